//! Typed errors for citation and page-address resolution.
//!
//! Generated answer text is untrusted input, so resolution failures are
//! ordinary values callers are expected to skip, never panics. Only the
//! extraction layer has its own error type (see [`crate::extract`]).

use thiserror::Error;

/// Why a citation reference could not be mapped back to a source page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A global page number fell outside `[1, total]` for the selection,
    /// or a local page number fell outside the referenced source.
    #[error("page {page} is outside the {total} addressable pages")]
    OutOfRange { page: usize, total: usize },

    /// A doc-indexed citation referenced a position outside the selection
    /// snapshot (e.g. a stale citation after a source was removed).
    #[error("document index {index} is out of bounds for a selection of {len} sources")]
    InvalidDocIndex { index: usize, len: usize },
}
