//! # Pagemark
//!
//! Document pagination and citation addressing for source-grounded chat.
//!
//! Pagemark is the addressing core of a document-chat application: it splits
//! heterogeneous document content into stable, citable "pages", concatenates
//! the selected sources into one global page space, resolves citation tokens
//! in generated answers back to (source, page), and coordinates the viewer
//! scroll that a citation click triggers.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌───────────────┐
//! │  Decoders   │──▶│ Paginator  │──▶│ Source        │
//! │ PDF/DOCX/   │   │ native /   │   │ Registry      │
//! │ XLSX/text   │   │ virtual    │   │ (selection)   │
//! └────────────┘   └────────────┘   └──────┬────────┘
//!                                          │ snapshot
//!                     answer text          ▼
//!                  ┌──────────────┐  ┌──────────────┐
//!                  │  Injection   │  │  Citation    │
//!                  │  fallback    │  │  resolver    │
//!                  └──────────────┘  └──────┬───────┘
//!                                           ▼
//!                                  ┌────────────────┐
//!                                  │  Navigation    │──▶ viewer events
//!                                  │  controller    │
//!                                  └────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Core data types (sources, pages, extraction output) |
//! | [`extract`] | PDF/DOCX/XLSX/plain-text decoding |
//! | [`paginate`] | Page derivation per content kind |
//! | [`registry`] | Active selection, offsets, global page resolution |
//! | [`citation`] | Citation token grammar and resolution |
//! | [`error`] | Resolution error taxonomy |
//! | [`inject`] | Fallback citation injection |
//! | [`context`] | Per-page payload for the answer generator |
//! | [`navigate`] | Viewer navigation state machine |
//! | [`session`] | Per-conversation coordination and snapshots |
//! | [`config`] | TOML configuration parsing |

pub mod citation;
pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod inject;
pub mod models;
pub mod navigate;
pub mod paginate;
pub mod registry;
pub mod session;
