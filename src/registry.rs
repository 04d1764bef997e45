//! Active-selection bookkeeping and multi-document page addressing.
//!
//! The registry holds the sources loaded into a conversation in insertion
//! order. The ordered *active* subset is the selection citations address:
//! concatenating the active sources' pages yields one global page space, and
//! a source's cumulative offset is the sum of the page counts before it.
//!
//! ```text
//! selection:   [ report.pdf (10) ][ notes.txt (15) ][ sheet.xlsx (3) ]
//! global page:   1 ........ 10     11 ......... 25   26 ........ 28
//! offset:        0                 10                25
//! ```
//!
//! Resolution for an already-generated answer never reads live registry
//! state: callers capture a [`SelectionSnapshot`] when the answer is
//! generated and resolve against that, so later add/remove/toggle calls
//! cannot retroactively re-map old citations.

use std::collections::HashSet;

use crate::error::ResolveError;
use crate::models::Source;

/// Ordered set of sources included in the conversation context.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    /// All loaded sources, insertion-ordered. Order is append-only.
    entries: Vec<Source>,
    /// Ids toggled out of the active selection (still loaded).
    inactive: HashSet<String>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source to the end of the selection, active.
    pub fn add(&mut self, source: Source) {
        self.inactive.remove(&source.id);
        self.entries.push(source);
    }

    /// Remove a source entirely. Remaining members keep their order and
    /// page counts; only offsets after the removed source shift.
    pub fn remove(&mut self, id: &str) -> Option<Source> {
        self.inactive.remove(id);
        let pos = self.entries.iter().position(|s| s.id == id)?;
        Some(self.entries.remove(pos))
    }

    /// Flip a source in or out of the active selection without disturbing
    /// its insertion position. Returns the new active state, or `None` for
    /// an unknown id.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        if !self.entries.iter().any(|s| s.id == id) {
            return None;
        }
        if self.inactive.remove(id) {
            Some(true)
        } else {
            self.inactive.insert(id.to_string());
            Some(false)
        }
    }

    /// Look up a loaded source by id (active or not).
    pub fn get(&self, id: &str) -> Option<&Source> {
        self.entries.iter().find(|s| s.id == id)
    }

    /// Mutable lookup, for in-place re-pagination.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Source> {
        self.entries.iter_mut().find(|s| s.id == id)
    }

    /// The active selection in insertion order.
    pub fn active(&self) -> impl Iterator<Item = &Source> {
        self.entries
            .iter()
            .filter(move |s| !self.inactive.contains(&s.id))
    }

    /// Number of active sources.
    pub fn active_len(&self) -> usize {
        self.active().count()
    }

    /// Number of loaded sources, active or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total pages across the active selection.
    pub fn total_pages(&self) -> usize {
        self.active().map(|s| s.page_count()).sum()
    }

    /// Sum of page counts of active sources preceding `id`; 0 for the first.
    /// `None` when `id` is not in the active selection.
    pub fn cumulative_offset_of(&self, id: &str) -> Option<usize> {
        let mut offset = 0;
        for source in self.active() {
            if source.id == id {
                return Some(offset);
            }
            offset += source.page_count();
        }
        None
    }

    /// Map a global page number onto `(source, local page)`.
    ///
    /// Walks the active selection accumulating page counts; the first source
    /// whose range `[offset + 1, offset + page_count]` contains the global
    /// page wins. With a single active source this is the identity mapping.
    pub fn resolve_global_page(&self, global: usize) -> Result<(&Source, usize), ResolveError> {
        let total = self.total_pages();
        if global == 0 || global > total {
            return Err(ResolveError::OutOfRange {
                page: global,
                total,
            });
        }
        let mut offset = 0;
        for source in self.active() {
            let count = source.page_count();
            if global <= offset + count {
                return Ok((source, global - offset));
            }
            offset += count;
        }
        Err(ResolveError::OutOfRange {
            page: global,
            total,
        })
    }

    /// Capture the active selection for citation resolution.
    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            entries: self
                .active()
                .map(|s| SnapshotEntry {
                    source_id: s.id.clone(),
                    name: s.name.clone(),
                    page_count: s.page_count(),
                })
                .collect(),
        }
    }
}

/// One active source as captured in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub source_id: String,
    pub name: String,
    pub page_count: usize,
}

/// Immutable capture of the active selection at answer-generation time.
///
/// All citation resolution for that answer runs against the snapshot, so the
/// doc-index and global-page spaces stay frozen even if the user edits the
/// selection afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionSnapshot {
    entries: Vec<SnapshotEntry>,
}

impl SelectionSnapshot {
    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at a 0-based position.
    pub fn get(&self, index: usize) -> Option<&SnapshotEntry> {
        self.entries.get(index)
    }

    pub fn total_pages(&self) -> usize {
        self.entries.iter().map(|e| e.page_count).sum()
    }

    /// Sum of page counts of the first `index` entries.
    pub fn cumulative_offset(&self, index: usize) -> usize {
        self.entries[..index.min(self.entries.len())]
            .iter()
            .map(|e| e.page_count)
            .sum()
    }

    /// Map a global page number onto `(entry index, local page)`.
    pub fn resolve_global_page(&self, global: usize) -> Result<(usize, usize), ResolveError> {
        let total = self.total_pages();
        if global == 0 || global > total {
            return Err(ResolveError::OutOfRange {
                page: global,
                total,
            });
        }
        let mut offset = 0;
        for (index, entry) in self.entries.iter().enumerate() {
            if global <= offset + entry.page_count {
                return Ok((index, global - offset));
            }
            offset += entry.page_count;
        }
        Err(ResolveError::OutOfRange {
            page: global,
            total,
        })
    }
}
