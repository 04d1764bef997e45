//! Citation token grammar and resolution.
//!
//! Answer generators are instructed to cite pages with bracketed tokens:
//!
//! ```text
//! [7]        page 7 of the concatenated selection (single-source form)
//! [7-9]      pages 7 through 9
//! [2:5]      page 5 of the 2nd source in the selection
//! [2:5-8]    pages 5 through 8 of the 2nd source
//! ```
//!
//! The grammar is matched bit-exactly; any other bracketed pattern (e.g.
//! `[7,9]` or `[fig 3]`) is not a citation and is ignored outright rather
//! than treated as malformed. Generated text is untrusted, so resolution has
//! partial-failure semantics: one bad token never aborts the others.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::error::ResolveError;
use crate::registry::SelectionSnapshot;

static CITATION_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(\d+)(?::(\d+))?(?:-(\d+))?\]").expect("citation grammar pattern is valid")
});

/// One citation token as scanned out of answer text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationToken {
    /// 1-based position in the selection, for the explicit `[doc:page]` form.
    pub doc_index: Option<usize>,
    /// Start page: global when `doc_index` is absent, local otherwise.
    pub start_page: usize,
    /// Inclusive end page for range forms.
    pub end_page: Option<usize>,
    /// Byte range of the token in the scanned text.
    pub span: (usize, usize),
}

impl CitationToken {
    /// The token as it appeared in the text, e.g. `[2:5-8]`.
    pub fn literal(&self) -> String {
        match (self.doc_index, self.end_page) {
            (Some(doc), Some(end)) => format!("[{}:{}-{}]", doc, self.start_page, end),
            (Some(doc), None) => format!("[{}:{}]", doc, self.start_page),
            (None, Some(end)) => format!("[{}-{}]", self.start_page, end),
            (None, None) => format!("[{}]", self.start_page),
        }
    }
}

/// A citation mapped back to a concrete source and local page range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCitation {
    /// 0-based position of the source in the snapshot.
    pub doc_index: usize,
    pub source_id: String,
    pub source_name: String,
    /// Local (per-source) page range; `end_page == start_page` for a
    /// single-page citation.
    pub start_page: usize,
    pub end_page: usize,
}

/// Scan text for every token matching the citation grammar, in order.
pub fn scan_tokens(text: &str) -> Vec<CitationToken> {
    CITATION_TOKEN
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let first: usize = caps.get(1)?.as_str().parse().ok()?;
            let second: Option<usize> = match caps.get(2) {
                Some(m) => Some(m.as_str().parse().ok()?),
                None => None,
            };
            let end: Option<usize> = match caps.get(3) {
                Some(m) => Some(m.as_str().parse().ok()?),
                None => None,
            };
            let (doc_index, start_page) = match second {
                Some(page) => (Some(first), page),
                None => (None, first),
            };
            Some(CitationToken {
                doc_index,
                start_page,
                end_page: end,
                span: (whole.start(), whole.end()),
            })
        })
        .collect()
}

/// Whether the text contains at least one citation token.
pub fn has_citation(text: &str) -> bool {
    CITATION_TOKEN.is_match(text)
}

/// Resolve a single token against a selection snapshot.
///
/// Doc-indexed tokens resolve directly against the snapshot position; plain
/// tokens resolve through the global page space. A range that would run past
/// its source's last page is clamped to it.
pub fn resolve(
    token: &CitationToken,
    snapshot: &SelectionSnapshot,
) -> Result<ResolvedCitation, ResolveError> {
    match token.doc_index {
        Some(doc) => {
            if doc == 0 || doc > snapshot.len() {
                return Err(ResolveError::InvalidDocIndex {
                    index: doc,
                    len: snapshot.len(),
                });
            }
            let entry = &snapshot.entries()[doc - 1];
            if token.start_page == 0 || token.start_page > entry.page_count {
                return Err(ResolveError::OutOfRange {
                    page: token.start_page,
                    total: entry.page_count,
                });
            }
            let end_page = token
                .end_page
                .unwrap_or(token.start_page)
                .clamp(token.start_page, entry.page_count);
            Ok(ResolvedCitation {
                doc_index: doc - 1,
                source_id: entry.source_id.clone(),
                source_name: entry.name.clone(),
                start_page: token.start_page,
                end_page,
            })
        }
        None => {
            let (doc_index, start_page) = snapshot.resolve_global_page(token.start_page)?;
            let entry = &snapshot.entries()[doc_index];
            let end_page = match token.end_page {
                Some(global_end) if global_end > token.start_page => {
                    let span = global_end - token.start_page;
                    (start_page + span).min(entry.page_count)
                }
                _ => start_page,
            };
            Ok(ResolvedCitation {
                doc_index,
                source_id: entry.source_id.clone(),
                source_name: entry.name.clone(),
                start_page,
                end_page,
            })
        }
    }
}

/// Resolve every token in `text`, skipping failures.
///
/// Each token resolves independently; a failing token is logged and carried
/// as an `Err` so callers can decide how to render it, but it never aborts
/// the rest.
pub fn resolve_all(
    text: &str,
    snapshot: &SelectionSnapshot,
) -> Vec<(CitationToken, Result<ResolvedCitation, ResolveError>)> {
    scan_tokens(text)
        .into_iter()
        .map(|token| {
            let resolved = resolve(&token, snapshot);
            if let Err(ref err) = resolved {
                warn!(token = %token.literal(), error = %err, "skipping unresolvable citation token");
            }
            (token, resolved)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Page, PageContent, Source, SourceKind};
    use crate::registry::SourceRegistry;

    fn snapshot_of(counts: &[usize]) -> SelectionSnapshot {
        let mut registry = SourceRegistry::new();
        for (i, &count) in counts.iter().enumerate() {
            let pages = (1..=count)
                .map(|n| Page::new(n, PageContent::TextChunk { text: n.to_string() }))
                .collect();
            registry.add(Source::new(
                SourceKind::File,
                format!("source-{}", i + 1),
                String::new(),
                pages,
            ));
        }
        registry.snapshot()
    }

    #[test]
    fn grammar_accepts_all_four_forms() {
        let tokens = scan_tokens("see [3], [4-6], [2:5] and [2:5-8].");
        assert_eq!(tokens.len(), 4);
        assert_eq!(
            tokens[0],
            CitationToken {
                doc_index: None,
                start_page: 3,
                end_page: None,
                span: (4, 7)
            }
        );
        assert_eq!(tokens[1].start_page, 4);
        assert_eq!(tokens[1].end_page, Some(6));
        assert_eq!(tokens[2].doc_index, Some(2));
        assert_eq!(tokens[2].start_page, 5);
        assert_eq!(tokens[3].doc_index, Some(2));
        assert_eq!(tokens[3].end_page, Some(8));
    }

    #[test]
    fn grammar_ignores_other_bracketed_patterns() {
        for text in ["[7,9]", "[fig 3]", "[a1]", "[3.5]", "[]", "[1-2-3]", "[-4]"] {
            assert!(scan_tokens(text).is_empty(), "matched non-citation {}", text);
            assert!(!has_citation(text));
        }
    }

    #[test]
    fn token_literal_round_trips() {
        for text in ["[3]", "[4-6]", "[2:5]", "[2:5-8]"] {
            let tokens = scan_tokens(text);
            assert_eq!(tokens.len(), 1);
            assert_eq!(tokens[0].literal(), text);
        }
    }

    #[test]
    fn plain_token_resolves_through_global_space() {
        let snapshot = snapshot_of(&[10, 15]);
        let tokens = scan_tokens("[18]");
        let resolved = resolve(&tokens[0], &snapshot).unwrap();
        assert_eq!(resolved.doc_index, 1);
        assert_eq!(resolved.source_name, "source-2");
        assert_eq!(resolved.start_page, 8);
        assert_eq!(resolved.end_page, 8);
    }

    #[test]
    fn doc_indexed_token_resolves_directly() {
        let snapshot = snapshot_of(&[10, 15]);
        let tokens = scan_tokens("[2:14]");
        let resolved = resolve(&tokens[0], &snapshot).unwrap();
        assert_eq!(resolved.doc_index, 1);
        assert_eq!(resolved.start_page, 14);
    }

    #[test]
    fn stale_doc_index_is_invalid_but_others_still_resolve() {
        let snapshot = snapshot_of(&[4]);
        let results = resolve_all("compare [2:3] with [1].", &snapshot);
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].1,
            Err(ResolveError::InvalidDocIndex { index: 2, len: 1 })
        );
        let ok = results[1].1.as_ref().unwrap();
        assert_eq!(ok.doc_index, 0);
        assert_eq!(ok.start_page, 1);
    }

    #[test]
    fn doc_index_zero_is_invalid() {
        let snapshot = snapshot_of(&[4]);
        let tokens = scan_tokens("[0:2]");
        assert_eq!(
            resolve(&tokens[0], &snapshot),
            Err(ResolveError::InvalidDocIndex { index: 0, len: 1 })
        );
    }

    #[test]
    fn local_page_out_of_range_is_reported() {
        let snapshot = snapshot_of(&[4, 2]);
        let tokens = scan_tokens("[2:9]");
        assert_eq!(
            resolve(&tokens[0], &snapshot),
            Err(ResolveError::OutOfRange { page: 9, total: 2 })
        );
    }

    #[test]
    fn range_clamps_to_the_start_source() {
        let snapshot = snapshot_of(&[10, 15]);
        // global 8-13 starts in source 1, which ends at local page 10
        let tokens = scan_tokens("[8-13]");
        let resolved = resolve(&tokens[0], &snapshot).unwrap();
        assert_eq!(resolved.doc_index, 0);
        assert_eq!(resolved.start_page, 8);
        assert_eq!(resolved.end_page, 10);
    }

    #[test]
    fn resolution_is_deterministic() {
        let snapshot = snapshot_of(&[3, 9, 2]);
        let text = "cited [5] and [3:1-2] and [99]";
        let a = resolve_all(text, &snapshot);
        let b = resolve_all(text, &snapshot);
        assert_eq!(a, b);
    }
}
