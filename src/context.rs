//! Generation-boundary context payload.
//!
//! The answer generator is a black box that receives per-page rows and
//! returns text carrying citation tokens. This module builds those rows:
//! `source_index` here is the same 1-based doc-index space the `[doc:page]`
//! citation form refers back to, and rows follow selection order so the
//! concatenated page space matches the resolver's offset arithmetic.

use serde::Serialize;

use crate::registry::SourceRegistry;

/// One page row handed to the external answer generator.
#[derive(Debug, Clone, Serialize)]
pub struct ContextPage {
    /// 1-based position of the source in the active selection.
    pub source_index: usize,
    pub source_name: String,
    /// 1-based page number within the source.
    pub local_page: usize,
    pub text: String,
}

/// Flatten the active selection into generator rows.
pub fn build_context(registry: &SourceRegistry) -> Vec<ContextPage> {
    let mut rows = Vec::new();
    for (index, source) in registry.active().enumerate() {
        for page in &source.pages {
            rows.push(ContextPage {
                source_index: index + 1,
                source_name: source.name.clone(),
                local_page: page.number,
                text: page.content.renderable_text().to_string(),
            });
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Page, PageContent, Source, SourceKind};

    fn source_with_pages(name: &str, count: usize) -> Source {
        let pages = (1..=count)
            .map(|n| {
                Page::new(
                    n,
                    PageContent::TextChunk {
                        text: format!("{} page {}", name, n),
                    },
                )
            })
            .collect();
        Source::new(SourceKind::File, name, String::new(), pages)
    }

    #[test]
    fn rows_follow_selection_then_page_order() {
        let mut registry = SourceRegistry::new();
        registry.add(source_with_pages("a", 2));
        registry.add(source_with_pages("b", 3));

        let rows = build_context(&registry);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].source_index, 1);
        assert_eq!(rows[0].local_page, 1);
        assert_eq!(rows[1].local_page, 2);
        assert_eq!(rows[2].source_index, 2);
        assert_eq!(rows[2].source_name, "b");
        assert_eq!(rows[4].local_page, 3);
    }

    #[test]
    fn toggled_off_sources_are_excluded() {
        let mut registry = SourceRegistry::new();
        let a = source_with_pages("a", 2);
        let ida = a.id.clone();
        registry.add(a);
        registry.add(source_with_pages("b", 1));
        registry.toggle(&ida);

        let rows = build_context(&registry);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].source_index, 1);
        assert_eq!(rows[0].source_name, "b");
    }
}
