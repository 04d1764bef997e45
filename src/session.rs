//! Conversation-session coordination.
//!
//! A [`ConversationSession`] owns the source registry and the navigation
//! controller for one conversation, and enforces the two ordering rules the
//! rest of the crate depends on:
//!
//! 1. **Snapshot at generation time.** Citations in an answer refer to the
//!    selection as it was when the answer was generated. The session captures
//!    a [`SelectionSnapshot`] per answer and resolves against it, so removing
//!    or toggling sources afterwards cannot re-map old citations.
//! 2. **One ordered reaction list on source change.** Switching the displayed
//!    source runs a fixed sequence (reset the viewer, re-derive deferred
//!    pagination, record the new active source) instead of leaving each
//!    concern to fire from its own watcher in unspecified order.

use tracing::{debug, warn};

use crate::citation::{self, ResolvedCitation};
use crate::config::Config;
use crate::models::{Source, ViewMode};
use crate::navigate::{NavDirective, NavTarget, NavigationController};
use crate::paginate::{self, PaginateOptions};
use crate::registry::{SelectionSnapshot, SourceRegistry};

/// State for a single conversation over a selection of sources.
pub struct ConversationSession {
    registry: SourceRegistry,
    controller: NavigationController,
    options: PaginateOptions,
    /// Snapshot the current answer was generated against.
    answer_snapshot: Option<SelectionSnapshot>,
    /// Source currently shown in the viewer.
    active_source: Option<String>,
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationSession {
    pub fn new() -> Self {
        ConversationSession {
            registry: SourceRegistry::new(),
            controller: NavigationController::new(),
            options: PaginateOptions::default(),
            answer_snapshot: None,
            active_source: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        ConversationSession {
            registry: SourceRegistry::new(),
            controller: NavigationController::with_policy(
                config.viewer.policy(),
                config.viewer.highlight(),
            ),
            options: config.pagination.options(),
            answer_snapshot: None,
            active_source: None,
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn controller(&self) -> &NavigationController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut NavigationController {
        &mut self.controller
    }

    /// Id of the source currently shown in the viewer.
    pub fn active_source(&self) -> Option<&str> {
        self.active_source.as_deref()
    }

    /// Add a source to the end of the selection.
    pub fn add_source(&mut self, source: Source) -> String {
        let id = source.id.clone();
        self.registry.add(source);
        id
    }

    /// Remove a source. If it was displayed, the viewer is reset.
    pub fn remove_source(&mut self, id: &str) -> Option<Source> {
        let removed = self.registry.remove(id);
        if removed.is_some() && self.active_source.as_deref() == Some(id) {
            self.controller.viewer_reset();
            self.active_source = None;
        }
        removed
    }

    /// Toggle a source in or out of the active selection.
    pub fn toggle_source(&mut self, id: &str) -> Option<bool> {
        self.registry.toggle(id)
    }

    /// Capture the selection an answer is about to be generated against.
    pub fn begin_answer(&mut self) -> SelectionSnapshot {
        let snapshot = self.registry.snapshot();
        self.answer_snapshot = Some(snapshot.clone());
        snapshot
    }

    /// Post-process a generated answer, guaranteeing at least one citation.
    pub fn finish_answer(&mut self, answer: &str) -> String {
        let snapshot = self
            .answer_snapshot
            .get_or_insert_with(|| self.registry.snapshot());
        crate::inject::ensure_citations(answer, snapshot)
    }

    /// Resolve every citation in an answer against the snapshot captured at
    /// generation time. Unresolvable tokens are skipped.
    pub fn resolve_answer(&self, answer: &str) -> Vec<ResolvedCitation> {
        let fallback;
        let snapshot = match &self.answer_snapshot {
            Some(snapshot) => snapshot,
            None => {
                fallback = self.registry.snapshot();
                &fallback
            }
        };
        citation::resolve_all(answer, snapshot)
            .into_iter()
            .filter_map(|(_, resolved)| resolved.ok())
            .collect()
    }

    /// A resolved citation was clicked: turn it into a navigation request.
    ///
    /// A citation whose source has left the registry since generation is
    /// dropped with a diagnostic. Switching to a different source first runs
    /// the source-changed reactions, so the scroll waits for the viewer to
    /// re-announce readiness over the new document.
    pub fn navigate_citation(&mut self, resolved: &ResolvedCitation) -> NavDirective {
        let Some(source) = self.registry.get(&resolved.source_id) else {
            warn!(
                source_id = %resolved.source_id,
                "citation targets a source no longer in the selection; ignoring"
            );
            return NavDirective::None;
        };
        let mode = source
            .page(resolved.start_page)
            .map(|page| page.content.view_mode())
            .unwrap_or(ViewMode::Text);
        let target = NavTarget {
            source_id: resolved.source_id.clone(),
            page: resolved.start_page,
            mode,
        };

        if self.active_source.as_deref() != Some(resolved.source_id.as_str()) {
            let id = resolved.source_id.clone();
            self.activate_source(&id);
        }
        self.controller.request_navigate(target)
    }

    /// Explicit "displayed source changed" transition.
    ///
    /// Reactions run in a fixed order:
    /// 1. reset the viewer (parked navigation is stale, readiness must be
    ///    re-announced over the new document),
    /// 2. re-derive pagination if it was deferred for this source,
    /// 3. record the new active source.
    pub fn activate_source(&mut self, id: &str) {
        if self.active_source.as_deref() == Some(id) {
            return;
        }
        debug!(source_id = %id, "active source changed");

        self.controller.viewer_reset();

        if let Some(source) = self.registry.get_mut(id) {
            if paginate::needs_repagination(source, &self.options) {
                debug!(source_id = %id, "re-deriving deferred pagination");
                paginate::repaginate_source(source, &self.options);
            }
        }

        self.active_source = Some(id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtractedContent, Page, PageContent, SourceKind};
    use crate::navigate::NavState;
    use crate::paginate::{paginate, EMPTY_CONTENT_PLACEHOLDER};

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
    fn answers_resolve_against_the_generation_snapshot() {
        let mut session = ConversationSession::new();
        let first = session.add_source(source_with_pages("first", 10));
        session.add_source(source_with_pages("second", 15));

        session.begin_answer();
        // the user removes a source after the answer was generated
        session.remove_source(&first);

        let resolved = session.resolve_answer("see [18]");
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].source_name, "second");
        assert_eq!(resolved[0].start_page, 8);
    }

    #[test]
    fn citations_to_removed_sources_are_dropped_on_click() {
        let mut session = ConversationSession::new();
        let first = session.add_source(source_with_pages("first", 10));
        session.add_source(source_with_pages("second", 15));

        session.begin_answer();
        let resolved = session.resolve_answer("see [3]");
        session.remove_source(&first);

        assert_eq!(session.navigate_citation(&resolved[0]), NavDirective::None);
    }

    #[test]
    fn navigating_to_a_new_source_waits_for_readiness() {
        let mut session = ConversationSession::new();
        session.add_source(source_with_pages("doc", 9));

        session.begin_answer();
        let resolved = session.resolve_answer("see [4]");
        assert_eq!(resolved.len(), 1);

        // switching documents resets the viewer, so the request parks
        let directive = session.navigate_citation(&resolved[0]);
        assert_eq!(directive, NavDirective::None);
        assert_eq!(session.controller().state(), NavState::AwaitingReady);

        let directive = session.controller_mut().viewer_ready(9);
        match directive {
            NavDirective::Locate { page, .. } => assert_eq!(page, 4),
            other => panic!("expected Locate, got {:?}", other),
        }
    }

    #[test]
    fn finish_answer_injects_when_generator_forgot() {
        let mut session = ConversationSession::new();
        session.add_source(source_with_pages("doc", 9));
        session.begin_answer();
        assert_eq!(
            session.finish_answer("An answer without citations."),
            "An answer without citations. [5]"
        );
    }

    #[test]
    fn activation_repaginates_deferred_sources_once() {
        let mut session = ConversationSession::new();
        let text = "A sentence for the paginator. ".repeat(200);
        let placeholder = paginate(
            &ExtractedContent::PlainText(String::new()),
            &PaginateOptions::default(),
        );
        let lazy = Source::new(SourceKind::Text, "paste", text, placeholder);
        let id = session.add_source(lazy);
        assert_eq!(
            session.registry().get(&id).unwrap().pages[0]
                .content
                .renderable_text(),
            EMPTY_CONTENT_PLACEHOLDER
        );

        session.activate_source(&id);
        let count = session.registry().get(&id).unwrap().page_count();
        assert!(count > 1);

        // activating the already-active source is a no-op
        session.activate_source(&id);
        assert_eq!(session.registry().get(&id).unwrap().page_count(), count);
    }
}
