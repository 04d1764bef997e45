//! Viewer navigation: mode switching, ready-gating, retry-based scrolling.
//!
//! The [`NavigationController`] decouples "something wants to show a page"
//! from "the viewer is ready to show it". It is constructed per conversation
//! session and injected where needed — there is no global instance.
//!
//! ```text
//! Idle ──request(target)──▶ AwaitingReady ──viewer_ready──▶ Navigating ──▶ Idle
//!   └────────request(target, viewer already ready)─────────────┘
//! ```
//!
//! Rendering is asynchronous, so the anchor for a page may not exist yet
//! when a scroll is requested. Instead of owning timers, the controller is a
//! step machine: it hands the host [`NavDirective`]s (look up this anchor /
//! wait this long and come back), and the host reports outcomes through
//! [`attempt_result`](NavigationController::attempt_result) and
//! [`retry_elapsed`](NavigationController::retry_elapsed). That keeps the
//! retry policy swappable and the whole machine testable without a UI.
//!
//! Delays grow linearly (base delay x attempt number) up to a fixed attempt
//! budget. Exhaustion is a logged diagnostic, never an error to the caller:
//! the scroll simply does not happen.
//!
//! Every request supersedes the previous one. Stale attempt and timer
//! reports carry an [`AttemptToken`] from a superseded generation and are
//! ignored, so a retry loop that was already in flight cannot scroll the
//! viewer to an outdated target.

use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, warn};

use crate::models::ViewMode;

/// Bounds for the anchor-lookup retry loop.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// How long a successful navigation highlights its target page.
pub const DEFAULT_HIGHLIGHT: Duration = Duration::from_millis(3000);

/// Events emitted to the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    /// The active display mode must change before the target can render.
    ModeChange { mode: ViewMode, page: usize },
    /// Scroll the viewer to a page whose anchor is known to exist.
    PageNavigate { page: usize },
    /// Highlight a page for a bounded duration, then auto-clear.
    PageHighlight { page: usize, duration_ms: u64 },
}

/// Subscriber for viewer events.
pub trait ViewerEventSink: Send + Sync {
    fn publish(&self, event: ViewerEvent);
}

/// Sink that drops every event.
pub struct NullSink;

impl ViewerEventSink for NullSink {
    fn publish(&self, _event: ViewerEvent) {}
}

/// Sink that records events in memory, for tests and diagnostics.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<ViewerEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ViewerEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl ViewerEventSink for MemorySink {
    fn publish(&self, event: ViewerEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Where a navigation wants to land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavTarget {
    pub source_id: String,
    pub page: usize,
    pub mode: ViewMode,
}

/// Controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    /// Nothing pending.
    Idle,
    /// A request arrived before the viewer announced readiness.
    AwaitingReady,
    /// Viewer ready, scroll attempt sequence in progress.
    Navigating,
}

/// Ties a host callback to the request generation and attempt it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptToken {
    generation: u64,
    attempt: u32,
}

/// What the controller asks the host to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavDirective {
    /// Nothing to do right now.
    None,
    /// Look up the anchor for (source, page) and report via
    /// [`NavigationController::attempt_result`].
    Locate {
        token: AttemptToken,
        source_id: String,
        page: usize,
    },
    /// Schedule a timer and call
    /// [`NavigationController::retry_elapsed`] when it fires.
    Wait { token: AttemptToken, delay: Duration },
    /// The retry budget ran out. Non-fatal; surface inertly if at all.
    Exhausted {
        source_id: String,
        page: usize,
        attempts: u32,
    },
}

struct InFlight {
    target: NavTarget,
    generation: u64,
    attempt: u32,
}

/// Session-scoped navigation coordinator.
pub struct NavigationController {
    state: NavState,
    ready: bool,
    total_pages: Option<usize>,
    mode: ViewMode,
    pending: Option<NavTarget>,
    current: Option<InFlight>,
    generation: u64,
    policy: RetryPolicy,
    highlight: Duration,
    sinks: Vec<Box<dyn ViewerEventSink>>,
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationController {
    pub fn new() -> Self {
        Self::with_policy(RetryPolicy::default(), DEFAULT_HIGHLIGHT)
    }

    pub fn with_policy(policy: RetryPolicy, highlight: Duration) -> Self {
        NavigationController {
            state: NavState::Idle,
            ready: false,
            total_pages: None,
            mode: ViewMode::Text,
            pending: None,
            current: None,
            generation: 0,
            policy,
            highlight,
            sinks: Vec::new(),
        }
    }

    /// Register a sink for viewer events.
    pub fn subscribe(&mut self, sink: Box<dyn ViewerEventSink>) {
        self.sinks.push(sink);
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn current_mode(&self) -> ViewMode {
        self.mode
    }

    /// Total pages last announced by the viewer, if it is ready.
    pub fn viewer_total_pages(&self) -> Option<usize> {
        self.total_pages
    }

    fn emit(&self, event: ViewerEvent) {
        for sink in &self.sinks {
            sink.publish(event.clone());
        }
    }

    /// Ask to show a page. If the viewer is not ready the request is parked;
    /// a newer request always replaces an older parked or in-flight one.
    pub fn request_navigate(&mut self, target: NavTarget) -> NavDirective {
        self.generation += 1;
        self.current = None;
        if !self.ready {
            debug!(
                source_id = %target.source_id,
                page = target.page,
                "viewer not ready; parking navigation request"
            );
            self.pending = Some(target);
            self.state = NavState::AwaitingReady;
            return NavDirective::None;
        }
        self.begin(target)
    }

    /// The viewer announced readiness. Executes the parked request, if any.
    pub fn viewer_ready(&mut self, total_pages: usize) -> NavDirective {
        self.ready = true;
        self.total_pages = Some(total_pages);
        match self.pending.take() {
            Some(target) => self.begin(target),
            None => {
                self.state = NavState::Idle;
                NavDirective::None
            }
        }
    }

    /// The displayed document changed. Drops parked and in-flight work and
    /// requires readiness to be re-announced before anything scrolls again.
    pub fn viewer_reset(&mut self) {
        debug!("viewer reset; clearing pending navigation");
        self.generation += 1;
        self.ready = false;
        self.total_pages = None;
        self.pending = None;
        self.current = None;
        self.state = NavState::Idle;
    }

    fn begin(&mut self, target: NavTarget) -> NavDirective {
        self.state = NavState::Navigating;
        // the scroll anchor only exists once the target's mode has rendered,
        // so the mode switch is sequenced strictly before the first lookup
        if target.mode != self.mode {
            self.mode = target.mode;
            self.emit(ViewerEvent::ModeChange {
                mode: target.mode,
                page: target.page,
            });
        }
        let token = AttemptToken {
            generation: self.generation,
            attempt: 1,
        };
        let directive = NavDirective::Locate {
            token,
            source_id: target.source_id.clone(),
            page: target.page,
        };
        self.current = Some(InFlight {
            target,
            generation: self.generation,
            attempt: 1,
        });
        directive
    }

    fn is_stale(&self, token: AttemptToken) -> bool {
        match &self.current {
            Some(current) => {
                token.generation != self.generation
                    || current.generation != self.generation
                    || token.attempt != current.attempt
            }
            None => true,
        }
    }

    /// Report the outcome of a [`NavDirective::Locate`] lookup.
    pub fn attempt_result(&mut self, token: AttemptToken, found: bool) -> NavDirective {
        if self.is_stale(token) {
            return NavDirective::None;
        }
        let Some(current) = self.current.as_ref() else {
            return NavDirective::None;
        };

        if found {
            let page = current.target.page;
            self.emit(ViewerEvent::PageNavigate { page });
            self.emit(ViewerEvent::PageHighlight {
                page,
                duration_ms: self.highlight.as_millis() as u64,
            });
            self.current = None;
            self.state = NavState::Idle;
            return NavDirective::None;
        }

        if current.attempt >= self.policy.max_attempts {
            let Some(in_flight) = self.current.take() else {
                return NavDirective::None;
            };
            let target = in_flight.target;
            warn!(
                source_id = %target.source_id,
                page = target.page,
                attempts = self.policy.max_attempts,
                "viewer never rendered the navigation target; giving up"
            );
            self.state = NavState::Idle;
            return NavDirective::Exhausted {
                source_id: target.source_id,
                page: target.page,
                attempts: self.policy.max_attempts,
            };
        }

        // linear backoff: base delay x attempt number
        let delay = self.policy.base_delay * current.attempt;
        NavDirective::Wait { token, delay }
    }

    /// A [`NavDirective::Wait`] timer fired.
    pub fn retry_elapsed(&mut self, token: AttemptToken) -> NavDirective {
        if self.is_stale(token) {
            return NavDirective::None;
        }
        let Some(current) = self.current.as_mut() else {
            return NavDirective::None;
        };
        current.attempt += 1;
        let token = AttemptToken {
            generation: current.generation,
            attempt: current.attempt,
        };
        NavDirective::Locate {
            token,
            source_id: current.target.source_id.clone(),
            page: current.target.page,
        }
    }
}
