//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::sync::Arc;

use hc3log_core::{ConnectionState, EventRecord, SortColumn};

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Stream (from the data bridge) ──────────────────────────────
    EventIngested(Arc<EventRecord>),
    StreamState(ConnectionState),
    StreamError(String),
    Reconnect,

    // ── Table ──────────────────────────────────────────────────────
    SortBy(SortColumn),
    ToggleAutoScroll,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    ScrollToTop,
    ScrollToBottom,
    ClearLog,

    // ── Filters ────────────────────────────────────────────────────
    ToggleFilterPanel,
    ClearFilters,
    OpenValueFilter,
    CloseValueFilter,

    // ── Details popup ──────────────────────────────────────────────
    FetchDetails { event_type: String, id: String },
    ShowEventJson(Arc<str>),
    DetailsLoaded(Arc<str>),
    DetailsFailed(String),
    CloseDetails,

    // ── Help ───────────────────────────────────────────────────────
    ToggleHelp,
}
