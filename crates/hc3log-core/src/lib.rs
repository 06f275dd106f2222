// hc3log-core: Event pipeline between hc3log-api and the view layer.
//
// Data flow: session (long-poll) → normalize → EventStore → FilterEngine
// → view planner → consumer. The store and filters are plain values
// mutated by a single owner; only the session runs a background task.

pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod normalize;
pub mod ordered_json;
pub mod session;
pub mod store;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ConnectionConfig, Scheme};
pub use error::CoreError;
pub use filter::{FilterEngine, IdFilter};
pub use model::{EventRecord, EventRow, Tone, ValueCell, ID_SENTINEL};
pub use session::{ConnectionState, LogSession, StreamHandle};
pub use store::{Appended, EventStore};
pub use view::{RenderPlan, SortColumn, SortDirection, SortState, sort_events};
