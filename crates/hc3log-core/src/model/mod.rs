// ── Domain model types ──

mod event;

pub use event::{EventRecord, EventRow, Tone, ValueCell, ID_SENTINEL};
