// hc3log-api: Raw HTTP layer for the Fibaro HC3 controller.
//
// Wraps `reqwest` with HC3-specific URL construction and Basic-auth
// transport. The long-poll event feed (`/api/refreshStates`) and the
// on-demand resource lookups live here; everything above this crate
// works with parsed `RawEvent` values and never sees HTTP.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod transport;

pub use client::Hc3Client;
pub use endpoints::detail_path;
pub use error::Error;
pub use models::{RawEvent, RefreshResponse};
pub use transport::{TlsMode, TransportConfig};
