//! Screen implementations.

pub mod filters;
pub mod log;

pub use log::LogScreen;
