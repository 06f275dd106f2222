//! Shared render-only widgets.

pub mod detail_popup;
