//! Terminal UI built on ratatui.
//!
//! - `render`: frame layout, overlays, status bar
//! - `input`: keyboard handling per tab and overlay
//! - `styles`: palette and per-status styling
//! - `tabs`: the five tab bodies (dashboard, children, attendance,
//!   progress, messages)

pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
