//! Display formatting helpers shared by the tab renderers.

pub mod format;

pub use format::{format_date, format_optional, format_phone, format_timestamp, truncate_string};
