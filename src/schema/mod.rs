//! Activity log input schema
//!
//! This module defines the daily log file format and the adapter that turns
//! logs into the raw entry sequence consumed by the analysis pipeline.

mod adapter;
mod daily_log;

pub use adapter::*;
pub use daily_log::*;
