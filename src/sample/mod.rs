//! Sample module for netlog.
//!
//! Holds the per-probe observation model and the CSV sample-log reader.

mod models;
mod reader;

pub use models::*;
pub use reader::*;
