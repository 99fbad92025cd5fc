//! HTTP handlers for the hosted apps collection.

pub mod apps;
pub use apps::*;
