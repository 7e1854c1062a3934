//! Data access layer
//!
//! Epoch-tagged tables around polars DataFrames, column classification and
//! summary statistics.

pub mod columns;
pub mod stats;
pub mod table;

pub use table::{Epoch, Table};
