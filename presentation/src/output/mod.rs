//! Console rendering of catalogs, outputs, and statistics

pub mod console;
