//! Construction packages.
//!
//! Package descriptions are stored as free text; `compare.rs` lines them
//! up feature by feature for the comparison table on the packages page.

pub mod compare;

pub use compare::{build_comparison, render_table, Comparison, ComparisonRow};
