//! Reusable rendering widgets

pub mod sparkline;

pub use sparkline::{sparkline_line, PriceSparkline};
