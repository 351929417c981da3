//! Terminal rendering for Price Scout
//!
//! This module turns a `ScoutReport` into text for the terminal, using
//! crossterm styling and a ratatui sparkline for the price trend.

pub mod report;
pub mod widgets;

pub use report::{render_report, ReportView};
