//! Price Scout Library
//!
//! This module exposes the lookup pipeline (cache, outbound clients, matcher,
//! fan-out) for the binary and for integration tests.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod fanout;
pub mod matcher;
pub mod scout;
pub mod ui;

#[cfg(test)]
mod test_support;
