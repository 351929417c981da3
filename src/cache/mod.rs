//! In-memory TTL cache for fetched signals
//!
//! This module provides a cache that memoizes the result of a fetch function
//! per source key for a time-to-live window. Failed fetches are never stored,
//! so the next read after expiry retries. Expired entries stay readable through
//! `peek` to support graceful degradation when a source is unavailable.

mod manager;

pub use manager::{
    get_or_fetch, get_or_stale, Cache, CachedData, Clock, ManualClock, SystemClock, TtlCache,
};
