//! Minimal LLM client and extraction-cache primitives, used by LLM-backed
//! extractors and by the extraction runner's batch cost aggregation.
//! Deterministic extractors never construct an `LlmClient` or touch the
//! cache; the runner's dependency on this crate is limited to
//! [`estimate_cost_usd`].

pub mod cache;
pub mod client;
pub mod cost;
pub mod error;

pub use cache::{compute_cache_key, lookup as cache_lookup, payload_hash};
pub use client::LlmClient;
pub use cost::estimate_cost_usd;
pub use error::{LlmError, Result};
