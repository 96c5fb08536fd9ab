//! Multi-provider search and the fallback tiers built on top of it.

pub mod aggregator;
pub mod fallback;

pub use aggregator::{Aggregator, CandidateSearch};
pub use fallback::{FallbackController, FallbackTier, FetchOutcome};
