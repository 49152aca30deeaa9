//! Logging infrastructure: structured outcome logging.
//!
//! Provides [`JsonlRewardSink`], a JSONL file writer that implements the
//! [`RewardSink`](council_application::RewardSink) port.

mod jsonl_outcomes;

pub use jsonl_outcomes::JsonlRewardSink;
