pub mod accuracy;
pub mod candidates;
pub mod chunker;
pub mod feed_reader;
pub mod partition;
pub mod prompts;
pub mod replenisher;
pub mod scoring;

pub use feed_reader::{FeedCursor, FeedPage};
pub use replenisher::{ReplenishOutcome, Replenisher, SkipReason};
