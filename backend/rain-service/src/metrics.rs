//! Prometheus metrics for the feed pipeline.

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    pub static ref REPLENISH_OUTCOMES: IntCounterVec = register_int_counter_vec!(
        "rain_replenish_outcomes_total",
        "Replenish operations by outcome",
        &["outcome"]
    )
    .expect("register replenish outcomes counter");
    pub static ref FEED_ITEMS_PROMOTED: IntCounter = register_int_counter!(
        "rain_feed_items_promoted_total",
        "Queue entries promoted into the feed log"
    )
    .expect("register promotion counter");
    pub static ref SCORER_FALLBACKS: IntCounter = register_int_counter!(
        "rain_scorer_fallback_scores_total",
        "Chunks assigned the neutral fallback score"
    )
    .expect("register scorer fallback counter");
}

/// Render the default registry in the Prometheus text format.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder
        .encode(&prometheus::gather(), &mut buffer)
        .is_err()
    {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
