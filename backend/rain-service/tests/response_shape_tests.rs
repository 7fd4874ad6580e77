//! Wire-shape tests for the structured outcomes the client depends on.

use chrono::Utc;
use rain_service::models::FeedItemFull;
use rain_service::services::replenisher::{ReplenishOutcome, SkipReason};
use uuid::Uuid;

#[test]
fn skipped_replenish_serializes_reason_and_omits_added() {
    let outcome = ReplenishOutcome {
        replenished: false,
        added: None,
        queue_size: 7,
        reason: Some(SkipReason::NoActiveSources),
    };
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["replenished"], false);
    assert_eq!(json["queueSize"], 7);
    assert_eq!(json["reason"], "no_active_sources");
    assert!(json.get("added").is_none());
}

#[test]
fn successful_replenish_serializes_added_and_omits_reason() {
    let outcome = ReplenishOutcome {
        replenished: true,
        added: Some(10),
        queue_size: 10,
        reason: None,
    };
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["replenished"], true);
    assert_eq!(json["added"], 10);
    assert!(json.get("reason").is_none());
}

#[test]
fn skip_reasons_match_their_wire_names() {
    assert_eq!(SkipReason::AlreadySufficient.as_str(), "already_sufficient");
    assert_eq!(SkipReason::NoActiveSources.as_str(), "no_active_sources");
    assert_eq!(SkipReason::NoCandidates.as_str(), "no_candidates");
    assert_eq!(
        serde_json::to_value(SkipReason::NoCandidates).unwrap(),
        "no_candidates"
    );
}

#[test]
fn feed_item_payload_keeps_snake_case_fields() {
    let item = FeedItemFull {
        feed_item_id: Uuid::new_v4(),
        chunk_id: Uuid::new_v4(),
        article_id: Uuid::new_v4(),
        article_title: "A title".to_string(),
        article_url: "https://example.com".to_string(),
        chunk_index: 2,
        content: "chunk body".to_string(),
        predicted_score: 4.2,
        was_explore: true,
        shown_at: Utc::now(),
        position: 17,
    };
    let json = serde_json::to_value(&item).unwrap();

    assert_eq!(json["feed_item_id"], serde_json::json!(item.feed_item_id));
    assert_eq!(json["article_title"], "A title");
    assert_eq!(json["was_explore"], true);
    assert_eq!(json["position"], 17);
}
