use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of a saved article. `Cloud` articles are actively sourced into
/// the feed; `River` is the reading pile; `Ocean` is the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Cloud,
    River,
    Ocean,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Cloud => "cloud",
            ArticleStatus::River => "river",
            ArticleStatus::Ocean => "ocean",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cloud" => Some(ArticleStatus::Cloud),
            "river" => Some(ArticleStatus::River),
            "ocean" => Some(ArticleStatus::Ocean),
            _ => None,
        }
    }

    /// Whether moving to `next` is a meaningful transition. Every move
    /// between distinct states is allowed; re-entering the current state
    /// is rejected so accidental double-submits surface as errors.
    pub fn can_transition_to(&self, next: ArticleStatus) -> bool {
        *self != next
    }
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Article {
    pub id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub generated_image_url: Option<String>,
    pub gradient_seed: i64,
    pub status: String,
    pub reading_progress: f64,
    pub notes: Option<String>,
    pub unread_reason: Option<String>,
    pub finished: bool,
    pub created_at: DateTime<Utc>,
    pub moved_to_river_at: Option<DateTime<Utc>>,
    pub moved_to_ocean_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Chunk {
    pub id: Uuid,
    pub article_id: Uuid,
    pub user_id: Uuid,
    pub chunk_index: i32,
    pub content: String,
    pub word_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChunkRating {
    pub id: Uuid,
    pub chunk_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub annotation: Option<String>,
    pub predicted_score: Option<f64>,
    pub was_explore: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedQueueEntry {
    pub id: Uuid,
    pub chunk_id: Uuid,
    pub user_id: Uuid,
    pub predicted_score: f64,
    pub was_explore: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedItem {
    pub id: Uuid,
    pub chunk_id: Uuid,
    pub user_id: Uuid,
    pub predicted_score: f64,
    pub was_explore: bool,
    pub shown_at: DateTime<Utc>,
    pub position: i64,
}

/// A feed log entry joined with its chunk and owning article, the unit
/// returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedItemFull {
    pub feed_item_id: Uuid,
    pub chunk_id: Uuid,
    pub article_id: Uuid,
    pub article_title: String,
    pub article_url: String,
    pub chunk_index: i32,
    pub content: String,
    pub predicted_score: f64,
    pub was_explore: bool,
    pub shown_at: DateTime<Utc>,
    pub position: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserFeedState {
    pub user_id: Uuid,
    pub last_seen_feed_item_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSettings {
    pub user_id: Uuid,
    pub chunk_size: i32,
    pub explore_ratio: f64,
    pub feed_batch_size: i32,
    pub candidate_pool_size: i32,
    pub scoring_batch_size: i32,
    pub num_few_shot: i32,
    pub scoring_model: String,
    pub context_model: String,
    pub show_explore_flag: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Settings values without the row metadata, used for inserts and updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsValues {
    pub chunk_size: i32,
    pub explore_ratio: f64,
    pub feed_batch_size: i32,
    pub candidate_pool_size: i32,
    pub scoring_batch_size: i32,
    pub num_few_shot: i32,
    pub scoring_model: String,
    pub context_model: String,
    pub show_explore_flag: bool,
}

impl Default for SettingsValues {
    fn default() -> Self {
        Self {
            chunk_size: 200,
            explore_ratio: 0.2,
            feed_batch_size: 10,
            candidate_pool_size: 100,
            scoring_batch_size: 10,
            num_few_shot: 20,
            scoring_model: "llama-3.3-70b".to_string(),
            context_model: "llama-3.3-70b".to_string(),
            show_explore_flag: false,
        }
    }
}

/// Partial settings update as sent by the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub chunk_size: Option<i64>,
    pub explore_ratio: Option<f64>,
    pub feed_batch_size: Option<i64>,
    pub candidate_pool_size: Option<i64>,
    pub scoring_batch_size: Option<i64>,
    pub num_few_shot: Option<i64>,
    pub scoring_model: Option<String>,
    pub context_model: Option<String>,
    pub show_explore_flag: Option<bool>,
}

fn clamp_i32(value: Option<i64>, min: i32, max: i32, fallback: i32) -> i32 {
    match value {
        Some(v) => (v.clamp(min as i64, max as i64)) as i32,
        None => fallback,
    }
}

fn clamp_f64(value: Option<f64>, min: f64, max: f64, fallback: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.clamp(min, max),
        _ => fallback,
    }
}

/// Clamp a partial update into a full, valid settings row. Missing or
/// out-of-range fields fall back to the supplied base values.
pub fn sanitize_settings(input: &SettingsUpdate, base: &SettingsValues) -> SettingsValues {
    SettingsValues {
        chunk_size: clamp_i32(input.chunk_size, 50, 500, base.chunk_size),
        explore_ratio: clamp_f64(input.explore_ratio, 0.0, 1.0, base.explore_ratio),
        feed_batch_size: clamp_i32(input.feed_batch_size, 1, 100, base.feed_batch_size),
        candidate_pool_size: clamp_i32(input.candidate_pool_size, 10, 1000, base.candidate_pool_size),
        scoring_batch_size: clamp_i32(input.scoring_batch_size, 1, 100, base.scoring_batch_size),
        num_few_shot: clamp_i32(input.num_few_shot, 0, 100, base.num_few_shot),
        scoring_model: match &input.scoring_model {
            Some(m) if !m.trim().is_empty() => m.clone(),
            _ => base.scoring_model.clone(),
        },
        context_model: match &input.context_model {
            Some(m) if !m.trim().is_empty() => m.clone(),
            _ => base.context_model.clone(),
        },
        show_explore_flag: input.show_explore_flag.unwrap_or(base.show_explore_flag),
    }
}

/// A chunk eligible for scoring.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateChunk {
    pub id: Uuid,
    pub content: String,
}

/// A scored candidate as returned by the relevance scorer.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkScore {
    pub id: Uuid,
    pub score: f64,
}

/// A prior rating supplied to the scorer as calibration context.
#[derive(Debug, Clone)]
pub struct FewShotExample {
    pub content: String,
    pub rating: i32,
    pub annotation: Option<String>,
}

/// A scored candidate tagged with its exploit/explore origin, ready for
/// feed queue insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedCandidate {
    pub chunk_id: Uuid,
    pub predicted_score: f64,
    pub was_explore: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let update = SettingsUpdate {
            chunk_size: Some(10_000),
            explore_ratio: Some(1.7),
            feed_batch_size: Some(0),
            candidate_pool_size: Some(3),
            num_few_shot: Some(-5),
            ..Default::default()
        };
        let out = sanitize_settings(&update, &SettingsValues::default());
        assert_eq!(out.chunk_size, 500);
        assert_eq!(out.explore_ratio, 1.0);
        assert_eq!(out.feed_batch_size, 1);
        assert_eq!(out.candidate_pool_size, 10);
        assert_eq!(out.num_few_shot, 0);
    }

    #[test]
    fn sanitize_keeps_base_for_missing_fields() {
        let base = SettingsValues::default();
        let out = sanitize_settings(&SettingsUpdate::default(), &base);
        assert_eq!(out, base);
    }

    #[test]
    fn sanitize_rejects_blank_model_names() {
        let update = SettingsUpdate {
            scoring_model: Some("  ".to_string()),
            ..Default::default()
        };
        let out = sanitize_settings(&update, &SettingsValues::default());
        assert_eq!(out.scoring_model, SettingsValues::default().scoring_model);
    }

    #[test]
    fn status_round_trips_and_rejects_unknown() {
        assert_eq!(ArticleStatus::parse("cloud"), Some(ArticleStatus::Cloud));
        assert_eq!(ArticleStatus::parse("river"), Some(ArticleStatus::River));
        assert_eq!(ArticleStatus::parse("ocean"), Some(ArticleStatus::Ocean));
        assert_eq!(ArticleStatus::parse("lake"), None);
        assert_eq!(ArticleStatus::Cloud.as_str(), "cloud");
    }

    #[test]
    fn status_transition_rejects_self() {
        assert!(!ArticleStatus::River.can_transition_to(ArticleStatus::River));
        assert!(ArticleStatus::Cloud.can_transition_to(ArticleStatus::River));
        assert!(ArticleStatus::Ocean.can_transition_to(ArticleStatus::Cloud));
    }
}
