//! Feed queue replenishment: candidate selection → scoring → partition →
//! queue insert, guarded by a per-user single flight.

use crate::clients::scorer::RelevanceScorer;
use crate::db::{chunk_repo, queue_repo, rating_repo};
use crate::error::Result;
use crate::metrics;
use crate::models::{FewShotExample, UserSettings};
use crate::services::candidates::{self, CandidatePool};
use crate::services::{partition, scoring};
use dashmap::DashMap;
use rand::rngs::StdRng;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadySufficient,
    NoActiveSources,
    NoCandidates,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::AlreadySufficient => "already_sufficient",
            SkipReason::NoActiveSources => "no_active_sources",
            SkipReason::NoCandidates => "no_candidates",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplenishOutcome {
    pub replenished: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added: Option<u64>,
    pub queue_size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SkipReason>,
}

impl ReplenishOutcome {
    fn skipped(queue_size: i64, reason: SkipReason) -> Self {
        Self {
            replenished: false,
            added: None,
            queue_size,
            reason: Some(reason),
        }
    }
}

/// Per-user single-flight guard for replenish.
///
/// This is a best-effort optimization that collapses overlapping calls from
/// one process into a single scoring pass. It is NOT the correctness
/// mechanism — the idempotent queue upsert and the log's unique indexes are
/// what keep concurrent replenishes (including from other processes) safe.
pub struct Replenisher {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl Default for Replenisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Replenisher {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    fn user_lock(&self, user_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Top up the user's feed queue if it has fallen below the batch size.
    /// "Nothing to do" conditions are structured outcomes, never errors.
    pub async fn replenish(
        &self,
        pool: &PgPool,
        scorer: &dyn RelevanceScorer,
        user_id: Uuid,
        settings: &UserSettings,
        rng: &mut StdRng,
    ) -> Result<ReplenishOutcome> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let queue_size = queue_repo::count_for_user(pool, user_id).await?;
        if queue_size >= settings.feed_batch_size as i64 {
            metrics::REPLENISH_OUTCOMES
                .with_label_values(&["already_sufficient"])
                .inc();
            return Ok(ReplenishOutcome::skipped(
                queue_size,
                SkipReason::AlreadySufficient,
            ));
        }

        let candidates = match candidates::select_candidates(
            pool,
            user_id,
            settings.candidate_pool_size,
            rng,
        )
        .await?
        {
            CandidatePool::NoActiveSources => {
                metrics::REPLENISH_OUTCOMES
                    .with_label_values(&["no_active_sources"])
                    .inc();
                return Ok(ReplenishOutcome::skipped(
                    queue_size,
                    SkipReason::NoActiveSources,
                ));
            }
            CandidatePool::Empty => {
                metrics::REPLENISH_OUTCOMES
                    .with_label_values(&["no_candidates"])
                    .inc();
                return Ok(ReplenishOutcome::skipped(queue_size, SkipReason::NoCandidates));
            }
            CandidatePool::Candidates(candidates) => candidates,
        };

        let examples = self
            .few_shot_examples(pool, user_id, settings.num_few_shot as i64)
            .await?;

        let scored = scoring::score_candidates(
            scorer,
            &candidates,
            &examples,
            &settings.scoring_model,
            settings.scoring_batch_size.max(1) as usize,
            rng,
        )
        .await;

        let queued = partition::partition_scored(
            scored,
            settings.feed_batch_size.max(1) as usize,
            settings.explore_ratio,
            rng,
        );

        let added = queue_repo::insert_batch(pool, user_id, &queued).await?;
        let final_size = queue_repo::count_for_user(pool, user_id).await?;

        metrics::REPLENISH_OUTCOMES
            .with_label_values(&["replenished"])
            .inc();
        info!(
            user_id = %user_id,
            added,
            queue_size = final_size,
            "feed queue replenished"
        );

        Ok(ReplenishOutcome {
            replenished: true,
            added: Some(added),
            queue_size: final_size,
            reason: None,
        })
    }

    /// The `num_few_shot` most recent ratings, newest first, joined with
    /// their chunk contents. Ratings whose chunk is gone are skipped.
    async fn few_shot_examples(
        &self,
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<FewShotExample>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }

        let ratings = rating_repo::recent_for_user(pool, user_id, limit).await?;
        if ratings.is_empty() {
            return Ok(Vec::new());
        }

        let chunk_ids: Vec<Uuid> = ratings.iter().map(|r| r.chunk_id).collect();
        let contents: HashMap<Uuid, String> = chunk_repo::contents_by_ids(pool, user_id, &chunk_ids)
            .await?
            .into_iter()
            .collect();

        Ok(ratings
            .into_iter()
            .filter_map(|rating| {
                contents.get(&rating.chunk_id).map(|content| FewShotExample {
                    content: content.clone(),
                    rating: rating.rating,
                    annotation: rating.annotation,
                })
            })
            .collect())
    }
}
