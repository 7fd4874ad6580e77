//! Candidate selection: unseen chunks from the user's active sources.

use crate::db::{article_repo, chunk_repo};
use crate::error::Result;
use crate::models::CandidateChunk;
use rand::seq::SliceRandom;
use rand::Rng;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

/// Floor of the recent-chunk pre-filter window.
const MIN_WINDOW: i64 = 300;

#[derive(Debug)]
pub enum CandidatePool {
    /// The user has no cloud articles; there is nothing to draw from.
    NoActiveSources,
    /// Active sources exist but every chunk in the window is already
    /// shown, queued, or rated.
    Empty,
    Candidates(Vec<CandidateChunk>),
}

/// Pick up to `pool_size` unseen chunks for scoring. The window pre-filter
/// bounds the exclusion-set work; the shuffle removes the bias toward the
/// newest chunks that a plain ORDER BY would bake in.
pub async fn select_candidates<R: Rng>(
    pool: &PgPool,
    user_id: Uuid,
    pool_size: i32,
    rng: &mut R,
) -> Result<CandidatePool> {
    let article_ids = article_repo::cloud_article_ids(pool, user_id).await?;
    if article_ids.is_empty() {
        return Ok(CandidatePool::NoActiveSources);
    }

    let window = (pool_size as i64 * 4).max(MIN_WINDOW);
    let mut candidates = chunk_repo::candidate_window(pool, user_id, &article_ids, window).await?;

    if candidates.is_empty() {
        return Ok(CandidatePool::Empty);
    }

    candidates.shuffle(rng);
    candidates.truncate(pool_size.max(0) as usize);

    debug!(
        user_id = %user_id,
        sources = article_ids.len(),
        selected = candidates.len(),
        "candidates selected"
    );

    Ok(CandidatePool::Candidates(candidates))
}
