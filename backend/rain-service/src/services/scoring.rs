//! Scoring orchestration: few-shot calibrated batches with graceful
//! degradation.
//!
//! Scoring must never fail a replenish. A batch that errors or times out
//! degrades to the neutral fallback score; a user with no rating history
//! gets uniform random scores because there is no calibration signal yet.

use crate::clients::scorer::{RelevanceScorer, FALLBACK_SCORE};
use crate::metrics;
use crate::models::{CandidateChunk, ChunkScore, FewShotExample};
use futures::{stream, StreamExt};
use rand::Rng;
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

/// Bound on concurrently in-flight scorer batches.
const MAX_PARALLEL_BATCHES: usize = 4;

/// Score every candidate, in the original candidate order.
pub async fn score_candidates<R: Rng>(
    scorer: &dyn RelevanceScorer,
    candidates: &[CandidateChunk],
    examples: &[FewShotExample],
    model: &str,
    batch_size: usize,
    rng: &mut R,
) -> Vec<ChunkScore> {
    if candidates.is_empty() {
        return Vec::new();
    }

    if examples.is_empty() {
        // No calibration signal yet: uniform random in [1, 5).
        return candidates
            .iter()
            .map(|chunk| ChunkScore {
                id: chunk.id,
                score: rng.gen::<f64>() * 4.0 + 1.0,
            })
            .collect();
    }

    let batches: Vec<&[CandidateChunk]> = candidates.chunks(batch_size.max(1)).collect();

    let results: Vec<Vec<ChunkScore>> = stream::iter(batches.into_iter().map(|batch| async move {
        match scorer.score_batch(batch, examples, model).await {
            Ok(scores) => scores,
            Err(e) => {
                warn!(error = %e, batch_len = batch.len(), "scorer batch failed, using fallback");
                metrics::SCORER_FALLBACKS.inc_by(batch.len() as u64);
                batch
                    .iter()
                    .map(|chunk| ChunkScore {
                        id: chunk.id,
                        score: FALLBACK_SCORE,
                    })
                    .collect()
            }
        }
    }))
    .buffered(MAX_PARALLEL_BATCHES)
    .collect()
    .await;

    // Flatten back into one list matching the candidate set, fallback for
    // anything a batch failed to mention.
    let by_id: HashMap<Uuid, f64> = results
        .into_iter()
        .flatten()
        .map(|s| (s.id, s.score))
        .collect();

    candidates
        .iter()
        .map(|chunk| ChunkScore {
            id: chunk.id,
            score: by_id.get(&chunk.id).copied().unwrap_or(FALLBACK_SCORE),
        })
        .collect()
}
