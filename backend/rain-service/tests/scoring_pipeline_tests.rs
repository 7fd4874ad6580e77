//! Scoring pipeline tests with a fake scorer.
//!
//! Exercises the degradation contract: scorer failures must never surface —
//! affected chunks get the neutral fallback — and users without rating
//! history get seeded-random scores without any scorer call.

use async_trait::async_trait;
use rain_service::clients::scorer::{RelevanceScorer, ScorerError, FALLBACK_SCORE};
use rain_service::models::{CandidateChunk, ChunkScore, FewShotExample};
use rain_service::services::{partition, scoring};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Mutex;
use uuid::Uuid;

fn candidates(n: usize) -> Vec<CandidateChunk> {
    (0..n)
        .map(|i| CandidateChunk {
            id: Uuid::new_v4(),
            content: format!("candidate chunk {}", i),
        })
        .collect()
}

fn example() -> FewShotExample {
    FewShotExample {
        content: "an example the user rated".to_string(),
        rating: 4,
        annotation: None,
    }
}

/// Scorer double: either fails every batch, echoes a fixed score, or
/// answers for only the first chunk of each batch. Records batch sizes.
enum FakeMode {
    FailAll,
    Fixed(f64),
    FirstOnly(f64),
}

struct FakeScorer {
    mode: FakeMode,
    batch_sizes: Mutex<Vec<usize>>,
}

impl FakeScorer {
    fn new(mode: FakeMode) -> Self {
        Self {
            mode,
            batch_sizes: Mutex::new(Vec::new()),
        }
    }

    fn recorded_batches(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelevanceScorer for FakeScorer {
    async fn score_batch(
        &self,
        batch: &[CandidateChunk],
        _examples: &[FewShotExample],
        _model: &str,
    ) -> Result<Vec<ChunkScore>, ScorerError> {
        self.batch_sizes.lock().unwrap().push(batch.len());
        match self.mode {
            FakeMode::FailAll => Err(ScorerError::Empty),
            FakeMode::Fixed(score) => Ok(batch
                .iter()
                .map(|c| ChunkScore { id: c.id, score })
                .collect()),
            FakeMode::FirstOnly(score) => Ok(batch
                .iter()
                .take(1)
                .map(|c| ChunkScore { id: c.id, score })
                .collect()),
        }
    }
}

#[tokio::test]
async fn scorer_failure_degrades_every_chunk_to_neutral() {
    let scorer = FakeScorer::new(FakeMode::FailAll);
    let pool = candidates(5);
    let mut rng = StdRng::seed_from_u64(1);

    let scored =
        scoring::score_candidates(&scorer, &pool, &[example()], "test-model", 10, &mut rng).await;

    assert_eq!(scored.len(), 5);
    assert!(scored.iter().all(|s| s.score == FALLBACK_SCORE));
    // Order matches the candidate set.
    let expected: Vec<Uuid> = pool.iter().map(|c| c.id).collect();
    let actual: Vec<Uuid> = scored.iter().map(|s| s.id).collect();
    assert_eq!(actual, expected);
}

#[tokio::test]
async fn no_examples_means_random_scores_and_no_scorer_calls() {
    let scorer = FakeScorer::new(FakeMode::Fixed(5.0));
    let pool = candidates(8);

    let mut rng = StdRng::seed_from_u64(42);
    let scored = scoring::score_candidates(&scorer, &pool, &[], "test-model", 10, &mut rng).await;

    assert!(scorer.recorded_batches().is_empty());
    assert_eq!(scored.len(), 8);
    assert!(scored.iter().all(|s| (1.0..=5.0).contains(&s.score)));

    // Same seed, same draw.
    let mut rng_again = StdRng::seed_from_u64(42);
    let scored_again =
        scoring::score_candidates(&scorer, &pool, &[], "test-model", 10, &mut rng_again).await;
    let a: Vec<f64> = scored.iter().map(|s| s.score).collect();
    let b: Vec<f64> = scored_again.iter().map(|s| s.score).collect();
    assert_eq!(a, b);
}

#[tokio::test]
async fn batches_are_capped_at_the_scoring_batch_size() {
    let scorer = FakeScorer::new(FakeMode::Fixed(4.0));
    let pool = candidates(10);
    let mut rng = StdRng::seed_from_u64(3);

    let scored =
        scoring::score_candidates(&scorer, &pool, &[example()], "test-model", 3, &mut rng).await;

    assert_eq!(scored.len(), 10);
    let batches = scorer.recorded_batches();
    assert_eq!(batches.iter().sum::<usize>(), 10);
    assert!(batches.iter().all(|&size| size <= 3));
    assert!(scored.iter().all(|s| s.score == 4.0));
}

#[tokio::test]
async fn chunks_missing_from_a_partial_response_get_the_fallback() {
    let scorer = FakeScorer::new(FakeMode::FirstOnly(4.5));
    let pool = candidates(4);
    let mut rng = StdRng::seed_from_u64(5);

    let scored =
        scoring::score_candidates(&scorer, &pool, &[example()], "test-model", 4, &mut rng).await;

    assert_eq!(scored.len(), 4);
    assert_eq!(scored[0].score, 4.5);
    assert!(scored[1..].iter().all(|s| s.score == FALLBACK_SCORE));
}

#[tokio::test]
async fn scored_batch_flows_into_an_exact_explore_exploit_split() {
    let scorer = FakeScorer::new(FakeMode::Fixed(3.0));
    let pool = candidates(20);
    let mut rng = StdRng::seed_from_u64(9);

    let scored =
        scoring::score_candidates(&scorer, &pool, &[example()], "test-model", 10, &mut rng).await;
    let queued = partition::partition_scored(scored, 10, 0.4, &mut rng);

    assert_eq!(queued.len(), 10);
    let exploit = queued.iter().filter(|c| !c.was_explore).count();
    let explore = queued.iter().filter(|c| c.was_explore).count();
    assert_eq!(exploit, 6); // round((1 - 0.4) * 10)
    assert_eq!(explore, 4);
}
