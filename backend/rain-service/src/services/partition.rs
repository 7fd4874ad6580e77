//! Explore/exploit partitioning of scored candidates.
//!
//! The exploit set is the top of the ranking; the explore set is a uniform
//! random sample of the rest, which is what yields calibration data outside
//! the model's current bias (a second page of exploitation would not).

use crate::models::{ChunkScore, QueuedCandidate};
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;

/// Split scored candidates into exploit and explore sets.
///
/// `batch_size` bounds the combined output; `explore_ratio` in [0,1] sets
/// the share drawn at random. Ties in score keep original candidate order
/// (stable sort). Output order is not significant — queue insertion order
/// decides eventual feed positions.
pub fn partition_scored<R: Rng>(
    mut scored: Vec<ChunkScore>,
    batch_size: usize,
    explore_ratio: f64,
    rng: &mut R,
) -> Vec<QueuedCandidate> {
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let total = batch_size.min(scored.len());
    if total == 0 {
        return Vec::new();
    }

    let ratio = explore_ratio.clamp(0.0, 1.0);
    let exploit_count = (((1.0 - ratio) * total as f64).round() as usize).min(total);
    let explore_count = total - exploit_count;

    let mut remainder = scored.split_off(exploit_count);
    let exploit = scored;

    remainder.shuffle(rng);
    remainder.truncate(explore_count);

    exploit
        .into_iter()
        .map(|s| QueuedCandidate {
            chunk_id: s.id,
            predicted_score: s.score,
            was_explore: false,
        })
        .chain(remainder.into_iter().map(|s| QueuedCandidate {
            chunk_id: s.id,
            predicted_score: s.score,
            was_explore: true,
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    fn scored(scores: &[f64]) -> Vec<ChunkScore> {
        scores
            .iter()
            .map(|&score| ChunkScore {
                id: Uuid::new_v4(),
                score,
            })
            .collect()
    }

    #[test]
    fn split_counts_match_rounded_ratio() {
        let mut rng = StdRng::seed_from_u64(7);
        let out = partition_scored(scored(&[5.0, 4.5, 4.0, 3.5, 3.0, 2.5, 2.0, 1.5, 1.0, 0.5]), 10, 0.3, &mut rng);
        assert_eq!(out.len(), 10);
        let exploit = out.iter().filter(|c| !c.was_explore).count();
        let explore = out.iter().filter(|c| c.was_explore).count();
        assert_eq!(exploit, 7); // round((1 - 0.3) * 10)
        assert_eq!(explore, 3);
    }

    #[test]
    fn exploit_set_is_the_top_of_the_ranking() {
        let mut rng = StdRng::seed_from_u64(1);
        let input = scored(&[1.0, 5.0, 3.0, 4.0, 2.0]);
        let top_two: Vec<Uuid> = vec![input[1].id, input[3].id];
        let out = partition_scored(input, 4, 0.5, &mut rng);
        let exploit_ids: Vec<Uuid> = out
            .iter()
            .filter(|c| !c.was_explore)
            .map(|c| c.chunk_id)
            .collect();
        assert_eq!(exploit_ids, top_two);
    }

    #[test]
    fn explore_sample_comes_from_the_remainder() {
        let mut rng = StdRng::seed_from_u64(3);
        let input = scored(&[5.0, 4.0, 3.0, 2.0, 1.0]);
        let remainder_ids: Vec<Uuid> = input[2..].iter().map(|s| s.id).collect();
        let out = partition_scored(input, 4, 0.5, &mut rng);
        for candidate in out.iter().filter(|c| c.was_explore) {
            assert!(remainder_ids.contains(&candidate.chunk_id));
        }
    }

    #[test]
    fn batch_larger_than_pool_uses_whole_pool() {
        let mut rng = StdRng::seed_from_u64(9);
        let out = partition_scored(scored(&[3.0, 2.0]), 10, 0.5, &mut rng);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn explore_ratio_extremes() {
        let mut rng = StdRng::seed_from_u64(11);
        let all_exploit = partition_scored(scored(&[1.0, 2.0, 3.0, 4.0]), 4, 0.0, &mut rng);
        assert!(all_exploit.iter().all(|c| !c.was_explore));

        let all_explore = partition_scored(scored(&[1.0, 2.0, 3.0, 4.0]), 4, 1.0, &mut rng);
        assert!(all_explore.iter().all(|c| c.was_explore));
    }

    #[test]
    fn equal_scores_keep_original_order_in_exploit_set() {
        let mut rng = StdRng::seed_from_u64(5);
        let input = scored(&[3.0, 3.0, 3.0, 3.0]);
        let first_two: Vec<Uuid> = input[..2].iter().map(|s| s.id).collect();
        let out = partition_scored(input, 2, 0.0, &mut rng);
        let exploit_ids: Vec<Uuid> = out.iter().map(|c| c.chunk_id).collect();
        assert_eq!(exploit_ids, first_two);
    }

    #[test]
    fn fixed_seed_is_deterministic() {
        let input = scored(&[5.0, 4.0, 3.0, 2.0, 1.0, 0.5]);
        let a = partition_scored(input.clone(), 4, 0.5, &mut StdRng::seed_from_u64(42));
        let b = partition_scored(input, 4, 0.5, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(partition_scored(Vec::new(), 10, 0.5, &mut rng).is_empty());
    }
}
