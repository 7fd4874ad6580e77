//! Prediction accuracy reporting: how close the scorer's predictions were
//! to the ratings the user actually gave, split by explore/exploit and by
//! calendar day.

use crate::models::ChunkRating;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyPoint {
    pub date: String,
    pub mae: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyTimelines {
    pub overall: Vec<AccuracyPoint>,
    pub explore: Vec<AccuracyPoint>,
    pub exploit: Vec<AccuracyPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyReport {
    pub overall_mae: Option<f64>,
    pub explore_mae: Option<f64>,
    pub exploit_mae: Option<f64>,
    pub total_ratings: usize,
    pub explore_ratings: usize,
    pub exploit_ratings: usize,
    pub timeline: AccuracyTimelines,
}

/// Mean absolute error between rating and predicted score. Rows without a
/// numeric prediction are excluded; returns None when nothing qualifies.
pub fn mean_absolute_error(rows: &[&ChunkRating]) -> Option<f64> {
    let valid: Vec<f64> = rows
        .iter()
        .filter_map(|row| {
            row.predicted_score
                .filter(|p| p.is_finite())
                .map(|predicted| (row.rating as f64 - predicted).abs())
        })
        .collect();

    if valid.is_empty() {
        return None;
    }
    Some(valid.iter().sum::<f64>() / valid.len() as f64)
}

/// One MAE point per UTC day present in the data, ascending. Days with no
/// ratings simply do not appear.
pub fn build_timeline(rows: &[&ChunkRating]) -> Vec<AccuracyPoint> {
    let mut grouped: BTreeMap<String, Vec<&ChunkRating>> = BTreeMap::new();
    for row in rows {
        let day = row.created_at.date_naive().to_string();
        grouped.entry(day).or_default().push(row);
    }

    grouped
        .into_iter()
        .map(|(date, day_rows)| AccuracyPoint {
            date,
            mae: mean_absolute_error(&day_rows).unwrap_or(0.0),
        })
        .collect()
}

pub fn build_report(rows: &[ChunkRating]) -> AccuracyReport {
    let all: Vec<&ChunkRating> = rows.iter().collect();
    let explore: Vec<&ChunkRating> = rows.iter().filter(|r| r.was_explore).collect();
    let exploit: Vec<&ChunkRating> = rows.iter().filter(|r| !r.was_explore).collect();

    AccuracyReport {
        overall_mae: mean_absolute_error(&all),
        explore_mae: mean_absolute_error(&explore),
        exploit_mae: mean_absolute_error(&exploit),
        total_ratings: all.len(),
        explore_ratings: explore.len(),
        exploit_ratings: exploit.len(),
        timeline: AccuracyTimelines {
            overall: build_timeline(&all),
            explore: build_timeline(&explore),
            exploit: build_timeline(&exploit),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn rating(
        value: i32,
        predicted: Option<f64>,
        was_explore: bool,
        day: u32,
    ) -> ChunkRating {
        ChunkRating {
            id: Uuid::new_v4(),
            chunk_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            rating: value,
            annotation: None,
            predicted_score: predicted,
            was_explore,
            created_at: Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn mae_matches_hand_computed_example() {
        let rows = vec![rating(4, Some(3.0), false, 1), rating(2, Some(2.0), false, 1)];
        let refs: Vec<&ChunkRating> = rows.iter().collect();
        assert_eq!(mean_absolute_error(&refs), Some(0.5));
    }

    #[test]
    fn rows_without_prediction_are_excluded_from_mae_but_counted() {
        let rows = vec![rating(5, None, false, 1), rating(3, Some(3.0), true, 1)];
        let report = build_report(&rows);
        assert_eq!(report.total_ratings, 2);
        assert_eq!(report.overall_mae, Some(0.0));
        assert_eq!(report.exploit_mae, None);
        assert_eq!(report.explore_ratings, 1);
    }

    #[test]
    fn empty_input_has_no_mae_and_empty_timelines() {
        let report = build_report(&[]);
        assert_eq!(report.overall_mae, None);
        assert_eq!(report.total_ratings, 0);
        assert!(report.timeline.overall.is_empty());
    }

    #[test]
    fn timeline_groups_by_utc_day_ascending_without_gap_filling() {
        let rows = vec![
            rating(4, Some(3.0), false, 5),
            rating(2, Some(2.0), false, 1),
            rating(5, Some(1.0), false, 5),
        ];
        let refs: Vec<&ChunkRating> = rows.iter().collect();
        let timeline = build_timeline(&refs);
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].date, "2025-06-01");
        assert_eq!(timeline[0].mae, 0.0);
        assert_eq!(timeline[1].date, "2025-06-05");
        assert_eq!(timeline[1].mae, 2.5);
    }

    #[test]
    fn explore_and_exploit_are_disjoint_segments() {
        let rows = vec![
            rating(4, Some(4.0), true, 1),
            rating(1, Some(3.0), false, 1),
            rating(5, Some(4.0), true, 2),
        ];
        let report = build_report(&rows);
        assert_eq!(report.explore_ratings, 2);
        assert_eq!(report.exploit_ratings, 1);
        assert_eq!(report.explore_mae, Some(0.5));
        assert_eq!(report.exploit_mae, Some(2.0));
    }
}
