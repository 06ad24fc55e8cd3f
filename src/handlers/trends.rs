use axum::{extract::State, Extension, Json};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::entry::PainEntry;
use crate::AppState;

/// Window size for the moving-average comparison.
const TREND_WINDOW: usize = 3;
/// A window-mean difference beyond this margin flips the classification.
const TREND_THRESHOLD: f64 = 0.5;
/// How many symptoms the ranking returns.
const MAX_RANKED_SYMPTOMS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub pain_level: i32,
}

#[derive(Debug, Serialize)]
pub struct SymptomCount {
    pub symptom: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct TrendsReport {
    pub average_pain_level: f64,
    pub total_entries: usize,
    pub trend: Trend,
    pub series: Vec<SeriesPoint>,
    pub top_symptoms: Vec<SymptomCount>,
}

pub async fn get_trends(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<TrendsReport>> {
    let entries = sqlx::query_as::<_, PainEntry>(
        r#"
        SELECT * FROM pain_entries
        WHERE user_id = $1
        ORDER BY entry_date ASC
        "#,
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(build_report(&entries)))
}

/// Aggregate a chronologically ordered entry list into the trends report.
pub fn build_report(entries: &[PainEntry]) -> TrendsReport {
    let levels: Vec<i32> = entries.iter().map(|e| e.pain_level).collect();

    let series = entries
        .iter()
        .map(|e| SeriesPoint {
            date: e.entry_date,
            pain_level: e.pain_level,
        })
        .collect();

    TrendsReport {
        average_pain_level: average_pain(&levels),
        total_entries: entries.len(),
        trend: classify_trend(&levels),
        series,
        top_symptoms: rank_symptoms(entries),
    }
}

fn mean(levels: &[i32]) -> f64 {
    levels.iter().map(|&l| l as f64).sum::<f64>() / levels.len() as f64
}

/// Mean pain level rounded to one decimal; 0 for an empty set.
fn average_pain(levels: &[i32]) -> f64 {
    if levels.is_empty() {
        return 0.0;
    }
    (mean(levels) * 10.0).round() / 10.0
}

/// Compare the mean of the most recent three entries against the mean of the
/// three before them. Needs six entries; with fewer the trend is not computed
/// and stays at its stable default.
fn classify_trend(levels: &[i32]) -> Trend {
    if levels.len() < TREND_WINDOW * 2 {
        return Trend::Stable;
    }

    let recent = &levels[levels.len() - TREND_WINDOW..];
    let older = &levels[levels.len() - TREND_WINDOW * 2..levels.len() - TREND_WINDOW];

    classify_window_means(mean(older), mean(recent))
}

/// The comparison is strict: a window-mean difference of exactly ±0.5 is
/// still stable.
fn classify_window_means(older: f64, recent: f64) -> Trend {
    let diff = recent - older;
    if diff > TREND_THRESHOLD {
        Trend::Increasing
    } else if diff < -TREND_THRESHOLD {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

/// Count one occurrence per entry per distinct symptom; rank by descending
/// count with ties broken by first-seen order, capped at six.
fn rank_symptoms(entries: &[PainEntry]) -> Vec<SymptomCount> {
    let mut counts: Vec<(String, i64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        for symptom in &entry.symptoms {
            match index.get(symptom.as_str()) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(symptom.clone(), counts.len());
                    counts.push((symptom.clone(), 1));
                }
            }
        }
    }

    // sort_by is stable, so equal counts keep first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(MAX_RANKED_SYMPTOMS);

    counts
        .into_iter()
        .map(|(symptom, count)| SymptomCount { symptom, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn entry(day_offset: i64, pain_level: i32, symptoms: &[&str]) -> PainEntry {
        let now = Utc::now();
        PainEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            entry_date: now.date_naive() + Duration::days(day_offset),
            pain_level,
            symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn entries_with_levels(levels: &[i32]) -> Vec<PainEntry> {
        levels
            .iter()
            .enumerate()
            .map(|(i, &l)| entry(i as i64, l, &[]))
            .collect()
    }

    #[test]
    fn test_average_of_2_4_6_is_4() {
        assert_eq!(average_pain(&[2, 4, 6]), 4.0);
    }

    #[test]
    fn test_average_empty_is_zero() {
        assert_eq!(average_pain(&[]), 0.0);
    }

    #[test]
    fn test_average_rounds_to_one_decimal() {
        // mean of [1, 1, 2] = 1.333... -> 1.3
        assert_eq!(average_pain(&[1, 1, 2]), 1.3);
        // mean of [1, 2, 2] = 1.666... -> 1.7
        assert_eq!(average_pain(&[1, 2, 2]), 1.7);
    }

    #[test]
    fn test_trend_needs_six_entries() {
        assert_eq!(classify_trend(&[]), Trend::Stable);
        assert_eq!(classify_trend(&[9, 1, 9, 1, 9]), Trend::Stable);
    }

    #[test]
    fn test_trend_increasing() {
        // older window [1,2,1] mean 4/3, recent [4,5,6] mean 5
        assert_eq!(classify_trend(&[1, 2, 1, 4, 5, 6]), Trend::Increasing);
    }

    #[test]
    fn test_trend_decreasing() {
        assert_eq!(classify_trend(&[7, 8, 7, 3, 2, 3]), Trend::Decreasing);
    }

    #[test]
    fn test_trend_stable_within_threshold() {
        assert_eq!(classify_trend(&[4, 4, 4, 4, 4, 4]), Trend::Stable);
        assert_eq!(classify_trend(&[4, 4, 4, 4, 4, 5]), Trend::Stable);
    }

    #[test]
    fn test_trend_boundary_is_stable() {
        // integer levels can only produce mean differences in thirds, so the
        // exact ±0.5 boundary is checked on the window means directly
        assert_eq!(classify_window_means(4.0, 4.5), Trend::Stable);
        assert_eq!(classify_window_means(4.5, 4.0), Trend::Stable);
        assert_eq!(classify_window_means(4.0, 4.6), Trend::Increasing);
        assert_eq!(classify_window_means(4.6, 4.0), Trend::Decreasing);
        // nearest integer-expressible diffs around the threshold: 1/3 and 2/3
        assert_eq!(classify_trend(&[4, 4, 4, 4, 4, 5]), Trend::Stable);
        assert_eq!(classify_trend(&[4, 4, 4, 4, 5, 5]), Trend::Increasing);
    }

    #[test]
    fn test_trend_uses_only_last_two_windows() {
        // noise before the final six entries must not matter
        let mut levels = vec![10, 0, 10, 0];
        levels.extend_from_slice(&[1, 1, 1, 5, 5, 5]);
        assert_eq!(classify_trend(&levels), Trend::Increasing);
    }

    #[test]
    fn test_rank_symptoms_counts_per_entry() {
        let entries = vec![
            entry(0, 3, &["A", "B"]),
            entry(1, 4, &["A"]),
            entry(2, 5, &["B"]),
            entry(3, 2, &["A"]),
        ];
        let ranked = rank_symptoms(&entries);
        assert_eq!(ranked[0].symptom, "A");
        assert_eq!(ranked[0].count, 3);
        assert_eq!(ranked[1].symptom, "B");
        assert_eq!(ranked[1].count, 2);
    }

    #[test]
    fn test_rank_symptoms_ties_break_by_first_seen() {
        let entries = vec![entry(0, 3, &["B", "A"]), entry(1, 4, &["A", "B"])];
        let ranked = rank_symptoms(&entries);
        assert_eq!(ranked[0].symptom, "B");
        assert_eq!(ranked[1].symptom, "A");
        assert_eq!(ranked[0].count, 2);
        assert_eq!(ranked[1].count, 2);
    }

    #[test]
    fn test_rank_symptoms_caps_at_six() {
        let entries = vec![entry(
            0,
            3,
            &["S1", "S2", "S3", "S4", "S5", "S6", "S7", "S8"],
        )];
        assert_eq!(rank_symptoms(&entries).len(), 6);
    }

    #[test]
    fn test_build_report_empty() {
        let report = build_report(&[]);
        assert_eq!(report.average_pain_level, 0.0);
        assert_eq!(report.total_entries, 0);
        assert_eq!(report.trend, Trend::Stable);
        assert!(report.series.is_empty());
        assert!(report.top_symptoms.is_empty());
    }

    #[test]
    fn test_build_report_full() {
        let entries = entries_with_levels(&[1, 2, 1, 6, 7, 6]);
        let report = build_report(&entries);
        assert_eq!(report.total_entries, 6);
        assert_eq!(report.trend, Trend::Increasing);
        assert_eq!(report.average_pain_level, 3.8); // 23/6 = 3.833...
        assert_eq!(report.series.len(), 6);
        assert_eq!(report.series[3].pain_level, 6);
    }
}
