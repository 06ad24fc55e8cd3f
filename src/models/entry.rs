use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// One user's pain/symptom/notes record for a calendar day. Unique per
/// (user_id, entry_date); saves upsert onto the same row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PainEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_date: NaiveDate,
    pub pain_level: i32,
    pub symptoms: Vec<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertEntryRequest {
    /// Defaults to today (UTC) when omitted.
    pub entry_date: Option<NaiveDate>,
    #[validate(range(min = 0, max = 10, message = "Pain level must be between 0 and 10"))]
    pub pain_level: i32,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EntryQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Saved-entry response: the stored row plus whether the confirmation email
/// went out. Email delivery is best-effort and never fails the save.
#[derive(Debug, Serialize)]
pub struct EntrySaved {
    #[serde(flatten)]
    pub entry: PainEntry,
    pub email_sent: bool,
}

/// Symptom labels offered by the tracker UI. Free-text labels are accepted
/// too; this is just the default catalog.
pub const COMMON_SYMPTOMS: [&str; 12] = [
    "Headache",
    "Fatigue",
    "Stiffness",
    "Muscle aches",
    "Joint pain",
    "Back pain",
    "Neck pain",
    "Difficulty sleeping",
    "Mood changes",
    "Difficulty concentrating",
    "Nausea",
    "Dizziness",
];

const PAIN_DESCRIPTIONS: [&str; 11] = [
    "No pain",
    "Very mild pain",
    "Mild pain",
    "Moderate pain",
    "Moderately severe pain",
    "Severe pain",
    "Very severe pain",
    "Intense pain",
    "Extremely intense pain",
    "Unbearable pain",
    "Unimaginable pain",
];

/// Human-readable descriptor for a 0-10 pain level. Out-of-range input is
/// clamped; stored levels are constrained to the scale anyway.
pub fn pain_description(level: i32) -> &'static str {
    PAIN_DESCRIPTIONS[level.clamp(0, 10) as usize]
}

/// Symptoms are a set: trim whitespace, drop empties, dedupe keeping the
/// first occurrence of each label.
pub fn normalize_symptoms(raw: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for symptom in raw {
        let trimmed = symptom.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !seen.iter().any(|s: &String| s == trimmed) {
            seen.push(trimmed.to_string());
        }
    }
    seen
}
