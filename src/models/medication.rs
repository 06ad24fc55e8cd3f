use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Medication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub dosage: String,
    pub frequency: MedFrequency,
    pub time_of_day: Option<NaiveTime>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "med_frequency", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MedFrequency {
    OnceDaily,
    TwiceDaily,
    ThreeTimesDaily,
    FourTimesDaily,
    AsNeeded,
    EveryFourHours,
    EverySixHours,
    EveryEightHours,
    EveryTwelveHours,
    Weekly,
    Other,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMedicationRequest {
    #[validate(length(min = 1, max = 100, message = "Medication name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "Dosage is required"))]
    pub dosage: String,
    pub frequency: MedFrequency,
    pub time_of_day: Option<NaiveTime>,
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}
