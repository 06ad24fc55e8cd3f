use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::entry::{
    normalize_symptoms, EntryQuery, EntrySaved, PainEntry, UpsertEntryRequest, COMMON_SYMPTOMS,
};
use crate::services;
use crate::AppState;

/// Upsert the day's entry. A second save for the same (user, date) overwrites
/// the whole row, never merges. On success a confirmation email goes out
/// best-effort: a delivery failure is logged and reported via `email_sent`
/// without failing the save.
pub async fn upsert_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<UpsertEntryRequest>,
) -> AppResult<Json<EntrySaved>> {
    body.validate()?;

    let entry_date = body.entry_date.unwrap_or_else(|| Utc::now().date_naive());
    let symptoms = normalize_symptoms(&body.symptoms);

    let entry = sqlx::query_as::<_, PainEntry>(
        r#"
        INSERT INTO pain_entries (id, user_id, entry_date, pain_level, symptoms, notes)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (user_id, entry_date) DO UPDATE SET
            pain_level = EXCLUDED.pain_level,
            symptoms = EXCLUDED.symptoms,
            notes = EXCLUDED.notes,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(entry_date)
    .bind(body.pain_level)
    .bind(&symptoms)
    .bind(&body.notes)
    .fetch_one(&state.db)
    .await?;

    let email_sent = match auth_user.email.as_deref() {
        Some(email) => {
            match services::email::send_entry_confirmation(&state.config, email).await {
                Ok(sent) => sent,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to send entry confirmation email");
                    false
                }
            }
        }
        None => false,
    };

    Ok(Json(EntrySaved { entry, email_sent }))
}

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<EntryQuery>,
) -> AppResult<Json<Vec<PainEntry>>> {
    let start = query
        .start_date
        .unwrap_or_else(|| Utc::now().date_naive() - chrono::Duration::days(30));
    let end = query.end_date.unwrap_or_else(|| Utc::now().date_naive());

    let entries = sqlx::query_as::<_, PainEntry>(
        r#"
        SELECT * FROM pain_entries
        WHERE user_id = $1 AND entry_date BETWEEN $2 AND $3
        ORDER BY entry_date DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(entries))
}

/// Fetch one day's entry, used by the Today screen on load.
pub async fn get_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_date): Path<NaiveDate>,
) -> AppResult<Json<PainEntry>> {
    let entry = sqlx::query_as::<_, PainEntry>(
        "SELECT * FROM pain_entries WHERE user_id = $1 AND entry_date = $2",
    )
    .bind(auth_user.id)
    .bind(entry_date)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("No entry for that date".into()))?;

    Ok(Json(entry))
}

/// The default symptom catalog offered by the tracker.
pub async fn list_symptoms() -> Json<Vec<&'static str>> {
    Json(COMMON_SYMPTOMS.to_vec())
}
