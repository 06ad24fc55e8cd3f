use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::medication::{CreateMedicationRequest, Medication};
use crate::AppState;

pub async fn list_medications(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<Medication>>> {
    let medications = sqlx::query_as::<_, Medication>(
        r#"
        SELECT * FROM medications
        WHERE user_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(medications))
}

pub async fn create_medication(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateMedicationRequest>,
) -> AppResult<Json<Medication>> {
    body.validate()?;

    let medication = sqlx::query_as::<_, Medication>(
        r#"
        INSERT INTO medications (id, user_id, name, dosage, frequency, time_of_day, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&body.name)
    .bind(&body.dosage)
    .bind(&body.frequency)
    .bind(body.time_of_day)
    .bind(&body.notes)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(medication))
}

pub async fn delete_medication(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(medication_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM medications WHERE id = $1 AND user_id = $2")
        .bind(medication_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Medication not found".into()));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}
