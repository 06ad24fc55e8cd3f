use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::services;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ConfirmationRequest {
    pub email: Option<String>,
}

/// Standalone confirmation-email endpoint. Contract: 400 when the address is
/// missing, 200 on send, 500 on delivery failure. Open to any origin.
pub async fn send_confirmation(
    State(state): State<AppState>,
    Json(body): Json<ConfirmationRequest>,
) -> (StatusCode, Json<Value>) {
    let email = body.email.unwrap_or_default();
    let email = email.trim();

    if email.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Email is required" })),
        );
    }

    match services::email::send_entry_confirmation(&state.config, email).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "message": "Email sent successfully" })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Error sending entry confirmation");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}
