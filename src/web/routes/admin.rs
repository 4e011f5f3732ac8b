use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::models::RegistrationRow;
use crate::services::{admission_service, payment_service};
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::routes::{engine_error_response, AppState};

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentForm {
    pub verified: bool,
}

#[derive(Serialize)]
struct RegistrationView {
    registration_id: String,
    participant_user_id: String,
    status: String,
    waitlist_position: Option<i64>,
    payment_status: Option<String>,
    promoted_at: Option<String>,
    payment_deadline_at: Option<String>,
    team: Option<String>,
}

impl From<RegistrationRow> for RegistrationView {
    fn from(row: RegistrationRow) -> Self {
        Self {
            registration_id: row.registration_id,
            participant_user_id: row.participant_user_id,
            status: row.status,
            waitlist_position: row.waitlist_position,
            payment_status: row.payment_status,
            promoted_at: row.promoted_at,
            payment_deadline_at: row.payment_deadline_at,
            team: row.team,
        }
    }
}

pub async fn verify_payment_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path((activity_id, registration_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Json(form): Json<VerifyPaymentForm>,
) -> impl IntoResponse {
    match payment_service::verify_payment(
        &state.pool,
        &state.notifier,
        &activity_id,
        &registration_id,
        form.verified,
        &auth_user.id,
    )
    .await
    {
        Ok(Some(row)) => Json(RegistrationView::from(row)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => engine_error_response(e),
    }
}

pub async fn remove_registration_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path((activity_id, registration_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match admission_service::remove_registration(
        &state.pool,
        &state.notifier,
        &activity_id,
        &registration_id,
        &auth_user.id,
    )
    .await
    {
        Ok(removed) => Json(serde_json::json!({ "removed": removed })).into_response(),
        Err(e) => engine_error_response(e),
    }
}
