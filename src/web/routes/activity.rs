use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::models::RegistrationRow;
use crate::services::{admission_service, payment_service, roster_service, waitlist_service};
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::routes::{engine_error_response, AppState};

#[derive(Debug, Deserialize, Default)]
pub struct RegisterForm {
    pub role: Option<String>,
}

#[derive(Serialize)]
struct RegisterResponse {
    registration_id: String,
    status: &'static str,
    waitlist_position: Option<i64>,
    message: String,
}

pub async fn register_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(activity_id): Path<String>,
    State(state): State<AppState>,
    form: Option<Json<RegisterForm>>,
) -> impl IntoResponse {
    let Json(form) = form.unwrap_or_default();

    match admission_service::register(
        &state.pool,
        &state.notifier,
        &activity_id,
        &auth_user.id,
        form.role.as_deref(),
    )
    .await
    {
        Ok(outcome) => Json(RegisterResponse {
            registration_id: outcome.registration_id,
            status: outcome.status.as_str(),
            waitlist_position: outcome.waitlist_position,
            message: outcome.message,
        })
        .into_response(),
        Err(e) => engine_error_response(e),
    }
}

pub async fn cancel_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(activity_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match admission_service::cancel_registration(
        &state.pool,
        &state.notifier,
        &activity_id,
        &auth_user.id,
    )
    .await
    {
        Ok(cancelled) => Json(serde_json::json!({ "cancelled": cancelled })).into_response(),
        Err(e) => engine_error_response(e),
    }
}

#[derive(Serialize)]
struct WaitlistEntryView {
    registration_id: String,
    participant_user_id: String,
    position: Option<i64>,
    payment_status: Option<String>,
    registered_at: String,
}

impl From<RegistrationRow> for WaitlistEntryView {
    fn from(row: RegistrationRow) -> Self {
        Self {
            registration_id: row.registration_id,
            participant_user_id: row.participant_user_id,
            position: row.waitlist_position,
            payment_status: row.payment_status,
            registered_at: row.registered_at,
        }
    }
}

pub async fn waitlist_handler(
    Extension(_auth_user): Extension<AuthenticatedUser>,
    Path(activity_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match waitlist_service::get_waitlist(&state.pool, &activity_id).await {
        Ok(rows) => {
            let entries: Vec<WaitlistEntryView> =
                rows.into_iter().map(WaitlistEntryView::from).collect();
            Json(entries).into_response()
        }
        Err(e) => engine_error_response(e),
    }
}

pub async fn roster_handler(
    Extension(_auth_user): Extension<AuthenticatedUser>,
    Path(activity_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match roster_service::load_activity_roster_view(&state.pool, &activity_id).await {
        Ok(Some(view)) => Json(view).into_response(),
        Ok(None) => axum::http::StatusCode::NOT_FOUND.into_response(),
        Err(e) => engine_error_response(e),
    }
}

pub async fn mark_payment_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(activity_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match payment_service::mark_payment(&state.pool, &activity_id, &auth_user.id).await {
        Ok(marked) => Json(serde_json::json!({ "marked": marked })).into_response(),
        Err(e) => engine_error_response(e),
    }
}
