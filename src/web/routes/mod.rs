pub mod activity;
pub mod admin;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sqlx::SqlitePool;
use tracing::warn;

use crate::services::errors::EngineError;
use crate::services::notifier_service::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub notifier: Notifier,
}

// Rejection reasons go out verbatim; clients match on the exact strings.
pub(crate) fn engine_error_response(e: EngineError) -> Response {
    let (status, message) = match &e {
        EngineError::AlreadyRegistered
        | EngineError::DeadlinePassed
        | EngineError::ActivityNotOpen
        | EngineError::InvalidPaymentState => (StatusCode::CONFLICT, e.to_string()),
        EngineError::RoleAmbiguous | EngineError::InvalidRole(_) => {
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        EngineError::ActivityNotFound
        | EngineError::RegistrationNotFound
        | EngineError::ParticipantNotFound => (StatusCode::NOT_FOUND, e.to_string()),
        EngineError::NotAuthorized => (StatusCode::FORBIDDEN, e.to_string()),
        EngineError::Database(err) => {
            warn!("database error: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
            )
        }
    };
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
