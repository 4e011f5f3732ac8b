use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

// Rejection reasons surfaced verbatim to callers; clients match on these
// strings, so changing them is a breaking change.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Already registered for this activity")]
    AlreadyRegistered,

    #[error("Registration deadline has passed")]
    DeadlinePassed,

    #[error("Multiple eligible roles; specify one")]
    RoleAmbiguous,

    #[error("Role '{0}' is not eligible for this participant")]
    InvalidRole(String),

    #[error("Activity not found")]
    ActivityNotFound,

    #[error("Activity is not open for registration")]
    ActivityNotOpen,

    #[error("Registration not found")]
    RegistrationNotFound,

    #[error("Participant not found")]
    ParticipantNotFound,

    #[error("Not allowed to manage this activity")]
    NotAuthorized,

    #[error("Payment is not awaiting verification")]
    InvalidPaymentState,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
