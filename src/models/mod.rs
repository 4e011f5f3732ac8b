pub mod activities;
pub mod registrations;
pub mod users;

pub use activities::ActivityRow;
pub use registrations::{PaymentStatus, RegistrationRow, RegistrationStatus};
pub use users::UsersRow;
