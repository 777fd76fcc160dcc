use thiserror::Error;

use crate::db_types::{AccountStatus, Role, User};

/// The user-account contract. Users are created on first login and mutated only by admin action thereafter,
/// except for the last-login timestamp which refreshes on every login event.
#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Creates the user with role `Customer` and status `Pending` if the email is unknown; otherwise refreshes
    /// `last_login_at` only. Role and status of an existing user are never touched by a login.
    async fn upsert_user_on_login(&self, email: &str) -> Result<User, UserAccountError>;

    async fn fetch_user(&self, email: &str) -> Result<Option<User>, UserAccountError>;

    /// All users except the given caller.
    async fn fetch_all_users(&self, excluding: &str) -> Result<Vec<User>, UserAccountError>;

    async fn update_role(&self, email: &str, role: Role) -> Result<User, UserAccountError>;

    async fn update_account_status(&self, email: &str, status: AccountStatus) -> Result<User, UserAccountError>;
}

#[derive(Debug, Clone, Error)]
pub enum UserAccountError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("No user account exists for {0}")]
    UserNotFound(String),
}

impl From<sqlx::Error> for UserAccountError {
    fn from(e: sqlx::Error) -> Self {
        UserAccountError::DatabaseError(e.to_string())
    }
}
