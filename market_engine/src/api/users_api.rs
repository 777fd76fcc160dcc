//! User account management. Accounts materialise lazily on first login and are mutated only by admin action
//! thereafter.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{AccountStatus, Role, User},
    traits::{UserAccountError, UserManagement},
};

pub struct UserApi<B> {
    db: B,
}

impl<B: Debug> Debug for UserApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserApi ({:?})", self.db)
    }
}

impl<B> UserApi<B>
where B: UserManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Registers a login. First-time users are created with the `Customer` role and a `Pending` account status;
    /// returning users only get their last-login timestamp refreshed.
    pub async fn on_login(&self, email: &str) -> Result<User, UserAccountError> {
        let user = self.db.upsert_user_on_login(email).await?;
        debug!("😊️ Login recorded for {email}");
        Ok(user)
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>, UserAccountError> {
        self.db.fetch_user(email).await
    }

    /// All users except the caller, so that admin views never offer self-modification.
    pub async fn all_users_except(&self, caller: &str) -> Result<Vec<User>, UserAccountError> {
        self.db.fetch_all_users(caller).await
    }

    pub async fn set_role(&self, email: &str, role: Role) -> Result<User, UserAccountError> {
        let user = self.db.update_role(email, role).await?;
        info!("😊️ {email} is now a {role}");
        Ok(user)
    }

    pub async fn set_account_status(&self, email: &str, status: AccountStatus) -> Result<User, UserAccountError> {
        let user = self.db.update_account_status(email, status).await?;
        info!("😊️ Account status for {email} is now {status}");
        Ok(user)
    }
}
