use sqlx::SqliteConnection;

use crate::db_types::{AccountStatus, Role, User};

/// Creates the user on first login, or refreshes the last-login timestamp on subsequent logins. Role and account
/// status of an existing user are deliberately left alone here; only an admin mutation changes them.
pub async fn upsert_user_on_login(email: &str, conn: &mut SqliteConnection) -> Result<User, sqlx::Error> {
    let user = sqlx::query_as(
        r#"
            INSERT INTO users (email) VALUES ($1)
            ON CONFLICT (email) DO UPDATE SET last_login_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(email)
    .fetch_one(conn)
    .await?;
    Ok(user)
}

pub async fn fetch_user(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE email = $1").bind(email).fetch_optional(conn).await?;
    Ok(user)
}

/// All users except the given caller, oldest account first.
pub async fn fetch_all_users(excluding: &str, conn: &mut SqliteConnection) -> Result<Vec<User>, sqlx::Error> {
    let users = sqlx::query_as("SELECT * FROM users WHERE email <> $1 ORDER BY created_at ASC")
        .bind(excluding)
        .fetch_all(conn)
        .await?;
    Ok(users)
}

pub(crate) async fn update_role(
    email: &str,
    role: Role,
    conn: &mut SqliteConnection,
) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("UPDATE users SET role = $1 WHERE email = $2 RETURNING *")
        .bind(role.to_string())
        .bind(email)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub(crate) async fn update_account_status(
    email: &str,
    status: AccountStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("UPDATE users SET status = $1 WHERE email = $2 RETURNING *")
        .bind(status.to_string())
        .bind(email)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}
