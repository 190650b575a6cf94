use anyhow::Context;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::{api::errors::AppError, db::models::AdminUser};

/// Create the admin account, or refresh its password hash if it exists.
pub async fn ensure_admin(
    pool: &SqlitePool,
    username: &str,
    password: &str,
    cost: u32,
) -> anyhow::Result<AdminUser> {
    let hash = hash_password(password.to_owned(), cost)
        .await
        .context("failed to hash admin password")?;

    let user = sqlx::query_as::<_, AdminUser>(
        r#"
        INSERT INTO admin_users (username, password_hash, created_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT (username) DO UPDATE SET password_hash = excluded.password_hash
        RETURNING id, username, password_hash, created_at
        "#,
    )
    .bind(username)
    .bind(hash)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .context("failed to upsert admin user")?;

    info!(username = %user.username, user_id = user.id, "Admin account ready");
    Ok(user)
}

/// Look up `username` and check `password` against its bcrypt hash.
///
/// Returns `Ok(None)` for an unknown user or a wrong password.
pub async fn authenticate(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<Option<AdminUser>, AppError> {
    let user = sqlx::query_as::<_, AdminUser>(
        "SELECT id, username, password_hash, created_at FROM admin_users WHERE username = ?1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    let Some(user) = user else {
        return Ok(None);
    };

    let password = password.to_owned();
    let hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("password check aborted: {e}")))?
        .unwrap_or(false);

    Ok(matches.then_some(user))
}

async fn hash_password(password: String, cost: u32) -> anyhow::Result<String> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Lowest cost bcrypt accepts; keeps the tests fast.
    const COST: u32 = 4;

    #[sqlx::test(migrations = "./migrations")]
    async fn ensure_admin_creates_user(pool: SqlitePool) {
        let user = ensure_admin(&pool, "admin", "pw", COST).await.unwrap();
        assert_eq!(user.username, "admin");
        assert_ne!(user.password_hash, "pw");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn ensure_admin_twice_keeps_one_row_and_new_password(pool: SqlitePool) {
        let first = ensure_admin(&pool, "admin", "old", COST).await.unwrap();
        let second = ensure_admin(&pool, "admin", "new", COST).await.unwrap();
        assert_eq!(first.id, second.id);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        assert!(authenticate(&pool, "admin", "old").await.unwrap().is_none());
        assert!(authenticate(&pool, "admin", "new").await.unwrap().is_some());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn authenticate_rejects_wrong_password_and_unknown_user(pool: SqlitePool) {
        ensure_admin(&pool, "admin", "pw", COST).await.unwrap();

        let ok = authenticate(&pool, "admin", "pw").await.unwrap().unwrap();
        assert_eq!(ok.username, "admin");
        assert!(authenticate(&pool, "admin", "PW").await.unwrap().is_none());
        assert!(authenticate(&pool, "ghost", "pw").await.unwrap().is_none());
    }
}
