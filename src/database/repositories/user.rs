use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{CreateUserRequest, UpdateUserRequest, User},
    utils::sql,
};

const USER_COLUMNS: &str = r#"
    id,
    email,
    password_hash,
    name,
    phone,
    role,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<User>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let users = sqlx::query_as::<_, User>(&sql(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT ? OFFSET ?"
        )))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((users, total))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&sql(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        )))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// `password_hash` must already be hashed; the request's plain password is ignored here.
    pub async fn create(&self, request: CreateUserRequest, password_hash: String) -> Result<User> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(&sql(&format!(
            r#"
            INSERT INTO
                users (
                    email,
                    password_hash,
                    name,
                    phone,
                    role,
                    created_at,
                    updated_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        )))
        .bind(request.email.trim().to_lowercase())
        .bind(password_hash)
        .bind(request.name)
        .bind(request.phone)
        .bind(request.role.unwrap_or_default())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Fields left as `None` keep their stored value.
    pub async fn update(&self, id: Uuid, request: UpdateUserRequest) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&sql(&format!(
            r#"
            UPDATE
                users
            SET
                name = COALESCE(?, name),
                phone = COALESCE(?, phone),
                role = COALESCE(?, role),
                updated_at = ?
            WHERE
                id = ?
            RETURNING {USER_COLUMNS}
            "#
        )))
        .bind(request.name)
        .bind(request.phone)
        .bind(request.role)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(&sql("DELETE FROM users WHERE id = ?"))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
