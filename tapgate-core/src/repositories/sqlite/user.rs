// tapgate-core/src/repositories/sqlite/user.rs

use sqlx::{Pool, Row, Sqlite};

use tapgate_common::models::user::User;
use tapgate_common::traits::repository_traits::UserRepository;

use crate::utils::time::{current_epoch, from_epoch};
use crate::Error;

pub struct SqliteUserRepository {
    pub pool: Pool<Sqlite>,
}

impl SqliteUserRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for SqliteUserRepository {
    async fn upsert(&self, user_id: i64, username: Option<&str>) -> Result<User, Error> {
        // first_seen sticks from the first insert; only the username moves.
        sqlx::query(
            r#"
            INSERT INTO users (user_id, username, first_seen)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET username = excluded.username
            "#,
        )
        .bind(user_id)
        .bind(username)
        .bind(current_epoch())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            r#"
            SELECT user_id, username, first_seen
            FROM users
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(User {
            user_id: row.try_get("user_id")?,
            username: row.try_get("username")?,
            first_seen: from_epoch(row.try_get::<i64, _>("first_seen")?),
        })
    }

    async fn get(&self, user_id: i64) -> Result<Option<User>, Error> {
        let row = sqlx::query(
            r#"
            SELECT user_id, username, first_seen
            FROM users
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(r) = row {
            Ok(Some(User {
                user_id: r.try_get("user_id")?,
                username: r.try_get("username")?,
                first_seen: from_epoch(r.try_get::<i64, _>("first_seen")?),
            }))
        } else {
            Ok(None)
        }
    }
}
