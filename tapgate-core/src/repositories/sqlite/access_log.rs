// tapgate-core/src/repositories/sqlite/access_log.rs

use sqlx::{Pool, Row, Sqlite};

use tapgate_common::models::access_log::AccessLogEntry;
use tapgate_common::traits::repository_traits::AccessLogRepository;

use crate::utils::time::{from_epoch, to_epoch};
use crate::Error;

pub struct SqliteAccessLogRepository {
    pub pool: Pool<Sqlite>,
}

impl SqliteAccessLogRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AccessLogRepository for SqliteAccessLogRepository {
    async fn append(&self, entry: &AccessLogEntry) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO access_logs (user_id, code, action, reason, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.code)
        .bind(entry.action.as_str())
        .bind(&entry.reason)
        .bind(to_epoch(entry.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<AccessLogEntry>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, code, action, reason, created_at
            FROM access_logs
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                let action: String = r.try_get("action")?;
                Ok(AccessLogEntry {
                    id: r.try_get("id")?,
                    user_id: r.try_get("user_id")?,
                    code: r.try_get("code")?,
                    action: action.parse()?,
                    reason: r.try_get("reason")?,
                    created_at: from_epoch(r.try_get::<i64, _>("created_at")?),
                })
            })
            .collect()
    }
}
