// tapgate-core/src/repositories/sqlite/nfc_key.rs

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

use tapgate_common::models::nfc_key::NfcKey;
use tapgate_common::traits::repository_traits::NfcKeyRepository;

use crate::utils::time::{from_epoch, to_epoch};
use crate::Error;

pub struct SqliteNfcKeyRepository {
    pub pool: Pool<Sqlite>,
}

impl SqliteNfcKeyRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn key_from_row(row: &SqliteRow) -> Result<NfcKey, Error> {
        let status: String = row.try_get("status")?;
        Ok(NfcKey {
            code: row.try_get("code")?,
            product_id: row.try_get("product_id")?,
            assigned_user_id: row.try_get("assigned_user_id")?,
            status: status.parse()?,
            created_at: from_epoch(row.try_get::<i64, _>("created_at")?),
            claimed_at: row.try_get::<Option<i64>, _>("claimed_at")?.map(from_epoch),
        })
    }
}

#[async_trait::async_trait]
impl NfcKeyRepository for SqliteNfcKeyRepository {
    async fn insert_new(&self, key: &NfcKey) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO nfc_keys (code, product_id, assigned_user_id, status, created_at, claimed_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(code) DO NOTHING
            "#,
        )
        .bind(&key.code)
        .bind(&key.product_id)
        .bind(key.assigned_user_id)
        .bind(key.status.as_str())
        .bind(to_epoch(key.created_at))
        .bind(key.claimed_at.map(to_epoch))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get(&self, code: &str) -> Result<Option<NfcKey>, Error> {
        let row = sqlx::query(
            r#"
            SELECT code, product_id, assigned_user_id, status, created_at, claimed_at
            FROM nfc_keys
            WHERE code = ?
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(r) = row {
            Ok(Some(Self::key_from_row(&r)?))
        } else {
            Ok(None)
        }
    }

    async fn try_claim(
        &self,
        code: &str,
        user_id: i64,
        claimed_at: DateTime<Utc>,
    ) -> Result<bool, Error> {
        // The WHERE clause is the whole point: only an unowned key still in
        // 'new' status can flip, so concurrent claimants cannot both win.
        let result = sqlx::query(
            r#"
            UPDATE nfc_keys
            SET assigned_user_id = ?, status = 'claimed', claimed_at = ?
            WHERE code = ? AND status = 'new' AND assigned_user_id IS NULL
            "#,
        )
        .bind(user_id)
        .bind(to_epoch(claimed_at))
        .bind(code)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke(&self, code: &str) -> Result<bool, Error> {
        let result = sqlx::query("UPDATE nfc_keys SET status = 'revoked' WHERE code = ?")
            .bind(code)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn latest_claimed_for(&self, user_id: i64) -> Result<Option<String>, Error> {
        let row = sqlx::query(
            r#"
            SELECT code
            FROM nfc_keys
            WHERE assigned_user_id = ? AND status = 'claimed'
            ORDER BY claimed_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(r) = row {
            Ok(Some(r.try_get("code")?))
        } else {
            Ok(None)
        }
    }
}
