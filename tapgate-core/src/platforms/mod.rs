// File: src/platforms/mod.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Error;

/// A single-use, time-bounded invite into the target chat.
#[derive(Debug, Clone)]
pub struct InviteLink {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues single-use invite links into the restricted chat. The claim engine
/// never calls this; it runs only after a claim has already been granted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InviteIssuer: Send + Sync {
    async fn create_invite(&self, label: &str, expires_at: DateTime<Utc>)
        -> Result<InviteLink, Error>;
}

pub mod telegram;
