//! Refresh-token session entity and repository trait.
//!
//! Maps to the `user_sessions` table. Only the SHA-256 hash of a refresh
//! token is persisted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Maps to the `user_sessions` table:
/// - id: UUID PRIMARY KEY
/// - user_id: BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
/// - refresh_token_hash: VARCHAR(64) NOT NULL UNIQUE
/// - user_agent: TEXT NULL
/// - expires_at / created_at / last_used_at: TIMESTAMPTZ
/// - revoked_at: TIMESTAMPTZ NULL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: i64,

    #[serde(skip_serializing)]
    pub refresh_token_hash: String,

    pub user_agent: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a new session.
    pub fn new(user_id: i64, refresh_token_hash: String, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            refresh_token_hash,
            user_agent: None,
            expires_at,
            created_at: now,
            last_used_at: now,
            revoked_at: None,
        }
    }

    /// Not expired and not revoked.
    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none() && self.expires_at > Utc::now()
    }
}

/// Repository trait for Session data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Find a session by refresh token hash.
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>, AppError>;

    /// Create a new session.
    async fn create(&self, session: &Session) -> Result<Session, AppError>;

    /// Swap the refresh token hash, but only while the session still holds
    /// `old_token_hash`. Returns `false` when another refresh won the race
    /// or the session was revoked.
    async fn rotate(
        &self,
        id: Uuid,
        old_token_hash: &str,
        new_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    /// Revoke a session (set revoked_at).
    async fn revoke(&self, id: Uuid) -> Result<(), AppError>;

    /// Revoke every session of a user (password change).
    async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64, AppError>;

    /// Delete expired and revoked sessions.
    async fn cleanup_expired(&self) -> Result<u64, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_session_is_active() {
        let session = Session::new(1, "hash".into(), Utc::now() + Duration::days(1));
        assert!(session.is_active());
    }

    #[test]
    fn test_expired_session_is_inactive() {
        let session = Session::new(1, "hash".into(), Utc::now() - Duration::seconds(1));
        assert!(!session.is_active());
    }

    #[test]
    fn test_revoked_session_is_inactive() {
        let mut session = Session::new(1, "hash".into(), Utc::now() + Duration::days(1));
        session.revoked_at = Some(Utc::now());
        assert!(!session.is_active());
    }
}
