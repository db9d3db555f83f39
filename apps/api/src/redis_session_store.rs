//! Session persistence in the same Redis instance as the domain data.
//!
//! Records live under `ephemera:session:{id}` with a TTL mirroring the
//! cookie expiry, so an abandoned session disappears from the store on its
//! own instead of waiting for an explicit logout.

use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tower_sessions::SessionStore;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, Error as SessionStoreError};

const SESSION_KEY_PREFIX: &str = "ephemera:session";

/// Sessions expire after 30 minutes of inactivity. The cookie layer refreshes
/// the expiry on every request; capping the stored TTL here keeps a record
/// with a long-dated expiry from outliving the inactivity window.
const MAX_SESSION_TTL_SECONDS: i64 = 30 * 60;

/// Seconds the stored record may live, or `None` when it is already expired
/// and should be dropped instead of written.
fn session_ttl_seconds(expiry_epoch: i64, now_epoch: i64) -> Option<u64> {
    let remaining = (expiry_epoch - now_epoch).min(MAX_SESSION_TTL_SECONDS);
    u64::try_from(remaining).ok().filter(|seconds| *seconds > 0)
}

fn session_key(session_id: &Id) -> String {
    format!("{SESSION_KEY_PREFIX}:{session_id}")
}

#[derive(Debug, Clone)]
pub struct RedisSessionStore {
    client: redis::Client,
}

impl RedisSessionStore {
    #[must_use]
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn connect(&self) -> session_store::Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| SessionStoreError::Backend(error.to_string()))
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn save(&self, session_record: &Record) -> session_store::Result<()> {
        let key = session_key(&session_record.id);
        let mut connection = self.connect().await?;

        let Some(ttl_seconds) = session_ttl_seconds(
            session_record.expiry_date.unix_timestamp(),
            Utc::now().timestamp(),
        ) else {
            // Already expired; make sure no stale record lingers.
            connection
                .del::<_, i64>(key)
                .await
                .map_err(|error| SessionStoreError::Backend(error.to_string()))?;
            return Ok(());
        };

        let encoded_record = serde_json::to_string(session_record)
            .map_err(|error| SessionStoreError::Encode(error.to_string()))?;

        connection
            .set_ex::<_, _, ()>(key, encoded_record, ttl_seconds)
            .await
            .map_err(|error| SessionStoreError::Backend(error.to_string()))
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let mut connection = self.connect().await?;

        let encoded_record: Option<String> = connection
            .get(session_key(session_id))
            .await
            .map_err(|error| SessionStoreError::Backend(error.to_string()))?;

        encoded_record
            .as_deref()
            .map(|value| {
                serde_json::from_str::<Record>(value)
                    .map_err(|error| SessionStoreError::Decode(error.to_string()))
            })
            .transpose()
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        let mut connection = self.connect().await?;

        connection
            .del::<_, i64>(session_key(session_id))
            .await
            .map_err(|error| SessionStoreError::Backend(error.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::session_ttl_seconds;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn expired_records_get_no_ttl() {
        assert_eq!(session_ttl_seconds(NOW - 1, NOW), None);
        assert_eq!(session_ttl_seconds(NOW, NOW), None);
    }

    #[test]
    fn live_records_keep_their_remaining_ttl() {
        assert_eq!(session_ttl_seconds(NOW + 120, NOW), Some(120));
    }

    #[test]
    fn ttl_is_capped_at_the_inactivity_window() {
        let far_future = NOW + 14 * 24 * 60 * 60;
        assert_eq!(session_ttl_seconds(far_future, NOW), Some(1800));
    }
}
