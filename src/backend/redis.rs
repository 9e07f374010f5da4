//! Dedup index backed by Redis.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, AsyncConnectionConfig};

use super::DedupIndex;
use crate::error::Result;

/// Redis client over a single multiplexed connection.
///
/// Clones share the connection; the connection does not reconnect on its own.
/// Every command is bounded by the response timeout given at connect time.
#[derive(Clone)]
pub struct RedisIndex {
    conn: MultiplexedConnection,
}

impl RedisIndex {
    /// Open a connection and verify it with `PING`.
    ///
    /// `io_timeout` bounds both the TCP connect and each later response.
    pub async fn connect(url: &str, io_timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let config = AsyncConnectionConfig::new()
            .set_connection_timeout(io_timeout)
            .set_response_timeout(io_timeout);
        let conn = client
            .get_multiplexed_async_connection_with_config(&config)
            .await?;
        let index = Self { conn };
        index.ping().await?;
        Ok(index)
    }
}

#[async_trait]
impl DedupIndex for RedisIndex {
    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let count: i64 = conn.exists(key).await?;
        Ok(count > 0)
    }

    async fn record(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        // Plain SET: no TTL, no NX, last writer wins.
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
