// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::mpsc;
use tracing::{instrument, warn};

use crate::error::{KvError, Result};
use crate::retry::with_backoff;
use crate::store::{KvMessage, KvStore, KvSubscription};

const RETRY_BASE: Duration = Duration::from_millis(50);
const RETRY_MAX_ATTEMPTS: u32 = 5;
const SCAN_COUNT: usize = 200;

/// Production [`KvStore`] backed by Redis, via `redis::aio::ConnectionManager`
/// so transport loss is reconnected transparently underneath our own
/// retry-with-backoff wrapper (spec §4.1).
pub struct RedisKv {
	manager: ConnectionManager,
	client: redis::Client,
}

impl RedisKv {
	pub async fn connect(url: &str) -> Result<Self> {
		let client = redis::Client::open(url).map_err(KvError::from)?;
		let manager = client.get_connection_manager().await.map_err(KvError::from)?;
		Ok(Self { manager, client })
	}

	async fn retrying<T, F, Fut>(&self, op: F) -> Result<T>
	where
		F: FnMut() -> Fut,
		Fut: std::future::Future<Output = Result<T>>,
	{
		with_backoff(RETRY_BASE, RETRY_MAX_ATTEMPTS, op).await
	}
}

#[async_trait]
impl KvStore for RedisKv {
	#[instrument(skip(self))]
	async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
		self.retrying(|| {
			let mut conn = self.manager.clone();
			let key = key.to_string();
			async move { conn.get(&key).await.map_err(KvError::from) }
		})
		.await
	}

	async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
		if keys.is_empty() {
			return Ok(Vec::new());
		}
		self.retrying(|| {
			let mut conn = self.manager.clone();
			let keys = keys.to_vec();
			async move { conn.mget(&keys).await.map_err(KvError::from) }
		})
		.await
	}

	async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
		self.retrying(|| {
			let mut conn = self.manager.clone();
			let key = key.to_string();
			let value = value.clone();
			async move {
				match ttl {
					Some(ttl) => {
						conn.set_ex::<_, _, ()>(&key, value, ttl.as_secs().max(1))
							.await
							.map_err(KvError::from)
					}
					None => conn.set::<_, _, ()>(&key, value).await.map_err(KvError::from),
				}
			}
		})
		.await
	}

	/// Uses a single pipeline so a batch of sets is one round trip (spec
	/// §4.1 "must use a single pipelined round trip when supported").
	async fn mset(&self, entries: &[(String, Vec<u8>)], ttl: Option<Duration>) -> Result<()> {
		if entries.is_empty() {
			return Ok(());
		}
		self.retrying(|| {
			let mut conn = self.manager.clone();
			let entries = entries.to_vec();
			async move {
				let mut pipe = redis::pipe();
				for (key, value) in &entries {
					match ttl {
						Some(ttl) => {
							pipe.set_ex(key, value, ttl.as_secs().max(1));
						}
						None => {
							pipe.set(key, value);
						}
					}
				}
				pipe.query_async::<()>(&mut conn).await.map_err(KvError::from)
			}
		})
		.await
	}

	async fn del(&self, keys: &[String]) -> Result<u64> {
		if keys.is_empty() {
			return Ok(0);
		}
		self.retrying(|| {
			let mut conn = self.manager.clone();
			let keys = keys.to_vec();
			async move { conn.del(&keys).await.map_err(KvError::from) }
		})
		.await
	}

	async fn incr(&self, key: &str, by: i64, ttl: Option<Duration>) -> Result<i64> {
		self.retrying(|| {
			let mut conn = self.manager.clone();
			let key = key.to_string();
			async move {
				let mut pipe = redis::pipe();
				pipe.atomic();
				pipe.cmd("INCRBY").arg(&key).arg(by);
				if let Some(ttl) = ttl {
					// NX: only arms the TTL if this created the key.
					pipe.cmd("EXPIRE").arg(&key).arg(ttl.as_secs().max(1)).arg("NX").ignore();
				}
				let (value,): (i64,) = pipe.query_async(&mut conn).await.map_err(KvError::from)?;
				Ok(value)
			}
		})
		.await
	}

	async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
		self.retrying(|| {
			let mut conn = self.manager.clone();
			let key = key.to_string();
			async move {
				conn.expire::<_, ()>(&key, ttl.as_secs().max(1) as i64).await.map_err(KvError::from)
			}
		})
		.await
	}

	/// Cursor-based `SCAN` rather than `KEYS`, so a large keyspace never
	/// blocks the Redis event loop (operational detail SPEC_FULL C1
	/// calls out explicitly).
	async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
		self.retrying(|| {
			let mut conn = self.manager.clone();
			let pattern = pattern.to_string();
			async move {
				let mut cursor = 0u64;
				let mut found = Vec::new();
				loop {
					let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
						.arg(cursor)
						.arg("MATCH")
						.arg(&pattern)
						.arg("COUNT")
						.arg(SCAN_COUNT)
						.query_async(&mut conn)
						.await
						.map_err(KvError::from)?;
					found.extend(batch);
					if next_cursor == 0 {
						break;
					}
					cursor = next_cursor;
				}
				Ok(found)
			}
		})
		.await
	}

	async fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> Result<()> {
		self.retrying(|| {
			let mut conn = self.manager.clone();
			let (key, field, value) = (key.to_string(), field.to_string(), value.clone());
			async move { conn.hset::<_, _, _, ()>(&key, &field, value).await.map_err(KvError::from) }
		})
		.await
	}

	async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
		self.retrying(|| {
			let mut conn = self.manager.clone();
			let (key, field) = (key.to_string(), field.to_string());
			async move { conn.hget(&key, &field).await.map_err(KvError::from) }
		})
		.await
	}

	async fn hgetall(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>> {
		self.retrying(|| {
			let mut conn = self.manager.clone();
			let key = key.to_string();
			async move { conn.hgetall(&key).await.map_err(KvError::from) }
		})
		.await
	}

	async fn hdel(&self, key: &str, field: &str) -> Result<u64> {
		self.retrying(|| {
			let mut conn = self.manager.clone();
			let (key, field) = (key.to_string(), field.to_string());
			async move { conn.hdel(&key, &field).await.map_err(KvError::from) }
		})
		.await
	}

	async fn hincrby(&self, key: &str, field: &str, by: i64) -> Result<i64> {
		self.retrying(|| {
			let mut conn = self.manager.clone();
			let (key, field) = (key.to_string(), field.to_string());
			async move { conn.hincr(&key, &field, by).await.map_err(KvError::from) }
		})
		.await
	}

	async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<u64> {
		self.retrying(|| {
			let mut conn = self.manager.clone();
			let (channel, payload) = (channel.to_string(), payload.clone());
			async move { conn.publish(&channel, payload).await.map_err(KvError::from) }
		})
		.await
	}

	async fn subscribe(&self, pattern: &str) -> Result<KvSubscription> {
		let mut pubsub = self.client.get_async_pubsub().await.map_err(KvError::from)?;
		pubsub.psubscribe(pattern).await.map_err(KvError::from)?;

		let (tx, rx) = mpsc::channel(256);
		let pattern_owned = pattern.to_string();
		tokio::spawn(async move {
			use futures_util::StreamExt;
			let mut stream = pubsub.on_message();
			while let Some(msg) = stream.next().await {
				let channel = msg.get_channel_name().to_string();
				let payload: Vec<u8> = match msg.get_payload() {
					Ok(p) => p,
					Err(err) => {
						warn!(%err, pattern = %pattern_owned, "dropping undecodable pubsub payload");
						continue;
					}
				};
				if tx.send(KvMessage { channel, payload }).await.is_err() {
					break;
				}
			}
		});

		Ok(KvSubscription::from_receiver(rx))
	}
}
