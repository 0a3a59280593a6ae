// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

/// A message delivered to a subscriber: the concrete channel it matched
/// and the published payload.
#[derive(Clone, Debug)]
pub struct KvMessage {
	pub channel: String,
	pub payload: Vec<u8>,
}

/// A live subscription handle. Dropping it unsubscribes.
pub struct KvSubscription {
	receiver: mpsc::Receiver<KvMessage>,
}

impl KvSubscription {
	/// Wraps a receiver fed by a backend-specific forwarding task. Used
	/// by [`KvStore`] implementations (including test doubles outside
	/// this crate) to construct the handle they return from `subscribe`.
	pub fn from_receiver(receiver: mpsc::Receiver<KvMessage>) -> Self {
		Self { receiver }
	}

	pub async fn recv(&mut self) -> Option<KvMessage> {
		self.receiver.recv().await
	}
}

/// The KV store boundary every other component programs against (spec
/// §4.1). Implementations: [`RedisKv`] in production,
/// `collabflow_testing::InMemoryKv` in tests — both are `Arc<dyn KvStore>`
/// so call sites never know which backend they hold.
#[async_trait]
pub trait KvStore: Send + Sync {
	async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

	async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>>;

	async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

	/// Sets many keys in a single pipelined round trip when the backend
	/// supports it (spec §4.1).
	async fn mset(&self, entries: &[(String, Vec<u8>)], ttl: Option<Duration>) -> Result<()>;

	async fn del(&self, keys: &[String]) -> Result<u64>;

	/// Atomically increments `key` by `by`. `ttl` is applied only the
	/// first time the key is created by this call (spec §4.1).
	async fn incr(&self, key: &str, by: i64, ttl: Option<Duration>) -> Result<i64>;

	async fn expire(&self, key: &str, ttl: Duration) -> Result<()>;

	/// Lists keys matching `pattern`. Backed by a non-blocking cursor
	/// scan rather than a single blocking `KEYS` call.
	async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

	async fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> Result<()>;

	async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>>;

	async fn hgetall(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>>;

	async fn hdel(&self, key: &str, field: &str) -> Result<u64>;

	async fn hincrby(&self, key: &str, field: &str, by: i64) -> Result<i64>;

	async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<u64>;

	/// Subscribes to a channel pattern (e.g. `ai:response:*`). Delivery
	/// is at-most-once; a subscriber restart may miss messages (spec
	/// §4.4).
	async fn subscribe(&self, pattern: &str) -> Result<KvSubscription>;
}
