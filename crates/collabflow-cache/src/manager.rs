// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use collabflow_core::Result;
use collabflow_kv::KvStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

use crate::category::Category;
use crate::metrics::{CacheMetrics, CacheMetricsSnapshot};
use crate::serialize;

/// Keys longer than this are truncated and given a content hash suffix
/// so two distinct long keys never collide (spec §4.2).
const MAX_KEY_LENGTH: usize = 200;
const HASH_SUFFIX_LEN: usize = 16;

/// Namespaced, tiered cache over a [`KvStore`] (spec §4.2). Every key
/// this manager touches is built as `{prefix}:{category}:{user_key}`;
/// callers never see the raw KV key.
pub struct CacheManager {
	kv: Arc<dyn KvStore>,
	prefix: String,
	metrics: CacheMetrics,
}

impl CacheManager {
	pub fn new(kv: Arc<dyn KvStore>, prefix: impl Into<String>) -> Self {
		Self { kv, prefix: prefix.into(), metrics: CacheMetrics::default() }
	}

	pub fn metrics(&self) -> CacheMetricsSnapshot {
		self.metrics.snapshot()
	}

	fn build_key(&self, category: Category, user_key: &str) -> String {
		let full = format!("{}:{}:{}", self.prefix, category.as_str(), user_key);
		if full.len() <= MAX_KEY_LENGTH {
			return full;
		}
		let mut hasher = Sha256::new();
		hasher.update(full.as_bytes());
		let digest = hasher.finalize();
		let suffix: String = digest.iter().map(|b| format!("{b:02x}")).collect::<String>()
			[..HASH_SUFFIX_LEN]
			.to_string();
		let keep = MAX_KEY_LENGTH - HASH_SUFFIX_LEN - 1;
		format!("{}-{}", &full[..keep], suffix)
	}

	/// Reads `user_key` from `category`. A read failure (transport loss,
	/// a value that no longer deserializes) is reported as a miss, never
	/// as an error, per spec §4.2.
	pub async fn get<T: DeserializeOwned>(&self, category: Category, user_key: &str) -> Option<T> {
		let started = Instant::now();
		let key = self.build_key(category, user_key);
		let raw = match self.kv.get(&key).await {
			Ok(Some(bytes)) => bytes,
			Ok(None) => {
				self.metrics.record_miss();
				self.metrics.record_response_time(started.elapsed());
				return None;
			}
			Err(err) => {
				tracing::warn!(error = %err, %key, "cache read failed, treating as miss");
				self.metrics.record_error();
				self.metrics.record_response_time(started.elapsed());
				return None;
			}
		};
		match serialize::decode(&raw) {
			Ok(value) => {
				self.metrics.record_hit();
				self.metrics.record_response_time(started.elapsed());
				Some(value)
			}
			Err(err) => {
				tracing::warn!(error = %err, %key, "cache payload failed to decode, treating as miss");
				self.metrics.record_error();
				self.metrics.record_response_time(started.elapsed());
				None
			}
		}
	}

	/// Writes `value` into `category` under `user_key`. Best-effort: a
	/// write failure is counted but never surfaced to the caller (spec
	/// §4.2 "a cache write failure degrades silently").
	pub async fn set<T: Serialize>(
		&self,
		category: Category,
		user_key: &str,
		value: &T,
		ttl: Option<Duration>,
	) {
		let started = Instant::now();
		let key = self.build_key(category, user_key);
		let encoded = match serialize::encode(value) {
			Ok(bytes) => bytes,
			Err(err) => {
				tracing::warn!(error = %err, %key, "cache value failed to encode");
				self.metrics.record_error();
				return;
			}
		};
		let effective_ttl = ttl.or(Some(category.default_ttl()));
		if let Err(err) = self.kv.set(&key, encoded, effective_ttl).await {
			tracing::warn!(error = %err, %key, "cache write failed");
			self.metrics.record_error();
		} else {
			self.metrics.record_set();
		}
		self.metrics.record_response_time(started.elapsed());
	}

	/// Deletes a single key from `category`.
	pub async fn delete(&self, category: Category, user_key: &str) {
		let key = self.build_key(category, user_key);
		match self.kv.del(&[key.clone()]).await {
			Ok(count) => self.metrics.record_delete(count),
			Err(err) => {
				tracing::warn!(error = %err, %key, "cache delete failed");
				self.metrics.record_error();
			}
		}
	}

	/// Cache-aside read: returns the cached value if present, otherwise
	/// invokes `loader`, stores its result, and returns it. Loader
	/// failures propagate; cache failures never do.
	pub async fn get_or_set<T, F, Fut>(
		&self,
		category: Category,
		user_key: &str,
		ttl: Option<Duration>,
		loader: F,
	) -> Result<T>
	where
		T: Serialize + DeserializeOwned,
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		if let Some(cached) = self.get::<T>(category, user_key).await {
			return Ok(cached);
		}
		let value = loader().await?;
		self.set(category, user_key, &value, ttl).await;
		Ok(value)
	}

	/// Invalidates every category declared downstream of `category` in
	/// the dependency graph (spec §4.2), deleting all keys under each by
	/// pattern and recording one invalidation event per affected key.
	pub async fn invalidate_dependent(&self, category: Category) {
		for dependent in category.dependents() {
			let pattern = format!("{}:{}:*", self.prefix, dependent.as_str());
			let keys = match self.kv.keys(&pattern).await {
				Ok(keys) => keys,
				Err(err) => {
					tracing::warn!(error = %err, %pattern, "invalidation scan failed");
					self.metrics.record_error();
					continue;
				}
			};
			if keys.is_empty() {
				continue;
			}
			match self.kv.del(&keys).await {
				Ok(count) => {
					self.metrics.record_delete(count);
					self.metrics.record_invalidation();
				}
				Err(err) => {
					tracing::warn!(error = %err, %pattern, "invalidation delete failed");
					self.metrics.record_error();
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use collabflow_testing::InMemoryKv;
	use serde::Deserialize;

	use super::*;

	#[derive(Serialize, Deserialize, PartialEq, Debug)]
	struct Profile {
		name: String,
	}

	fn manager() -> CacheManager {
		CacheManager::new(Arc::new(InMemoryKv::new()), "cf")
	}

	#[tokio::test]
	async fn get_or_set_only_invokes_loader_on_miss() {
		let cache = manager();
		let mut calls = 0;
		let loaded = cache
			.get_or_set(Category::UserData, "u1", None, || {
				calls += 1;
				async move { Ok(Profile { name: "ada".to_string() }) }
			})
			.await
			.unwrap();
		assert_eq!(loaded, Profile { name: "ada".to_string() });

		let cached = cache
			.get_or_set(Category::UserData, "u1", None, || {
				calls += 1;
				async move { Ok(Profile { name: "never".to_string() }) }
			})
			.await
			.unwrap();
		assert_eq!(cached.name, "ada");
		assert_eq!(calls, 1);
	}

	#[tokio::test]
	async fn invalidate_dependent_clears_declared_categories() {
		let cache = manager();
		cache.set(Category::Sessions, "s1", &Profile { name: "x".to_string() }, None).await;
		cache.set(Category::Workspace, "w1", &Profile { name: "y".to_string() }, None).await;

		cache.invalidate_dependent(Category::UserData).await;

		assert!(cache.get::<Profile>(Category::Sessions, "s1").await.is_none());
		assert!(cache.get::<Profile>(Category::Workspace, "w1").await.is_none());
	}

	#[tokio::test]
	async fn long_keys_are_truncated_with_a_stable_hash_suffix() {
		let cache = manager();
		let long_key = "u".repeat(500);
		cache.set(Category::Flows, &long_key, &Profile { name: "z".to_string() }, None).await;
		let fetched = cache.get::<Profile>(Category::Flows, &long_key).await;
		assert_eq!(fetched, Some(Profile { name: "z".to_string() }));
	}

	#[tokio::test]
	async fn read_failure_is_reported_as_a_miss() {
		let cache = manager();
		let missing = cache.get::<Profile>(Category::Flows, "does-not-exist").await;
		assert!(missing.is_none());
	}
}
