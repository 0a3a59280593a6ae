// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use collabflow_kv::{KvMessage, KvStore, KvSubscription, Result};
use tokio::sync::{broadcast, mpsc};

struct Entry {
	value: Vec<u8>,
	expires_at: Option<Instant>,
}

/// An in-process [`KvStore`] double. Not a toy: it implements the same
/// TTL-on-first-increment and pattern-scan semantics as the Redis adapter,
/// so tests exercising cache/rate-limit/event-bus behavior don't need a
/// real Redis instance (SPEC_FULL A4).
pub struct InMemoryKv {
	strings: Mutex<HashMap<String, Entry>>,
	hashes: Mutex<HashMap<String, HashMap<String, Vec<u8>>>>,
	broadcaster: broadcast::Sender<KvMessage>,
}

impl Default for InMemoryKv {
	fn default() -> Self {
		let (broadcaster, _) = broadcast::channel(1024);
		Self { strings: Mutex::new(HashMap::new()), hashes: Mutex::new(HashMap::new()), broadcaster }
	}
}

impl InMemoryKv {
	pub fn new() -> Self {
		Self::default()
	}

	fn live(entry: &Entry) -> bool {
		entry.expires_at.map(|at| at > Instant::now()).unwrap_or(true)
	}
}

#[async_trait]
impl KvStore for InMemoryKv {
	async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
		let map = self.strings.lock().unwrap();
		Ok(map.get(key).filter(|e| Self::live(e)).map(|e| e.value.clone()))
	}

	async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
		let map = self.strings.lock().unwrap();
		Ok(keys.iter().map(|k| map.get(k).filter(|e| Self::live(e)).map(|e| e.value.clone())).collect())
	}

	async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
		let mut map = self.strings.lock().unwrap();
		map.insert(key.to_string(), Entry { value, expires_at: ttl.map(|t| Instant::now() + t) });
		Ok(())
	}

	async fn mset(&self, entries: &[(String, Vec<u8>)], ttl: Option<Duration>) -> Result<()> {
		let mut map = self.strings.lock().unwrap();
		for (key, value) in entries {
			map.insert(key.clone(), Entry { value: value.clone(), expires_at: ttl.map(|t| Instant::now() + t) });
		}
		Ok(())
	}

	async fn del(&self, keys: &[String]) -> Result<u64> {
		let mut map = self.strings.lock().unwrap();
		let mut hashes = self.hashes.lock().unwrap();
		let mut count = 0;
		for key in keys {
			if map.remove(key).is_some() {
				count += 1;
			}
			if hashes.remove(key).is_some() {
				count += 1;
			}
		}
		Ok(count)
	}

	async fn incr(&self, key: &str, by: i64, ttl: Option<Duration>) -> Result<i64> {
		let mut map = self.strings.lock().unwrap();
		let is_new = !map.contains_key(key) || !Self::live(map.get(key).unwrap());
		let entry = map.entry(key.to_string()).or_insert(Entry { value: b"0".to_vec(), expires_at: None });
		if is_new {
			entry.value = b"0".to_vec();
			entry.expires_at = None;
		}
		let current: i64 = std::str::from_utf8(&entry.value).unwrap_or("0").parse().unwrap_or(0);
		let updated = current + by;
		entry.value = updated.to_string().into_bytes();
		if is_new {
			entry.expires_at = ttl.map(|t| Instant::now() + t);
		}
		Ok(updated)
	}

	async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
		let mut map = self.strings.lock().unwrap();
		if let Some(entry) = map.get_mut(key) {
			entry.expires_at = Some(Instant::now() + ttl);
		}
		Ok(())
	}

	async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
		let map = self.strings.lock().unwrap();
		Ok(map
			.iter()
			.filter(|(_, e)| Self::live(e))
			.map(|(k, _)| k.clone())
			.filter(|k| glob_match::glob_match(pattern, k))
			.collect())
	}

	async fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> Result<()> {
		let mut hashes = self.hashes.lock().unwrap();
		hashes.entry(key.to_string()).or_default().insert(field.to_string(), value);
		Ok(())
	}

	async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
		let hashes = self.hashes.lock().unwrap();
		Ok(hashes.get(key).and_then(|h| h.get(field)).cloned())
	}

	async fn hgetall(&self, key: &str) -> Result<Vec<(String, Vec<u8>)>> {
		let hashes = self.hashes.lock().unwrap();
		Ok(hashes.get(key).map(|h| h.iter().map(|(k, v)| (k.clone(), v.clone())).collect()).unwrap_or_default())
	}

	async fn hdel(&self, key: &str, field: &str) -> Result<u64> {
		let mut hashes = self.hashes.lock().unwrap();
		let removed = hashes.get_mut(key).map(|h| h.remove(field).is_some()).unwrap_or(false);
		Ok(removed as u64)
	}

	async fn hincrby(&self, key: &str, field: &str, by: i64) -> Result<i64> {
		let mut hashes = self.hashes.lock().unwrap();
		let h = hashes.entry(key.to_string()).or_default();
		let current: i64 = h.get(field).and_then(|v| std::str::from_utf8(v).ok()).and_then(|s| s.parse().ok()).unwrap_or(0);
		let updated = current + by;
		h.insert(field.to_string(), updated.to_string().into_bytes());
		Ok(updated)
	}

	async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<u64> {
		let receivers = self.broadcaster.send(KvMessage { channel: channel.to_string(), payload }).unwrap_or(0);
		Ok(receivers as u64)
	}

	async fn subscribe(&self, pattern: &str) -> Result<KvSubscription> {
		let mut source = self.broadcaster.subscribe();
		let (tx, rx) = mpsc::channel(256);
		let pattern = pattern.to_string();
		tokio::spawn(async move {
			loop {
				match source.recv().await {
					Ok(msg) if glob_match::glob_match(&pattern, &msg.channel) => {
						if tx.send(msg).await.is_err() {
							break;
						}
					}
					Ok(_) => continue,
					Err(broadcast::error::RecvError::Lagged(_)) => continue,
					Err(broadcast::error::RecvError::Closed) => break,
				}
			}
		});
		Ok(KvSubscription::from_receiver(rx))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn incr_applies_ttl_only_on_first_increment() {
		let kv = InMemoryKv::new();
		kv.incr("counter", 1, Some(Duration::from_secs(60))).await.unwrap();
		kv.incr("counter", 1, Some(Duration::from_secs(1))).await.unwrap();
		let map = kv.strings.lock().unwrap();
		let entry = map.get("counter").unwrap();
		assert!(entry.expires_at.unwrap() > Instant::now() + Duration::from_secs(30));
	}

	#[tokio::test]
	async fn pubsub_matches_wildcard_pattern() {
		let kv = InMemoryKv::new();
		let mut sub = kv.subscribe("ai:response:*").await.unwrap();
		kv.publish("ai:response:req-1", b"hello".to_vec()).await.unwrap();
		let msg = sub.recv().await.unwrap();
		assert_eq!(msg.channel, "ai:response:req-1");
		assert_eq!(msg.payload, b"hello");
	}
}
