// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::sync::Arc;

use collabflow_kv::KvStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::error::{EventBusError, Result};

/// A decoded event delivered to a subscriber: the concrete topic it
/// published on (not the subscribed pattern) plus the decoded payload.
#[derive(Debug)]
pub struct Delivery<T> {
	pub topic: String,
	pub payload: T,
}

/// A live typed subscription. Each `recv` decodes the next raw message;
/// a payload that fails to decode is logged and skipped rather than
/// ending the subscription, so one malformed publisher can't wedge
/// every other subscriber reading the same wildcard pattern.
pub struct Subscription<T> {
	inner: collabflow_kv::KvSubscription,
	_marker: std::marker::PhantomData<T>,
}

impl<T: DeserializeOwned> Subscription<T> {
	pub async fn recv(&mut self) -> Option<Delivery<T>> {
		loop {
			let msg = self.inner.recv().await?;
			match serde_json::from_slice::<T>(&msg.payload) {
				Ok(payload) => return Some(Delivery { topic: msg.channel, payload }),
				Err(err) => {
					tracing::warn!(error = %err, channel = %msg.channel, "dropping undecodable event payload");
					continue;
				}
			}
		}
	}
}

/// Typed publish/subscribe over [`KvStore`] channels (spec §4.4,
/// component C4). Ordering is per-topic, per-publisher FIFO; delivery
/// is at-most-once — there is no replay buffer, matching the spec's
/// explicit acceptance of lost messages across a subscriber restart.
pub struct EventBus {
	kv: Arc<dyn KvStore>,
}

impl EventBus {
	pub fn new(kv: Arc<dyn KvStore>) -> Self {
		Self { kv }
	}

	/// Serializes `payload` and publishes it on channel `topic`.
	#[instrument(skip(self, payload))]
	pub async fn publish<T: Serialize + std::fmt::Debug>(&self, topic: &str, payload: &T) -> Result<()> {
		let bytes = serde_json::to_vec(payload)?;
		self.kv.publish(topic, bytes).await.map_err(EventBusError::from)?;
		Ok(())
	}

	/// Subscribes to a (possibly wildcarded) topic pattern, e.g.
	/// `ai:response:*`.
	pub async fn subscribe<T: DeserializeOwned>(&self, pattern: &str) -> Result<Subscription<T>> {
		let inner = self.kv.subscribe(pattern).await.map_err(EventBusError::from)?;
		Ok(Subscription { inner, _marker: std::marker::PhantomData })
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use collabflow_testing::InMemoryKv;
	use serde::Deserialize;

	use super::*;

	#[derive(Serialize, Deserialize, Debug, PartialEq)]
	struct FlowUpdated {
		flow_id: String,
		user_id: String,
	}

	#[tokio::test]
	async fn publish_and_subscribe_round_trip_through_wildcard() {
		let bus = EventBus::new(Arc::new(InMemoryKv::new()));
		let mut sub = bus.subscribe::<FlowUpdated>("flow:update:*").await.unwrap();

		let event = FlowUpdated { flow_id: "f1".into(), user_id: "u1".into() };
		bus.publish("flow:update:f1", &event).await.unwrap();

		let delivery = sub.recv().await.unwrap();
		assert_eq!(delivery.topic, "flow:update:f1");
		assert_eq!(delivery.payload, event);
	}

	#[tokio::test]
	async fn non_matching_topics_are_not_delivered() {
		let bus = EventBus::new(Arc::new(InMemoryKv::new()));
		let mut sub = bus.subscribe::<FlowUpdated>("ai:response:*").await.unwrap();

		bus.publish("flow:update:f1", &FlowUpdated { flow_id: "f1".into(), user_id: "u1".into() })
			.await
			.unwrap();
		bus.publish("ai:response:r1", &FlowUpdated { flow_id: "f2".into(), user_id: "u2".into() })
			.await
			.unwrap();

		let delivery = sub.recv().await.unwrap();
		assert_eq!(delivery.topic, "ai:response:r1");
	}
}
