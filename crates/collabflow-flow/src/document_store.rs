// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use collabflow_core::FlowId;

use crate::error::{FlowError, Result};
use crate::model::{FlowDocument, Version};

/// The authoritative storage boundary the flow manager writes through
/// (spec §4.7, SPEC_FULL C7). A production implementation backs this
/// with a document database; [`InMemoryDocumentStore`] here is a
/// complete, dependency-free implementation used by every crate's
/// tests and suitable for a single-process deployment.
#[async_trait]
pub trait DocumentStore: Send + Sync {
	async fn create(&self, doc: FlowDocument) -> Result<()>;

	async fn get(&self, flow_id: &FlowId) -> Result<Option<FlowDocument>>;

	/// Replaces the document if its currently stored version matches
	/// `expected_version`; returns `false` on a version mismatch rather
	/// than erroring, so the caller (C7) can translate it into a
	/// `SERVICE_UNAVAILABLE`/retry decision. This is belt-and-suspenders
	/// underneath C8's per-flow serialization (SPEC_FULL C7 notes).
	async fn replace_if_version(&self, flow_id: &FlowId, expected_version: Version, new_doc: FlowDocument) -> Result<bool>;

	async fn soft_delete(&self, flow_id: &FlowId, at_millis: i64) -> Result<()>;

	/// Appends a version snapshot to the audit log (spec §4.7 step 6).
	async fn append_version(&self, flow_id: &FlowId, snapshot: FlowDocument) -> Result<()>;

	async fn versions(&self, flow_id: &FlowId) -> Result<Vec<FlowDocument>>;
}

struct FlowSlot {
	current: FlowDocument,
	versions: Vec<FlowDocument>,
}

/// In-memory [`DocumentStore`]. Keeps the live document and its full
/// version history per flow id behind a `DashMap`, so distinct flows
/// never contend on the same lock (mirrors the fine-grained per-
/// resource locking spec §5 calls for).
#[derive(Default)]
pub struct InMemoryDocumentStore {
	flows: DashMap<String, FlowSlot>,
}

impl InMemoryDocumentStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn shared() -> Arc<Self> {
		Arc::new(Self::default())
	}
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
	async fn create(&self, doc: FlowDocument) -> Result<()> {
		let key = doc.id.as_str().to_string();
		self.flows.insert(key, FlowSlot { current: doc.clone(), versions: vec![doc] });
		Ok(())
	}

	async fn get(&self, flow_id: &FlowId) -> Result<Option<FlowDocument>> {
		Ok(self.flows.get(flow_id.as_str()).map(|slot| slot.current.clone()))
	}

	async fn replace_if_version(&self, flow_id: &FlowId, expected_version: Version, new_doc: FlowDocument) -> Result<bool> {
		let mut slot = self
			.flows
			.get_mut(flow_id.as_str())
			.ok_or_else(|| FlowError::NotFound(flow_id.to_string()))?;
		if slot.current.metadata.version != expected_version {
			return Ok(false);
		}
		slot.current = new_doc;
		Ok(true)
	}

	async fn soft_delete(&self, flow_id: &FlowId, at_millis: i64) -> Result<()> {
		let mut slot = self
			.flows
			.get_mut(flow_id.as_str())
			.ok_or_else(|| FlowError::NotFound(flow_id.to_string()))?;
		slot.current.metadata.status = crate::model::FlowStatus::Deleted;
		slot.current.metadata.updated_at = at_millis;
		Ok(())
	}

	async fn append_version(&self, flow_id: &FlowId, snapshot: FlowDocument) -> Result<()> {
		let mut slot = self
			.flows
			.get_mut(flow_id.as_str())
			.ok_or_else(|| FlowError::NotFound(flow_id.to_string()))?;
		slot.versions.push(snapshot);
		Ok(())
	}

	async fn versions(&self, flow_id: &FlowId) -> Result<Vec<FlowDocument>> {
		Ok(self.flows.get(flow_id.as_str()).map(|slot| slot.versions.clone()).unwrap_or_default())
	}
}
