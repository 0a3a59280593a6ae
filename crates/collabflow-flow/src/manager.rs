// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use collabflow_cache::{CacheManager, Category};
use collabflow_core::{FlowId, UserId};
use collabflow_eventbus::{topics, EventBus};

use crate::apply::apply_batch;
use crate::document_store::DocumentStore;
use crate::error::{FlowError, Result};
use crate::model::{FlowDocument, FlowMetadata, FlowStatus, Version};
use crate::template::Template;
use crate::transaction::MutationBatch;
use crate::validate::validate_invariants;

/// Options accepted by [`FlowManager::create_flow`] (spec §4.7).
#[derive(Clone, Debug, Default)]
pub struct CreateFlowOptions {
	pub template: Option<Template>,
	pub name: Option<String>,
	pub description: Option<String>,
}

/// Scoping filters accepted by [`FlowManager::get_flow`] (spec §4.7
/// "projectId/workspaceId may be enforced to scope access").
#[derive(Clone, Debug, Default)]
pub struct GetFlowFilters {
	pub project_id: Option<String>,
	pub workspace_id: Option<String>,
}

/// Published on `flow:update:<flowId>` after a successful
/// [`FlowManager::update_flow`] (spec §4.7 step 8, §6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowUpdateEvent {
	pub flow_id: String,
	pub user_id: String,
	pub changes: MutationBatch,
	pub version: Version,
}

/// Owns authoritative flow documents: creation from template, cached
/// reads, transactional mutation with version bumps, and soft delete
/// (spec §4.7, component C7). The only machine state beyond the
/// document itself is "cached or not" — the cache is purely an
/// optimization.
pub struct FlowManager {
	store: Arc<dyn DocumentStore>,
	cache: Arc<CacheManager>,
	bus: Arc<EventBus>,
}

impl FlowManager {
	pub fn new(store: Arc<dyn DocumentStore>, cache: Arc<CacheManager>, bus: Arc<EventBus>) -> Self {
		Self { store, cache, bus }
	}

	/// Builds a flow from a named template, validates it, inserts it,
	/// records version 1.0.0, and caches it (spec §4.7 `createFlow`).
	#[instrument(skip(self, opts))]
	pub async fn create_flow(
		&self,
		project_id: &str,
		workspace_id: Option<&str>,
		user_id: &UserId,
		opts: CreateFlowOptions,
	) -> Result<FlowDocument> {
		let (nodes, edges) = opts.template.unwrap_or(Template::Empty).build();
		let now = now_millis();
		let doc = FlowDocument {
			id: FlowId::generate(),
			metadata: FlowMetadata {
				name: opts.name.unwrap_or_else(|| "Untitled flow".to_string()),
				description: opts.description.unwrap_or_default(),
				version: Version::INITIAL,
				owner_id: user_id.clone(),
				project_id: project_id.to_string(),
				workspace_id: workspace_id.map(str::to_string),
				status: FlowStatus::Active,
				created_at: now,
				updated_at: now,
				last_modified_by: None,
			},
			nodes,
			edges,
		};
		validate_invariants(&doc)?;

		self.store.create(doc.clone()).await?;
		self.cache.set(Category::Flows, doc.id.as_str(), &doc, None).await;
		Ok(doc)
	}

	/// Cache-first read, scoped by `filters` (spec §4.7 `getFlow`).
	/// Soft-deleted flows are reported as `NOT_FOUND` (design note
	/// "the cache must treat `status=deleted` as `NOT_FOUND` on read").
	#[instrument(skip(self, filters))]
	pub async fn get_flow(&self, flow_id: &FlowId, filters: &GetFlowFilters) -> Result<FlowDocument> {
		let doc = match self.cache.get::<FlowDocument>(Category::Flows, flow_id.as_str()).await {
			Some(doc) => doc,
			None => {
				let doc = self
					.store
					.get(flow_id)
					.await?
					.ok_or_else(|| FlowError::NotFound(flow_id.to_string()))?;
				self.cache.set(Category::Flows, flow_id.as_str(), &doc, None).await;
				doc
			}
		};

		if doc.metadata.status == FlowStatus::Deleted {
			return Err(FlowError::NotFound(flow_id.to_string()));
		}
		if let Some(project_id) = &filters.project_id {
			if &doc.metadata.project_id != project_id {
				return Err(FlowError::NotFound(flow_id.to_string()));
			}
		}
		if let Some(workspace_id) = &filters.workspace_id {
			if doc.metadata.workspace_id.as_deref() != Some(workspace_id.as_str()) {
				return Err(FlowError::NotFound(flow_id.to_string()));
			}
		}
		Ok(doc)
	}

	/// Applies `transactions` atomically: load, deep-clone, apply, validate,
	/// bump version, replace, snapshot, invalidate cache, publish (spec
	/// §4.7 `updateFlow` steps 1-8). A failure at apply or validation
	/// aborts before anything is written.
	#[instrument(skip(self, transactions))]
	pub async fn update_flow(
		&self,
		flow_id: &FlowId,
		transactions: MutationBatch,
		user_id: &UserId,
	) -> Result<FlowDocument> {
		let current = self.get_flow(flow_id, &GetFlowFilters::default()).await?;
		let expected_version = current.metadata.version;

		let mut next = current.clone();
		apply_batch(&mut next, &transactions)?;
		validate_invariants(&next)?;

		let now = now_millis();
		next.metadata.updated_at = now;
		next.metadata.last_modified_by = Some(user_id.clone());
		next.metadata.version = expected_version.bump_patch();

		let replaced = self.store.replace_if_version(flow_id, expected_version, next.clone()).await?;
		if !replaced {
			return Err(FlowError::VersionConflict(flow_id.to_string()));
		}
		self.store.append_version(flow_id, next.clone()).await?;

		self.cache.delete(Category::Flows, flow_id.as_str()).await;
		self.cache.invalidate_dependent(Category::Flows).await;

		let event = FlowUpdateEvent {
			flow_id: flow_id.to_string(),
			user_id: user_id.to_string(),
			changes: transactions,
			version: next.metadata.version,
		};
		self.bus.publish(&topics::flow_update(flow_id.as_str()), &event).await.map_err(|err| {
			tracing::warn!(error = %err, %flow_id, "flow updated but change notification failed to publish");
			FlowError::StoreUnavailable(err.to_string())
		})?;

		Ok(next)
	}

	/// Soft-deletes a flow: sets `status=deleted`, stamps timestamps,
	/// invalidates the cache entry. Version history is retained for
	/// audit (spec §4.7 `deleteFlow`).
	#[instrument(skip(self))]
	pub async fn delete_flow(&self, flow_id: &FlowId, _user_id: &UserId) -> Result<()> {
		self.store.soft_delete(flow_id, now_millis()).await?;
		self.cache.delete(Category::Flows, flow_id.as_str()).await;
		Ok(())
	}
}

fn now_millis() -> i64 {
	SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as i64
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use collabflow_cache::CacheManager;
	use collabflow_eventbus::EventBus;
	use collabflow_testing::InMemoryKv;

	use super::*;
	use crate::document_store::InMemoryDocumentStore;
	use crate::transaction::Transaction;
	use crate::model::{NodeType, Position};

	fn manager() -> FlowManager {
		let kv = Arc::new(InMemoryKv::new());
		let cache = Arc::new(CacheManager::new(kv.clone(), "cf"));
		let bus = Arc::new(EventBus::new(kv));
		FlowManager::new(InMemoryDocumentStore::shared(), cache, bus)
	}

	#[tokio::test]
	async fn create_then_get_round_trips() {
		let manager = manager();
		let user = UserId::new("u1");
		let created = manager.create_flow("proj", None, &user, CreateFlowOptions::default()).await.unwrap();
		let fetched = manager.get_flow(&created.id, &GetFlowFilters::default()).await.unwrap();
		assert_eq!(fetched.id, created.id);
		assert_eq!(fetched.metadata.version, Version::INITIAL);
	}

	#[tokio::test]
	async fn serial_mutation_bumps_version_and_invalidates_cache() {
		let manager = manager();
		let user = UserId::new("u1");
		let flow = manager.create_flow("proj", None, &user, CreateFlowOptions::default()).await.unwrap();

		let batch = vec![
			Transaction::AddNode {
				id: "s1".into(),
				node_type: NodeType::Screen,
				position: Some(Position { x: 0.0, y: 100.0 }),
				data: None,
			},
			Transaction::AddEdge {
				id: "e1".into(),
				source: "start".into(),
				target: "s1".into(),
				source_handle: None,
				target_handle: None,
				data: None,
			},
		];
		let updated = manager.update_flow(&flow.id, batch, &user).await.unwrap();
		assert_eq!(updated.metadata.version.to_string(), "1.0.1");
		assert_eq!(updated.nodes.len(), 2);
		assert_eq!(updated.edges.len(), 1);

		let refetched = manager.get_flow(&flow.id, &GetFlowFilters::default()).await.unwrap();
		assert_eq!(refetched.metadata.version.to_string(), "1.0.1");
	}

	#[tokio::test]
	async fn rejected_invariant_leaves_flow_unchanged() {
		let manager = manager();
		let user = UserId::new("u1");
		let flow = manager.create_flow("proj", None, &user, CreateFlowOptions::default()).await.unwrap();

		let batch = vec![Transaction::AddEdge {
			id: "e1".into(),
			source: "start".into(),
			target: "ghost".into(),
			source_handle: None,
			target_handle: None,
			data: None,
		}];
		let err = manager.update_flow(&flow.id, batch, &user).await.unwrap_err();
		assert!(matches!(err, FlowError::Validation(_)));

		let refetched = manager.get_flow(&flow.id, &GetFlowFilters::default()).await.unwrap();
		assert_eq!(refetched.metadata.version, Version::INITIAL);
		assert_eq!(refetched.edges.len(), 0);
	}

	#[tokio::test]
	async fn deleted_flow_reads_as_not_found() {
		let manager = manager();
		let user = UserId::new("u1");
		let flow = manager.create_flow("proj", None, &user, CreateFlowOptions::default()).await.unwrap();
		manager.delete_flow(&flow.id, &user).await.unwrap();
		let err = manager.get_flow(&flow.id, &GetFlowFilters::default()).await.unwrap_err();
		assert!(matches!(err, FlowError::NotFound(_)));
	}
}
