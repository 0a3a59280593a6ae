// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::instrument;

use collabflow_ai::{AiIntent, AiRequest};
use collabflow_core::{ConnectionId, FlowId, ProjectId, RequestId, UserId};
use collabflow_eventbus::{topics, EventBus};
use collabflow_flow::{Edge, FlowDocument, FlowManager, MutationBatch, Node};
use collabflow_kv::KvStore;

use crate::error::{CollabError, Result};
use crate::events::CollabEvent;
use crate::ghost::ghost_to_batch;
use crate::queue::{spawn_drain_task, QueueItem};
use crate::room::{CursorSnapshot, JoinResponse, RoomState};

const CURSOR_TTL: Duration = Duration::from_secs(60);
const IMAGE_UPLOAD_MAX_BYTES: usize = 10 * 1024 * 1024;

fn cursor_key(flow_id: &FlowId, user_id: &UserId) -> String {
	format!("cursor:{flow_id}:{user_id}")
}

fn collaboration_topic(flow_id: &FlowId) -> String {
	format!("collaboration:{flow_id}")
}

/// Sits between the gateway and the flow manager (spec §4.8, component
/// C8): serializes mutation batches per flow, tracks room membership
/// and ephemeral presence, and routes AI intents onto the event bus.
pub struct CollabCoordinator {
	kv: Arc<dyn KvStore>,
	bus: Arc<EventBus>,
	flow_manager: Arc<FlowManager>,
	rooms: DashMap<FlowId, RoomState>,
	queues: DashMap<FlowId, mpsc::Sender<QueueItem>>,
}

impl CollabCoordinator {
	pub fn new(kv: Arc<dyn KvStore>, bus: Arc<EventBus>, flow_manager: Arc<FlowManager>) -> Self {
		Self { kv, bus, flow_manager, rooms: DashMap::new(), queues: DashMap::new() }
	}

	fn queue_for(&self, flow_id: &FlowId) -> mpsc::Sender<QueueItem> {
		self.queues
			.entry(flow_id.clone())
			.or_insert_with(|| spawn_drain_task(flow_id.clone(), self.flow_manager.clone()))
			.clone()
	}

	/// Adds `connection_id` to `flow_id`'s room, publishes
	/// `user_joined_project`, and returns the current roster plus any
	/// live cursor snapshots (spec §4.8 `join_project`).
	#[instrument(skip(self))]
	pub async fn join_project(&self, flow_id: &FlowId, user_id: &UserId, connection_id: &ConnectionId) -> Result<JoinResponse> {
		let roster = {
			let mut room = self.rooms.entry(flow_id.clone()).or_default();
			room.insert(connection_id.clone(), user_id.clone());
			room.roster()
		};

		self.bus
			.publish(
				&collaboration_topic(flow_id),
				&CollabEvent::UserJoined { user_id: user_id.clone(), connection_id: connection_id.clone() },
			)
			.await
			.map_err(|e| CollabError::Unavailable(e.to_string()))?;

		let mut cursors = Vec::new();
		for member in &roster {
			if let Ok(Some(bytes)) = self.kv.get(&cursor_key(flow_id, &member.user_id)).await {
				if let Ok(position) = serde_json::from_slice(&bytes) {
					cursors.push(CursorSnapshot { user_id: member.user_id.clone(), position });
				}
			}
		}

		Ok(JoinResponse { roster, cursors })
	}

	/// Removes `connection_id` from `flow_id`'s room, deletes its
	/// cursor key, publishes `user_left_project`, and disposes the
	/// flow's mutation queue if the room is now empty (spec §4.8
	/// `leave_project`).
	#[instrument(skip(self))]
	pub async fn leave_project(&self, flow_id: &FlowId, user_id: &UserId, connection_id: &ConnectionId) -> Result<()> {
		let now_empty = {
			let Some(mut room) = self.rooms.get_mut(flow_id) else { return Ok(()) };
			room.remove(connection_id);
			room.is_empty()
		};

		let _ = self.kv.del(&[cursor_key(flow_id, user_id)]).await;

		self.bus
			.publish(
				&collaboration_topic(flow_id),
				&CollabEvent::UserLeft { user_id: user_id.clone(), connection_id: connection_id.clone() },
			)
			.await
			.map_err(|e| CollabError::Unavailable(e.to_string()))?;

		if now_empty {
			self.rooms.remove(flow_id);
			// Dropping the sender lets the drain task's `recv` return
			// `None` once any in-flight items finish, disposing it.
			self.queues.remove(flow_id);
		}

		Ok(())
	}

	/// Stores the cursor under a 60s TTL and broadcasts it, but only
	/// for a current room member — non-members are silently ignored
	/// (spec §4.8).
	pub async fn cursor_position(&self, flow_id: &FlowId, user_id: &UserId, connection_id: &ConnectionId, position: collabflow_flow::Position) -> Result<()> {
		if !self.is_member(flow_id, connection_id) {
			return Ok(());
		}
		let bytes = serde_json::to_vec(&position).map_err(|e| CollabError::Unavailable(e.to_string()))?;
		let _ = self.kv.set(&cursor_key(flow_id, user_id), bytes, Some(CURSOR_TTL)).await;
		self.bus
			.publish(
				&collaboration_topic(flow_id),
				&CollabEvent::CursorUpdate { user_id: user_id.clone(), connection_id: connection_id.clone(), position },
			)
			.await
			.map_err(|e| CollabError::Unavailable(e.to_string()))?;
		Ok(())
	}

	/// Broadcasts a selection; not persisted (spec §4.8). Non-members
	/// are silently ignored, same as cursor updates.
	pub async fn selection_update(&self, flow_id: &FlowId, user_id: &UserId, connection_id: &ConnectionId, selection: serde_json::Value) -> Result<()> {
		if !self.is_member(flow_id, connection_id) {
			return Ok(());
		}
		self.bus
			.publish(
				&collaboration_topic(flow_id),
				&CollabEvent::SelectionUpdate { user_id: user_id.clone(), connection_id: connection_id.clone(), selection },
			)
			.await
			.map_err(|e| CollabError::Unavailable(e.to_string()))?;
		Ok(())
	}

	fn is_member(&self, flow_id: &FlowId, connection_id: &ConnectionId) -> bool {
		self.rooms.get(flow_id).map(|room| room.contains(connection_id)).unwrap_or(false)
	}

	/// Enqueues `batch` on `flow_id`'s serial queue and awaits the
	/// result (spec §4.8: "a single-consumer queue per active flow
	/// id... drains call `C7.updateFlow`"). Non-members get
	/// `NOT_IN_PROJECT` (spec §4.8 "operations").
	#[instrument(skip(self, batch))]
	pub async fn flow_operation(&self, flow_id: &FlowId, user_id: &UserId, connection_id: &ConnectionId, batch: MutationBatch) -> Result<FlowDocument> {
		if !self.is_member(flow_id, connection_id) {
			return Err(CollabError::NotInProject);
		}
		let (reply_tx, reply_rx) = oneshot::channel();
		let sender = self.queue_for(flow_id);
		sender
			.send(QueueItem { user_id: user_id.clone(), batch, reply: reply_tx })
			.await
			.map_err(|_| CollabError::Unavailable("mutation queue closed".into()))?;
		let result = reply_rx.await.map_err(|_| CollabError::Unavailable("mutation queue dropped reply".into()))?;
		Ok(result?)
	}

	/// Publishes a `USER_MESSAGE_RECEIVED` intent on
	/// `ai:request:<requestId>` and returns the request id the caller
	/// acks with (spec §4.8).
	#[instrument(skip(self, message, context))]
	pub async fn user_message_received(
		&self,
		project_id: &ProjectId,
		flow_id: Option<FlowId>,
		user_id: &UserId,
		connection_id: &ConnectionId,
		message: String,
		context: Option<serde_json::Value>,
	) -> Result<RequestId> {
		let request_id = RequestId::generate();
		let request = AiRequest {
			request_id: request_id.clone(),
			project_id: project_id.clone(),
			flow_id,
			user_id: user_id.clone(),
			connection_id: connection_id.clone(),
			intent: AiIntent::UserMessage { message, context },
		};
		self.bus
			.publish(&topics::ai_request(request_id.as_str()), &request)
			.await
			.map_err(|e| CollabError::Unavailable(e.to_string()))?;
		Ok(request_id)
	}

	/// Converts the approved ghost subgraph into a mutation batch and
	/// enqueues it on `flow_id`'s serial queue without waiting for it
	/// to apply; a failure surfaces asynchronously as
	/// `CollabEvent::OperationFailed` on `collaboration:<flowId>` (spec
	/// §4.8 `USER_PLAN_APPROVED`, "ack: {status: executing}").
	#[instrument(skip(self, nodes, edges))]
	pub async fn user_plan_approved(
		&self,
		flow_id: &FlowId,
		user_id: &UserId,
		connection_id: &ConnectionId,
		nodes: Vec<Node>,
		edges: Vec<Edge>,
	) -> Result<()> {
		let batch = ghost_to_batch(nodes, edges);
		let sender = self.queue_for(flow_id);
		let (reply_tx, reply_rx) = oneshot::channel();
		sender
			.send(QueueItem { user_id: user_id.clone(), batch, reply: reply_tx })
			.await
			.map_err(|_| CollabError::Unavailable("mutation queue closed".into()))?;

		let bus = self.bus.clone();
		let flow_id = flow_id.clone();
		let connection_id = connection_id.clone();
		tokio::spawn(async move {
			if let Ok(Err(err)) = reply_rx.await {
				let event = CollabEvent::OperationFailed {
					connection_id,
					error_type: err.kind.as_wire_tag().to_string(),
					reason: err.message,
				};
				if let Err(publish_err) = bus.publish(&collaboration_topic(&flow_id), &event).await {
					tracing::warn!(error = %publish_err, %flow_id, "failed to publish ghost-apply failure");
				}
			}
		});
		Ok(())
	}

	/// Decodes and size-checks an uploaded image (10 MiB cap, spec
	/// §4.8), then forwards it to the AI worker as an `ImageUpload`
	/// intent.
	#[instrument(skip(self, image_base64))]
	pub async fn image_upload_received(
		&self,
		project_id: &ProjectId,
		user_id: &UserId,
		connection_id: &ConnectionId,
		image_base64: String,
		mime_type: Option<String>,
		purpose: Option<String>,
	) -> Result<RequestId> {
		let decoded_len = BASE64.decode(&image_base64).map(|bytes| bytes.len()).unwrap_or(usize::MAX);
		if decoded_len > IMAGE_UPLOAD_MAX_BYTES {
			return Err(CollabError::SizeLimit);
		}

		let request_id = RequestId::generate();
		let request = AiRequest {
			request_id: request_id.clone(),
			project_id: project_id.clone(),
			flow_id: None,
			user_id: user_id.clone(),
			connection_id: connection_id.clone(),
			intent: AiIntent::ImageUpload { image_base64, mime_type, purpose },
		};
		self.bus
			.publish(&topics::ai_request(request_id.as_str()), &request)
			.await
			.map_err(|e| CollabError::Unavailable(e.to_string()))?;
		Ok(request_id)
	}
}
