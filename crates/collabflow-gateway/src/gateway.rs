// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, instrument, warn};

use collabflow_ai::AiResponse;
use collabflow_collab::{CollabCoordinator, CollabEvent};
use collabflow_core::{ConnectionId, CoreError, FlowId, Tier, UserId};
use collabflow_eventbus::{topics, EventBus};
use collabflow_flow::FlowUpdateEvent;
use collabflow_ratelimit::RateLimiter;

use crate::auth::verify_token;
use crate::error::{GatewayError, Result};
use crate::protocol::{ClientEvent, RosterEntry, ServerEvent};
use crate::rooms::{ConnectionHandle, RoomRegistry};

const COLLABORATION_TOPIC_PATTERN: &str = "collaboration:*";
const COLLABORATION_TOPIC_PREFIX: &str = "collaboration:";

/// Ties the auth/admission/per-connection protocol loop (spec §4.6) to
/// the collaboration coordinator (C8), rate limiter (C5), and event bus
/// (C4). One `Gateway` serves one process's share of connections;
/// cross-instance fan-out happens purely through the event bus.
pub struct Gateway {
	signing_key: Vec<u8>,
	rate_limiter: Arc<RateLimiter>,
	collab: Arc<CollabCoordinator>,
	bus: Arc<EventBus>,
	rooms: RoomRegistry,
}

impl Gateway {
	pub fn new(signing_key: Vec<u8>, rate_limiter: Arc<RateLimiter>, collab: Arc<CollabCoordinator>, bus: Arc<EventBus>) -> Arc<Self> {
		Arc::new(Self { signing_key, rate_limiter, collab, bus, rooms: RoomRegistry::default() })
	}

	/// Accepts connections on `listener` forever, and spawns the three
	/// background fan-out tasks that forward event-bus traffic to local
	/// clients. Never returns under normal operation.
	pub async fn serve(self: Arc<Self>, listener: TcpListener) {
		tokio::spawn(self.clone().forward_flow_updates());
		tokio::spawn(self.clone().forward_ai_responses());
		tokio::spawn(self.clone().forward_collaboration_events());

		loop {
			let (stream, peer) = match listener.accept().await {
				Ok(pair) => pair,
				Err(err) => {
					warn!(error = %err, "failed to accept connection");
					continue;
				}
			};
			let gateway = self.clone();
			tokio::spawn(async move {
				if let Err(err) = gateway.handle_connection(stream).await {
					warn!(error = %err, %peer, "connection ended with error");
				}
			});
		}
	}

	async fn forward_flow_updates(self: Arc<Self>) {
		let Ok(mut sub) = self.bus.subscribe::<FlowUpdateEvent>(topics::flow_update_wildcard()).await else {
			warn!("failed to subscribe to flow update events");
			return;
		};
		while let Some(delivery) = sub.recv().await {
			let event = delivery.payload;
			let flow_id = FlowId::new(event.flow_id);
			let server_event = ServerEvent::FlowUpdated {
				flow_id: flow_id.clone(),
				changes: event.changes,
				user_id: UserId::new(event.user_id),
				timestamp: now_millis(),
			};
			self.rooms.broadcast_flow(&flow_id, None, server_event);
		}
	}

	async fn forward_ai_responses(self: Arc<Self>) {
		let Ok(mut sub) = self.bus.subscribe::<AiResponse>(topics::ai_response_wildcard()).await else {
			warn!("failed to subscribe to AI response events");
			return;
		};
		while let Some(delivery) = sub.recv().await {
			let response = delivery.payload;
			let server_event = ServerEvent::AiResponse {
				response_type: response.response_type,
				content: response.content,
				metadata: response.metadata,
				timestamp: now_millis(),
			};
			match response.connection_id {
				Some(connection_id) => self.rooms.send_to(&connection_id, server_event),
				None => self.rooms.broadcast_project(&response.project_id, server_event),
			}
		}
	}

	async fn forward_collaboration_events(self: Arc<Self>) {
		let Ok(mut sub) = self.bus.subscribe::<CollabEvent>(COLLABORATION_TOPIC_PATTERN).await else {
			warn!("failed to subscribe to collaboration events");
			return;
		};
		while let Some(delivery) = sub.recv().await {
			let Some(flow_id_str) = delivery.topic.strip_prefix(COLLABORATION_TOPIC_PREFIX) else { continue };
			let flow_id = FlowId::new(flow_id_str);
			let event = delivery.payload;
			let now = now_millis();

			if let Some(connection_id) = event.target_connection() {
				if let CollabEvent::OperationFailed { error_type, reason, .. } = &event {
					self.rooms.send_to(connection_id, ServerEvent::Error { error_type: error_type.clone(), message: reason.clone() });
				}
				continue;
			}

			let originator = event.originator().cloned();
			let server_event = match event {
				CollabEvent::UserJoined { user_id, .. } => ServerEvent::UserJoinedProject { user_id, flow_id: flow_id.clone(), timestamp: now },
				CollabEvent::UserLeft { user_id, .. } => ServerEvent::UserLeftProject { user_id, flow_id: flow_id.clone(), timestamp: now },
				CollabEvent::CursorUpdate { user_id, position, .. } => ServerEvent::CursorUpdate { user_id, position, timestamp: now },
				CollabEvent::SelectionUpdate { user_id, selection, .. } => ServerEvent::SelectionUpdate { user_id, selection, timestamp: now },
				CollabEvent::OperationFailed { .. } => continue,
			};
			self.rooms.broadcast_flow(&flow_id, originator.as_ref(), server_event);
		}
	}

	#[instrument(skip(self, stream))]
	async fn handle_connection(self: Arc<Self>, stream: TcpStream) -> Result<()> {
		let ws_stream = tokio_tungstenite::accept_async(stream).await.map_err(|err| GatewayError::Malformed(err.to_string()))?;
		let (mut sink, mut stream) = ws_stream.split();

		let first = stream.next().await.ok_or_else(|| GatewayError::AuthFailed("connection closed before handshake".into()))?;
		let first = first.map_err(|err| GatewayError::AuthFailed(err.to_string()))?;
		let Message::Text(token_frame) = first else {
			return Err(GatewayError::AuthFailed("first frame must be the auth token".into()));
		};

		let claims = verify_token(&self.signing_key, &token_frame)?;
		let user_id = UserId::new(claims.user_id);

		let decision = self.rate_limiter.check_connection(user_id.as_str(), claims.tier).await.map_err(CoreError::from)?;
		if !decision.allowed {
			let _ = sink.send(encode(&ServerEvent::Error { error_type: "CONN_LIMIT".to_string(), message: decision.reason.unwrap_or_default() })).await;
			return Err(GatewayError::ConnLimit);
		}

		let connection_id = ConnectionId::generate();
		let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
		self.rooms.register(connection_id.clone(), ConnectionHandle { user_id: user_id.clone(), tier: claims.tier, outbound: outbound_tx.clone() });

		let writer = tokio::spawn(async move {
			while let Some(event) = outbound_rx.recv().await {
				if sink.send(encode(&event)).await.is_err() {
					break;
				}
			}
		});

		let _ = outbound_tx.send(ServerEvent::Connected { connection_id: connection_id.clone(), user_id: user_id.clone(), tier: claims.tier });

		while let Some(message) = stream.next().await {
			let message = match message {
				Ok(message) => message,
				Err(err) => {
					warn!(error = %err, %connection_id, "websocket read error");
					break;
				}
			};
			match message {
				Message::Text(text) => {
					self.dispatch(&connection_id, &user_id, claims.tier, text.as_bytes(), &outbound_tx).await;
				}
				Message::Binary(bytes) => {
					self.dispatch(&connection_id, &user_id, claims.tier, &bytes, &outbound_tx).await;
				}
				Message::Close(_) => break,
				_ => {}
			}
		}

		writer.abort();
		self.disconnect(&connection_id, &user_id, claims.tier).await;
		Ok(())
	}

	#[instrument(skip(self, raw, outbound))]
	async fn dispatch(&self, connection_id: &ConnectionId, user_id: &UserId, tier: Tier, raw: &[u8], outbound: &mpsc::UnboundedSender<ServerEvent>) {
		let decision = match self.rate_limiter.check_message(connection_id.as_str(), tier).await {
			Ok(decision) => decision,
			Err(err) => {
				warn!(error = %err, %connection_id, "rate limiter unavailable");
				return;
			}
		};
		if !decision.allowed {
			let _ = outbound.send(ServerEvent::Error { error_type: "RATE_LIMIT".to_string(), message: decision.reason.unwrap_or_default() });
			return;
		}

		let event = match ClientEvent::decode(raw) {
			Ok(event) => event,
			Err(err) => {
				let _ = outbound.send(ServerEvent::Error { error_type: "VALIDATION_ERROR".to_string(), message: err.to_string() });
				return;
			}
		};

		if let Err(err) = self.handle_event(connection_id, user_id, event, outbound).await {
			let core_err: CoreError = err.into();
			warn!(error = %core_err, %connection_id, "event handling failed");
			let _ = outbound.send(ServerEvent::Error { error_type: core_err.kind.as_wire_tag().to_string(), message: core_err.message });
		}
	}

	async fn handle_event(
		&self,
		connection_id: &ConnectionId,
		user_id: &UserId,
		event: ClientEvent,
		outbound: &mpsc::UnboundedSender<ServerEvent>,
	) -> Result<()> {
		match event {
			ClientEvent::JoinProject { flow_id } => {
				let response = self.collab.join_project(&flow_id, user_id, connection_id).await?;
				self.rooms.join_flow_room(&flow_id, connection_id.clone());
				let users = response.roster.into_iter().map(|m| RosterEntry { user_id: m.user_id, connection_id: m.connection_id }).collect();
				let _ = outbound.send(ServerEvent::JoinedProject { flow_id, users });
				for cursor in response.cursors {
					let _ = outbound.send(ServerEvent::CursorUpdate { user_id: cursor.user_id, position: cursor.position, timestamp: now_millis() });
				}
			}
			ClientEvent::LeaveProject { flow_id } => {
				self.collab.leave_project(&flow_id, user_id, connection_id).await?;
				self.rooms.leave_flow_room(&flow_id, connection_id);
			}
			ClientEvent::CursorPosition { flow_id, position } => {
				self.collab.cursor_position(&flow_id, user_id, connection_id, position).await?;
			}
			ClientEvent::SelectionUpdate { flow_id, selection } => {
				self.collab.selection_update(&flow_id, user_id, connection_id, selection).await?;
			}
			ClientEvent::FlowOperation { flow_id, operation, batch } => {
				let batch = ClientEvent::flow_operation_batch(operation, batch)?;
				self.collab.flow_operation(&flow_id, user_id, connection_id, batch).await?;
			}
			ClientEvent::UserMessageReceived { project_id, flow_id, message, context } => {
				self.rooms.touch_project_room(&project_id, connection_id.clone());
				self.collab.user_message_received(&project_id, flow_id, user_id, connection_id, message, context).await?;
				let _ = outbound.send(ServerEvent::MessageAcknowledged { status: "processing" });
			}
			ClientEvent::UserPlanApproved { project_id, flow_id, plan_id: _, flow_structure, modifications: _ } => {
				self.rooms.touch_project_room(&project_id, connection_id.clone());
				let (nodes, edges) = ghost_subgraph_from(flow_structure)?;
				self.collab.user_plan_approved(&flow_id, user_id, connection_id, nodes, edges).await?;
				let _ = outbound.send(ServerEvent::PlanApprovalAcknowledged { status: "executing" });
			}
			ClientEvent::ImageUploadReceived { project_id, image_data, mime_type, purpose } => {
				self.rooms.touch_project_room(&project_id, connection_id.clone());
				self.collab.image_upload_received(&project_id, user_id, connection_id, image_data, mime_type, purpose).await?;
				let _ = outbound.send(ServerEvent::ImageUploadAcknowledged { status: "analyzing" });
			}
		}
		Ok(())
	}

	async fn disconnect(&self, connection_id: &ConnectionId, user_id: &UserId, tier: Tier) {
		let joined_flows = self.rooms.deregister(connection_id);
		for flow_id in joined_flows {
			if let Err(err) = self.collab.leave_project(&flow_id, user_id, connection_id).await {
				warn!(error = %err, %flow_id, %connection_id, "failed to leave project on disconnect");
			}
		}
		if let Err(err) = self.rate_limiter.release_connection(user_id.as_str(), tier).await {
			warn!(error = %err, %connection_id, "failed to release connection slot on disconnect");
		}
		info!(%connection_id, "connection closed");
	}
}

fn ghost_subgraph_from(flow_structure: Option<serde_json::Value>) -> Result<(Vec<collabflow_flow::Node>, Vec<collabflow_flow::Edge>)> {
	let Some(value) = flow_structure else { return Ok((Vec::new(), Vec::new())) };
	#[derive(serde::Deserialize)]
	struct GhostSubgraph {
		#[serde(default)]
		nodes: Vec<collabflow_flow::Node>,
		#[serde(default)]
		edges: Vec<collabflow_flow::Edge>,
	}
	let parsed: GhostSubgraph = serde_json::from_value(value).map_err(|err| GatewayError::Malformed(err.to_string()))?;
	Ok((parsed.nodes, parsed.edges))
}

fn encode(event: &ServerEvent) -> Message {
	Message::Text(serde_json::to_string(event).expect("ServerEvent always serializes").into())
}

fn now_millis() -> i64 {
	SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as i64
}
