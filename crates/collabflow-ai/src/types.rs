// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;

use collabflow_core::{ConnectionId, FlowId, ProjectId, RequestId, UserId};
use collabflow_flow::{Edge, Node};

/// The three intent shapes the collaboration coordinator forwards to
/// the AI worker (spec §4.8 "AI intents", §6 client events
/// `USER_MESSAGE_RECEIVED` / `USER_PLAN_APPROVED` / `IMAGE_UPLOAD_RECEIVED`).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AiIntent {
	UserMessage {
		message: String,
		#[serde(skip_serializing_if = "Option::is_none")]
		context: Option<Value>,
	},
	PlanApproved {
		plan_id: String,
		#[serde(skip_serializing_if = "Option::is_none")]
		flow_structure: Option<Value>,
		#[serde(skip_serializing_if = "Option::is_none")]
		modifications: Option<Value>,
	},
	ImageUpload {
		/// Base64-encoded image payload; the 10 MiB cap (spec §4.8) is
		/// enforced by the collaboration coordinator before this intent
		/// is constructed, not here.
		image_base64: String,
		#[serde(skip_serializing_if = "Option::is_none")]
		mime_type: Option<String>,
		#[serde(skip_serializing_if = "Option::is_none")]
		purpose: Option<String>,
	},
}

/// The envelope published on `ai:request:<requestId>` (spec §4.9).
/// `connection_id` is present so a response can be routed back to a
/// single client rather than the whole room.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AiRequest {
	pub request_id: RequestId,
	pub project_id: ProjectId,
	pub flow_id: Option<FlowId>,
	pub user_id: UserId,
	pub connection_id: ConnectionId,
	pub intent: AiIntent,
}

/// The envelope the worker publishes back on `ai:response:<requestId>`
/// (spec §4.9, §6 `ai_response` frame). When `connection_id` is set the
/// gateway delivers to that single client; otherwise it broadcasts to
/// the room identified by `project_id` (spec §4.8 "AI responses").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AiResponse {
	pub request_id: RequestId,
	pub project_id: ProjectId,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub connection_id: Option<ConnectionId>,
	pub response_type: String,
	pub content: Value,
	#[serde(default)]
	pub metadata: Value,
}

/// A flow-shaped delta proposed by the AI worker, published on
/// `flow:ghost:<projectId>` (spec §3 "Ghost proposal", §4.9). Not
/// persisted in the committed flow until a `USER_PLAN_APPROVED` intent
/// merges it via a normal mutation batch; discarded on client
/// disconnect per the Q3 resolution (SPEC_FULL).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GhostProposal {
	pub project_id: ProjectId,
	pub request_id: RequestId,
	pub plan_id: String,
	pub nodes: Vec<Node>,
	pub edges: Vec<Edge>,
}
