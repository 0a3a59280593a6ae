// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;

use collabflow_core::{ConnectionId, FlowId, ProjectId, Tier, UserId};
use collabflow_flow::{MutationBatch, Position, Transaction};

use crate::error::{GatewayError, Result};

/// The closed C→S event vocabulary (spec §6). Tags are mixed-case in
/// the wire protocol (`join_project` vs `USER_MESSAGE_RECEIVED`) exactly
/// as the spec's table shows; an unrecognized `event` is rejected at the
/// boundary rather than silently ignored.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "event")]
pub enum ClientEvent {
	#[serde(rename = "join_project")]
	JoinProject { #[serde(rename = "flowId")] flow_id: FlowId },
	#[serde(rename = "leave_project")]
	LeaveProject { #[serde(rename = "flowId")] flow_id: FlowId },
	#[serde(rename = "cursor_position")]
	CursorPosition { #[serde(rename = "flowId")] flow_id: FlowId, position: Position },
	#[serde(rename = "selection_update")]
	SelectionUpdate { #[serde(rename = "flowId")] flow_id: FlowId, selection: Value },
	#[serde(rename = "flow_operation")]
	FlowOperation {
		#[serde(rename = "flowId")]
		flow_id: FlowId,
		#[serde(default)]
		operation: Option<Transaction>,
		#[serde(default)]
		batch: Option<MutationBatch>,
	},
	#[serde(rename = "USER_MESSAGE_RECEIVED")]
	UserMessageReceived {
		#[serde(rename = "projectId")]
		project_id: ProjectId,
		#[serde(default, rename = "flowId")]
		flow_id: Option<FlowId>,
		message: String,
		#[serde(default)]
		context: Option<Value>,
	},
	#[serde(rename = "USER_PLAN_APPROVED")]
	UserPlanApproved {
		#[serde(rename = "projectId")]
		project_id: ProjectId,
		#[serde(rename = "flowId")]
		flow_id: FlowId,
		#[serde(rename = "planId")]
		plan_id: String,
		#[serde(default, rename = "flowStructure")]
		flow_structure: Option<Value>,
		#[serde(default)]
		modifications: Option<Value>,
	},
	#[serde(rename = "IMAGE_UPLOAD_RECEIVED")]
	ImageUploadReceived {
		#[serde(rename = "projectId")]
		project_id: ProjectId,
		#[serde(rename = "imageData")]
		image_data: String,
		#[serde(default, rename = "mimeType")]
		mime_type: Option<String>,
		#[serde(default)]
		purpose: Option<String>,
	},
}

impl ClientEvent {
	pub fn decode(raw: &[u8]) -> Result<Self> {
		serde_json::from_slice(raw).map_err(|err| GatewayError::Malformed(err.to_string()))
	}
}

impl ClientEvent {
	/// Normalizes `flow_operation`'s two accepted shapes — a single
	/// `operation` or an ordered `batch` — into one batch (spec §6
	/// `flow_operation: {flowId, operation} or {flowId, batch}`).
	pub fn flow_operation_batch(operation: Option<Transaction>, batch: Option<MutationBatch>) -> Result<MutationBatch> {
		match (operation, batch) {
			(Some(op), None) => Ok(vec![op]),
			(None, Some(batch)) => Ok(batch),
			(Some(_), Some(_)) => Err(GatewayError::Malformed("flow_operation carries both operation and batch".into())),
			(None, None) => Err(GatewayError::Malformed("flow_operation carries neither operation nor batch".into())),
		}
	}
}

/// The closed S→C event vocabulary (spec §6).
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event")]
pub enum ServerEvent {
	#[serde(rename = "connected")]
	Connected { #[serde(rename = "connectionId")] connection_id: ConnectionId, #[serde(rename = "userId")] user_id: UserId, tier: Tier },
	#[serde(rename = "joined_project")]
	JoinedProject { #[serde(rename = "flowId")] flow_id: FlowId, users: Vec<RosterEntry> },
	#[serde(rename = "user_joined_project")]
	UserJoinedProject { #[serde(rename = "userId")] user_id: UserId, #[serde(rename = "flowId")] flow_id: FlowId, timestamp: i64 },
	#[serde(rename = "user_left_project")]
	UserLeftProject { #[serde(rename = "userId")] user_id: UserId, #[serde(rename = "flowId")] flow_id: FlowId, timestamp: i64 },
	#[serde(rename = "cursor_update")]
	CursorUpdate { #[serde(rename = "userId")] user_id: UserId, position: Position, timestamp: i64 },
	#[serde(rename = "selection_update")]
	SelectionUpdate { #[serde(rename = "userId")] user_id: UserId, selection: Value, timestamp: i64 },
	#[serde(rename = "flow_updated")]
	FlowUpdated { #[serde(rename = "flowId")] flow_id: FlowId, changes: MutationBatch, #[serde(rename = "userId")] user_id: UserId, timestamp: i64 },
	#[serde(rename = "ai_response")]
	AiResponse {
		#[serde(rename = "type")]
		response_type: String,
		content: Value,
		metadata: Value,
		timestamp: i64,
	},
	#[serde(rename = "message_acknowledged")]
	MessageAcknowledged { status: &'static str },
	#[serde(rename = "plan_approval_acknowledged")]
	PlanApprovalAcknowledged { status: &'static str },
	#[serde(rename = "image_upload_acknowledged")]
	ImageUploadAcknowledged { status: &'static str },
	#[serde(rename = "error")]
	Error {
		#[serde(rename = "type")]
		error_type: String,
		message: String,
	},
}

/// One `joined_project.users[]` entry (spec §6).
#[derive(Clone, Debug, Serialize)]
pub struct RosterEntry {
	#[serde(rename = "userId")]
	pub user_id: UserId,
	#[serde(rename = "connectionId")]
	pub connection_id: ConnectionId,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decodes_join_project_by_its_literal_event_tag() {
		let raw = br#"{"event":"join_project","flowId":"f1"}"#;
		let event = ClientEvent::decode(raw).unwrap();
		assert!(matches!(event, ClientEvent::JoinProject { flow_id } if flow_id.as_str() == "f1"));
	}

	#[test]
	fn decodes_screaming_snake_case_ai_intents() {
		let raw = br#"{"event":"USER_MESSAGE_RECEIVED","projectId":"p1","message":"hi"}"#;
		let event = ClientEvent::decode(raw).unwrap();
		assert!(matches!(event, ClientEvent::UserMessageReceived { .. }));
	}

	#[test]
	fn unknown_event_tag_is_rejected() {
		assert!(ClientEvent::decode(br#"{"event":"not_a_real_event"}"#).is_err());
	}

	#[test]
	fn flow_operation_batch_rejects_neither_shape() {
		assert!(ClientEvent::flow_operation_batch(None, None).is_err());
	}
}
