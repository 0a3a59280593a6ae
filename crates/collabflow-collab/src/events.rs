// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;

use collabflow_core::{ConnectionId, UserId};
use collabflow_flow::Position;

/// Published on `collaboration:<flowId>` (spec §6 pub/sub channel
/// `collaboration:*`). A gateway subscribed to its own flows' channels
/// forwards these to local room members, translating them into the
/// wire-level S→C frames (spec §6).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollabEvent {
	UserJoined {
		user_id: UserId,
		connection_id: ConnectionId,
	},
	UserLeft {
		user_id: UserId,
		connection_id: ConnectionId,
	},
	CursorUpdate {
		user_id: UserId,
		connection_id: ConnectionId,
		position: Position,
	},
	SelectionUpdate {
		user_id: UserId,
		connection_id: ConnectionId,
		selection: Value,
	},
	/// A queued operation (spec §4.8 `USER_PLAN_APPROVED`) failed after
	/// the caller had already been ack'd; delivered back to the
	/// originating connection only (spec §4.8 "failure semantics").
	OperationFailed {
		connection_id: ConnectionId,
		error_type: String,
		reason: String,
	},
}

impl CollabEvent {
	/// The `connectionId` a gateway should address this to, if it's not
	/// meant for the whole room (spec §4.6 "to a specific connectionId
	/// when the publisher addressed one").
	pub fn target_connection(&self) -> Option<&ConnectionId> {
		match self {
			CollabEvent::OperationFailed { connection_id, .. } => Some(connection_id),
			_ => None,
		}
	}

	/// The connection that originated this event, excluded from
	/// broadcast delivery by the gateway except where explicitly
	/// addressed (spec §4.6 "except optionally the originator").
	pub fn originator(&self) -> Option<&ConnectionId> {
		match self {
			CollabEvent::CursorUpdate { connection_id, .. } => Some(connection_id),
			CollabEvent::SelectionUpdate { connection_id, .. } => Some(connection_id),
			_ => None,
		}
	}
}
