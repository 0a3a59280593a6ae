// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use collabflow_core::{ConnectionId, UserId};
use collabflow_flow::Position;

/// The set of connections currently joined to a flow's room (spec §3
/// "Session / room"). Kept keyed by [`ConnectionId`] since a single
/// user may hold more than one open connection.
#[derive(Default)]
pub struct RoomState {
	members: HashMap<ConnectionId, UserId>,
}

impl RoomState {
	pub fn insert(&mut self, connection_id: ConnectionId, user_id: UserId) {
		self.members.insert(connection_id, user_id);
	}

	pub fn remove(&mut self, connection_id: &ConnectionId) {
		self.members.remove(connection_id);
	}

	pub fn contains(&self, connection_id: &ConnectionId) -> bool {
		self.members.contains_key(connection_id)
	}

	pub fn is_empty(&self) -> bool {
		self.members.is_empty()
	}

	pub fn roster(&self) -> Vec<RosterMember> {
		self.members
			.iter()
			.map(|(connection_id, user_id)| RosterMember { user_id: user_id.clone(), connection_id: connection_id.clone() })
			.collect()
	}
}

/// One entry of a room's roster (spec §6 `joined_project.users`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RosterMember {
	pub user_id: UserId,
	pub connection_id: ConnectionId,
}

/// A recently observed cursor, read back from the KV store on join
/// (spec §4.8 "recent cursor snapshots from KV").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CursorSnapshot {
	pub user_id: UserId,
	pub position: Position,
}

/// The full response to a `join_project` request (spec §6
/// `joined_project`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JoinResponse {
	pub roster: Vec<RosterMember>,
	pub cursors: Vec<CursorSnapshot>,
}
