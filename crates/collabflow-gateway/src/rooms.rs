// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use dashmap::DashMap;
use tokio::sync::mpsc;

use collabflow_core::{ConnectionId, FlowId, ProjectId, Tier, UserId};

use crate::protocol::ServerEvent;

/// A connection's outbound frame channel plus the identity the gateway
/// authenticated it with (spec §3 "Session").
pub struct ConnectionHandle {
	pub user_id: UserId,
	pub tier: Tier,
	pub outbound: mpsc::UnboundedSender<ServerEvent>,
}

/// Local bookkeeping for connections and the flow/project rooms they've
/// joined, so `flow:update:*`/`ai:response:*`/`collaboration:*` events
/// from the event bus can be fanned out to this gateway instance's own
/// clients (spec §4.6 "Cross-instance delivery is via C4").
#[derive(Default)]
pub struct RoomRegistry {
	connections: DashMap<ConnectionId, ConnectionHandle>,
	flow_rooms: DashMap<FlowId, DashMap<ConnectionId, ()>>,
	project_rooms: DashMap<ProjectId, DashMap<ConnectionId, ()>>,
}

impl RoomRegistry {
	pub fn register(&self, connection_id: ConnectionId, handle: ConnectionHandle) {
		self.connections.insert(connection_id, handle);
	}

	/// Removes the connection from every room it had joined and drops its
	/// outbound handle (spec §4.6 disconnect: "removes the local
	/// session"). Returns the set of flow ids it had joined so the caller
	/// can tell the collaboration coordinator to leave each one.
	pub fn deregister(&self, connection_id: &ConnectionId) -> Vec<FlowId> {
		self.connections.remove(connection_id);
		let mut left = Vec::new();
		self.flow_rooms.retain(|flow_id, members| {
			if members.remove(connection_id).is_some() {
				left.push(flow_id.clone());
			}
			!members.is_empty()
		});
		self.project_rooms.retain(|_, members| {
			members.remove(connection_id);
			!members.is_empty()
		});
		left
	}

	pub fn join_flow_room(&self, flow_id: &FlowId, connection_id: ConnectionId) {
		self.flow_rooms.entry(flow_id.clone()).or_default().insert(connection_id, ());
	}

	pub fn leave_flow_room(&self, flow_id: &FlowId, connection_id: &ConnectionId) {
		if let Some(members) = self.flow_rooms.get(flow_id) {
			members.remove(connection_id);
		}
	}

	/// Registers standing interest in a project's AI-response broadcasts.
	/// The client protocol has no explicit `join_project_scope` event; a
	/// connection is implicitly enrolled the first time it sends a
	/// project-scoped AI intent (spec §4.8 "AI responses... broadcast to
	/// the room identified by projectId").
	pub fn touch_project_room(&self, project_id: &ProjectId, connection_id: ConnectionId) {
		self.project_rooms.entry(project_id.clone()).or_default().insert(connection_id, ());
	}

	pub fn send_to(&self, connection_id: &ConnectionId, event: ServerEvent) {
		if let Some(handle) = self.connections.get(connection_id) {
			let _ = handle.outbound.send(event);
		}
	}

	/// Delivers `event` to every member of `flow_id`'s room, optionally
	/// skipping `exclude` (spec §4.6 "except optionally the originator").
	/// A send failure for one member is dropped, never stops the fan-out
	/// (spec §7 "one bad member cannot starve a room").
	pub fn broadcast_flow(&self, flow_id: &FlowId, exclude: Option<&ConnectionId>, event: ServerEvent) {
		let Some(members) = self.flow_rooms.get(flow_id) else { return };
		for member in members.iter() {
			let connection_id = member.key();
			if exclude == Some(connection_id) {
				continue;
			}
			self.send_to(connection_id, event.clone());
		}
	}

	pub fn broadcast_project(&self, project_id: &ProjectId, event: ServerEvent) {
		let Some(members) = self.project_rooms.get(project_id) else { return };
		for member in members.iter() {
			self.send_to(member.key(), event.clone());
		}
	}

	pub fn tier_of(&self, connection_id: &ConnectionId) -> Option<Tier> {
		self.connections.get(connection_id).map(|h| h.tier)
	}
}
