// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;

use collabflow_core::{FlowId, UserId};

/// A flow's semantic version (spec §3: `MAJOR.MINOR.PATCH`). `updateFlow`
/// bumps the patch component exactly once per committed batch (I5);
/// nothing in this crate ever touches major/minor directly.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Version {
	pub major: u64,
	pub minor: u64,
	pub patch: u64,
}

impl Version {
	pub const INITIAL: Version = Version { major: 1, minor: 0, patch: 0 };

	pub fn bump_patch(self) -> Self {
		Version { patch: self.patch + 1, ..self }
	}
}

impl std::fmt::Display for Version {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
	}
}

/// Whether a flow is live or soft-deleted (spec §4.7 `deleteFlow`,
/// design note "soft-delete vs physical delete").
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
	Active,
	Deleted,
}

/// `{x, y}` position, always present on a node (spec §3).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

/// `{w, h}` size, present only on nodes that carry one (frames, some
/// screens).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
	pub w: f64,
	pub h: f64,
}

/// The closed set of node variants (spec §3). Unknown tags are
/// rejected at deserialization by serde's default "unknown variant"
/// error — the boundary-level rejection SPEC_FULL design notes call
/// for ("reject unknown tags at the boundary").
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
	Start,
	End,
	Screen,
	Decision,
	Condition,
	Action,
	Note,
	Subflow,
	Frame,
}

/// A node in a flow document (spec §3). `data` is an opaque,
/// type-specific payload (condition branches, a subflow's referenced
/// flow id, a frame's contained node ids) — this crate never assumes
/// its shape beyond what a handful of helper accessors need to enforce
/// I4 and recompute I6.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
	pub id: String,
	#[serde(rename = "type")]
	pub node_type: NodeType,
	#[serde(default)]
	pub position: Position,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub size: Option<Size>,
	#[serde(default = "default_data")]
	pub data: Value,
}

fn default_data() -> Value {
	Value::Object(serde_json::Map::new())
}

/// A labeled branch declared on a `condition` node (spec §3, I4).
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Branch {
	pub id: String,
	#[serde(default)]
	pub label: Option<String>,
}

impl Node {
	/// The set of valid `sourceHandle` values for edges leaving this
	/// node, if it is a `condition` node with a well-formed
	/// `data.branches` array (I4). Non-condition nodes, or condition
	/// nodes with malformed branch data, yield an empty set — callers
	/// treat an empty set as "no handle restriction enforced" only when
	/// the node isn't actually a condition; validation distinguishes the
	/// two cases explicitly.
	pub fn condition_branch_ids(&self) -> Vec<String> {
		if self.node_type != NodeType::Condition {
			return Vec::new();
		}
		self.data
			.get("branches")
			.and_then(|v| serde_json::from_value::<Vec<Branch>>(v.clone()).ok())
			.map(|branches| branches.into_iter().map(|b| b.id).collect())
			.unwrap_or_default()
	}

	/// The node ids a `subflow` node's `data.flowId` refers to, if any.
	pub fn subflow_reference(&self) -> Option<String> {
		if self.node_type != NodeType::Subflow {
			return None;
		}
		self.data.get("flowId").and_then(|v| v.as_str()).map(str::to_owned)
	}
}

/// A directed connection between two nodes (spec §3).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
	pub id: String,
	pub source: String,
	pub target: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub source_handle: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub target_handle: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub label: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub style: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none", rename = "type")]
	pub edge_type: Option<String>,
	#[serde(default = "default_data")]
	pub data: Value,
}

/// A derived view of a `frame`-type node's containment (I6). Never
/// stored — recomputed on demand from node geometry by
/// [`crate::flow::FlowDocument::frame_views`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameView {
	pub frame_id: String,
	pub contained_node_ids: Vec<String>,
}

/// Human-facing and bookkeeping fields for a flow (spec §3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowMetadata {
	pub name: String,
	#[serde(default)]
	pub description: String,
	pub version: Version,
	pub owner_id: UserId,
	pub project_id: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub workspace_id: Option<String>,
	pub status: FlowStatus,
	pub created_at: i64,
	pub updated_at: i64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_modified_by: Option<UserId>,
}

/// The authoritative, document-store-backed shape of a flow (spec §3).
/// All in-memory copies held anywhere else (gateway rooms, the cache)
/// are just that — copies.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowDocument {
	pub id: FlowId,
	pub metadata: FlowMetadata,
	pub nodes: Vec<Node>,
	pub edges: Vec<Edge>,
}

impl FlowDocument {
	pub fn find_node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	pub fn find_node_mut(&mut self, id: &str) -> Option<&mut Node> {
		self.nodes.iter_mut().find(|n| n.id == id)
	}

	pub fn find_edge(&self, id: &str) -> Option<&Edge> {
		self.edges.iter().find(|e| e.id == id)
	}

	pub fn find_edge_mut(&mut self, id: &str) -> Option<&mut Edge> {
		self.edges.iter_mut().find(|e| e.id == id)
	}

	pub fn has_node(&self, id: &str) -> bool {
		self.nodes.iter().any(|n| n.id == id)
	}

	pub fn has_edge(&self, id: &str) -> bool {
		self.edges.iter().any(|e| e.id == id)
	}

	/// Recomputes every `frame`-type node's containment by geometric
	/// overlap of each candidate node's position with the frame's
	/// bounding box (I6: "recomputed, not user-authored").
	pub fn frame_views(&self) -> Vec<FrameView> {
		self.nodes
			.iter()
			.filter(|n| n.node_type == NodeType::Frame)
			.map(|frame| {
				let Some(size) = frame.size else {
					return FrameView { frame_id: frame.id.clone(), contained_node_ids: Vec::new() };
				};
				let (fx0, fy0) = (frame.position.x, frame.position.y);
				let (fx1, fy1) = (fx0 + size.w, fy0 + size.h);
				let contained = self
					.nodes
					.iter()
					.filter(|n| n.id != frame.id && n.node_type != NodeType::Frame)
					.filter(|n| {
						n.position.x >= fx0 && n.position.x <= fx1 && n.position.y >= fy0 && n.position.y <= fy1
					})
					.map(|n| n.id.clone())
					.collect();
				FrameView { frame_id: frame.id.clone(), contained_node_ids: contained }
			})
			.collect()
	}
}
