// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{NodeType, Position};

/// A single structural change (spec §3). An ordered list of these is a
/// mutation batch, applied atomically by
/// [`crate::manager::FlowManager::update_flow`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Transaction {
	AddNode {
		id: String,
		#[serde(rename = "type")]
		node_type: NodeType,
		#[serde(skip_serializing_if = "Option::is_none")]
		position: Option<Position>,
		#[serde(skip_serializing_if = "Option::is_none")]
		data: Option<Value>,
	},
	UpdateNode {
		id: String,
		#[serde(rename = "type", skip_serializing_if = "Option::is_none")]
		node_type: Option<NodeType>,
		#[serde(skip_serializing_if = "Option::is_none")]
		position: Option<Position>,
		#[serde(skip_serializing_if = "Option::is_none")]
		data: Option<Value>,
	},
	DeleteNode {
		id: String,
	},
	AddEdge {
		id: String,
		source: String,
		target: String,
		#[serde(skip_serializing_if = "Option::is_none")]
		source_handle: Option<String>,
		#[serde(skip_serializing_if = "Option::is_none")]
		target_handle: Option<String>,
		#[serde(skip_serializing_if = "Option::is_none")]
		data: Option<Value>,
	},
	UpdateEdge {
		id: String,
		#[serde(skip_serializing_if = "Option::is_none")]
		data: Option<Value>,
	},
	DeleteEdge {
		id: String,
	},
}

impl Transaction {
	/// The id the transaction targets, for error messages that "name
	/// the first offending transaction" (spec §4.7).
	pub fn target_id(&self) -> &str {
		match self {
			Transaction::AddNode { id, .. }
			| Transaction::UpdateNode { id, .. }
			| Transaction::DeleteNode { id }
			| Transaction::AddEdge { id, .. }
			| Transaction::UpdateEdge { id, .. }
			| Transaction::DeleteEdge { id } => id,
		}
	}
}

/// An ordered list of transactions applied atomically — either all
/// commit and the version increments once, or none are visible (spec
/// §3 "mutation batch").
pub type MutationBatch = Vec<Transaction>;
