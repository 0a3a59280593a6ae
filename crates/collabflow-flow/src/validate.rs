// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::collections::HashSet;

use crate::error::{FlowError, Result};
use crate::model::{FlowDocument, NodeType};

/// Checks invariants I1, I2 and I4 against the full document (spec
/// §3, §4.7 step 3). I3 and I5 are enforced structurally by
/// [`crate::apply::apply_batch`] and
/// [`crate::manager::FlowManager::update_flow`] respectively; I6 has
/// nothing to validate since frame containment is never stored.
pub fn validate_invariants(doc: &FlowDocument) -> Result<()> {
	let mut node_ids = HashSet::with_capacity(doc.nodes.len());
	for node in &doc.nodes {
		if !node_ids.insert(node.id.as_str()) {
			return Err(FlowError::Validation(format!("duplicate node id '{}'", node.id)));
		}
	}

	let mut edge_ids = HashSet::with_capacity(doc.edges.len());
	for edge in &doc.edges {
		if !edge_ids.insert(edge.id.as_str()) {
			return Err(FlowError::Validation(format!("duplicate edge id '{}'", edge.id)));
		}
		// I1: both endpoints must exist in this flow.
		if !node_ids.contains(edge.source.as_str()) {
			return Err(FlowError::Validation(format!("edge '{}' source '{}' does not exist", edge.id, edge.source)));
		}
		if !node_ids.contains(edge.target.as_str()) {
			return Err(FlowError::Validation(format!("edge '{}' target '{}' does not exist", edge.id, edge.target)));
		}

		// I4: a source_handle leaving a condition node must name one of
		// its declared branches.
		if let (Some(handle), Some(source_node)) = (&edge.source_handle, doc.find_node(&edge.source)) {
			if source_node.node_type == NodeType::Condition {
				let branches = source_node.condition_branch_ids();
				if !branches.iter().any(|b| b == handle) {
					return Err(FlowError::Validation(format!(
						"edge '{}' sourceHandle '{handle}' is not a declared branch of condition node '{}'",
						edge.id, edge.source
					)));
				}
			}
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::model::{Edge, FlowMetadata, FlowStatus, Node, Position, Version};
	use collabflow_core::{FlowId, UserId};

	fn doc_with(nodes: Vec<Node>, edges: Vec<Edge>) -> FlowDocument {
		FlowDocument {
			id: FlowId::generate(),
			metadata: FlowMetadata {
				name: "t".into(),
				description: String::new(),
				version: Version::INITIAL,
				owner_id: UserId::new("o"),
				project_id: "p".into(),
				workspace_id: None,
				status: FlowStatus::Active,
				created_at: 0,
				updated_at: 0,
				last_modified_by: None,
			},
			nodes,
			edges,
		}
	}

	fn node(id: &str, node_type: NodeType, data: serde_json::Value) -> Node {
		Node { id: id.into(), node_type, position: Position::default(), size: None, data }
	}

	fn edge(id: &str, source: &str, target: &str, source_handle: Option<&str>) -> Edge {
		Edge {
			id: id.into(),
			source: source.into(),
			target: target.into(),
			source_handle: source_handle.map(String::from),
			target_handle: None,
			label: None,
			style: None,
			edge_type: None,
			data: json!({}),
		}
	}

	#[test]
	fn rejects_edge_with_missing_endpoint() {
		let doc = doc_with(vec![node("a", NodeType::Action, json!({}))], vec![edge("e", "a", "ghost", None)]);
		assert!(matches!(validate_invariants(&doc), Err(FlowError::Validation(_))));
	}

	#[test]
	fn rejects_unknown_condition_branch_handle() {
		let condition = node("c", NodeType::Condition, json!({"branches": [{"id": "yes"}, {"id": "no"}]}));
		let target = node("t", NodeType::Action, json!({}));
		let doc = doc_with(vec![condition, target], vec![edge("e", "c", "t", Some("maybe"))]);
		assert!(matches!(validate_invariants(&doc), Err(FlowError::Validation(_))));
	}

	#[test]
	fn accepts_declared_condition_branch_handle() {
		let condition = node("c", NodeType::Condition, json!({"branches": [{"id": "yes"}, {"id": "no"}]}));
		let target = node("t", NodeType::Action, json!({}));
		let doc = doc_with(vec![condition, target], vec![edge("e", "c", "t", Some("yes"))]);
		assert!(validate_invariants(&doc).is_ok());
	}
}
