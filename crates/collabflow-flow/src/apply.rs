// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use serde_json::Value;

use crate::error::{FlowError, Result};
use crate::model::{Edge, FlowDocument, Node, Position};
use crate::transaction::{MutationBatch, Transaction};

/// Applies every transaction in `batch` to `doc`, in order, mutating it
/// in place. The caller is expected to have deep-cloned `doc` first
/// (spec §4.7 step 2) so a failure partway through never leaves the
/// original visible — this function itself stops at the first error
/// and returns it, naming the offending transaction.
pub fn apply_batch(doc: &mut FlowDocument, batch: &MutationBatch) -> Result<()> {
	for tx in batch {
		apply_one(doc, tx).map_err(|err| match err {
			FlowError::Validation(msg) => {
				FlowError::Validation(format!("{} (transaction targeting '{}')", msg, tx.target_id()))
			}
			other => other,
		})?;
	}
	Ok(())
}

fn apply_one(doc: &mut FlowDocument, tx: &Transaction) -> Result<()> {
	match tx {
		Transaction::AddNode { id, node_type, position, data } => {
			if doc.has_node(id) {
				return Err(FlowError::Validation(format!("node '{id}' already exists")));
			}
			doc.nodes.push(Node {
				id: id.clone(),
				node_type: *node_type,
				position: position.unwrap_or(Position::default()),
				size: None,
				data: data.clone().unwrap_or_else(|| Value::Object(Default::default())),
			});
			Ok(())
		}
		Transaction::UpdateNode { id, node_type, position, data } => {
			let node = doc
				.find_node_mut(id)
				.ok_or_else(|| FlowError::Validation(format!("node '{id}' does not exist")))?;
			if let Some(node_type) = node_type {
				node.node_type = *node_type;
			}
			if let Some(position) = position {
				node.position = *position;
			}
			if let Some(data) = data {
				shallow_merge(&mut node.data, data);
			}
			Ok(())
		}
		Transaction::DeleteNode { id } => {
			// Q1: a missing id is a VALIDATION_ERROR, symmetric with
			// UPDATE_NODE and ADD_EDGE's endpoint checks (SPEC_FULL Q1).
			if !doc.has_node(id) {
				return Err(FlowError::Validation(format!("node '{id}' does not exist")));
			}
			doc.nodes.retain(|n| &n.id != id);
			// I3: cascading delete of every incident edge, in the same
			// transaction.
			doc.edges.retain(|e| &e.source != id && &e.target != id);
			Ok(())
		}
		Transaction::AddEdge { id, source, target, source_handle, target_handle, data } => {
			if doc.has_edge(id) {
				return Err(FlowError::Validation(format!("edge '{id}' already exists")));
			}
			if !doc.has_node(source) {
				return Err(FlowError::Validation(format!("edge source '{source}' does not exist")));
			}
			if !doc.has_node(target) {
				return Err(FlowError::Validation(format!("edge target '{target}' does not exist")));
			}
			doc.edges.push(Edge {
				id: id.clone(),
				source: source.clone(),
				target: target.clone(),
				source_handle: source_handle.clone(),
				target_handle: target_handle.clone(),
				label: None,
				style: None,
				edge_type: None,
				data: data.clone().unwrap_or_else(|| Value::Object(Default::default())),
			});
			Ok(())
		}
		Transaction::UpdateEdge { id, data } => {
			let edge = doc
				.find_edge_mut(id)
				.ok_or_else(|| FlowError::Validation(format!("edge '{id}' does not exist")))?;
			if let Some(data) = data {
				shallow_merge(&mut edge.data, data);
			}
			Ok(())
		}
		Transaction::DeleteEdge { id } => {
			// Spec §4.7: idempotent by design, absent is not an error.
			doc.edges.retain(|e| &e.id != id);
			Ok(())
		}
	}
}

fn shallow_merge(base: &mut Value, patch: &Value) {
	let (Value::Object(base_map), Value::Object(patch_map)) = (base.clone(), patch) else {
		*base = patch.clone();
		return;
	};
	let mut merged = base_map;
	for (key, value) in patch_map {
		merged.insert(key.clone(), value.clone());
	}
	*base = Value::Object(merged);
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::model::{FlowMetadata, FlowStatus, Version};
	use collabflow_core::{FlowId, UserId};

	fn empty_doc() -> FlowDocument {
		FlowDocument {
			id: FlowId::generate(),
			metadata: FlowMetadata {
				name: "test".into(),
				description: String::new(),
				version: Version::INITIAL,
				owner_id: UserId::new("owner"),
				project_id: "p1".into(),
				workspace_id: None,
				status: FlowStatus::Active,
				created_at: 0,
				updated_at: 0,
				last_modified_by: None,
			},
			nodes: Vec::new(),
			edges: Vec::new(),
		}
	}

	#[test]
	fn add_node_then_add_edge_succeeds() {
		let mut doc = empty_doc();
		let batch = vec![
			Transaction::AddNode {
				id: "start".into(),
				node_type: crate::model::NodeType::Start,
				position: None,
				data: None,
			},
			Transaction::AddNode {
				id: "s1".into(),
				node_type: crate::model::NodeType::Screen,
				position: Some(Position { x: 0.0, y: 100.0 }),
				data: None,
			},
			Transaction::AddEdge {
				id: "e1".into(),
				source: "start".into(),
				target: "s1".into(),
				source_handle: None,
				target_handle: None,
				data: None,
			},
		];
		apply_batch(&mut doc, &batch).unwrap();
		assert_eq!(doc.nodes.len(), 2);
		assert_eq!(doc.edges.len(), 1);
	}

	#[test]
	fn add_edge_to_missing_target_fails() {
		let mut doc = empty_doc();
		doc.nodes.push(Node {
			id: "a".into(),
			node_type: crate::model::NodeType::Start,
			position: Position::default(),
			size: None,
			data: json!({}),
		});
		let batch = vec![Transaction::AddEdge {
			id: "e".into(),
			source: "a".into(),
			target: "ghost".into(),
			source_handle: None,
			target_handle: None,
			data: None,
		}];
		let err = apply_batch(&mut doc, &batch).unwrap_err();
		assert!(matches!(err, FlowError::Validation(_)));
		assert!(doc.edges.is_empty());
	}

	#[test]
	fn delete_node_cascades_to_incident_edges() {
		let mut doc = empty_doc();
		for id in ["a", "b", "c"] {
			doc.nodes.push(Node {
				id: id.into(),
				node_type: crate::model::NodeType::Action,
				position: Position::default(),
				size: None,
				data: json!({}),
			});
		}
		doc.edges.push(Edge {
			id: "ab".into(),
			source: "a".into(),
			target: "b".into(),
			source_handle: None,
			target_handle: None,
			label: None,
			style: None,
			edge_type: None,
			data: json!({}),
		});
		doc.edges.push(Edge {
			id: "bc".into(),
			source: "b".into(),
			target: "c".into(),
			source_handle: None,
			target_handle: None,
			label: None,
			style: None,
			edge_type: None,
			data: json!({}),
		});
		apply_batch(&mut doc, &vec![Transaction::DeleteNode { id: "b".into() }]).unwrap();
		assert_eq!(doc.nodes.len(), 2);
		assert!(doc.edges.is_empty());
	}

	#[test]
	fn delete_edge_on_missing_id_is_a_no_op() {
		let mut doc = empty_doc();
		apply_batch(&mut doc, &vec![Transaction::DeleteEdge { id: "missing".into() }]).unwrap();
	}

	#[test]
	fn update_node_merges_data_shallowly() {
		let mut doc = empty_doc();
		doc.nodes.push(Node {
			id: "a".into(),
			node_type: crate::model::NodeType::Action,
			position: Position::default(),
			size: None,
			data: json!({"label": "old", "keep": true}),
		});
		apply_batch(
			&mut doc,
			&vec![Transaction::UpdateNode {
				id: "a".into(),
				node_type: None,
				position: None,
				data: Some(json!({"label": "new"})),
			}],
		)
		.unwrap();
		let node = doc.find_node("a").unwrap();
		assert_eq!(node.data, json!({"label": "new", "keep": true}));
	}
}
