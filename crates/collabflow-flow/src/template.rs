// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::model::{Edge, Node, NodeType, Position};

/// The named starting points `createFlow` accepts (spec §4.7).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
	Empty,
	Basic,
	Ecommerce,
}

impl Template {
	/// Builds the starting `(nodes, edges)` for this template. Every
	/// template begins with a single `start` node id'd `"start"` (spec
	/// §8 scenario 1: "template `empty` (one `start` node id=`start`)").
	pub fn build(self) -> (Vec<Node>, Vec<Edge>) {
		match self {
			Template::Empty => (
				vec![Node {
					id: "start".into(),
					node_type: NodeType::Start,
					position: Position { x: 0.0, y: 0.0 },
					size: None,
					data: json!({}),
				}],
				Vec::new(),
			),
			Template::Basic => {
				let nodes = vec![
					Node {
						id: "start".into(),
						node_type: NodeType::Start,
						position: Position { x: 0.0, y: 0.0 },
						size: None,
						data: json!({}),
					},
					Node {
						id: "welcome".into(),
						node_type: NodeType::Screen,
						position: Position { x: 0.0, y: 150.0 },
						size: None,
						data: json!({"title": "Welcome"}),
					},
					Node {
						id: "end".into(),
						node_type: NodeType::End,
						position: Position { x: 0.0, y: 300.0 },
						size: None,
						data: json!({}),
					},
				];
				let edges = vec![
					Edge {
						id: "start-welcome".into(),
						source: "start".into(),
						target: "welcome".into(),
						source_handle: None,
						target_handle: None,
						label: None,
						style: None,
						edge_type: None,
						data: json!({}),
					},
					Edge {
						id: "welcome-end".into(),
						source: "welcome".into(),
						target: "end".into(),
						source_handle: None,
						target_handle: None,
						label: None,
						style: None,
						edge_type: None,
						data: json!({}),
					},
				];
				(nodes, edges)
			}
			Template::Ecommerce => {
				let nodes = vec![
					Node {
						id: "start".into(),
						node_type: NodeType::Start,
						position: Position { x: 0.0, y: 0.0 },
						size: None,
						data: json!({}),
					},
					Node {
						id: "browse".into(),
						node_type: NodeType::Screen,
						position: Position { x: 0.0, y: 150.0 },
						size: None,
						data: json!({"title": "Browse products"}),
					},
					Node {
						id: "in-stock".into(),
						node_type: NodeType::Condition,
						position: Position { x: 0.0, y: 300.0 },
						size: None,
						data: json!({"branches": [{"id": "yes", "label": "In stock"}, {"id": "no", "label": "Out of stock"}]}),
					},
					Node {
						id: "checkout".into(),
						node_type: NodeType::Screen,
						position: Position { x: -150.0, y: 450.0 },
						size: None,
						data: json!({"title": "Checkout"}),
					},
					Node {
						id: "notify".into(),
						node_type: NodeType::Action,
						position: Position { x: 150.0, y: 450.0 },
						size: None,
						data: json!({"action": "notify_when_available"}),
					},
					Node {
						id: "end".into(),
						node_type: NodeType::End,
						position: Position { x: 0.0, y: 600.0 },
						size: None,
						data: json!({}),
					},
				];
				let edges = vec![
					simple_edge("start-browse", "start", "browse"),
					simple_edge("browse-stock", "browse", "in-stock"),
					Edge {
						id: "stock-checkout".into(),
						source: "in-stock".into(),
						target: "checkout".into(),
						source_handle: Some("yes".into()),
						target_handle: None,
						label: None,
						style: None,
						edge_type: None,
						data: json!({}),
					},
					Edge {
						id: "stock-notify".into(),
						source: "in-stock".into(),
						target: "notify".into(),
						source_handle: Some("no".into()),
						target_handle: None,
						label: None,
						style: None,
						edge_type: None,
						data: json!({}),
					},
					simple_edge("checkout-end", "checkout", "end"),
					simple_edge("notify-end", "notify", "end"),
				];
				(nodes, edges)
			}
		}
	}
}

fn simple_edge(id: &str, source: &str, target: &str) -> Edge {
	Edge {
		id: id.into(),
		source: source.into(),
		target: target.into(),
		source_handle: None,
		target_handle: None,
		label: None,
		style: None,
		edge_type: None,
		data: json!({}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::validate::validate_invariants;
	use crate::model::{FlowDocument, FlowMetadata, FlowStatus, Version};
	use collabflow_core::{FlowId, UserId};

	fn wrap(template: Template) -> FlowDocument {
		let (nodes, edges) = template.build();
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

	#[test]
	fn every_template_satisfies_invariants() {
		for template in [Template::Empty, Template::Basic, Template::Ecommerce] {
			let doc = wrap(template);
			assert!(validate_invariants(&doc).is_ok(), "{template:?} failed validation");
		}
	}

	#[test]
	fn empty_template_has_a_single_start_node() {
		let doc = wrap(Template::Empty);
		assert_eq!(doc.nodes.len(), 1);
		assert_eq!(doc.nodes[0].id, "start");
		assert_eq!(doc.nodes[0].node_type, NodeType::Start);
	}
}
