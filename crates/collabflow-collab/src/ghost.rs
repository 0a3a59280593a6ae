// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use collabflow_flow::{Edge, Node, Transaction};

/// Converts an approved ghost subgraph into the mutation batch that
/// commits it as a normal part of the flow (spec §4.8
/// `USER_PLAN_APPROVED`: "converts the approved ghost subgraph into a
/// mutation batch"). Nodes are added before edges so I1 is satisfied
/// within the batch itself regardless of input ordering.
pub fn ghost_to_batch(nodes: Vec<Node>, edges: Vec<Edge>) -> Vec<Transaction> {
	let mut batch = Vec::with_capacity(nodes.len() + edges.len());
	for node in nodes {
		batch.push(Transaction::AddNode {
			id: node.id,
			node_type: node.node_type,
			position: Some(node.position),
			data: Some(node.data),
		});
	}
	for edge in edges {
		batch.push(Transaction::AddEdge {
			id: edge.id,
			source: edge.source,
			target: edge.target,
			source_handle: edge.source_handle,
			target_handle: edge.target_handle,
			data: Some(edge.data),
		});
	}
	batch
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use collabflow_flow::{NodeType, Position};

	#[test]
	fn nodes_precede_edges_regardless_of_input_order() {
		let nodes = vec![Node {
			id: "g1".into(),
			node_type: NodeType::Screen,
			position: Position { x: 1.0, y: 2.0 },
			size: None,
			data: json!({"ghost": true}),
		}];
		let edges = vec![Edge {
			id: "ge1".into(),
			source: "start".into(),
			target: "g1".into(),
			source_handle: None,
			target_handle: None,
			label: None,
			style: None,
			edge_type: None,
			data: json!({}),
		}];
		let batch = ghost_to_batch(nodes, edges);
		assert!(matches!(batch[0], Transaction::AddNode { .. }));
		assert!(matches!(batch[1], Transaction::AddEdge { .. }));
	}
}
