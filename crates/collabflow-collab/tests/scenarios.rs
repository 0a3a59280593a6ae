// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::sync::Arc;

use collabflow_cache::CacheManager;
use collabflow_collab::CollabCoordinator;
use collabflow_core::{ConnectionId, UserId};
use collabflow_eventbus::EventBus;
use collabflow_flow::{CreateFlowOptions, FlowManager, InMemoryDocumentStore, NodeType, Position, Transaction};
use collabflow_testing::InMemoryKv;

fn coordinator() -> (Arc<CollabCoordinator>, Arc<FlowManager>) {
	let kv = Arc::new(InMemoryKv::new());
	let cache = Arc::new(CacheManager::new(kv.clone(), "cf"));
	let bus = Arc::new(EventBus::new(kv.clone()));
	let flow_manager = Arc::new(FlowManager::new(InMemoryDocumentStore::shared(), cache, bus.clone()));
	let coordinator = Arc::new(CollabCoordinator::new(kv, bus, flow_manager.clone()));
	(coordinator, flow_manager)
}

/// Scenario 4 (spec §8): two clients simultaneously submit `ADD_NODE{id=x}`
/// for the same flow. Exactly one succeeds; the other is rejected with a
/// validation error because the per-flow queue serializes them.
#[tokio::test]
async fn concurrent_add_node_to_same_flow_yields_exactly_one_success() {
	let (coordinator, flow_manager) = coordinator();
	let owner = UserId::new("owner");
	let flow = flow_manager.create_flow("proj", None, &owner, CreateFlowOptions::default()).await.unwrap();

	let conn_a = ConnectionId::new("conn-a");
	let conn_b = ConnectionId::new("conn-b");
	coordinator.join_project(&flow.id, &UserId::new("alice"), &conn_a).await.unwrap();
	coordinator.join_project(&flow.id, &UserId::new("bob"), &conn_b).await.unwrap();

	let batch_for = || {
		vec![Transaction::AddNode { id: "x".into(), node_type: NodeType::Screen, position: Some(Position { x: 1.0, y: 1.0 }), data: None }]
	};

	let (result_a, result_b) = tokio::join!(
		coordinator.flow_operation(&flow.id, &UserId::new("alice"), &conn_a, batch_for()),
		coordinator.flow_operation(&flow.id, &UserId::new("bob"), &conn_b, batch_for()),
	);

	let successes = [&result_a, &result_b].iter().filter(|r| r.is_ok()).count();
	assert_eq!(successes, 1, "exactly one of the two racing inserts should succeed");

	let failure = if result_a.is_err() { result_a } else { result_b };
	assert!(matches!(failure.unwrap_err(), collabflow_collab::CollabError::Core(_)));

	let final_doc = flow_manager.get_flow(&flow.id, &Default::default()).await.unwrap();
	assert_eq!(final_doc.nodes.iter().filter(|n| n.id == "x").count(), 1);
	assert_eq!(final_doc.metadata.version.to_string(), "1.0.1");
}

/// Scenario 5 (spec §8): join, move the cursor, then leave. The cursor key
/// is gone immediately on leave (well within the 60s TTL the spec allows).
#[tokio::test]
async fn presence_lifecycle_clears_cursor_key_on_leave() {
	let (coordinator, flow_manager) = coordinator();
	let owner = UserId::new("owner");
	let flow = flow_manager.create_flow("proj", None, &owner, CreateFlowOptions::default()).await.unwrap();

	let user = UserId::new("alice");
	let conn = ConnectionId::new("conn-1");
	coordinator.join_project(&flow.id, &user, &conn).await.unwrap();
	coordinator
		.cursor_position(&flow.id, &user, &conn, Position { x: 10.0, y: 20.0 })
		.await
		.unwrap();
	coordinator.leave_project(&flow.id, &user, &conn).await.unwrap();

	// leave_project deletes the cursor key synchronously; it must not
	// wait out the 60s TTL for a departed member's cursor to vanish.
	let join_again = coordinator.join_project(&flow.id, &UserId::new("bob"), &ConnectionId::new("conn-2")).await.unwrap();
	assert!(join_again.cursors.iter().all(|c| c.user_id != user));
}

/// A non-member's cursor update is silently ignored rather than erroring,
/// and never reaches the KV store (spec §4.8).
#[tokio::test]
async fn cursor_update_from_non_member_is_ignored() {
	let (coordinator, flow_manager) = coordinator();
	let owner = UserId::new("owner");
	let flow = flow_manager.create_flow("proj", None, &owner, CreateFlowOptions::default()).await.unwrap();

	let stranger = UserId::new("stranger");
	let stranger_conn = ConnectionId::new("stranger-conn");
	coordinator
		.cursor_position(&flow.id, &stranger, &stranger_conn, Position { x: 0.0, y: 0.0 })
		.await
		.unwrap();

	let join = coordinator.join_project(&flow.id, &UserId::new("alice"), &ConnectionId::new("alice-conn")).await.unwrap();
	assert!(join.cursors.is_empty());
}

/// A `flow_operation` from a connection that never joined the room is
/// rejected with `NotInProject`, not silently applied.
#[tokio::test]
async fn flow_operation_from_non_member_is_rejected() {
	let (coordinator, flow_manager) = coordinator();
	let owner = UserId::new("owner");
	let flow = flow_manager.create_flow("proj", None, &owner, CreateFlowOptions::default()).await.unwrap();

	let batch = vec![Transaction::AddNode { id: "x".into(), node_type: NodeType::Screen, position: None, data: None }];
	let err = coordinator
		.flow_operation(&flow.id, &UserId::new("intruder"), &ConnectionId::new("intruder-conn"), batch)
		.await
		.unwrap_err();
	assert!(matches!(err, collabflow_collab::CollabError::NotInProject));
}
