// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

//! End-to-end scenarios 1-3 from spec §8, exercised against a real
//! [`FlowManager`] over the in-memory document store and cache.

use std::sync::Arc;

use collabflow_cache::CacheManager;
use collabflow_core::UserId;
use collabflow_eventbus::{topics, EventBus};
use collabflow_flow::{
	CreateFlowOptions, FlowError, FlowManager, FlowUpdateEvent, GetFlowFilters, InMemoryDocumentStore, NodeType,
	Position, Transaction,
};
use collabflow_testing::InMemoryKv;

fn manager_and_bus() -> (FlowManager, Arc<EventBus>) {
	let kv = Arc::new(InMemoryKv::new());
	let cache = Arc::new(CacheManager::new(kv.clone(), "cf"));
	let bus = Arc::new(EventBus::new(kv));
	(FlowManager::new(InMemoryDocumentStore::shared(), cache, bus.clone()), bus)
}

#[tokio::test]
async fn scenario_1_serial_mutations() {
	let (manager, bus) = manager_and_bus();
	let user = UserId::new("u1");
	let flow = manager.create_flow("proj", None, &user, CreateFlowOptions::default()).await.unwrap();

	let mut sub = bus.subscribe::<FlowUpdateEvent>(topics::flow_update_wildcard()).await.unwrap();

	let batch = vec![
		Transaction::AddNode {
			id: "s1".into(),
			node_type: NodeType::Screen,
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
	let updated = manager.update_flow(&flow.id, batch, &user).await.unwrap();

	assert_eq!(updated.metadata.version.to_string(), "1.0.1");
	assert_eq!(updated.nodes.len(), 2);
	assert_eq!(updated.edges.len(), 1);

	let delivery = sub.recv().await.unwrap();
	assert_eq!(delivery.payload.flow_id, flow.id.to_string());
	assert_eq!(delivery.payload.version.to_string(), "1.0.1");
}

#[tokio::test]
async fn scenario_2_cascading_delete() {
	let (manager, _bus) = manager_and_bus();
	let user = UserId::new("u1");
	let flow = manager.create_flow("proj", None, &user, CreateFlowOptions::default()).await.unwrap();

	let build = vec![
		Transaction::AddNode { id: "a".into(), node_type: NodeType::Screen, position: None, data: None },
		Transaction::AddNode { id: "b".into(), node_type: NodeType::Screen, position: None, data: None },
		Transaction::AddNode { id: "c".into(), node_type: NodeType::Screen, position: None, data: None },
		Transaction::AddEdge {
			id: "ab".into(),
			source: "a".into(),
			target: "b".into(),
			source_handle: None,
			target_handle: None,
			data: None,
		},
		Transaction::AddEdge {
			id: "bc".into(),
			source: "b".into(),
			target: "c".into(),
			source_handle: None,
			target_handle: None,
			data: None,
		},
	];
	manager.update_flow(&flow.id, build, &user).await.unwrap();

	let updated = manager
		.update_flow(&flow.id, vec![Transaction::DeleteNode { id: "b".into() }], &user)
		.await
		.unwrap();

	let remaining_ids: Vec<_> = updated.nodes.iter().map(|n| n.id.as_str()).collect();
	assert!(remaining_ids.contains(&"a"));
	assert!(remaining_ids.contains(&"c"));
	assert!(!remaining_ids.contains(&"b"));
	assert!(updated.edges.is_empty());
}

#[tokio::test]
async fn scenario_3_rejected_invariant_leaves_flow_unchanged_and_emits_nothing() {
	let (manager, bus) = manager_and_bus();
	let user = UserId::new("u1");
	let flow = manager.create_flow("proj", None, &user, CreateFlowOptions::default()).await.unwrap();

	let mut sub = bus.subscribe::<FlowUpdateEvent>(topics::flow_update_wildcard()).await.unwrap();

	let batch = vec![Transaction::AddEdge {
		id: "e".into(),
		source: "start".into(),
		target: "ghost".into(),
		source_handle: None,
		target_handle: None,
		data: None,
	}];
	let err = manager.update_flow(&flow.id, batch, &user).await.unwrap_err();
	assert!(matches!(err, FlowError::Validation(msg) if msg.contains("ghost")));

	let refetched = manager.get_flow(&flow.id, &GetFlowFilters::default()).await.unwrap();
	assert_eq!(refetched.metadata.version.to_string(), "1.0.0");
	assert!(refetched.edges.is_empty());

	// No event should have been published; publish something else and
	// confirm it's what we receive, proving no prior message is queued.
	manager
		.update_flow(
			&flow.id,
			vec![Transaction::AddNode { id: "ok".into(), node_type: NodeType::Screen, position: None, data: None }],
			&user,
		)
		.await
		.unwrap();
	let delivery = sub.recv().await.unwrap();
	assert_eq!(delivery.payload.version.to_string(), "1.0.1");
}
