// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use collabflow_core::{CoreError, FlowId, UserId};
use collabflow_flow::{FlowDocument, FlowManager, MutationBatch};

/// One queued mutation batch, paired with a channel the drain task
/// uses to report the result back to whoever enqueued it (spec §4.8
/// "a single-consumer queue per active flow id").
pub struct QueueItem {
	pub user_id: UserId,
	pub batch: MutationBatch,
	pub reply: oneshot::Sender<std::result::Result<FlowDocument, CoreError>>,
}

const QUEUE_CAPACITY: usize = 256;

/// Spawns the drain task for one flow's serial queue and returns the
/// sender side. The task runs until its sender is dropped (i.e. the
/// coordinator removes the flow from its queue map once the room is
/// empty and no items remain pending) — spec §4.8 "when a flow has no
/// pending work and no members, its queue is disposed".
pub fn spawn_drain_task(flow_id: FlowId, flow_manager: Arc<FlowManager>) -> mpsc::Sender<QueueItem> {
	let (tx, mut rx) = mpsc::channel::<QueueItem>(QUEUE_CAPACITY);
	tokio::spawn(async move {
		while let Some(item) = rx.recv().await {
			let result = flow_manager
				.update_flow(&flow_id, item.batch, &item.user_id)
				.await
				.map_err(CoreError::from);
			let _ = item.reply.send(result);
		}
		tracing::debug!(%flow_id, "per-flow mutation queue disposed");
	});
	tx
}
