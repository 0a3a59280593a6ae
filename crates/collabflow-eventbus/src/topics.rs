// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

//! Channel-name builders for the pub/sub topics named in spec §6, kept
//! in one place so a typo in a format string can't silently desync a
//! publisher from its subscriber's pattern.

pub fn ai_request(request_id: &str) -> String {
	format!("ai:request:{request_id}")
}

pub fn ai_response(request_id: &str) -> String {
	format!("ai:response:{request_id}")
}

pub fn ai_response_wildcard() -> &'static str {
	"ai:response:*"
}

pub fn flow_update(flow_id: &str) -> String {
	format!("flow:update:{flow_id}")
}

pub fn flow_update_wildcard() -> &'static str {
	"flow:update:*"
}

pub fn flow_ghost(project_id: &str) -> String {
	format!("flow:ghost:{project_id}")
}
