// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use std::time::Duration;

/// Advisory size tier (spec §4.2: "advisory — map to soft size caps at
/// the callsite, not hard eviction").
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Tier {
	Hot,
	Warm,
	Cold,
}

/// The recognized cache categories and their default TTLs (spec §4.2).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Category {
	Sessions,
	UserData,
	Flows,
	Knowledge,
	AiResponses,
	ApiResponses,
	Workspace,
	Billing,
	Config,
	Metrics,
}

impl Category {
	pub fn as_str(self) -> &'static str {
		match self {
			Category::Sessions => "sessions",
			Category::UserData => "user_data",
			Category::Flows => "flows",
			Category::Knowledge => "knowledge",
			Category::AiResponses => "ai_responses",
			Category::ApiResponses => "api_responses",
			Category::Workspace => "workspace",
			Category::Billing => "billing",
			Category::Config => "config",
			Category::Metrics => "metrics",
		}
	}

	pub fn default_ttl(self) -> Duration {
		let secs = match self {
			Category::Sessions => 1800,
			Category::UserData => 900,
			Category::Flows => 600,
			Category::Knowledge => 1800,
			Category::AiResponses => 3600,
			Category::ApiResponses => 300,
			Category::Workspace => 600,
			Category::Billing => 300,
			Category::Config => 3600,
			Category::Metrics => 60,
		};
		Duration::from_secs(secs)
	}

	pub fn tier(self) -> Tier {
		match self {
			Category::Sessions | Category::Metrics => Tier::Hot,
			Category::UserData
			| Category::Flows
			| Category::ApiResponses
			| Category::Workspace
			| Category::Billing => Tier::Warm,
			Category::Knowledge | Category::AiResponses | Category::Config => Tier::Cold,
		}
	}

	/// Declared downstream categories to invalidate when this one
	/// changes (spec §4.2 dependency graph).
	pub fn dependents(self) -> &'static [Category] {
		match self {
			Category::UserData => &[Category::Sessions, Category::Workspace],
			Category::Flows => &[Category::ApiResponses],
			_ => &[],
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ttls_match_spec_table() {
		assert_eq!(Category::Sessions.default_ttl(), Duration::from_secs(1800));
		assert_eq!(Category::ApiResponses.default_ttl(), Duration::from_secs(300));
		assert_eq!(Category::Metrics.default_ttl(), Duration::from_secs(60));
	}

	#[test]
	fn dependency_graph_matches_spec() {
		assert_eq!(Category::UserData.dependents(), &[Category::Sessions, Category::Workspace]);
		assert_eq!(Category::Flows.dependents(), &[Category::ApiResponses]);
		assert!(Category::Billing.dependents().is_empty());
	}
}
