// Copyright (c) collabflow.dev 2026
// This file is licensed under the Apache-2.0

use serde::{Deserialize, Serialize};

/// A label on a user that parameterizes rate and connection limits
/// (spec glossary "Tier").
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
	Free,
	Pro,
	Enterprise,
}

impl Tier {
	pub fn as_str(self) -> &'static str {
		match self {
			Tier::Free => "free",
			Tier::Pro => "pro",
			Tier::Enterprise => "enterprise",
		}
	}
}

impl std::str::FromStr for Tier {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"free" => Ok(Tier::Free),
			"pro" => Ok(Tier::Pro),
			"enterprise" => Ok(Tier::Enterprise),
			_ => Err(()),
		}
	}
}
