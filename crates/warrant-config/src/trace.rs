// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Evaluation trace configuration section.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How much of the evaluation trail the policy engine emits.
///
/// `Summary` reports the request, every rule that got past the user check, and
/// the final decision. `Full` additionally reports rules skipped because the
/// user did not match, which is noisy for large rule sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceLevel {
	#[default]
	Off,
	Summary,
	Full,
}

impl TraceLevel {
	pub fn is_enabled(self) -> bool {
		self != TraceLevel::Off
	}

	pub fn is_full(self) -> bool {
		self == TraceLevel::Full
	}

	pub fn as_str(self) -> &'static str {
		match self {
			TraceLevel::Off => "off",
			TraceLevel::Summary => "summary",
			TraceLevel::Full => "full",
		}
	}
}

impl fmt::Display for TraceLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for TraceLevel {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"off" | "false" | "0" => Ok(TraceLevel::Off),
			"summary" | "true" | "1" => Ok(TraceLevel::Summary),
			"full" => Ok(TraceLevel::Full),
			other => Err(format!("unknown trace level '{other}'")),
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TraceConfigLayer {
	pub level: Option<TraceLevel>,
}

impl TraceConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.level.is_some() {
			self.level = other.level;
		}
	}

	pub fn finalize(self) -> TraceConfig {
		TraceConfig {
			level: self.level.unwrap_or_default(),
		}
	}
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TraceConfig {
	pub level: TraceLevel,
}
