// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use serde::Serialize;

use crate::rule::{Effect, MatchDescription};

/// Outcome of evaluating a request against a policy.
///
/// `Indeterminate` means no rule had anything to say. It is not the same as
/// `Denied`, although `enforce` refuses both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
	Granted,
	Denied,
	Indeterminate,
}

impl Decision {
	/// Maps a rule verdict onto a decision.
	pub fn from_verdict(verdict: Option<bool>) -> Self {
		match verdict {
			Some(true) => Decision::Granted,
			Some(false) => Decision::Denied,
			None => Decision::Indeterminate,
		}
	}

	pub fn from_effect(effect: Effect) -> Self {
		match effect {
			Effect::Allow => Decision::Granted,
			Effect::Deny => Decision::Denied,
		}
	}

	pub fn is_granted(self) -> bool {
		self == Decision::Granted
	}

	pub fn is_denied(self) -> bool {
		self == Decision::Denied
	}

	pub fn is_indeterminate(self) -> bool {
		self == Decision::Indeterminate
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Decision::Granted => "granted",
			Decision::Denied => "denied",
			Decision::Indeterminate => "indeterminate",
		}
	}
}

impl fmt::Display for Decision {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Result of `Policy::describe`: the first matching rule's description,
/// tagged with whether it grants or denies.
#[derive(Debug, Clone)]
pub enum Described<'r, U, T> {
	Granted(MatchDescription<'r, U, T>),
	Denied(MatchDescription<'r, U, T>),
	Indeterminate,
}

impl<'r, U, T> Described<'r, U, T> {
	pub(crate) fn from_match(description: Option<MatchDescription<'r, U, T>>) -> Self {
		match description {
			Some(description) if description.effect == Effect::Deny => Described::Denied(description),
			Some(description) => Described::Granted(description),
			None => Described::Indeterminate,
		}
	}

	pub fn decision(&self) -> Decision {
		match self {
			Described::Granted(_) => Decision::Granted,
			Described::Denied(_) => Decision::Denied,
			Described::Indeterminate => Decision::Indeterminate,
		}
	}

	pub fn description(&self) -> Option<&MatchDescription<'r, U, T>> {
		match self {
			Described::Granted(description) | Described::Denied(description) => Some(description),
			Described::Indeterminate => None,
		}
	}

	pub fn into_description(self) -> Option<MatchDescription<'r, U, T>> {
		match self {
			Described::Granted(description) | Described::Denied(description) => Some(description),
			Described::Indeterminate => None,
		}
	}
}
