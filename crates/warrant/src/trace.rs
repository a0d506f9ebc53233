// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Evaluation trail.
//!
//! Every event goes to the `warrant::trace` target at debug level, so hosts
//! route it with their usual `tracing-subscriber` filters. Events are only
//! produced when the policy's [`TraceLevel`] asks for them.

use std::fmt;

use tracing::debug;
use warrant_config::TraceLevel;

use crate::decision::Decision;
use crate::rule::Effect;

pub const TRACE_TARGET: &str = "warrant::trace";

/// The rule field at which matching stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
	User,
	Action,
	Target,
	Condition,
}

impl Field {
	fn as_str(self) -> &'static str {
		match self {
			Field::User => "user",
			Field::Action => "action",
			Field::Target => "target",
			Field::Condition => "condition",
		}
	}
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Trail {
	level: TraceLevel,
}

impl Trail {
	pub(crate) fn new(level: TraceLevel) -> Self {
		Self { level }
	}

	pub(crate) fn off() -> Self {
		Self::new(TraceLevel::Off)
	}

	pub(crate) fn begin(&self, user: &dyn fmt::Display, action: &str, target: &dyn fmt::Display, describe: bool) {
		if !self.level.is_enabled() {
			return;
		}
		debug!(
			target: TRACE_TARGET,
			user = %user,
			action,
			model = %target,
			describe,
			"evaluating request"
		);
	}

	/// User misses are the bulk of a scan, so they only appear at `Full`.
	pub(crate) fn miss(&self, rule: &dyn fmt::Display, field: Field) {
		let wanted = match field {
			Field::User => self.level.is_full(),
			_ => self.level.is_enabled(),
		};
		if !wanted {
			return;
		}
		debug!(target: TRACE_TARGET, rule = %rule, field = field.as_str(), "rule did not match");
	}

	pub(crate) fn hit(&self, rule: &dyn fmt::Display, effect: Effect) {
		if !self.level.is_enabled() {
			return;
		}
		debug!(target: TRACE_TARGET, rule = %rule, effect = effect.as_str(), "rule matched");
	}

	pub(crate) fn finish(&self, decision: Decision) {
		if !self.level.is_enabled() {
			return;
		}
		debug!(target: TRACE_TARGET, decision = decision.as_str(), "decision reached");
	}
}


#[cfg(test)]
mod tests {
	use super::capture::capture;
	use super::*;

	#[test]
	fn off_emits_nothing() {
		let ((), events) = capture(|| {
			let trail = Trail::off();
			trail.begin(&"alice", "edit", &"Post", false);
			trail.miss(&"rule", Field::Action);
			trail.hit(&"rule", Effect::Allow);
			trail.finish(Decision::Granted);
		});
		assert!(events.is_empty());
	}

	#[test]
	fn summary_skips_user_misses() {
		let ((), events) = capture(|| {
			let trail = Trail::new(TraceLevel::Summary);
			trail.miss(&"rule", Field::User);
			trail.miss(&"rule", Field::Target);
		});
		assert_eq!(events.len(), 1);
		assert_eq!(events[0].field("field"), Some("target"));
	}

	#[test]
	fn full_includes_user_misses() {
		let ((), events) = capture(|| {
			let trail = Trail::new(TraceLevel::Full);
			trail.miss(&"rule", Field::User);
		});
		assert_eq!(events.len(), 1);
		assert_eq!(events[0].field("field"), Some("user"));
	}

	#[test]
	fn finish_reports_decision() {
		let ((), events) = capture(|| {
			Trail::new(TraceLevel::Summary).finish(Decision::Indeterminate);
		});
		assert_eq!(events[0].message, "decision reached");
		assert_eq!(events[0].field("decision"), Some("indeterminate"));
	}
}
