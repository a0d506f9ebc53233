// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Action specifiers and their compiled matchers.
//!
//! Plain strings are compiled once, when a rule is declared:
//!
//! - `"manage"` and `"ALL"` become [`CompiledAction::Manage`] and match every action
//! - strings containing `*` become [`CompiledAction::Glob`], where `*` matches any substring
//! - everything else is a [`CompiledAction::Literal`] compared by equality
//!
//! A caller-supplied [`Regex`] is kept as [`CompiledAction::Pattern`], and a
//! list becomes [`CompiledAction::AnyOf`], each element compiled the same way.

use std::fmt;

use regex::Regex;

use crate::error::{PolicyError, PolicyResult};

/// Action that matches every request, including actions no other rule mentions.
pub const MANAGE: &str = "manage";
/// Alias for [`MANAGE`].
pub const ALL: &str = "ALL";

const WILDCARD: char = '*';

/// An action as declared by the caller, before compilation.
#[derive(Debug, Clone)]
pub enum ActionSpec {
	Named(String),
	Pattern(Regex),
	/// OR-combined: matches when any element matches. Elements may not be
	/// lists themselves.
	AnyOf(Vec<ActionSpec>),
}

impl From<&str> for ActionSpec {
	fn from(action: &str) -> Self {
		ActionSpec::Named(action.to_string())
	}
}

impl From<String> for ActionSpec {
	fn from(action: String) -> Self {
		ActionSpec::Named(action)
	}
}

impl From<&String> for ActionSpec {
	fn from(action: &String) -> Self {
		ActionSpec::Named(action.clone())
	}
}

impl From<Regex> for ActionSpec {
	fn from(pattern: Regex) -> Self {
		ActionSpec::Pattern(pattern)
	}
}

impl<A: Into<ActionSpec>> From<Vec<A>> for ActionSpec {
	fn from(actions: Vec<A>) -> Self {
		ActionSpec::AnyOf(actions.into_iter().map(Into::into).collect())
	}
}

impl fmt::Display for ActionSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ActionSpec::Named(name) => f.write_str(name),
			ActionSpec::Pattern(pattern) => write!(f, "/{}/", pattern.as_str()),
			ActionSpec::AnyOf(actions) => write_list(f, actions.as_slice()),
		}
	}
}

/// A rule's action, compiled at declaration time.
#[derive(Debug, Clone)]
pub enum CompiledAction {
	Manage,
	Literal(String),
	Glob { source: String, pattern: Regex },
	Pattern(Regex),
	AnyOf(Vec<CompiledAction>),
}

impl CompiledAction {
	pub fn compile(spec: ActionSpec) -> PolicyResult<Self> {
		match spec {
			ActionSpec::AnyOf(actions) => {
				if actions.is_empty() {
					return Err(PolicyError::invalid_rule(
						"action",
						"empty list matches nothing; use a single action or \"manage\"",
					));
				}
				actions
					.into_iter()
					.map(|action| match action {
						ActionSpec::AnyOf(_) => Err(PolicyError::invalid_rule(
							"action",
							"action lists cannot be nested",
						)),
						single => Self::compile(single),
					})
					.collect::<PolicyResult<Vec<_>>>()
					.map(CompiledAction::AnyOf)
			}
			ActionSpec::Pattern(pattern) => Ok(CompiledAction::Pattern(pattern)),
			ActionSpec::Named(name) => {
				if name.is_empty() {
					return Err(PolicyError::invalid_rule("action", "action must not be empty"));
				}
				if name == MANAGE || name == ALL {
					return Ok(CompiledAction::Manage);
				}
				if name.contains(WILDCARD) {
					let pattern = glob_to_regex(&name)?;
					return Ok(CompiledAction::Glob {
						source: name,
						pattern,
					});
				}
				Ok(CompiledAction::Literal(name))
			}
		}
	}

	pub fn is_manage(&self) -> bool {
		matches!(self, CompiledAction::Manage)
	}

	/// Single actions yield themselves; lists yield their elements.
	pub fn elements(&self) -> &[CompiledAction] {
		match self {
			CompiledAction::AnyOf(actions) => actions,
			single => std::slice::from_ref(single),
		}
	}

	/// Tests a requested action against this one.
	pub fn matches(&self, action: &str) -> bool {
		match self {
			CompiledAction::Manage => true,
			CompiledAction::Literal(name) => name == action,
			CompiledAction::Glob { pattern, .. } | CompiledAction::Pattern(pattern) => {
				pattern.is_match(action)
			}
			CompiledAction::AnyOf(actions) => actions.iter().any(|declared| declared.matches(action)),
		}
	}

	/// Matches `action` element by element, with `compare` deciding each
	/// non-`manage` element.
	///
	/// Returns `None` on no match. When `all` is false the scan stops at the
	/// first hit; otherwise every matching element is collected.
	pub(crate) fn match_with(
		&self,
		action: &str,
		all: bool,
		compare: impl Fn(&str, &CompiledAction) -> bool,
	) -> Option<ActionMatch<'_>> {
		if self.is_manage() {
			return Some(ActionMatch::Any);
		}

		let mut hits = self
			.elements()
			.iter()
			.filter(|declared| declared.is_manage() || compare(action, *declared));

		let matched: Vec<&CompiledAction> = if all {
			hits.collect()
		} else {
			hits.next().into_iter().collect()
		};

		if matched.is_empty() {
			None
		} else {
			Some(ActionMatch::Matched(matched))
		}
	}
}

impl fmt::Display for CompiledAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CompiledAction::Manage => f.write_str(MANAGE),
			CompiledAction::Literal(name) => f.write_str(name),
			CompiledAction::Glob { source, .. } => f.write_str(source),
			CompiledAction::Pattern(pattern) => write!(f, "/{}/", pattern.as_str()),
			CompiledAction::AnyOf(actions) => write_list(f, actions.as_slice()),
		}
	}
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[impl fmt::Display]) -> fmt::Result {
	for (i, item) in items.iter().enumerate() {
		if i > 0 {
			f.write_str(",")?;
		}
		write!(f, "{item}")?;
	}
	Ok(())
}

/// Translates `*` into "any substring". Everything else is matched literally,
/// and the pattern is not anchored.
fn glob_to_regex(glob: &str) -> PolicyResult<Regex> {
	let translated = glob
		.split(WILDCARD)
		.map(regex::escape)
		.collect::<Vec<_>>()
		.join(".*");

	Regex::new(&translated).map_err(|source| PolicyError::InvalidPattern {
		action: glob.to_string(),
		source,
	})
}

/// How a rule's action field matched.
#[derive(Debug, Clone)]
pub enum ActionMatch<'a> {
	/// The rule was declared with `manage`.
	Any,
	/// The declared actions that matched. A single action yields one entry;
	/// a list yields the first hit, or every hit when describing.
	Matched(Vec<&'a CompiledAction>),
}

impl<'a> ActionMatch<'a> {
	pub fn is_any(&self) -> bool {
		matches!(self, ActionMatch::Any)
	}

	/// Matched declarations, empty for `Any`.
	pub fn actions(&self) -> &[&'a CompiledAction] {
		match self {
			ActionMatch::Any => &[],
			ActionMatch::Matched(actions) => actions,
		}
	}
}
