// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Declarative permission rules.
//!
//! A [`Rule`] pairs a user, an action and a target with an optional
//! [`Condition`] and an [`Effect`]. Matching always runs in the same order,
//! stopping at the first field that fails:
//!
//! 1. **User**, with excluded users removed first
//! 2. **Action**, where `manage` matches unconditionally and a list matches
//!    when any element does
//! 3. **Target**
//! 4. **Condition**, invoked only once the other three matched

use std::fmt;

use serde::Serialize;

use crate::action::{ActionMatch, ActionSpec, CompiledAction};
use crate::condition::Condition;
use crate::error::PolicyResult;
use crate::strategy::Strategies;
use crate::subject::{FieldMatch, Subject};
use crate::trace::{Field, Trail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
	Allow,
	Deny,
}

impl Effect {
	pub fn as_str(self) -> &'static str {
		match self {
			Effect::Allow => "allow",
			Effect::Deny => "deny",
		}
	}
}

/// Uncompiled rule declaration, as accepted by `Policy::set_rules`.
#[derive(Debug, Clone)]
pub struct RuleSpec<U, T, C> {
	pub user: Subject<U>,
	pub action: ActionSpec,
	pub target: Subject<T>,
	pub condition: Option<Condition<U, T, C>>,
	pub effect: Effect,
}

impl<U, T, C> RuleSpec<U, T, C> {
	pub fn allow(
		user: impl Into<Subject<U>>,
		action: impl Into<ActionSpec>,
		target: impl Into<Subject<T>>,
	) -> Self {
		Self {
			user: user.into(),
			action: action.into(),
			target: target.into(),
			condition: None,
			effect: Effect::Allow,
		}
	}

	pub fn deny(
		user: impl Into<Subject<U>>,
		action: impl Into<ActionSpec>,
		target: impl Into<Subject<T>>,
	) -> Self {
		Self {
			effect: Effect::Deny,
			..Self::allow(user, action, target)
		}
	}

	pub fn when(mut self, condition: Condition<U, T, C>) -> Self {
		self.condition = Some(condition);
		self
	}
}

/// Flags that change how a rule is matched.
#[derive(Debug)]
pub struct MatchOptions<'a, U> {
	/// Users that can never satisfy a rule's user field.
	pub exclude_users: &'a [U],
	/// Collect every matching element of list fields instead of stopping at
	/// the first.
	pub describe: bool,
}

impl<U> Default for MatchOptions<'_, U> {
	fn default() -> Self {
		Self {
			exclude_users: &[],
			describe: false,
		}
	}
}

/// Which parts of a rule matched a request.
#[derive(Debug, Clone)]
pub struct MatchDescription<'r, U, T> {
	pub user: FieldMatch<'r, U>,
	pub action: ActionMatch<'r>,
	pub target: FieldMatch<'r, T>,
	/// Name of the condition that held, if the rule has one.
	pub condition: Option<&'r str>,
	pub effect: Effect,
}

/// A compiled permission rule. Immutable once built.
#[derive(Debug, Clone)]
pub struct Rule<U, T, C> {
	user: Subject<U>,
	action: CompiledAction,
	target: Subject<T>,
	condition: Option<Condition<U, T, C>>,
	effect: Effect,
}

impl<U, T, C> Rule<U, T, C> {
	/// Validates a declaration and compiles its action.
	pub fn new(spec: RuleSpec<U, T, C>) -> PolicyResult<Self> {
		spec.user.validate("user")?;
		spec.target.validate("target")?;
		let action = CompiledAction::compile(spec.action)?;

		Ok(Self {
			user: spec.user,
			action,
			target: spec.target,
			condition: spec.condition,
			effect: spec.effect,
		})
	}

	pub fn user(&self) -> &Subject<U> {
		&self.user
	}

	pub fn action(&self) -> &CompiledAction {
		&self.action
	}

	pub fn target(&self) -> &Subject<T> {
		&self.target
	}

	pub fn condition(&self) -> Option<&Condition<U, T, C>> {
		self.condition.as_ref()
	}

	pub fn effect(&self) -> Effect {
		self.effect
	}

	pub fn is_deny(&self) -> bool {
		self.effect == Effect::Deny
	}
}

impl<U, T, C> Rule<U, T, C>
where
	U: PartialEq + fmt::Display,
	T: PartialEq + fmt::Display,
{
	/// Returns a description of the match, or `None` if any field fails.
	///
	/// A deny rule that matches still returns `Some`; use [`Rule::verdict`]
	/// for the allow/deny answer. Errors come only from fallible conditions.
	pub fn matches<'r>(
		&'r self,
		strategies: &Strategies<U, T>,
		user: &U,
		action: &str,
		target: &T,
		context: &C,
		options: &MatchOptions<'_, U>,
	) -> PolicyResult<Option<MatchDescription<'r, U, T>>> {
		self.matches_traced(strategies, user, action, target, context, options, &Trail::off())
	}

	/// `Some(true)` for a matching allow rule, `Some(false)` for a matching
	/// deny rule, `None` when the rule has nothing to say.
	pub fn verdict(
		&self,
		strategies: &Strategies<U, T>,
		user: &U,
		action: &str,
		target: &T,
		context: &C,
		options: &MatchOptions<'_, U>,
	) -> PolicyResult<Option<bool>> {
		let matched = self.matches(strategies, user, action, target, context, options)?;
		Ok(matched.map(|_| !self.is_deny()))
	}

	#[allow(clippy::too_many_arguments)]
	pub(crate) fn matches_traced<'r>(
		&'r self,
		strategies: &Strategies<U, T>,
		user: &U,
		action: &str,
		target: &T,
		context: &C,
		options: &MatchOptions<'_, U>,
		trail: &Trail,
	) -> PolicyResult<Option<MatchDescription<'r, U, T>>> {
		let Some(user_match) = self.user.match_with(
			user,
			options.exclude_users,
			options.describe,
			|current, declared| strategies.compare_users(current, declared),
		) else {
			trail.miss(self, Field::User);
			return Ok(None);
		};

		let action_match = self.action.match_with(action, options.describe, |current, declared| {
			strategies.compare_actions(current, declared)
		});
		let Some(action_match) = action_match else {
			trail.miss(self, Field::Action);
			return Ok(None);
		};

		let target_match = self.target.match_with(target, &[], options.describe, |current, declared| {
			strategies.compare_targets(current, declared)
		});
		let Some(target_match) = target_match else {
			trail.miss(self, Field::Target);
			return Ok(None);
		};

		let condition = match &self.condition {
			Some(condition) => {
				if !condition.check(user, target, context, action)? {
					trail.miss(self, Field::Condition);
					return Ok(None);
				}
				Some(condition.name())
			}
			None => None,
		};

		Ok(Some(MatchDescription {
			user: user_match,
			action: action_match,
			target: target_match,
			condition,
			effect: self.effect,
		}))
	}
}

impl<U: fmt::Display, T: fmt::Display, C> fmt::Display for Rule<U, T, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let can = match self.effect {
			Effect::Allow => "can",
			Effect::Deny => "CANNOT",
		};
		write!(f, "{} {} {} {}", self.user, can, self.action, self.target)?;
		if let Some(condition) = &self.condition {
			write!(f, " if {}", condition.name())?;
		}
		Ok(())
	}
}
