// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Synchronous lifecycle listeners.
//!
//! Listeners observe evaluation; they cannot change its outcome. They run in
//! registration order on the evaluating thread.

use std::fmt;
use std::sync::Arc;

use crate::decision::Decision;
use crate::error::{PolicyError, PolicyResult};
use crate::rule::Rule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
	/// Before the rule scan starts.
	Evaluate,
	/// When a rule produces a verdict.
	RuleMatched,
	/// After the scan, with the folded decision.
	Decision,
}

impl Hook {
	pub fn as_str(self) -> &'static str {
		match self {
			Hook::Evaluate => "evaluate",
			Hook::RuleMatched => "rule_matched",
			Hook::Decision => "decision",
		}
	}
}

impl fmt::Display for Hook {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Arguments passed to a listener.
///
/// `user` is exactly what the caller passed; `acting_user` is the subject the
/// rules were matched against, after `default_user` resolution. `rule` is set
/// for [`Hook::RuleMatched`] and `decision` for [`Hook::Decision`].
pub struct HookEvent<'a, U, T, C> {
	pub hook: Hook,
	pub user: &'a U,
	pub acting_user: &'a U,
	pub action: &'a str,
	pub target: &'a T,
	pub context: &'a C,
	pub rule: Option<&'a Rule<U, T, C>>,
	pub decision: Option<Decision>,
}

pub type Listener<U, T, C> = Arc<dyn Fn(&HookEvent<'_, U, T, C>) + Send + Sync>;

/// Wraps a closure as a [`Listener`]. Keep the returned `Arc` to register the
/// same listener on several hooks.
pub fn listener<U, T, C, F>(f: F) -> Listener<U, T, C>
where
	F: Fn(&HookEvent<'_, U, T, C>) + Send + Sync + 'static,
{
	Arc::new(f)
}

/// Handle returned by `Policy::on`, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration<U, T, C> {
	hook: Hook,
	id: ListenerId,
	listener: Listener<U, T, C>,
}

pub(crate) struct Hooks<U, T, C> {
	next_id: u64,
	registrations: Vec<Registration<U, T, C>>,
}

impl<U, T, C> Default for Hooks<U, T, C> {
	fn default() -> Self {
		Self {
			next_id: 0,
			registrations: Vec::new(),
		}
	}
}

impl<U, T, C> Hooks<U, T, C> {
	pub(crate) fn register(&mut self, hook: Hook, listener: Listener<U, T, C>) -> PolicyResult<ListenerId> {
		let duplicate = self
			.registrations
			.iter()
			.any(|r| r.hook == hook && Arc::ptr_eq(&r.listener, &listener));
		if duplicate {
			return Err(PolicyError::DuplicateListener(hook.as_str()));
		}

		let id = ListenerId(self.next_id);
		self.next_id += 1;
		self.registrations.push(Registration { hook, id, listener });
		Ok(id)
	}

	pub(crate) fn unregister(&mut self, hook: Hook, id: ListenerId) -> bool {
		let before = self.registrations.len();
		self.registrations.retain(|r| !(r.hook == hook && r.id == id));
		self.registrations.len() != before
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.registrations.is_empty()
	}

	pub(crate) fn emit(&self, event: &HookEvent<'_, U, T, C>) {
		for registration in self.registrations.iter().filter(|r| r.hook == event.hook) {
			(registration.listener)(event);
		}
	}
}

impl<U, T, C> fmt::Debug for Hooks<U, T, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Hooks")
			.field("listeners", &self.registrations.len())
			.finish()
	}
}
