// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The policy registry.
//!
//! A [`Policy`] holds rules in declaration order and folds them into a single
//! [`Decision`]: the first rule that matches decides, and later rules are not
//! consulted. Declaring a `forbid` before a `grant` therefore makes the deny
//! win, and the reverse makes the grant win.
//!
//! Rules are declared with `&mut self` during setup. A built policy is read
//! concurrently by sharing it behind an `Arc`.

use std::fmt;

use tracing::{debug, instrument};
use warrant_config::{TraceLevel, WarrantConfig};

use crate::action::ActionSpec;
use crate::condition::Condition;
use crate::decision::{Decision, Described};
use crate::error::{PolicyError, PolicyResult};
use crate::hooks::{Hook, HookEvent, Hooks, Listener, ListenerId};
use crate::rule::{MatchDescription, MatchOptions, Rule, RuleSpec};
use crate::strategy::{FailureRequest, Principal, Strategies};
use crate::subject::Subject;
use crate::trace::Trail;

/// Per-call evaluation options.
#[derive(Debug, Clone)]
pub struct EvaluateOptions<U> {
	/// Users treated as absent from every rule's user field.
	pub exclude_users: Vec<U>,
}

impl<U> Default for EvaluateOptions<U> {
	fn default() -> Self {
		Self {
			exclude_users: Vec::new(),
		}
	}
}

impl<U> EvaluateOptions<U> {
	pub fn excluding(users: impl IntoIterator<Item = U>) -> Self {
		Self {
			exclude_users: users.into_iter().collect(),
		}
	}
}

struct Request<'a, U, T, C> {
	/// The user as passed by the caller.
	requested_user: &'a U,
	/// `requested_user` after `default_user` resolution.
	user: &'a U,
	action: &'a str,
	target: &'a T,
	context: &'a C,
}

/// Ordered rule registry for users `U`, targets `T` and request context `C`.
pub struct Policy<U, T, C = ()> {
	rules: Vec<Rule<U, T, C>>,
	strategies: Strategies<U, T>,
	trace: TraceLevel,
	hooks: Hooks<U, T, C>,
}

impl<U, T, C> Policy<U, T, C>
where
	U: Principal + PartialEq + 'static,
	T: fmt::Display + PartialEq + 'static,
{
	/// Creates an empty policy with the default strategies.
	pub fn new() -> Self {
		Self::with_strategies(Strategies::default())
	}

	pub fn from_config(config: &WarrantConfig) -> Self {
		Self::new().with_trace(config.trace.level)
	}
}

impl<U, T, C> Default for Policy<U, T, C>
where
	U: Principal + PartialEq + 'static,
	T: fmt::Display + PartialEq + 'static,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<U, T, C> Policy<U, T, C> {
	pub fn with_strategies(strategies: Strategies<U, T>) -> Self {
		Self {
			rules: Vec::new(),
			strategies,
			trace: TraceLevel::Off,
			hooks: Hooks::default(),
		}
	}

	pub fn with_trace(mut self, level: TraceLevel) -> Self {
		self.trace = level;
		self
	}

	pub fn set_trace(&mut self, level: TraceLevel) {
		self.trace = level;
	}

	pub fn trace_level(&self) -> TraceLevel {
		self.trace
	}

	pub fn strategies(&self) -> &Strategies<U, T> {
		&self.strategies
	}

	/// Rules in declaration order.
	pub fn rules(&self) -> &[Rule<U, T, C>] {
		&self.rules
	}

	pub fn len(&self) -> usize {
		self.rules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}

	/// Registers a listener. Registering the same `Arc` twice on one hook is
	/// an error.
	pub fn on(&mut self, hook: Hook, listener: Listener<U, T, C>) -> PolicyResult<ListenerId> {
		self.hooks.register(hook, listener)
	}

	/// Returns false if no such listener was registered on `hook`.
	pub fn off(&mut self, hook: Hook, id: ListenerId) -> bool {
		self.hooks.unregister(hook, id)
	}
}

impl<U, T, C> Policy<U, T, C>
where
	U: PartialEq + fmt::Display,
	T: PartialEq + fmt::Display,
{
	pub fn grant(
		&mut self,
		user: impl Into<Subject<U>>,
		action: impl Into<ActionSpec>,
		target: impl Into<Subject<T>>,
	) -> PolicyResult<&mut Self> {
		self.push(RuleSpec::allow(user, action, target))
	}

	pub fn forbid(
		&mut self,
		user: impl Into<Subject<U>>,
		action: impl Into<ActionSpec>,
		target: impl Into<Subject<T>>,
	) -> PolicyResult<&mut Self> {
		self.push(RuleSpec::deny(user, action, target))
	}

	/// Conditional grant. `None` is rejected rather than treated as
	/// unconditional.
	pub fn grant_when(
		&mut self,
		user: impl Into<Subject<U>>,
		action: impl Into<ActionSpec>,
		target: impl Into<Subject<T>>,
		condition: Option<Condition<U, T, C>>,
	) -> PolicyResult<&mut Self> {
		self.push_conditional(RuleSpec::allow(user, action, target), condition)
	}

	/// Conditional forbid. `None` is rejected rather than treated as
	/// unconditional.
	pub fn forbid_when(
		&mut self,
		user: impl Into<Subject<U>>,
		action: impl Into<ActionSpec>,
		target: impl Into<Subject<T>>,
		condition: Option<Condition<U, T, C>>,
	) -> PolicyResult<&mut Self> {
		self.push_conditional(RuleSpec::deny(user, action, target), condition)
	}

	/// Replaces every rule. Nothing changes unless all specs are valid.
	pub fn set_rules(&mut self, specs: impl IntoIterator<Item = RuleSpec<U, T, C>>) -> PolicyResult<()> {
		let rules = specs
			.into_iter()
			.map(Rule::new)
			.collect::<PolicyResult<Vec<_>>>()?;
		debug!(count = rules.len(), "policy rules replaced");
		self.rules = rules;
		Ok(())
	}

	fn push_conditional(
		&mut self,
		spec: RuleSpec<U, T, C>,
		condition: Option<Condition<U, T, C>>,
	) -> PolicyResult<&mut Self> {
		let Some(condition) = condition else {
			return Err(PolicyError::MissingCondition {
				user: spec.user.to_string(),
				action: spec.action.to_string(),
				target: spec.target.to_string(),
			});
		};
		self.push(spec.when(condition))
	}

	fn push(&mut self, spec: RuleSpec<U, T, C>) -> PolicyResult<&mut Self> {
		let rule = Rule::new(spec)?;
		debug!(rule = %rule, "rule declared");
		self.rules.push(rule);
		Ok(self)
	}

	/// Decides whether `user` may perform `action` on `target`.
	///
	/// Returns `Err` only when a fallible condition fails.
	pub fn evaluate(&self, user: &U, action: &str, target: &T, context: &C) -> PolicyResult<Decision> {
		self.evaluate_with(user, action, target, context, &EvaluateOptions::default())
	}

	#[instrument(
		level = "debug",
		skip(self, user, target, context, options),
		fields(
			user = %user,
			model = %target,
			excluded = options.exclude_users.len(),
		)
	)]
	pub fn evaluate_with(
		&self,
		user: &U,
		action: &str,
		target: &T,
		context: &C,
		options: &EvaluateOptions<U>,
	) -> PolicyResult<Decision> {
		let request = self.request(user, action, target, context);
		self.decide(&request, &options.exclude_users)
	}

	/// Like [`Policy::evaluate`], but returns which parts of the deciding rule
	/// matched. List fields report every matching element.
	pub fn describe<'r>(
		&'r self,
		user: &U,
		action: &str,
		target: &T,
		context: &C,
	) -> PolicyResult<Described<'r, U, T>> {
		self.describe_with(user, action, target, context, &EvaluateOptions::default())
	}

	#[instrument(
		level = "debug",
		skip(self, user, target, context, options),
		fields(
			user = %user,
			model = %target,
			excluded = options.exclude_users.len(),
		)
	)]
	pub fn describe_with<'r>(
		&'r self,
		user: &U,
		action: &str,
		target: &T,
		context: &C,
		options: &EvaluateOptions<U>,
	) -> PolicyResult<Described<'r, U, T>> {
		let request = self.request(user, action, target, context);
		let options = MatchOptions {
			exclude_users: &options.exclude_users,
			describe: true,
		};
		let trail = Trail::new(self.trace);

		let described = Described::from_match(self.scan(&request, &options, &trail)?);
		self.conclude(&request, described.decision(), &trail);
		Ok(described)
	}

	/// Succeeds only when the decision is [`Decision::Granted`].
	///
	/// Otherwise returns [`PolicyError::Unauthorized`] with a failure built by
	/// the `failure` strategy; its `denied` flag is set only when a deny rule
	/// matched.
	pub fn enforce(&self, user: &U, action: &str, target: &T, context: &C) -> PolicyResult<()> {
		let request = self.request(user, action, target, context);
		let decision = self.decide(&request, &[])?;
		if decision.is_granted() {
			return Ok(());
		}

		debug!(user = %request.user, action, decision = %decision, "authorization refused");
		let failure = self.strategies.failure(&FailureRequest {
			user: request.user,
			action,
			target,
			denied: decision.is_denied(),
		});
		Err(PolicyError::Unauthorized(failure))
	}

	fn request<'a>(&self, user: &'a U, action: &'a str, target: &'a T, context: &'a C) -> Request<'a, U, T, C> {
		Request {
			requested_user: user,
			user: self.strategies.default_user(user),
			action,
			target,
			context,
		}
	}

	fn decide(&self, request: &Request<'_, U, T, C>, exclude_users: &[U]) -> PolicyResult<Decision> {
		let options = MatchOptions {
			exclude_users,
			describe: false,
		};
		let trail = Trail::new(self.trace);

		let decision = self
			.scan(request, &options, &trail)?
			.map_or(Decision::Indeterminate, |matched| Decision::from_effect(matched.effect));
		self.conclude(request, decision, &trail);
		Ok(decision)
	}

	fn scan<'r>(
		&'r self,
		request: &Request<'_, U, T, C>,
		options: &MatchOptions<'_, U>,
		trail: &Trail,
	) -> PolicyResult<Option<MatchDescription<'r, U, T>>> {
		trail.begin(request.user, request.action, request.target, options.describe);
		self.emit(Hook::Evaluate, request, None, None);

		for rule in &self.rules {
			let matched = rule.matches_traced(
				&self.strategies,
				request.user,
				request.action,
				request.target,
				request.context,
				options,
				trail,
			)?;
			if let Some(description) = matched {
				trail.hit(rule, rule.effect());
				self.emit(Hook::RuleMatched, request, Some(rule), None);
				return Ok(Some(description));
			}
		}
		Ok(None)
	}

	fn conclude(&self, request: &Request<'_, U, T, C>, decision: Decision, trail: &Trail) {
		trail.finish(decision);
		self.emit(Hook::Decision, request, None, Some(decision));
	}

	fn emit(
		&self,
		hook: Hook,
		request: &Request<'_, U, T, C>,
		rule: Option<&Rule<U, T, C>>,
		decision: Option<Decision>,
	) {
		if self.hooks.is_empty() {
			return;
		}
		self.hooks.emit(&HookEvent {
			hook,
			user: request.requested_user,
			acting_user: request.user,
			action: request.action,
			target: request.target,
			context: request.context,
			rule,
			decision,
		});
	}
}

impl<U, T, C> fmt::Debug for Policy<U, T, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Policy")
			.field("rules", &self.rules.len())
			.field("trace", &self.trace)
			.field("hooks", &self.hooks)
			.finish()
	}
}
