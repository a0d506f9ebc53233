// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pluggable comparison strategies shared by every rule in a policy.
//!
//! A [`Strategies`] value is handed to the policy once, at construction. Rules
//! never hold a copy; the policy passes its strategies in on every evaluation,
//! so replacing a strategy affects all rules at once.
//!
//! | strategy | default |
//! |----------|---------|
//! | `default_user` | [`identity`] |
//! | `user_compare` | [`equals`] |
//! | `target_compare` | [`equals`] |
//! | `action_compare` | [`action_matches`] |
//! | `failure` | [`build_failure`] |

use std::fmt;
use std::sync::Arc;

use crate::action::CompiledAction;
use crate::error::AuthorizationFailure;

/// A user that can be named in an authorization failure.
///
/// `roles` is reported in the failure payload when the user carries a token.
pub trait Principal: fmt::Display {
	fn roles(&self) -> Option<Vec<String>> {
		None
	}
}

impl Principal for String {}
impl Principal for &str {}

/// Inputs to the failure builder.
#[derive(Debug)]
pub struct FailureRequest<'a, U, T> {
	pub user: &'a U,
	pub action: &'a str,
	pub target: &'a T,
	/// True when a deny rule matched, false when no rule matched.
	pub denied: bool,
}

type DefaultUserFn<U> = dyn for<'a> Fn(&'a U) -> &'a U + Send + Sync;
type CompareFn<V> = dyn Fn(&V, &V) -> bool + Send + Sync;
type ActionCompareFn = dyn Fn(&str, &CompiledAction) -> bool + Send + Sync;
type FailureFn<U, T> = dyn Fn(&FailureRequest<'_, U, T>) -> AuthorizationFailure + Send + Sync;

pub struct Strategies<U, T> {
	default_user: Arc<DefaultUserFn<U>>,
	user_compare: Arc<CompareFn<U>>,
	target_compare: Arc<CompareFn<T>>,
	action_compare: Arc<ActionCompareFn>,
	failure: Arc<FailureFn<U, T>>,
}

impl<U, T> Default for Strategies<U, T>
where
	U: Principal + PartialEq + 'static,
	T: fmt::Display + PartialEq + 'static,
{
	fn default() -> Self {
		Self {
			default_user: Arc::new(identity::<U>),
			user_compare: Arc::new(equals::<U>),
			target_compare: Arc::new(equals::<T>),
			action_compare: Arc::new(action_matches),
			failure: Arc::new(build_failure::<U, T>),
		}
	}
}

impl<U, T> Strategies<U, T> {
	/// Resolves the acting subject, e.g. unwrapping an impersonation session
	/// into the user it acts for.
	pub fn with_default_user<F>(mut self, f: F) -> Self
	where
		F: for<'a> Fn(&'a U) -> &'a U + Send + Sync + 'static,
	{
		self.default_user = Arc::new(f);
		self
	}

	/// Compares the requesting user (first) against a declared rule user.
	pub fn with_user_compare<F>(mut self, f: F) -> Self
	where
		F: Fn(&U, &U) -> bool + Send + Sync + 'static,
	{
		self.user_compare = Arc::new(f);
		self
	}

	/// Compares the requested target (first) against a declared rule target.
	pub fn with_target_compare<F>(mut self, f: F) -> Self
	where
		F: Fn(&T, &T) -> bool + Send + Sync + 'static,
	{
		self.target_compare = Arc::new(f);
		self
	}

	/// Compares the requested action against a rule's compiled action. Rules
	/// declared with `manage` match before this is consulted.
	pub fn with_action_compare<F>(mut self, f: F) -> Self
	where
		F: Fn(&str, &CompiledAction) -> bool + Send + Sync + 'static,
	{
		self.action_compare = Arc::new(f);
		self
	}

	pub fn with_failure<F>(mut self, f: F) -> Self
	where
		F: Fn(&FailureRequest<'_, U, T>) -> AuthorizationFailure + Send + Sync + 'static,
	{
		self.failure = Arc::new(f);
		self
	}

	pub fn default_user<'a>(&self, user: &'a U) -> &'a U {
		(self.default_user)(user)
	}

	pub fn compare_users(&self, current: &U, declared: &U) -> bool {
		(self.user_compare)(current, declared)
	}

	pub fn compare_targets(&self, current: &T, declared: &T) -> bool {
		(self.target_compare)(current, declared)
	}

	pub fn compare_actions(&self, action: &str, declared: &CompiledAction) -> bool {
		(self.action_compare)(action, declared)
	}

	pub fn failure(&self, request: &FailureRequest<'_, U, T>) -> AuthorizationFailure {
		(self.failure)(request)
	}
}

impl<U, T> Clone for Strategies<U, T> {
	fn clone(&self) -> Self {
		Self {
			default_user: Arc::clone(&self.default_user),
			user_compare: Arc::clone(&self.user_compare),
			target_compare: Arc::clone(&self.target_compare),
			action_compare: Arc::clone(&self.action_compare),
			failure: Arc::clone(&self.failure),
		}
	}
}

impl<U, T> fmt::Debug for Strategies<U, T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Strategies").finish_non_exhaustive()
	}
}

pub fn identity<U>(user: &U) -> &U {
	user
}

pub fn equals<V: PartialEq>(current: &V, declared: &V) -> bool {
	current == declared
}

pub fn action_matches(action: &str, declared: &CompiledAction) -> bool {
	declared.matches(action)
}

pub fn build_failure<U, T>(request: &FailureRequest<'_, U, T>) -> AuthorizationFailure
where
	U: Principal,
	T: fmt::Display,
{
	AuthorizationFailure::new(
		request.action,
		display_or_null(request.target),
		display_or_null(request.user),
		request.denied,
	)
	.with_roles(request.user.roles())
}

pub(crate) fn display_or_null(value: &impl fmt::Display) -> String {
	let rendered = value.to_string();
	if rendered.is_empty() {
		"(null)".to_string()
	} else {
		rendered
	}
}
