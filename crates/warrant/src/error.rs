// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy error types and the authorization failure payload.

use serde::Serialize;
use thiserror::Error;

/// Message used by the default failure builder.
pub const DEFAULT_FAILURE_MESSAGE: &str = "You are not authorized to do that.";

/// Boxed error returned by fallible condition predicates.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors raised while declaring rules or evaluating requests.
#[derive(Debug, Error)]
pub enum PolicyError {
	// =========================================================================
	// Configuration Errors
	// =========================================================================
	/// A rule was declared with a missing user, action or target.
	#[error("invalid rule ({field}): {reason}")]
	InvalidRule { field: &'static str, reason: String },

	/// A conditional declaration was given no condition, which would otherwise
	/// grant or deny unconditionally.
	#[error("conditional rule declared without a condition for {user} {action} {target}")]
	MissingCondition {
		user: String,
		action: String,
		target: String,
	},

	/// A wildcard action could not be compiled into a pattern.
	#[error("invalid action pattern '{action}': {source}")]
	InvalidPattern {
		action: String,
		#[source]
		source: regex::Error,
	},

	/// The same listener was registered twice for one hook.
	#[error("listener already registered for hook {0}")]
	DuplicateListener(&'static str),

	// =========================================================================
	// Evaluation Errors
	// =========================================================================
	/// A condition predicate failed. The predicate's own error is the source.
	#[error("condition '{name}' failed: {source}")]
	Condition {
		name: String,
		#[source]
		source: BoxError,
	},

	/// Raised by `enforce` when the decision is anything but granted.
	#[error("{}", .0.message)]
	Unauthorized(AuthorizationFailure),
}

impl PolicyError {
	/// Returns true for errors caused by a malformed policy declaration.
	pub fn is_configuration(&self) -> bool {
		matches!(
			self,
			PolicyError::InvalidRule { .. }
				| PolicyError::MissingCondition { .. }
				| PolicyError::InvalidPattern { .. }
				| PolicyError::DuplicateListener(_)
		)
	}

	/// Returns the failure payload if this is an authorization failure.
	pub fn authorization_failure(&self) -> Option<&AuthorizationFailure> {
		match self {
			PolicyError::Unauthorized(failure) => Some(failure),
			_ => None,
		}
	}

	pub(crate) fn invalid_rule(field: &'static str, reason: impl Into<String>) -> Self {
		PolicyError::InvalidRule {
			field,
			reason: reason.into(),
		}
	}
}

/// Structured payload describing why `enforce` refused a request.
///
/// `denied` distinguishes an explicit deny rule (`true`) from the case where
/// no rule matched at all (`false`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorizationFailure {
	pub message: String,
	pub action: String,
	pub model: String,
	pub user: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub roles: Option<Vec<String>>,
	pub denied: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub extra: Option<serde_json::Value>,
}

impl AuthorizationFailure {
	pub fn new(
		action: impl Into<String>,
		model: impl Into<String>,
		user: impl Into<String>,
		denied: bool,
	) -> Self {
		Self {
			message: DEFAULT_FAILURE_MESSAGE.to_string(),
			action: action.into(),
			model: model.into(),
			user: user.into(),
			roles: None,
			denied,
			extra: None,
		}
	}

	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = message.into();
		self
	}

	pub fn with_roles(mut self, roles: Option<Vec<String>>) -> Self {
		self.roles = roles;
		self
	}

	pub fn with_extra(mut self, extra: serde_json::Value) -> Self {
		self.extra = Some(extra);
		self
	}
}
