// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Guard predicates attached to rules.

use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, PolicyError, PolicyResult};

type Predicate<U, T, C> = dyn Fn(&U, &T, &C, &str) -> Result<bool, BoxError> + Send + Sync;

/// A named predicate that must hold for a rule to match.
///
/// Called as `(user, target, context, action)`, and only after the rule's
/// user, action and target have all matched.
pub struct Condition<U, T, C> {
	name: String,
	predicate: Arc<Predicate<U, T, C>>,
}

impl<U: 'static, T: 'static, C: 'static> Condition<U, T, C> {
	pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
	where
		F: Fn(&U, &T, &C, &str) -> bool + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			predicate: Arc::new(move |user: &U, target: &T, context: &C, action: &str| -> Result<bool, BoxError> {
				Ok(predicate(user, target, context, action))
			}),
		}
	}

	/// A predicate that can fail. Its error reaches the caller of `evaluate`
	/// or `enforce` as [`PolicyError::Condition`].
	pub fn fallible<F, E>(name: impl Into<String>, predicate: F) -> Self
	where
		F: Fn(&U, &T, &C, &str) -> Result<bool, E> + Send + Sync + 'static,
		E: Into<BoxError>,
	{
		Self {
			name: name.into(),
			predicate: Arc::new(move |user: &U, target: &T, context: &C, action: &str| -> Result<bool, BoxError> {
				predicate(user, target, context, action).map_err(Into::into)
			}),
		}
	}
}

impl<U, T, C> Condition<U, T, C> {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub(crate) fn check(&self, user: &U, target: &T, context: &C, action: &str) -> PolicyResult<bool> {
		(self.predicate)(user, target, context, action).map_err(|source| PolicyError::Condition {
			name: self.name.clone(),
			source,
		})
	}
}

impl<U, T, C> Clone for Condition<U, T, C> {
	fn clone(&self) -> Self {
		Self {
			name: self.name.clone(),
			predicate: Arc::clone(&self.predicate),
		}
	}
}

impl<U, T, C> fmt::Debug for Condition<U, T, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Condition").field("name", &self.name).finish()
	}
}
