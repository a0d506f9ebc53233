// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User and target specifiers.

use std::fmt;

use crate::error::{PolicyError, PolicyResult};

/// Who or what a rule's user or target field refers to.
///
/// `AnyOf` is OR-combined: the field matches when any element matches. The
/// variant is fixed when the rule is built, so evaluation never has to work
/// out whether a field is a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject<V> {
	/// Matches every value.
	Any,
	One(V),
	AnyOf(Vec<V>),
}

impl<V> Subject<V> {
	pub fn one(value: V) -> Self {
		Subject::One(value)
	}

	pub fn any_of(values: impl IntoIterator<Item = V>) -> Self {
		Subject::AnyOf(values.into_iter().collect())
	}

	pub fn is_any(&self) -> bool {
		matches!(self, Subject::Any)
	}

	/// Declared values, empty for `Any`.
	pub fn values(&self) -> &[V] {
		match self {
			Subject::Any => &[],
			Subject::One(value) => std::slice::from_ref(value),
			Subject::AnyOf(values) => values,
		}
	}

	pub(crate) fn validate(&self, field: &'static str) -> PolicyResult<()> {
		match self {
			Subject::AnyOf(values) if values.is_empty() => Err(PolicyError::invalid_rule(
				field,
				"empty list matches nothing; use a single value or Subject::Any",
			)),
			_ => Ok(()),
		}
	}

	/// Compares `current` against the declared values, skipping any value in
	/// `exclude`.
	///
	/// Returns `None` on no match. When `all` is false the scan stops at the
	/// first hit; otherwise every matching element is collected.
	pub(crate) fn match_with<'s>(
		&'s self,
		current: &V,
		exclude: &[V],
		all: bool,
		compare: impl Fn(&V, &V) -> bool,
	) -> Option<FieldMatch<'s, V>>
	where
		V: PartialEq,
	{
		let candidates = match self {
			Subject::Any => return Some(FieldMatch::Any),
			Subject::One(value) => std::slice::from_ref(value),
			Subject::AnyOf(values) => values.as_slice(),
		};

		let mut hits = candidates
			.iter()
			.filter(|declared| !exclude.contains(*declared))
			.filter(|declared| compare(current, *declared));

		let matched: Vec<&V> = if all {
			hits.collect()
		} else {
			hits.next().into_iter().collect()
		};

		if matched.is_empty() {
			None
		} else {
			Some(FieldMatch::Values(matched))
		}
	}
}

impl<V> From<V> for Subject<V> {
	fn from(value: V) -> Self {
		Subject::One(value)
	}
}

impl<V> From<Vec<V>> for Subject<V> {
	fn from(values: Vec<V>) -> Self {
		Subject::AnyOf(values)
	}
}

impl<V: fmt::Display> fmt::Display for Subject<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Subject::Any => f.write_str("all"),
			Subject::One(value) => write!(f, "{value}"),
			Subject::AnyOf(values) => {
				for (i, value) in values.iter().enumerate() {
					if i > 0 {
						f.write_str(",")?;
					}
					write!(f, "{value}")?;
				}
				Ok(())
			}
		}
	}
}

/// Which declared elements of a user or target field matched.
#[derive(Debug, PartialEq, Eq)]
pub enum FieldMatch<'a, V> {
	/// The field was declared as `Subject::Any`.
	Any,
	Values(Vec<&'a V>),
}

impl<V> Clone for FieldMatch<'_, V> {
	fn clone(&self) -> Self {
		match self {
			FieldMatch::Any => FieldMatch::Any,
			FieldMatch::Values(values) => FieldMatch::Values(values.clone()),
		}
	}
}

impl<V> FieldMatch<'_, V> {
	pub fn is_any(&self) -> bool {
		matches!(self, FieldMatch::Any)
	}

	/// Matched elements, empty for `Any`.
	pub fn values(&self) -> &[&V] {
		match self {
			FieldMatch::Any => &[],
			FieldMatch::Values(values) => values,
		}
	}
}
