// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read-only views of a policy's rules.
//!
//! Values are reported through their `Display` strings, so descriptors can be
//! serialized and shown to administrators without exposing `U` or `T`.

use std::fmt;

use regex::Regex;
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

use crate::policy::Policy;
use crate::rule::Rule;
use crate::subject::Subject;

/// A rendered user or target field. `All` serializes as the string `"all"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectDescriptor {
	All,
	One(String),
	AnyOf(Vec<String>),
}

impl SubjectDescriptor {
	fn from_subject<V: fmt::Display>(subject: &Subject<V>) -> Self {
		match subject {
			Subject::Any => SubjectDescriptor::All,
			Subject::One(value) => SubjectDescriptor::One(value.to_string()),
			Subject::AnyOf(values) => {
				SubjectDescriptor::AnyOf(values.iter().map(ToString::to_string).collect())
			}
		}
	}
}

impl Serialize for SubjectDescriptor {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			SubjectDescriptor::All => serializer.serialize_str("all"),
			SubjectDescriptor::One(value) => serializer.serialize_str(value),
			SubjectDescriptor::AnyOf(values) => {
				let mut seq = serializer.serialize_seq(Some(values.len()))?;
				for value in values {
					seq.serialize_element(value)?;
				}
				seq.end()
			}
		}
	}
}

/// Serializable summary of one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleDescriptor {
	pub user: SubjectDescriptor,
	/// The action as declared, e.g. `post:*`. Lists are comma-joined.
	pub action: String,
	pub target: SubjectDescriptor,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub condition: Option<String>,
	pub deny: bool,
}

impl<U: fmt::Display, T: fmt::Display, C> Rule<U, T, C> {
	pub fn descriptor(&self) -> RuleDescriptor {
		RuleDescriptor {
			user: SubjectDescriptor::from_subject(self.user()),
			action: self.action().to_string(),
			target: SubjectDescriptor::from_subject(self.target()),
			condition: self.condition().map(|c| c.name().to_string()),
			deny: self.is_deny(),
		}
	}
}

/// Selects rules by target name.
#[derive(Debug, Clone)]
pub enum TargetQuery {
	/// Exact name.
	Name(String),
	/// Unanchored pattern tested against the name.
	Pattern(Regex),
}

impl TargetQuery {
	pub fn matches(&self, name: &str) -> bool {
		match self {
			TargetQuery::Name(expected) => expected == name,
			TargetQuery::Pattern(pattern) => pattern.is_match(name),
		}
	}
}

impl From<&str> for TargetQuery {
	fn from(name: &str) -> Self {
		TargetQuery::Name(name.to_string())
	}
}

impl From<String> for TargetQuery {
	fn from(name: String) -> Self {
		TargetQuery::Name(name)
	}
}

impl From<Regex> for TargetQuery {
	fn from(pattern: Regex) -> Self {
		TargetQuery::Pattern(pattern)
	}
}

impl<U, T, C> Policy<U, T, C>
where
	U: PartialEq + fmt::Display,
	T: PartialEq + fmt::Display,
{
	/// Rules whose user field covers `user` under the policy's user
	/// comparison. Rules declared for every user are included.
	pub fn rules_for_user(&self, user: &U) -> Vec<RuleDescriptor> {
		let strategies = self.strategies();
		self.rules()
			.iter()
			.filter(|rule| {
				rule.user()
					.match_with(user, &[], false, |current, declared| {
						strategies.compare_users(current, declared)
					})
					.is_some()
			})
			.map(Rule::descriptor)
			.collect()
	}

	/// Rules whose target field names a matching target. Rules declared for
	/// every target always match; list targets are narrowed to the matching
	/// names.
	pub fn rules_for_target(&self, query: impl Into<TargetQuery>) -> Vec<RuleDescriptor> {
		let query = query.into();
		self.rules()
			.iter()
			.filter_map(|rule| {
				let target = match rule.target() {
					Subject::Any => SubjectDescriptor::All,
					Subject::One(value) => {
						let name = value.to_string();
						if !query.matches(&name) {
							return None;
						}
						SubjectDescriptor::One(name)
					}
					Subject::AnyOf(values) => {
						let names: Vec<String> = values
							.iter()
							.map(ToString::to_string)
							.filter(|name| query.matches(name))
							.collect();
						if names.is_empty() {
							return None;
						}
						SubjectDescriptor::AnyOf(names)
					}
				};
				Some(RuleDescriptor {
					target,
					..rule.descriptor()
				})
			})
			.collect()
	}
}
