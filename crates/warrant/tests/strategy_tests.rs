// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Integration tests for pluggable strategies and introspection over
//! application-defined user and model types.
//!
//! Tests cover:
//! - Role-based user comparison and model comparison by name
//! - Impersonation unwrapping via the default-user strategy
//! - Failure payloads carrying roles and custom extras
//! - Rule descriptors for users and targets

use std::fmt;

use regex::Regex;
use serde_json::json;
use warrant::{
	AuthorizationFailure, Condition, Decision, Policy, PolicyError, Principal, Strategies, Subject,
	SubjectDescriptor,
};

#[derive(Debug, Clone, PartialEq)]
struct Actor {
	name: String,
	roles: Vec<String>,
	impersonating: Option<Box<Actor>>,
}

impl Actor {
	fn new(name: &str, roles: &[&str]) -> Self {
		Self {
			name: name.to_string(),
			roles: roles.iter().map(|r| r.to_string()).collect(),
			impersonating: None,
		}
	}

	/// A rule-side placeholder matching everyone holding `role`.
	fn role(role: &str) -> Self {
		Self::new(role, &[])
	}

	fn impersonate(mut self, other: Actor) -> Self {
		self.impersonating = Some(Box::new(other));
		self
	}
}

impl fmt::Display for Actor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.name)
	}
}

impl Principal for Actor {
	fn roles(&self) -> Option<Vec<String>> {
		Some(self.roles.clone())
	}
}

#[derive(Debug, Clone, PartialEq)]
struct Model {
	kind: &'static str,
	owner: Option<&'static str>,
}

impl Model {
	fn kind(kind: &'static str) -> Self {
		Self { kind, owner: None }
	}

	fn owned_by(kind: &'static str, owner: &'static str) -> Self {
		Self {
			kind,
			owner: Some(owner),
		}
	}
}

impl fmt::Display for Model {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.kind)
	}
}

fn strategies() -> Strategies<Actor, Model> {
	Strategies::<Actor, Model>::default()
		.with_default_user(|actor| actor.impersonating.as_deref().unwrap_or(actor))
		.with_user_compare(|current, declared| {
			current.name == declared.name || current.roles.contains(&declared.name)
		})
		.with_target_compare(|current, declared| current.kind == declared.kind)
}

fn is_owner() -> Condition<Actor, Model, ()> {
	Condition::new("is_owner", |actor: &Actor, model: &Model, _, _| {
		model.owner == Some(actor.name.as_str())
	})
}

fn newsroom() -> Policy<Actor, Model> {
	let mut policy = Policy::with_strategies(strategies());
	policy
		.forbid(Actor::role("suspended"), "manage", Subject::Any)
		.unwrap()
		.grant(Actor::role("editor"), "post:*", Model::kind("Post"))
		.unwrap()
		.grant_when(Actor::role("writer"), "post:edit", Model::kind("Post"), Some(is_owner()))
		.unwrap()
		.grant(
			Subject::Any,
			"read",
			vec![Model::kind("Post"), Model::kind("Comment")],
		)
		.unwrap();
	policy
}

mod comparison {
	use super::*;

	#[test]
	fn roles_satisfy_role_rules() {
		let policy = newsroom();
		let editor = Actor::new("erin", &["editor"]);
		let decision = policy
			.evaluate(&editor, "post:publish", &Model::kind("Post"), &())
			.unwrap();
		assert_eq!(decision, Decision::Granted);
	}

	#[test]
	fn models_compare_by_kind() {
		let policy = newsroom();
		let writer = Actor::new("wade", &["writer"]);
		let own_post = Model::owned_by("Post", "wade");
		let other_post = Model::owned_by("Post", "erin");
		assert_eq!(
			policy.evaluate(&writer, "post:edit", &own_post, &()).unwrap(),
			Decision::Granted
		);
		assert_eq!(
			policy.evaluate(&writer, "post:edit", &other_post, &()).unwrap(),
			Decision::Indeterminate
		);
	}

	#[test]
	fn suspension_overrides_later_grants() {
		let policy = newsroom();
		let suspended = Actor::new("erin", &["editor", "suspended"]);
		let decision = policy
			.evaluate(&suspended, "read", &Model::kind("Post"), &())
			.unwrap();
		assert_eq!(decision, Decision::Denied);
	}
}

mod impersonation {
	use super::*;

	#[test]
	fn impersonated_user_is_evaluated() {
		let policy = newsroom();
		let admin = Actor::new("ada", &["editor"]).impersonate(Actor::new("wade", &["writer"]));
		let decision = policy
			.evaluate(&admin, "post:delete", &Model::kind("Post"), &())
			.unwrap();
		assert_eq!(decision, Decision::Indeterminate);
	}

	#[test]
	fn failure_names_the_impersonated_user() {
		let policy = newsroom();
		let admin = Actor::new("ada", &["editor"]).impersonate(Actor::new("wade", &["writer"]));
		let err = policy
			.enforce(&admin, "post:delete", &Model::kind("Post"), &())
			.unwrap_err();
		let failure = err.authorization_failure().unwrap();
		assert_eq!(failure.user, "wade");
		assert_eq!(failure.roles, Some(vec!["writer".to_string()]));
		assert!(!failure.denied);
	}
}

mod failures {
	use super::*;

	#[test]
	fn default_payload_serializes() {
		let policy = newsroom();
		let suspended = Actor::new("sam", &["suspended"]);
		let err = policy
			.enforce(&suspended, "read", &Model::kind("Comment"), &())
			.unwrap_err();
		let json = serde_json::to_value(err.authorization_failure().unwrap()).unwrap();
		assert_eq!(
			json,
			json!({
				"message": "You are not authorized to do that.",
				"action": "read",
				"model": "Comment",
				"user": "sam",
				"roles": ["suspended"],
				"denied": true,
			})
		);
	}

	#[test]
	fn custom_failure_builder_adds_extra() {
		let strategies = strategies().with_failure(|request| {
			AuthorizationFailure::new(
				request.action,
				request.target.to_string(),
				request.user.to_string(),
				request.denied,
			)
			.with_message(format!("{} may not {}", request.user, request.action))
			.with_extra(json!({ "owner": request.target.owner }))
		});
		let policy: Policy<Actor, Model> = Policy::with_strategies(strategies);
		let err = policy
			.enforce(
				&Actor::new("wade", &[]),
				"post:edit",
				&Model::owned_by("Post", "erin"),
				&(),
			)
			.unwrap_err();

		assert_eq!(err.to_string(), "wade may not post:edit");
		match err {
			PolicyError::Unauthorized(failure) => {
				assert_eq!(failure.extra, Some(json!({ "owner": "erin" })));
				assert!(failure.roles.is_none());
			}
			other => panic!("unexpected error: {other}"),
		}
	}
}

mod introspection {
	use super::*;

	#[test]
	fn rules_for_user_uses_role_comparison() {
		let policy = newsroom();
		let writer = Actor::new("wade", &["writer"]);
		let rules = policy.rules_for_user(&writer);
		let summary: Vec<(String, Option<String>)> = rules
			.into_iter()
			.map(|d| (d.action, d.condition))
			.collect();
		assert_eq!(
			summary,
			vec![
				("post:edit".to_string(), Some("is_owner".to_string())),
				("read".to_string(), None),
			]
		);
	}

	#[test]
	fn rules_for_target_by_name_and_pattern() {
		let policy = newsroom();

		let comment_rules = policy.rules_for_target("Comment");
		assert_eq!(comment_rules.len(), 2);
		assert_eq!(comment_rules[0].target, SubjectDescriptor::All);
		assert_eq!(
			comment_rules[1].target,
			SubjectDescriptor::AnyOf(vec!["Comment".to_string()])
		);

		let post_rules = policy.rules_for_target(Regex::new("^Po").unwrap());
		assert_eq!(post_rules.len(), 4);
		assert_eq!(post_rules[3].target, SubjectDescriptor::AnyOf(vec!["Post".to_string()]));
	}

	#[test]
	fn descriptors_render_role_placeholders() {
		let policy = newsroom();
		let json = serde_json::to_value(policy.rules()[0].descriptor()).unwrap();
		assert_eq!(
			json,
			json!({
				"user": "suspended",
				"action": "manage",
				"target": "all",
				"deny": true,
			})
		);
	}
}
