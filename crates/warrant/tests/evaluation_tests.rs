// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Integration tests for policy evaluation.
//!
//! Tests cover:
//! - First-match-wins ordering between grants and forbids
//! - Wildcard, manage, regex and list actions
//! - List targets and condition short-circuiting
//! - Match descriptions and user exclusion
//! - `enforce` failures and fallible conditions

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use proptest::prelude::*;
use regex::Regex;
use warrant::{
	Condition, Decision, Described, EvaluateOptions, Policy, PolicyError, RuleSpec, Subject,
	DEFAULT_FAILURE_MESSAGE,
};

type Blog = Policy<&'static str, &'static str>;

fn evaluate(policy: &Blog, user: &'static str, action: &str, target: &'static str) -> Decision {
	policy.evaluate(&user, action, &target, &()).unwrap()
}

mod ordering {
	use super::*;

	#[test]
	fn forbid_declared_first_wins() {
		let mut policy = Blog::new();
		policy
			.forbid("alice", "edit", "Post")
			.unwrap()
			.grant("alice", "edit", "Post")
			.unwrap();
		assert_eq!(evaluate(&policy, "alice", "edit", "Post"), Decision::Denied);
	}

	#[test]
	fn grant_declared_first_wins() {
		let mut policy = Blog::new();
		policy
			.grant("alice", "edit", "Post")
			.unwrap()
			.forbid("alice", "edit", "Post")
			.unwrap();
		assert_eq!(evaluate(&policy, "alice", "edit", "Post"), Decision::Granted);
	}

	#[test]
	fn empty_policy_is_indeterminate() {
		let policy = Blog::new();
		assert_eq!(evaluate(&policy, "alice", "edit", "Post"), Decision::Indeterminate);
	}

	#[test]
	fn unrelated_rules_are_indeterminate() {
		let mut policy = Blog::new();
		policy.grant("bob", "edit", "Post").unwrap();
		assert_eq!(evaluate(&policy, "alice", "edit", "Post"), Decision::Indeterminate);
	}

	proptest! {
		#[test]
		fn first_matching_rule_decides(effects in prop::collection::vec(any::<bool>(), 1..12), skip in 0usize..12) {
			let mut policy = Blog::new();
			let skip = skip.min(effects.len() - 1);
			let mut specs = Vec::new();
			for (i, allow) in effects.iter().enumerate() {
				let user = if i < skip { "someone-else" } else { "alice" };
				specs.push(if *allow {
					RuleSpec::allow(user, "edit", "Post")
				} else {
					RuleSpec::deny(user, "edit", "Post")
				});
			}
			policy.set_rules(specs).unwrap();

			let expected = if effects[skip] { Decision::Granted } else { Decision::Denied };
			prop_assert_eq!(evaluate(&policy, "alice", "edit", "Post"), expected);
		}
	}
}

mod actions {
	use super::*;

	#[test]
	fn wildcard_covers_action_family() {
		let mut policy = Blog::new();
		policy.grant("alice", "post:*", "Post").unwrap();
		assert_eq!(evaluate(&policy, "alice", "post:create", "Post"), Decision::Granted);
		assert_eq!(evaluate(&policy, "alice", "post:delete", "Post"), Decision::Granted);
		assert_eq!(
			evaluate(&policy, "alice", "comment:create", "Post"),
			Decision::Indeterminate
		);
	}

	#[test]
	fn manage_and_all_cover_every_action() {
		let mut policy = Blog::new();
		policy
			.grant("admin", "manage", Subject::Any)
			.unwrap()
			.grant("root", "ALL", Subject::Any)
			.unwrap();
		for action in ["read", "edit", "post:publish", "invent-something-new"] {
			assert_eq!(evaluate(&policy, "admin", action, "Post"), Decision::Granted);
			assert_eq!(evaluate(&policy, "root", action, "Invoice"), Decision::Granted);
		}
	}

	#[test]
	fn regex_action_is_tested_as_given() {
		let mut policy = Blog::new();
		policy
			.grant("alice", Regex::new("^(read|list)$").unwrap(), "Post")
			.unwrap();
		assert_eq!(evaluate(&policy, "alice", "list", "Post"), Decision::Granted);
		assert_eq!(evaluate(&policy, "alice", "listen", "Post"), Decision::Indeterminate);
	}

	#[test]
	fn action_list_covers_each_member() {
		let mut policy = Blog::new();
		policy
			.grant("alice", vec!["read", "list"], "Post")
			.unwrap()
			.forbid("alice", vec!["delete", "post:*"], "Post")
			.unwrap();
		assert_eq!(evaluate(&policy, "alice", "read", "Post"), Decision::Granted);
		assert_eq!(evaluate(&policy, "alice", "list", "Post"), Decision::Granted);
		assert_eq!(evaluate(&policy, "alice", "delete", "Post"), Decision::Denied);
		assert_eq!(evaluate(&policy, "alice", "post:publish", "Post"), Decision::Denied);
		assert_eq!(evaluate(&policy, "alice", "edit", "Post"), Decision::Indeterminate);
	}

	#[test]
	fn empty_action_list_is_rejected() {
		let mut policy = Blog::new();
		let err = policy
			.grant("alice", Vec::<&str>::new(), "Post")
			.unwrap_err();
		assert!(matches!(err, PolicyError::InvalidRule { field: "action", .. }));
		assert!(policy.is_empty());
	}

	#[test]
	fn whitespace_action_is_declarable() {
		let mut policy = Blog::new();
		policy.grant("alice", " ", "Post").unwrap();
		assert_eq!(evaluate(&policy, "alice", " ", "Post"), Decision::Granted);
		assert_eq!(evaluate(&policy, "alice", "", "Post"), Decision::Indeterminate);
	}

	#[test]
	fn empty_action_is_a_configuration_error() {
		let mut policy = Blog::new();
		let err = policy.grant("alice", "", "Post").unwrap_err();
		assert!(err.is_configuration());
		assert!(policy.is_empty());
	}
}

mod targets {
	use super::*;

	#[test]
	fn list_target_matches_each_member() {
		let mut policy = Blog::new();
		policy.grant("alice", "read", vec!["Post", "Comment"]).unwrap();
		assert_eq!(evaluate(&policy, "alice", "read", "Post"), Decision::Granted);
		assert_eq!(evaluate(&policy, "alice", "read", "Comment"), Decision::Granted);
		assert_eq!(evaluate(&policy, "alice", "read", "Invoice"), Decision::Indeterminate);
	}

	#[test]
	fn empty_target_list_is_rejected() {
		let mut policy = Blog::new();
		let err = policy
			.grant("alice", "read", Vec::<&str>::new())
			.unwrap_err();
		assert!(matches!(err, PolicyError::InvalidRule { field: "target", .. }));
	}
}

mod conditions {
	use super::*;

	#[test]
	fn condition_only_runs_for_matching_requests() {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);
		let mut policy = Blog::new();
		policy
			.grant_when(
				"alice",
				"edit",
				"Post",
				Some(Condition::new("is_author", move |_, _, _, _| {
					counter.fetch_add(1, Ordering::SeqCst);
					true
				})),
			)
			.unwrap();

		assert_eq!(evaluate(&policy, "bob", "edit", "Post"), Decision::Indeterminate);
		assert_eq!(evaluate(&policy, "alice", "read", "Post"), Decision::Indeterminate);
		assert_eq!(evaluate(&policy, "alice", "edit", "Comment"), Decision::Indeterminate);
		assert_eq!(calls.load(Ordering::SeqCst), 0);

		assert_eq!(evaluate(&policy, "alice", "edit", "Post"), Decision::Granted);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn failed_condition_falls_through_to_later_rules() {
		let mut policy = Blog::new();
		policy
			.forbid_when(
				"alice",
				"edit",
				"Post",
				Some(Condition::new("is_locked", |_, _, _, _| false)),
			)
			.unwrap()
			.grant("alice", "edit", "Post")
			.unwrap();
		assert_eq!(evaluate(&policy, "alice", "edit", "Post"), Decision::Granted);
	}

	#[test]
	fn explicit_none_condition_is_rejected() {
		let mut policy = Blog::new();
		let err = policy.forbid_when("alice", "edit", "Post", None).unwrap_err();
		assert!(matches!(err, PolicyError::MissingCondition { .. }));
		assert!(policy.is_empty());
	}

	#[test]
	fn condition_receives_context() {
		let mut policy: Policy<&'static str, &'static str, u32> = Policy::new();
		policy
			.grant_when(
				"alice",
				"edit",
				"Post",
				Some(Condition::new("within_quota", |_, _, quota: &u32, _| *quota > 0)),
			)
			.unwrap();
		assert_eq!(policy.evaluate(&"alice", "edit", &"Post", &3).unwrap(), Decision::Granted);
		assert_eq!(
			policy.evaluate(&"alice", "edit", &"Post", &0).unwrap(),
			Decision::Indeterminate
		);
	}

	#[test]
	fn fallible_condition_errors_surface_from_evaluate_and_enforce() {
		let mut policy = Blog::new();
		policy
			.grant_when(
				"alice",
				"edit",
				"Post",
				Some(Condition::fallible("owner_lookup", |_, _, _, _| {
					Err::<bool, _>("ownership store unavailable")
				})),
			)
			.unwrap();

		let err = policy.evaluate(&"alice", "edit", &"Post", &()).unwrap_err();
		assert!(matches!(err, PolicyError::Condition { ref name, .. } if name == "owner_lookup"));

		let err = policy.enforce(&"alice", "edit", &"Post", &()).unwrap_err();
		assert!(err.authorization_failure().is_none());
		assert!(err.to_string().contains("ownership store unavailable"));
	}
}

mod describe {
	use super::*;

	#[test]
	fn reports_only_matching_list_members() {
		let mut policy = Blog::new();
		policy
			.grant(vec!["alice", "bob"], "read", vec!["Post", "Comment"])
			.unwrap();

		let described = policy.describe(&"alice", "read", &"Comment", &()).unwrap();
		let description = match described {
			Described::Granted(description) => description,
			other => panic!("expected a grant, got {other:?}"),
		};
		assert_eq!(description.user.values(), &[&"alice"]);
		assert_eq!(description.target.values(), &[&"Comment"]);
	}

	#[test]
	fn reports_matching_actions_from_a_list() {
		let mut policy = Blog::new();
		policy
			.grant("alice", vec!["post:*", "read", "post:edit"], "Post")
			.unwrap();

		let described = policy.describe(&"alice", "post:edit", &"Post", &()).unwrap();
		let description = described.description().unwrap();
		let actions: Vec<String> = description
			.action
			.actions()
			.iter()
			.map(|action| action.to_string())
			.collect();
		assert_eq!(actions, vec!["post:*", "post:edit"]);
	}

	#[test]
	fn deny_is_structural() {
		let mut policy = Blog::new();
		policy
			.forbid_when(
				Subject::Any,
				"delete",
				Subject::Any,
				Some(Condition::new("is_archived", |_, _, _, _| true)),
			)
			.unwrap();

		let described = policy.describe(&"alice", "delete", &"Post", &()).unwrap();
		assert_eq!(described.decision(), Decision::Denied);
		let description = described.description().unwrap();
		assert!(description.user.is_any());
		assert!(description.target.is_any());
		assert_eq!(description.condition, Some("is_archived"));
	}

	#[test]
	fn no_match_is_indeterminate() {
		let policy = Blog::new();
		let described = policy.describe(&"alice", "read", &"Post", &()).unwrap();
		assert!(matches!(described, Described::Indeterminate));
	}
}

mod exclusion {
	use super::*;

	#[test]
	fn excluded_users_never_match() {
		let mut policy = Blog::new();
		policy
			.grant("alice", "edit", "Post")
			.unwrap()
			.grant(vec!["alice", "bob"], "read", "Post")
			.unwrap();
		let options = EvaluateOptions::excluding(["alice"]);

		let decision = policy
			.evaluate_with(&"alice", "edit", &"Post", &(), &options)
			.unwrap();
		assert_eq!(decision, Decision::Indeterminate);

		let decision = policy
			.evaluate_with(&"alice", "read", &"Post", &(), &options)
			.unwrap();
		assert_eq!(decision, Decision::Indeterminate);

		let decision = policy
			.evaluate_with(&"bob", "read", &"Post", &(), &options)
			.unwrap();
		assert_eq!(decision, Decision::Granted);
	}

	#[test]
	fn describe_honours_exclusion() {
		let mut policy = Blog::new();
		policy
			.grant(vec!["alice", "bob"], "read", "Post")
			.unwrap()
			.forbid(Subject::Any, "read", "Post")
			.unwrap();
		let options = EvaluateOptions::excluding(["alice"]);

		let described = policy
			.describe_with(&"alice", "read", &"Post", &(), &options)
			.unwrap();
		assert_eq!(described.decision(), Decision::Denied);

		let described = policy
			.describe_with(&"bob", "read", &"Post", &(), &options)
			.unwrap();
		assert_eq!(described.description().unwrap().user.values(), &[&"bob"]);
	}

	#[test]
	fn wildcard_user_ignores_exclusion() {
		let mut policy = Blog::new();
		policy.grant(Subject::Any, "read", "Post").unwrap();
		let options = EvaluateOptions::excluding(["alice"]);
		let decision = policy
			.evaluate_with(&"alice", "read", &"Post", &(), &options)
			.unwrap();
		assert_eq!(decision, Decision::Granted);
	}
}

mod enforce {
	use super::*;

	#[test]
	fn granted_request_passes() {
		let mut policy = Blog::new();
		policy.grant("alice", "edit", "Post").unwrap();
		assert!(policy.enforce(&"alice", "edit", &"Post", &()).is_ok());
	}

	#[test]
	fn explicit_deny_sets_denied() {
		let mut policy = Blog::new();
		policy.forbid("alice", "edit", "Post").unwrap();
		let err = policy.enforce(&"alice", "edit", &"Post", &()).unwrap_err();
		let failure = err.authorization_failure().unwrap();
		assert!(failure.denied);
		assert_eq!(failure.message, DEFAULT_FAILURE_MESSAGE);
		assert_eq!(failure.action, "edit");
		assert_eq!(failure.model, "Post");
		assert_eq!(failure.user, "alice");
	}

	#[test]
	fn missing_grant_is_not_a_deny() {
		let policy = Blog::new();
		let err = policy.enforce(&"alice", "edit", &"Post", &()).unwrap_err();
		assert!(!err.authorization_failure().unwrap().denied);
		assert_eq!(err.to_string(), DEFAULT_FAILURE_MESSAGE);
	}
}

#[test]
fn built_policies_can_be_shared_across_threads() {
	fn assert_send_sync<T: Send + Sync>() {}
	assert_send_sync::<Policy<String, String, ()>>();

	let mut policy: Policy<String, String> = Policy::new();
	policy
		.grant("alice".to_string(), "read", "Post".to_string())
		.unwrap();
	let policy = Arc::new(policy);

	let handles: Vec<_> = (0..4)
		.map(|_| {
			let policy = Arc::clone(&policy);
			std::thread::spawn(move || {
				policy
					.evaluate(&"alice".to_string(), "read", &"Post".to_string(), &())
					.unwrap()
			})
		})
		.collect();
	for handle in handles {
		assert_eq!(handle.join().unwrap(), Decision::Granted);
	}
}
