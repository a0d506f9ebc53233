// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ordered allow/deny rules for attribute-based authorization.
//!
//! This crate provides:
//! - Declarative rules over a user, an action and a target, with optional conditions
//! - Wildcard (`post:*`), `manage` and regex action matching
//! - A tri-state [`Decision`] where the first matching rule wins
//! - Match descriptions and per-user / per-target rule introspection
//! - Pluggable comparison strategies and synchronous lifecycle hooks
//!
//! # Evaluation
//!
//! Rules are checked in declaration order. Each rule compares the user, then the
//! action, then the target, then runs its condition, and stops at the first
//! field that fails. The first rule to match decides:
//!
//! - an allow rule yields [`Decision::Granted`]
//! - a deny rule yields [`Decision::Denied`]
//! - no match at all yields [`Decision::Indeterminate`]
//!
//! [`Policy::enforce`] turns anything but `Granted` into
//! [`PolicyError::Unauthorized`], whose `denied` flag tells an explicit deny
//! apart from a missing grant.
//!
//! # Usage
//!
//! ```ignore
//! use warrant::{Condition, Policy, Subject};
//!
//! let mut policy: Policy<&str, &str> = Policy::new();
//! policy
//!     .forbid("mallory", "manage", Subject::Any)?
//!     .grant("alice", "post:*", "Post")?
//!     .grant(Subject::Any, "read", vec!["Post", "Comment"])?;
//!
//! policy.enforce(&"alice", "post:edit", &"Post", &())?;
//! ```
//!
//! # Tracing
//!
//! Evaluation is instrumented at debug level. With a [`TraceLevel`] other than
//! `Off`, the rule scan is also reported as events under the
//! [`TRACE_TARGET`] target.

pub mod action;
pub mod condition;
pub mod decision;
pub mod error;
pub mod hooks;
pub mod introspect;
pub mod policy;
pub mod rule;
pub mod strategy;
pub mod subject;
mod trace;

pub use action::{ActionMatch, ActionSpec, CompiledAction, ALL, MANAGE};
pub use condition::Condition;
pub use decision::{Decision, Described};
pub use error::{AuthorizationFailure, BoxError, PolicyError, PolicyResult, DEFAULT_FAILURE_MESSAGE};
pub use hooks::{listener, Hook, HookEvent, Listener, ListenerId};
pub use introspect::{RuleDescriptor, SubjectDescriptor, TargetQuery};
pub use policy::{EvaluateOptions, Policy};
pub use rule::{Effect, MatchDescription, MatchOptions, Rule, RuleSpec};
pub use strategy::{FailureRequest, Principal, Strategies};
pub use subject::{FieldMatch, Subject};
pub use trace::TRACE_TARGET;
pub use warrant_config::TraceLevel;
