// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, TOML files and environment variables.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::WarrantConfigLayer;
use crate::trace::{TraceConfigLayer, TraceLevel};

/// Environment variable holding the trace verbosity (`off`, `summary`, `full`).
pub const TRACE_ENV_VAR: &str = "WARRANT_TRACE";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<WarrantConfigLayer, ConfigError>;
}

/// Policy defaults: tracing off until a file or the environment says otherwise.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<WarrantConfigLayer, ConfigError> {
		trace!(level = %TraceLevel::default(), "applying built-in trace level");
		Ok(WarrantConfigLayer {
			trace: Some(TraceConfigLayer {
				level: Some(TraceLevel::default()),
			}),
		})
	}
}

/// Policy settings read from a TOML document with a `[trace]` table.
///
/// An absent file contributes nothing, so deployments without one fall
/// through to the defaults.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// `/etc/warrant/policy.toml`.
	pub fn system() -> Self {
		Self::new("/etc/warrant/policy.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"policy-file"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<WarrantConfigLayer, ConfigError> {
		let content = match std::fs::read_to_string(&self.path) {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				debug!(path = %self.path.display(), "no policy file, using lower-precedence settings");
				return Ok(WarrantConfigLayer::default());
			}
			Err(source) => {
				return Err(ConfigError::FileRead {
					path: self.path.clone(),
					source,
				})
			}
		};

		let layer: WarrantConfigLayer = toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
			path: self.path.clone(),
			source,
		})?;
		debug!(
			path = %self.path.display(),
			trace = ?layer.trace.as_ref().and_then(|t| t.level),
			"policy file read"
		);
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: WARRANT_<FIELD>. Reads the process environment unless built
/// with [`EnvSource::from_vars`].
#[derive(Default)]
pub struct EnvSource {
	vars: Option<HashMap<String, String>>,
}

impl EnvSource {
	pub fn new() -> Self {
		Self::default()
	}

	/// Reads from a fixed set of variables instead of the process environment.
	pub fn from_vars<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: Some(
				vars
					.into_iter()
					.map(|(k, v)| (k.into(), v.into()))
					.collect(),
			),
		}
	}

	fn var(&self, name: &str) -> Option<String> {
		let value = match &self.vars {
			Some(vars) => vars.get(name).cloned(),
			None => std::env::var(name).ok(),
		};
		value.filter(|s| !s.is_empty())
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<WarrantConfigLayer, ConfigError> {
		debug!("loading environment variables");
		let level = match self.var(TRACE_ENV_VAR) {
			Some(v) => Some(v.parse::<TraceLevel>().map_err(|message| {
				ConfigError::InvalidValue {
					key: TRACE_ENV_VAR.to_string(),
					message,
				}
			})?),
			None => None,
		};

		Ok(WarrantConfigLayer {
			trace: Some(TraceConfigLayer { level }),
		})
	}
}
