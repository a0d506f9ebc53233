// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Warrant policy engine.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - The [`TraceLevel`] knob that controls how much of the evaluation trail is emitted
//!
//! # Usage
//!
//! ```ignore
//! use warrant_config::load_config;
//!
//! let config = load_config()?;
//! println!("trace level: {}", config.trace.level);
//! ```

pub mod error;
pub mod layer;
pub mod sources;
pub mod trace;

pub use error::ConfigError;
pub use layer::WarrantConfigLayer;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, TRACE_ENV_VAR};
pub use trace::{TraceConfig, TraceConfigLayer, TraceLevel};

use tracing::{debug, info};

/// Fully resolved engine configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarrantConfig {
	pub trace: TraceConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`WARRANT_*`)
/// 2. Config file (`/etc/warrant/policy.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<WarrantConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource::new()),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<WarrantConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource::new()),
	])
}

/// Merge the given sources in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<WarrantConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = WarrantConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	let config = finalize(merged);
	info!(trace = %config.trace.level, "warrant configuration loaded");
	Ok(config)
}

fn finalize(layer: WarrantConfigLayer) -> WarrantConfig {
	WarrantConfig {
		trace: layer.trace.unwrap_or_default().finalize(),
	}
}
