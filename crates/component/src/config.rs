// Runtime configuration
//
// Loaded from YAML or JSON. String values may reference environment
// variables (`${OPENAI_API_KEY}`); a reference to an unset variable fails
// the load.

use std::collections::HashMap;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use crate::secrets::SecretMap;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("failed to read config file: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to parse config: {0}")]
	Parse(String),

	#[error("environment variable '{name}' not found")]
	EnvVarNotFound { name: String },

	#[error("failed to initialise logging: {0}")]
	Telemetry(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Text,
	Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
	/// `EnvFilter` directive, e.g. `info` or `component=debug`.
	pub level: String,
	pub format: LogFormat,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::Text,
		}
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
	logging: LoggingConfig,
	secrets: HashMap<String, HashMap<String, String>>,
}

#[derive(Debug, Default)]
pub struct Config {
	pub logging: LoggingConfig,
	/// Component id -> setup field -> secret
	secrets: HashMap<String, SecretMap>,
}

fn expand_env(value: &str) -> Result<String, ConfigError> {
	shellexpand::env(value)
		.map(|expanded| expanded.into_owned())
		.map_err(|e| ConfigError::EnvVarNotFound { name: e.var_name })
}

impl Config {
	/// Read a config file. `.json` files are parsed as JSON, anything else
	/// as YAML.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = fs_err::tokio::read_to_string(path).await?;
		match path.extension().and_then(|e| e.to_str()) {
			Some("json") => Self::from_json(&content),
			_ => Self::from_yaml(&content),
		}
	}

	pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
		let raw: RawConfig = serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
		Self::from_raw(raw)
	}

	pub fn from_json(content: &str) -> Result<Self, ConfigError> {
		let raw: RawConfig = serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
		Self::from_raw(raw)
	}

	fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
		let logging = LoggingConfig {
			level: expand_env(&raw.logging.level)?,
			format: raw.logging.format,
		};
		let mut secrets = HashMap::with_capacity(raw.secrets.len());
		for (component, fields) in raw.secrets {
			let mut resolved = SecretMap::with_capacity(fields.len());
			for (field, value) in fields {
				resolved.insert(field, SecretString::from(expand_env(&value)?));
			}
			secrets.insert(component, resolved);
		}
		Ok(Self { logging, secrets })
	}

	/// Secrets configured for component `id`; empty when none are.
	pub fn component_secrets(&self, id: &str) -> SecretMap {
		self
			.secrets
			.get(id)
			.map(|fields| {
				fields
					.iter()
					.map(|(k, v)| (k.clone(), SecretString::from(v.expose_secret().to_string())))
					.collect()
			})
			.unwrap_or_default()
	}
}
