// Logging setup

use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, LogFormat, LoggingConfig};

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// level.
pub fn init(config: &LoggingConfig) -> Result<(), ConfigError> {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(&config.level))
		.map_err(|e| ConfigError::Telemetry(e.to_string()))?;
	let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
	let result = match config.format {
		LogFormat::Text => builder.try_init(),
		LogFormat::Json => builder.json().try_init(),
	};
	result.map_err(|e| ConfigError::Telemetry(e.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_init_only_once() {
		let config = LoggingConfig {
			level: "component=debug".to_string(),
			format: LogFormat::Json,
		};
		let _ = init(&config);
		assert!(init(&config).is_err());
	}
}
