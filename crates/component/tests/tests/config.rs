// Configuration files

use assert_matches::assert_matches;
use pipeline_component::{Config, ConfigError, LogFormat};
use secrecy::ExposeSecret;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_json_config_with_env_expansion() -> anyhow::Result<()> {
	// SAFETY: the variable name is unique to this test.
	unsafe { std::env::set_var("PIPELINE_COMPONENT_TEST_OPENAI_KEY", "sk-env") };

	let file = NamedTempFile::with_suffix(".json")?;
	std::fs::write(
		file.path(),
		r#"{
			"logging": {"level": "debug", "format": "json"},
			"secrets": {"openai": {"apikey": "${PIPELINE_COMPONENT_TEST_OPENAI_KEY}"}}
		}"#,
	)?;

	let config = Config::from_file(file.path()).await?;
	assert_eq!(config.logging.format, LogFormat::Json);
	assert_eq!(config.logging.level, "debug");
	assert_eq!(config.component_secrets("openai")["apikey"].expose_secret(), "sk-env");
	Ok(())
}

#[tokio::test]
async fn test_missing_file() {
	let err = Config::from_file("/nonexistent/pipeline-component.yaml").await.unwrap_err();
	assert_matches!(err, ConfigError::Io(_));
	assert!(err.to_string().contains("pipeline-component.yaml"));
}
