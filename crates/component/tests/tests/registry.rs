// Start-up registration through the registry store

use std::io::Write;
use std::sync::Arc;

use assert_matches::assert_matches;
use pipeline_component::record::record;
use pipeline_component::testing::{MockHandler, echo_component, uppercase_text};
use pipeline_component::{
	ComponentError, Config, ExecutionContext, Record, RegistryStore, SECRET_KEYWORD,
};
use serde_json::json;
use tempfile::NamedTempFile;

use super::common::openai_component;

fn register_all(store: &RegistryStore, config: &Config) -> Result<(), ComponentError> {
	store.init(|registry| {
		let echo = echo_component(MockHandler::new().with_task("TASK_ECHO", uppercase_text))?;
		registry.register(echo.with_secrets(config.component_secrets("echo")))?;
		let openai = openai_component(
			MockHandler::new().with_task("TASK_TEXT_EMBEDDINGS", |_| Ok(record(json!({"embedding": [1.0]})))),
		)?;
		registry.register(openai.with_secrets(config.component_secrets("openai")))?;
		Ok(())
	})?;
	Ok(())
}

#[tokio::test]
async fn test_registry_from_config_file() -> anyhow::Result<()> {
	let mut file = NamedTempFile::with_suffix(".yaml")?;
	writeln!(file, "secrets:\n  openai:\n    apikey: sk-from-config")?;
	let config = Config::from_file(file.path()).await?;

	let store = RegistryStore::new();
	assert!(store.get().is_none());
	register_all(&store, &config)?;
	let registry = store.get().expect("registry is initialised");

	let ids = registry.definitions().map(|d| d.id.clone()).collect::<Vec<_>>();
	assert_eq!(ids, ["echo", "openai"]);
	let openai = registry.get("openai").expect("openai is registered");
	assert!(Arc::ptr_eq(registry.get_by_uid(&openai.uid()).expect("indexed by uid"), openai));

	assert!(registry.is_secret_field("openai", "api-key")?);
	assert!(!registry.is_secret_field("openai", "organization")?);

	let exec = registry.create_execution(
		"openai",
		&record(json!({"api-key": SECRET_KEYWORD})),
		"TASK_TEXT_EMBEDDINGS",
		Record::new(),
	)?;
	assert!(exec.uses_instill_credentials());
	assert_eq!(exec.setup()["api-key"], "sk-from-config");

	let outputs = exec
		.execute(&ExecutionContext::new(), &[record(json!({"model": "gpt-4o", "text": "x"}))])
		.await?;
	assert_eq!(outputs.len(), 1);
	Ok(())
}

#[tokio::test]
async fn test_unknown_component_and_task() -> anyhow::Result<()> {
	let store = RegistryStore::new();
	register_all(&store, &Config::default())?;
	let registry = store.get().expect("registry is initialised");

	assert_matches!(
		registry.create_execution("anthropic", &Record::new(), "TASK_TEXT_GENERATION", Record::new()),
		Err(ComponentError::ComponentNotFound(_))
	);
	let err = registry
		.create_execution("echo", &Record::new(), "TASK_TEXT_GENERATION", Record::new())
		.unwrap_err();
	assert!(err.to_string().contains("unsupported task"));
	Ok(())
}
