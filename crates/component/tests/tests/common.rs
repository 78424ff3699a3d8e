// Shared fixtures for the integration tests

use pipeline_component::contracts::shared_documents;
use pipeline_component::testing::MockHandler;
use pipeline_component::{Component, ComponentError, SecretMap};
use secrecy::SecretString;

pub const OPENAI_DEFINITION: &[u8] = include_bytes!("../fixtures/openai/definition.json");
pub const OPENAI_SETUP: &[u8] = include_bytes!("../fixtures/openai/setup.json");
pub const OPENAI_TASKS: &[u8] = include_bytes!("../fixtures/openai/tasks.json");

pub fn openai_component(handler: MockHandler) -> Result<Component, ComponentError> {
	Component::load(handler, OPENAI_DEFINITION, OPENAI_SETUP, OPENAI_TASKS, &shared_documents())
}

pub fn secrets(pairs: &[(&str, &str)]) -> SecretMap {
	pairs
		.iter()
		.map(|(k, v)| (k.to_string(), SecretString::from(v.to_string())))
		.collect()
}
