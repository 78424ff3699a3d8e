// Loading the fixture definitions

use assert_matches::assert_matches;
use pipeline_component::contracts::shared_documents;
use pipeline_component::schema::contains_array_shorthand;
use pipeline_component::testing::MockHandler;
use pipeline_component::{ComponentError, load_definition};

use super::common::{OPENAI_DEFINITION, OPENAI_SETUP, OPENAI_TASKS, openai_component};

#[test]
fn test_openai_definition() -> anyhow::Result<()> {
	let component = openai_component(MockHandler::new())?;
	let def = component.definition();

	assert_eq!(def.id, "openai");
	assert_eq!(def.vendor.as_deref(), Some("OpenAI"));
	assert_eq!(def.component_type.as_deref(), Some("COMPONENT_TYPE_AI"));
	assert!(def.has_credentials);
	assert!(def.public);
	assert_eq!(
		def.documentation_url.as_ref().map(|u| u.host_str()),
		Some(Some("www.instill.tech"))
	);
	assert_eq!(def.available_tasks(), ["TASK_TEXT_GENERATION", "TASK_TEXT_EMBEDDINGS"]);

	let titles = def.tasks().map(|t| t.title.as_str()).collect::<Vec<_>>();
	assert_eq!(titles, ["Text Generation", "Text Embeddings"]);
	let generation = def.task("TASK_TEXT_GENERATION").expect("task is loaded");
	assert_eq!(generation.short_description, "Provide text outputs in response to text inputs.");

	let history = &generation.input.schema()["properties"]["chat-history"];
	assert_eq!(history["title"], "Chat History");
	assert_eq!(history["items"]["required"], serde_json::json!(["role", "content"]));
	Ok(())
}

#[test]
fn test_no_shorthand_survives_loading() -> anyhow::Result<()> {
	let def = load_definition(OPENAI_DEFINITION, OPENAI_SETUP, OPENAI_TASKS, &shared_documents())?;
	assert!(!contains_array_shorthand(def.setup.schema()));
	for task in def.tasks() {
		assert!(!contains_array_shorthand(task.input.schema()), "{}", task.name);
		assert!(!contains_array_shorthand(task.output.schema()), "{}", task.name);
	}
	Ok(())
}

#[test]
fn test_loading_twice_is_identical() -> anyhow::Result<()> {
	let a = load_definition(OPENAI_DEFINITION, OPENAI_SETUP, OPENAI_TASKS, &shared_documents())?;
	let b = load_definition(OPENAI_DEFINITION, OPENAI_SETUP, OPENAI_TASKS, &shared_documents())?;
	assert_eq!(a.uid, b.uid);
	assert_eq!(a.setup.schema(), b.setup.schema());
	for (x, y) in a.tasks().zip(b.tasks()) {
		assert_eq!(x.input.schema(), y.input.schema());
		assert_eq!(x.output.schema(), y.output.schema());
	}
	Ok(())
}

#[test]
fn test_missing_shared_document() {
	let err = load_definition(OPENAI_DEFINITION, OPENAI_SETUP, OPENAI_TASKS, &[]).unwrap_err();
	assert_matches!(err, ComponentError::MalformedDefinition(m) if m.contains("instill-types"));
}
