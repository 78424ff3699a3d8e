// End-to-end tests for executions built from the fixture components

use std::sync::Arc;

use assert_matches::assert_matches;
use pipeline_component::contracts::{GenerativeTextModelUsage, TemplateTextGenerationOutput};
use pipeline_component::record::record;
use pipeline_component::testing::{
	MockHandler, RecordingUsageHandler, UsageCall, echo_component, uppercase_text,
};
use pipeline_component::{
	ComponentError, ExecutionContext, Record, SECRET_KEYWORD, from_record, to_record,
};
use serde_json::{Value, json};

use super::common::{openai_component, secrets};

const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

fn generate(input: &Record) -> anyhow::Result<Record> {
	let prompt = input.get("prompt").and_then(Value::as_str).unwrap_or_default();
	let output = TemplateTextGenerationOutput {
		text: format!("re: {prompt}"),
		usage: Some(GenerativeTextModelUsage {
			input_tokens: prompt.len() as i64,
			output_tokens: 4,
		}),
	};
	let mut rec = to_record(&output)?;
	let text = rec.remove("text").unwrap_or(Value::Null);
	rec.insert("texts".to_string(), json!([text]));
	Ok(rec)
}

fn openai_handler() -> MockHandler {
	MockHandler::new()
		.with_task("TASK_TEXT_GENERATION", generate)
		.with_task("TASK_TEXT_EMBEDDINGS", |_| Ok(record(json!({"embedding": [0.1, 0.2]}))))
}

#[tokio::test]
async fn test_unsupported_task() -> anyhow::Result<()> {
	let component = Arc::new(openai_component(openai_handler())?);
	let setup = record(json!({"api-key": "sk-user"}));

	let err = component
		.create_execution(&setup, "FOOBAR", Record::new())
		.unwrap_err();
	assert!(err.to_string().contains("unsupported task"));
	assert_matches!(err, ComponentError::UnsupportedTask { ref task, .. } if task == "FOOBAR");
	Ok(())
}

#[tokio::test]
async fn test_missing_prompt_is_reported_with_path() -> anyhow::Result<()> {
	let component = Arc::new(openai_component(openai_handler())?);
	let exec = component.create_execution(
		&record(json!({"api-key": "sk-user"})),
		"TASK_TEXT_GENERATION",
		Record::new(),
	)?;

	let err = exec
		.execute(&ExecutionContext::new(), &[record(json!({"model": "gpt-4o"}))])
		.await
		.unwrap_err();
	assert_eq!(err.to_string(), r#"inputs[0].prompt: missing properties: "prompt""#);
	assert_eq!(err.user_message().as_deref(), Some(r#"inputs[0].prompt: missing properties: "prompt""#));
	Ok(())
}

#[tokio::test]
async fn test_global_secret_is_resolved() -> anyhow::Result<()> {
	let handler = openai_handler();
	let component = Arc::new(
		openai_component(handler.clone())?.with_secrets(secrets(&[("apikey", "sk-global")])),
	);
	let setup = record(json!({"api-key": SECRET_KEYWORD, "organization": "acme"}));

	let exec = component.create_execution(&setup, "TASK_TEXT_EMBEDDINGS", Record::new())?;
	assert!(exec.uses_instill_credentials());
	assert_eq!(exec.setup()["api-key"], "sk-global");
	assert_eq!(setup["api-key"], SECRET_KEYWORD);

	let bound = handler.bound();
	assert_eq!(bound.len(), 1);
	assert_eq!(bound[0].setup["api-key"], "sk-global");
	assert!(bound[0].uses_instill_credentials);

	let outputs = exec
		.execute(
			&ExecutionContext::new(),
			&[record(json!({"model": "text-embedding-3-small", "text": "hi"}))],
		)
		.await?;
	assert_eq!(outputs[0]["embedding"], json!([0.1, 0.2]));
	Ok(())
}

#[tokio::test]
async fn test_user_key_does_not_use_global_secret() -> anyhow::Result<()> {
	let component = Arc::new(
		openai_component(openai_handler())?.with_secrets(secrets(&[("apikey", "sk-global")])),
	);
	let exec = component.create_execution(
		&record(json!({"api-key": "sk-user"})),
		"TASK_TEXT_EMBEDDINGS",
		Record::new(),
	)?;
	assert!(!exec.uses_instill_credentials());
	assert_eq!(exec.setup()["api-key"], "sk-user");
	Ok(())
}

#[tokio::test]
async fn test_global_secret_unresolved() -> anyhow::Result<()> {
	let component = Arc::new(openai_component(openai_handler())?);
	let err = component
		.create_execution(
			&record(json!({"api-key": SECRET_KEYWORD})),
			"TASK_TEXT_GENERATION",
			Record::new(),
		)
		.unwrap_err();
	assert_matches!(err, ComponentError::UnresolvedCredential { ref field } if field == "api-key");
	assert_eq!(
		err.user_message().as_deref(),
		Some("The configuration field api-key references a global secret but it doesn't support Instill Credentials.")
	);
	Ok(())
}

#[tokio::test]
async fn test_setup_is_validated() -> anyhow::Result<()> {
	let component = Arc::new(openai_component(openai_handler())?);
	let err = component
		.create_execution(&record(json!({"organization": "acme"})), "TASK_TEXT_GENERATION", Record::new())
		.unwrap_err();
	assert_eq!(err.to_string(), r#"setup.api-key: missing properties: "api-key""#);
	Ok(())
}

#[tokio::test]
async fn test_array_shorthand_accepts_image_batches() -> anyhow::Result<()> {
	let component = Arc::new(openai_component(openai_handler())?);
	let task = component
		.definition()
		.task("TASK_TEXT_GENERATION")
		.expect("task is loaded");
	let images = &task.input.schema()["properties"]["images"];
	assert_eq!(images["items"]["instillAcceptFormats"], json!(["image/*"]));
	assert!(images.get("instillAcceptFormats").is_none());
	assert_eq!(task.output.schema()["properties"]["texts"]["type"], "array");

	let exec = component.create_execution(
		&record(json!({"api-key": "sk-user"})),
		"TASK_TEXT_GENERATION",
		Record::new(),
	)?;
	let ctx = ExecutionContext::new();
	let ok = record(json!({
		"model": "gpt-4o",
		"prompt": "what is this?",
		"images": [PNG_1X1, format!("data:image/png;base64,{PNG_1X1}")]
	}));
	let outputs = exec.execute(&ctx, &[ok]).await?;
	let usage: GenerativeTextModelUsage = from_record(outputs[0]["usage"].as_object().expect("usage record"))?;
	assert_eq!(usage.input_tokens, 13);

	let text = record(json!({
		"model": "gpt-4o",
		"prompt": "what is this?",
		"images": ["aGVsbG8gd29ybGQ="]
	}));
	let err = exec.execute(&ctx, &[text]).await.unwrap_err();
	assert_eq!(
		err.to_string(),
		"inputs[0].images[0]: expected one of [image/*], but got text/plain"
	);
	Ok(())
}

#[tokio::test]
async fn test_batch_order_and_usage_hooks() -> anyhow::Result<()> {
	let usage = RecordingUsageHandler::new();
	let component = Arc::new(
		echo_component(MockHandler::new().with_task("TASK_ECHO", uppercase_text))?
			.with_usage_handler_creator(usage.creator()),
	);
	let exec = component.create_execution(&Record::new(), "TASK_ECHO", Record::new())?;

	let inputs = ["a", "b"].map(|t| record(json!({"text": t})));
	let outputs = exec.execute(&ExecutionContext::new(), &inputs).await?;
	assert_eq!(outputs, ["A", "B"].map(|t| record(json!({"text": t}))));
	assert_eq!(
		usage.calls(),
		[UsageCall::Check { inputs: 2 }, UsageCall::Collect { inputs: 2, outputs: 2 }]
	);
	Ok(())
}

#[tokio::test]
async fn test_concurrent_executions() -> anyhow::Result<()> {
	let component = Arc::new(echo_component(MockHandler::new().with_task("TASK_ECHO", uppercase_text))?);
	let exec = Arc::new(component.create_execution(&Record::new(), "TASK_ECHO", Record::new())?);

	let handles = (0..8)
		.map(|i| {
			let exec = Arc::clone(&exec);
			tokio::spawn(async move {
				let input = record(json!({"text": format!("item-{i}")}));
				exec.execute(&ExecutionContext::new(), &[input]).await
			})
		})
		.collect::<Vec<_>>();
	for (i, handle) in handles.into_iter().enumerate() {
		let outputs = handle.await??;
		assert_eq!(outputs[0]["text"], format!("ITEM-{i}"));
	}
	Ok(())
}
