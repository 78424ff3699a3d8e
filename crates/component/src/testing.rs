// Test doubles for adapters and usage handlers

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, anyhow, bail};
use serde_json::Value;

use crate::component::Component;
use crate::contracts::shared_documents;
use crate::error::ComponentError;
use crate::execution::{ComponentHandler, ExecutionContext, ExecutionParams, TaskHandler};
use crate::record::Record;
use crate::usage::{UsageHandler, UsageHandlerCreator};

pub const ECHO_DEFINITION: &[u8] = include_bytes!("../tests/fixtures/echo/definition.json");
pub const ECHO_TASKS: &[u8] = include_bytes!("../tests/fixtures/echo/tasks.json");

type RecordFn = Arc<dyn Fn(&Record) -> anyhow::Result<Record> + Send + Sync>;
type BatchFn = Arc<dyn Fn(&ExecutionContext, &[Record]) -> anyhow::Result<Vec<Record>> + Send + Sync>;

#[derive(Clone)]
enum MockTask {
	PerRecord(RecordFn),
	Batch(BatchFn),
}

/// Adapter whose tasks are closures. Remembers every binding it served.
#[derive(Clone, Default)]
pub struct MockHandler {
	tasks: HashMap<String, MockTask>,
	bound: Arc<Mutex<Vec<ExecutionParams>>>,
}

impl MockHandler {
	pub fn new() -> Self {
		Self::default()
	}

	/// Map every input record independently.
	pub fn with_task(
		mut self,
		task: &str,
		f: impl Fn(&Record) -> anyhow::Result<Record> + Send + Sync + 'static,
	) -> Self {
		self.tasks.insert(task.to_string(), MockTask::PerRecord(Arc::new(f)));
		self
	}

	/// Handle the whole batch at once.
	pub fn with_batch_task(
		mut self,
		task: &str,
		f: impl Fn(&ExecutionContext, &[Record]) -> anyhow::Result<Vec<Record>> + Send + Sync + 'static,
	) -> Self {
		self.tasks.insert(task.to_string(), MockTask::Batch(Arc::new(f)));
		self
	}

	/// Parameters of every execution created so far.
	pub fn bound(&self) -> Vec<ExecutionParams> {
		self.bound.lock().unwrap().clone()
	}
}

impl ComponentHandler for MockHandler {
	fn create_task(&self, params: &ExecutionParams) -> anyhow::Result<Box<dyn TaskHandler>> {
		self.bound.lock().unwrap().push(params.clone());
		match self.tasks.get(&params.task) {
			Some(task) => Ok(Box::new(MockTaskHandler { task: task.clone() })),
			None => bail!("no mock registered for {}", params.task),
		}
	}
}

struct MockTaskHandler {
	task: MockTask,
}

#[async_trait::async_trait]
impl TaskHandler for MockTaskHandler {
	async fn execute(&self, ctx: &ExecutionContext, inputs: &[Record]) -> anyhow::Result<Vec<Record>> {
		match &self.task {
			MockTask::PerRecord(f) => inputs.iter().map(|input| f(input)).collect(),
			MockTask::Batch(f) => f(ctx, inputs),
		}
	}
}

/// Upper-case the `text` field of a record.
pub fn uppercase_text(input: &Record) -> anyhow::Result<Record> {
	let text = input
		.get("text")
		.and_then(Value::as_str)
		.context("text is missing")?;
	let mut output = Record::new();
	output.insert("text".to_string(), Value::String(text.to_uppercase()));
	Ok(output)
}

/// The echo fixture component served by `handler`.
pub fn echo_component(handler: MockHandler) -> Result<Component, ComponentError> {
	Component::load(handler, ECHO_DEFINITION, b"", ECHO_TASKS, &shared_documents())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageCall {
	Check { inputs: usize },
	Collect { inputs: usize, outputs: usize },
}

/// Usage handler that records its calls and can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingUsageHandler {
	calls: Arc<Mutex<Vec<UsageCall>>>,
	fail_check: Option<String>,
	fail_collect: Option<String>,
}

impl RecordingUsageHandler {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn failing_check(mut self, message: &str) -> Self {
		self.fail_check = Some(message.to_string());
		self
	}

	pub fn failing_collect(mut self, message: &str) -> Self {
		self.fail_collect = Some(message.to_string());
		self
	}

	pub fn calls(&self) -> Vec<UsageCall> {
		self.calls.lock().unwrap().clone()
	}

	/// A creator handing out clones that share this handler's call log.
	pub fn creator(&self) -> UsageHandlerCreator {
		let handler = self.clone();
		Arc::new(move |_| Ok(Box::new(handler.clone())))
	}
}

#[async_trait::async_trait]
impl UsageHandler for RecordingUsageHandler {
	async fn check(&self, _ctx: &ExecutionContext, inputs: &[Record]) -> anyhow::Result<()> {
		self.calls.lock().unwrap().push(UsageCall::Check { inputs: inputs.len() });
		match &self.fail_check {
			Some(message) => Err(anyhow!(message.clone())),
			None => Ok(()),
		}
	}

	async fn collect(&self, _ctx: &ExecutionContext, inputs: &[Record], outputs: &[Record]) -> anyhow::Result<()> {
		self.calls.lock().unwrap().push(UsageCall::Collect {
			inputs: inputs.len(),
			outputs: outputs.len(),
		});
		match &self.fail_collect {
			Some(message) => Err(anyhow!(message.clone())),
			None => Ok(()),
		}
	}
}
