// Execution envelope
//
// An `Execution` binds a component task to a resolved setup. Every
// `execute` call runs, in order:
// - input validation against the task input schema
// - usage check
// - the task handler
// - output validation against the task output schema
// - usage collection
//
// The cancellation token is checked before each step.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, warn};

use crate::component::Component;
use crate::definition::TaskDefinition;
use crate::error::ComponentError;
use crate::record::Record;
use crate::schema::{CompiledSchema, validate};

/// Per-call context threaded to task handlers and usage hooks.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
	cancellation: CancellationToken,
}

impl ExecutionContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_cancellation(cancellation: CancellationToken) -> Self {
		Self { cancellation }
	}

	pub fn cancellation_token(&self) -> &CancellationToken {
		&self.cancellation
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancellation.is_cancelled()
	}

	fn ensure_active(&self) -> Result<(), ComponentError> {
		if self.is_cancelled() {
			Err(ComponentError::Cancelled)
		} else {
			Ok(())
		}
	}
}

/// What a component handler receives when a task is bound.
#[derive(Debug, Clone)]
pub struct ExecutionParams {
	pub component_id: String,
	pub task: String,
	/// Setup with global secrets already substituted.
	pub setup: Record,
	pub system_variables: Record,
	pub uses_instill_credentials: bool,
	/// Span carrying the `component` and `task` fields.
	pub span: Span,
}

/// Adapter side of a component: binds tasks to handlers.
pub trait ComponentHandler: Send + Sync {
	fn create_task(&self, params: &ExecutionParams) -> anyhow::Result<Box<dyn TaskHandler>>;
}

/// A task bound to a setup. Receives validated inputs and returns one
/// output per input, in order.
#[async_trait::async_trait]
pub trait TaskHandler: Send + Sync {
	async fn execute(&self, ctx: &ExecutionContext, inputs: &[Record]) -> anyhow::Result<Vec<Record>>;
}

/// A task of a component bound to a resolved setup.
pub struct Execution {
	component: Arc<Component>,
	task: Arc<TaskDefinition>,
	params: ExecutionParams,
	handler: Box<dyn TaskHandler>,
}

impl fmt::Debug for Execution {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Execution")
			.field("component", &self.params.component_id)
			.field("task", &self.params.task)
			.field("uses_instill_credentials", &self.params.uses_instill_credentials)
			.finish_non_exhaustive()
	}
}

impl Execution {
	pub(crate) fn new(
		component: Arc<Component>,
		task: Arc<TaskDefinition>,
		params: ExecutionParams,
		handler: Box<dyn TaskHandler>,
	) -> Self {
		Self {
			component,
			task,
			params,
			handler,
		}
	}

	pub fn component(&self) -> &Arc<Component> {
		&self.component
	}

	pub fn task(&self) -> &str {
		&self.params.task
	}

	pub fn setup(&self) -> &Record {
		&self.params.setup
	}

	pub fn system_variables(&self) -> &Record {
		&self.params.system_variables
	}

	pub fn uses_instill_credentials(&self) -> bool {
		self.params.uses_instill_credentials
	}

	pub fn span(&self) -> &Span {
		&self.params.span
	}

	pub fn input_schema(&self) -> &CompiledSchema {
		&self.task.input
	}

	pub fn output_schema(&self) -> &CompiledSchema {
		&self.task.output
	}

	/// Run the task over a batch of inputs.
	///
	/// Output `i` answers input `i`. Validation is all-or-nothing: any
	/// invalid record fails the whole batch before the handler runs.
	pub async fn execute(&self, ctx: &ExecutionContext, inputs: &[Record]) -> Result<Vec<Record>, ComponentError> {
		let span = self.params.span.clone();
		self.run(ctx, inputs).instrument(span).await
	}

	async fn run(&self, ctx: &ExecutionContext, inputs: &[Record]) -> Result<Vec<Record>, ComponentError> {
		ctx.ensure_active()?;
		if let Err(e) = validate(inputs, &self.task.input, "inputs") {
			debug!(target: "component", error = %e, "input validation failed");
			return Err(e.into());
		}

		ctx.ensure_active()?;
		let usage = (self.component.usage_handler_creator())(self).map_err(ComponentError::Usage)?;
		usage.check(ctx, inputs).await.map_err(ComponentError::Usage)?;

		ctx.ensure_active()?;
		let outputs = match self.handler.execute(ctx, inputs).await {
			Ok(outputs) => outputs,
			Err(source) => {
				warn!(target: "component", error = %source, "task handler failed");
				return Err(ComponentError::Handler {
					component: self.params.component_id.clone(),
					task: self.params.task.clone(),
					source,
				});
			},
		};
		if outputs.len() != inputs.len() {
			return Err(ComponentError::OutputLengthMismatch {
				task: self.params.task.clone(),
				expected: inputs.len(),
				actual: outputs.len(),
			});
		}

		ctx.ensure_active()?;
		if let Err(e) = validate(&outputs, &self.task.output, "outputs") {
			warn!(target: "component", error = %e, "output validation failed");
			return Err(e.into());
		}

		ctx.ensure_active()?;
		usage
			.collect(ctx, inputs, &outputs)
			.await
			.map_err(ComponentError::Usage)?;

		debug!(target: "component", records = outputs.len(), "execution finished");
		Ok(outputs)
	}
}
