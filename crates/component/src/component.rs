// Component handles
//
// A `Component` pairs a loaded definition with the adapter that implements
// its tasks, the secrets injected for it and its usage handler creator.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info_span};
use uuid::Uuid;

use crate::definition::{ComponentDefinition, load_definition};
use crate::error::ComponentError;
use crate::execution::{ComponentHandler, Execution, ExecutionParams};
use crate::record::Record;
use crate::secrets::{SecretMap, resolve_setup};
use crate::usage::{UsageHandlerCreator, noop_usage_handler_creator};

pub struct Component {
	definition: ComponentDefinition,
	handler: Arc<dyn ComponentHandler>,
	secrets: SecretMap,
	usage_handler_creator: UsageHandlerCreator,
}

impl fmt::Debug for Component {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Component")
			.field("id", &self.definition.id)
			.field("uid", &self.definition.uid)
			.field("version", &self.definition.version)
			.field("secrets", &self.secrets.keys().collect::<Vec<_>>())
			.finish_non_exhaustive()
	}
}

impl Component {
	pub fn new(definition: ComponentDefinition, handler: impl ComponentHandler + 'static) -> Self {
		Self {
			definition,
			handler: Arc::new(handler),
			secrets: SecretMap::new(),
			usage_handler_creator: noop_usage_handler_creator(),
		}
	}

	/// Load the definition documents and wrap them with `handler`.
	pub fn load(
		handler: impl ComponentHandler + 'static,
		definition: &[u8],
		setup: &[u8],
		tasks: &[u8],
		additional: &[(&str, &[u8])],
	) -> Result<Self, ComponentError> {
		let definition = load_definition(definition, setup, tasks, additional)?;
		Ok(Self::new(definition, handler))
	}

	/// Secrets substituted for `__INSTILL_SECRET` setup fields.
	pub fn with_secrets(mut self, secrets: SecretMap) -> Self {
		self.secrets = secrets;
		self
	}

	pub fn with_usage_handler_creator(mut self, creator: UsageHandlerCreator) -> Self {
		self.usage_handler_creator = creator;
		self
	}

	pub fn id(&self) -> &str {
		&self.definition.id
	}

	pub fn uid(&self) -> Uuid {
		self.definition.uid
	}

	pub fn definition(&self) -> &ComponentDefinition {
		&self.definition
	}

	pub fn usage_handler_creator(&self) -> &UsageHandlerCreator {
		&self.usage_handler_creator
	}

	/// Bind `task` to `setup`.
	///
	/// Global secrets are substituted into a copy of `setup`, which is then
	/// validated against the setup schema before the adapter sees it.
	pub fn create_execution(
		self: &Arc<Self>,
		setup: &Record,
		task: &str,
		system_variables: Record,
	) -> Result<Execution, ComponentError> {
		let Some(task_def) = self.definition.task(task) else {
			return Err(ComponentError::unsupported_task(self.id(), task));
		};

		let resolved = resolve_setup(setup, &self.secrets)?;
		self.definition.setup.validate_record(&resolved.setup, "setup")?;

		let span = info_span!(target: "component", "execution", component = %self.id(), task = %task);
		let params = ExecutionParams {
			component_id: self.id().to_string(),
			task: task.to_string(),
			setup: resolved.setup,
			system_variables,
			uses_instill_credentials: resolved.uses_instill_credentials,
			span,
		};
		let handler = self
			.handler
			.create_task(&params)
			.map_err(|source| ComponentError::Handler {
				component: params.component_id.clone(),
				task: params.task.clone(),
				source,
			})?;

		debug!(
			target: "component",
			component = %params.component_id,
			task = %params.task,
			uses_instill_credentials = params.uses_instill_credentials,
			"created execution"
		);
		Ok(Execution::new(Arc::clone(self), Arc::clone(task_def), params, handler))
	}
}
