// Component framework error types

use thiserror::Error;

use crate::schema::ValidationError;

/// Errors that cross the framework boundary.
///
/// Handler and usage failures are carried as `anyhow::Error` and keep their own
/// `Display`, so callers see exactly what the adapter reported.
#[derive(Error, Debug)]
pub enum ComponentError {
	#[error("malformed definition: {0}")]
	MalformedDefinition(String),

	#[error(transparent)]
	Validation(#[from] ValidationError),

	#[error("unresolved global credential: {field}")]
	UnresolvedCredential { field: String },

	#[error("{source}")]
	Handler {
		component: String,
		task: String,
		#[source]
		source: anyhow::Error,
	},

	#[error(transparent)]
	Usage(anyhow::Error),

	#[error("unsupported task: '{task}' is not available in component '{component}'")]
	UnsupportedTask { component: String, task: String },

	#[error("component definition '{0}' not found")]
	ComponentNotFound(String),

	#[error("duplicate component: '{0}' is already registered")]
	DuplicateComponent(String),

	#[error("task '{task}' returned {actual} outputs for {expected} inputs")]
	OutputLengthMismatch {
		task: String,
		expected: usize,
		actual: usize,
	},

	#[error("execution cancelled")]
	Cancelled,

	#[error(transparent)]
	Config(#[from] crate::config::ConfigError),
}

impl ComponentError {
	pub fn malformed(message: impl Into<String>) -> Self {
		Self::MalformedDefinition(message.into())
	}

	pub fn unresolved_credential(field: impl Into<String>) -> Self {
		Self::UnresolvedCredential { field: field.into() }
	}

	pub fn unsupported_task(component: impl Into<String>, task: impl Into<String>) -> Self {
		Self::UnsupportedTask {
			component: component.into(),
			task: task.into(),
		}
	}

	/// End-user message for errors that are safe to show outside the
	/// runtime. Returns `None` for internal failures.
	pub fn user_message(&self) -> Option<String> {
		match self {
			Self::UnresolvedCredential { field } => Some(format!(
				"The configuration field {field} references a global secret but it doesn't support Instill Credentials."
			)),
			Self::Validation(e) => Some(e.to_string()),
			Self::UnsupportedTask { task, .. } => Some(format!("Task {task} is not supported.")),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_unresolved_credential_message() {
		let err = ComponentError::unresolved_credential("api-key");
		assert_eq!(err.to_string(), "unresolved global credential: api-key");
		assert_eq!(
			err.user_message().as_deref(),
			Some(
				"The configuration field api-key references a global secret but it doesn't support Instill Credentials."
			)
		);
	}

	#[test]
	fn test_handler_error_display_is_unchanged() {
		let err = ComponentError::Handler {
			component: "openai".to_string(),
			task: "TASK_TEXT_EMBEDDINGS".to_string(),
			source: anyhow::anyhow!("bar"),
		};
		assert_eq!(err.to_string(), "bar");
		assert!(err.user_message().is_none());
	}

	#[test]
	fn test_unsupported_task_message() {
		let err = ComponentError::unsupported_task("openai", "FOOBAR");
		assert!(err.to_string().contains("unsupported task"));
	}
}
