// Component definitions
//
// A definition bundles identity metadata with the compiled setup schema and
// the input/output schema pair of every available task.

mod loader;
mod refs;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

pub use loader::{load_definition, task_id_to_title};

use crate::schema::CompiledSchema;

/// Setup schema keyword marking a field as holding a secret.
pub const INSTILL_SECRET: &str = "instillSecret";

/// Raw identity document, as authored by component packages.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DefinitionDocument {
	pub id: String,
	pub uid: String,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub description: String,
	pub version: String,
	pub available_tasks: Vec<String>,
	#[serde(default)]
	pub source_url: Option<String>,
	#[serde(default)]
	pub documentation_url: Option<String>,
	#[serde(default)]
	pub icon: Option<String>,
	#[serde(default, rename = "type")]
	pub component_type: Option<String>,
	#[serde(default)]
	pub vendor: Option<String>,
	#[serde(default)]
	pub release_stage: Option<String>,
	#[serde(default)]
	pub public: bool,
	#[serde(default)]
	pub tombstone: bool,
	#[serde(default)]
	pub has_credentials: Option<bool>,
}

/// A loaded component definition. Immutable once built.
#[derive(Debug)]
pub struct ComponentDefinition {
	pub id: String,
	pub uid: Uuid,
	pub title: String,
	pub description: String,
	pub version: String,
	pub component_type: Option<String>,
	pub vendor: Option<String>,
	pub icon: Option<String>,
	pub source_url: Option<Url>,
	pub documentation_url: Option<Url>,
	pub release_stage: Option<String>,
	pub public: bool,
	pub tombstone: bool,
	/// Whether the setup carries credentials.
	pub has_credentials: bool,
	pub setup: CompiledSchema,
	available_tasks: Vec<String>,
	tasks: HashMap<String, Arc<TaskDefinition>>,
}

impl ComponentDefinition {
	/// Task names in declaration order.
	pub fn available_tasks(&self) -> &[String] {
		&self.available_tasks
	}

	pub fn supports_task(&self, task: &str) -> bool {
		self.tasks.contains_key(task)
	}

	pub fn task(&self, task: &str) -> Option<&Arc<TaskDefinition>> {
		self.tasks.get(task)
	}

	/// Task definitions in declaration order.
	pub fn tasks(&self) -> impl Iterator<Item = &Arc<TaskDefinition>> {
		self.available_tasks.iter().filter_map(|name| self.tasks.get(name))
	}

	/// Whether the setup field at dotted `path` is marked `instillSecret`.
	pub fn is_secret_field(&self, path: &str) -> bool {
		is_secret_field(self.setup.schema(), path)
	}
}

fn is_secret_field(schema: &Value, path: &str) -> bool {
	let (head, rest) = match path.split_once('.') {
		Some((head, rest)) => (head, Some(rest)),
		None => (path, None),
	};
	branches(schema).any(|node| {
		let Some(field) = node.get("properties").and_then(|props| props.get(head)) else {
			return false;
		};
		match rest {
			Some(rest) => is_secret_field(field, rest),
			None => branches(field).any(|f| f.get(INSTILL_SECRET).and_then(Value::as_bool) == Some(true)),
		}
	})
}

/// `node` followed by its `oneOf` / `anyOf` / `allOf` alternatives.
fn branches(node: &Value) -> impl Iterator<Item = &Value> {
	let alternatives = ["oneOf", "anyOf", "allOf"]
		.into_iter()
		.filter_map(move |keyword| node.get(keyword).and_then(Value::as_array))
		.flatten();
	std::iter::once(node).chain(alternatives)
}

/// One task of a component: its card and its schema pair.
#[derive(Debug)]
pub struct TaskDefinition {
	pub name: String,
	pub title: String,
	pub description: String,
	pub short_description: String,
	pub input: CompiledSchema,
	pub output: CompiledSchema,
}
