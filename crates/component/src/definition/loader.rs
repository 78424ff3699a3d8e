// Definition loading
//
// Builds a `ComponentDefinition` from the definition, setup and tasks
// documents plus named extra documents. Any problem is reported as
// `MalformedDefinition`; nothing partially loaded escapes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value, json};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::refs::RefResolver;
use super::{ComponentDefinition, DefinitionDocument, TaskDefinition};
use crate::error::ComponentError;
use crate::schema::CompiledSchema;

const DEFS: &str = "$defs";
const TASK_PREFIX: &str = "TASK_";
const SHORT_DESCRIPTION: &str = "instillShortDescription";

// Semantic Versioning 2.0.0
static SEMVER: Lazy<Regex> = Lazy::new(|| {
	Regex::new(
		r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-((?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
	)
	.expect("semver pattern is valid")
});

/// Human-readable title for a task id: `TASK_TEXT_GENERATION` becomes
/// `Text Generation`.
pub fn task_id_to_title(id: &str) -> String {
	id.strip_prefix(TASK_PREFIX)
		.unwrap_or(id)
		.split('_')
		.filter(|word| !word.is_empty())
		.map(|word| {
			let lower = word.to_ascii_lowercase();
			let mut chars = lower.chars();
			match chars.next() {
				Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
				None => String::new(),
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}

fn parse_json(name: &str, bytes: &[u8]) -> Result<Value, ComponentError> {
	serde_json::from_slice(bytes).map_err(|e| ComponentError::malformed(format!("{name} document: {e}")))
}

fn parse_url(field: &str, value: Option<String>) -> Result<Option<Url>, ComponentError> {
	value
		.filter(|v| !v.is_empty())
		.map(|v| Url::parse(&v).map_err(|e| ComponentError::malformed(format!("{field} '{v}': {e}"))))
		.transpose()
}

fn compile(what: &str, schema: Value) -> Result<CompiledSchema, ComponentError> {
	CompiledSchema::compile(schema).map_err(|e| ComponentError::malformed(format!("{what}: {e}")))
}

fn string_field(node: &Map<String, Value>, key: &str) -> Option<String> {
	node.get(key).and_then(Value::as_str).map(str::to_string)
}

fn check_metadata(doc: &DefinitionDocument) -> Result<Uuid, ComponentError> {
	if doc.id.trim().is_empty() {
		return Err(ComponentError::malformed("definition id must not be empty"));
	}
	let uid = Uuid::parse_str(&doc.uid)
		.map_err(|e| ComponentError::malformed(format!("uid '{}' is not a UUID: {e}", doc.uid)))?;
	if !SEMVER.is_match(&doc.version) {
		return Err(ComponentError::malformed(format!(
			"version '{}' is not a semantic version",
			doc.version
		)));
	}
	if doc.available_tasks.is_empty() {
		return Err(ComponentError::malformed(format!(
			"component '{}' declares no available tasks",
			doc.id
		)));
	}
	let mut seen = HashSet::new();
	for task in &doc.available_tasks {
		if !seen.insert(task.as_str()) {
			return Err(ComponentError::malformed(format!("task '{task}' is listed twice")));
		}
	}
	Ok(uid)
}

fn load_setup(setup: &[u8], extras: &HashMap<String, Value>) -> Result<Value, ComponentError> {
	let raw = if setup.iter().all(u8::is_ascii_whitespace) {
		Value::Object(Map::new())
	} else {
		parse_json("setup", setup)?
	};
	let mut resolved = RefResolver::new(&raw, extras).resolve(&raw)?;
	let Value::Object(node) = &mut resolved else {
		return Err(ComponentError::malformed("setup document must be an object"));
	};
	node.remove(DEFS);
	if node.is_empty() {
		return Ok(json!({"type": "object", "properties": {}}));
	}
	Ok(resolved)
}

fn load_task(name: &str, tasks: &Map<String, Value>, resolver: &RefResolver<'_>) -> Result<TaskDefinition, ComponentError> {
	if name == DEFS {
		return Err(ComponentError::malformed("'$defs' is not a task"));
	}
	let raw = tasks.get(name).ok_or_else(|| {
		ComponentError::malformed(format!("task '{name}' is available but missing from the tasks document"))
	})?;
	let Value::Object(mut task) = resolver.resolve(raw)? else {
		return Err(ComponentError::malformed(format!("task '{name}' must be an object")));
	};

	let input = task
		.remove("input")
		.ok_or_else(|| ComponentError::malformed(format!("task '{name}' has no input schema")))?;
	let output = task
		.remove("output")
		.ok_or_else(|| ComponentError::malformed(format!("task '{name}' has no output schema")))?;

	let title = string_field(&task, "title").unwrap_or_else(|| task_id_to_title(name));
	let description = string_field(&task, "description").unwrap_or_default();
	let short_description = string_field(&task, SHORT_DESCRIPTION).unwrap_or_else(|| description.clone());

	Ok(TaskDefinition {
		name: name.to_string(),
		title,
		description,
		short_description,
		input: compile(&format!("task '{name}' input"), input)?,
		output: compile(&format!("task '{name}' output"), output)?,
	})
}

/// Parse, resolve and compile a component definition.
///
/// `additional` holds named documents that `$ref`s may point into
/// (`<name>#/<pointer>`). An empty `setup` yields the empty object schema.
pub fn load_definition(
	definition: &[u8],
	setup: &[u8],
	tasks: &[u8],
	additional: &[(&str, &[u8])],
) -> Result<ComponentDefinition, ComponentError> {
	let doc: DefinitionDocument = serde_json::from_slice(definition)
		.map_err(|e| ComponentError::malformed(format!("definition document: {e}")))?;
	let uid = check_metadata(&doc)?;

	let extras = additional
		.iter()
		.map(|(name, bytes)| Ok((name.to_string(), parse_json(name, bytes)?)))
		.collect::<Result<HashMap<_, _>, ComponentError>>()?;

	let setup = load_setup(setup, &extras)?;
	let has_credentials = doc.has_credentials.unwrap_or_else(|| {
		setup
			.get("properties")
			.and_then(Value::as_object)
			.is_some_and(|props| !props.is_empty())
	});

	let tasks_doc = parse_json("tasks", tasks)?;
	let Value::Object(task_nodes) = &tasks_doc else {
		return Err(ComponentError::malformed("tasks document must be an object"));
	};
	let resolver = RefResolver::new(&tasks_doc, &extras);
	let mut loaded = HashMap::with_capacity(doc.available_tasks.len());
	for name in &doc.available_tasks {
		let task = load_task(name, task_nodes, &resolver)?;
		loaded.insert(name.clone(), Arc::new(task));
	}

	debug!(
		target: "component",
		id = %doc.id,
		version = %doc.version,
		tasks = doc.available_tasks.len(),
		"loaded component definition"
	);

	Ok(ComponentDefinition {
		source_url: parse_url("source_url", doc.source_url)?,
		documentation_url: parse_url("documentation_url", doc.documentation_url)?,
		setup: compile("setup", setup)?,
		id: doc.id,
		uid,
		title: doc.title,
		description: doc.description,
		version: doc.version,
		component_type: doc.component_type,
		vendor: doc.vendor,
		icon: doc.icon,
		release_stage: doc.release_stage,
		public: doc.public,
		tombstone: doc.tombstone,
		has_credentials,
		available_tasks: doc.available_tasks,
		tasks: loaded,
	})
}
