// Compiled schemas ready for runtime validation

use std::fmt;

use itertools::Itertools;
use jsonschema::{Draft, JSONSchema};
use jsonschema::error::ValidationErrorKind;
use serde_json::Value;
use thiserror::Error;

use super::keywords::{
	INSTILL_ACCEPT_FORMATS, INSTILL_FORMAT, instill_accept_formats_factory, instill_format_factory,
};
use super::normalize::normalize_array_shorthand;
use crate::record::Record;

/// Errors raised while compiling a schema.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
	#[error("invalid schema: {0}")]
	Compile(String),
}

/// Aggregated validation failure for a batch of records.
///
/// Renders as `"<path>: <message>"` entries joined with `"; "`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}", .entries.join("; "))]
pub struct ValidationError {
	entries: Vec<String>,
}

impl ValidationError {
	pub fn new(entries: Vec<String>) -> Self {
		Self { entries }
	}

	/// Individual `"<path>: <message>"` entries.
	pub fn entries(&self) -> &[String] {
		&self.entries
	}
}

/// A normalised schema compiled with the custom keywords.
///
/// Compiled once when a component loads and shared across executions.
pub struct CompiledSchema {
	raw: Value,
	validator: JSONSchema,
}

impl fmt::Debug for CompiledSchema {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CompiledSchema").field("raw", &self.raw).finish()
	}
}

impl CompiledSchema {
	/// Normalise `array:` shorthand and compile against Draft 2020-12.
	pub fn compile(mut raw: Value) -> Result<Self, SchemaError> {
		normalize_array_shorthand(&mut raw);
		let validator = JSONSchema::options()
			.with_draft(Draft::Draft202012)
			.with_keyword(INSTILL_FORMAT, instill_format_factory)
			.with_keyword(INSTILL_ACCEPT_FORMATS, instill_accept_formats_factory)
			.compile(&raw)
			.map_err(|e| SchemaError::Compile(e.to_string()))?;
		Ok(Self { raw, validator })
	}

	/// The normalised schema document.
	pub fn schema(&self) -> &Value {
		&self.raw
	}

	/// Every violation of `record`, rendered with paths rooted at `root`.
	pub fn record_errors(&self, record: &Record, root: &str) -> Vec<String> {
		let instance = Value::Object(record.clone());
		match self.validator.validate(&instance) {
			Ok(()) => Vec::new(),
			Err(errors) => errors.map(|e| render_error(root, &e)).collect(),
		}
	}

	/// Validate a single record.
	pub fn validate_record(&self, record: &Record, root: &str) -> Result<(), ValidationError> {
		let entries = self.record_errors(record, root);
		if entries.is_empty() {
			Ok(())
		} else {
			Err(ValidationError::new(entries))
		}
	}
}

fn render_error(root: &str, err: &jsonschema::ValidationError<'_>) -> String {
	let mut path = format_instance_path(root, &err.instance_path.to_string());
	let message = match &err.kind {
		ValidationErrorKind::Required { property } => {
			if let Some(name) = property.as_str() {
				path.push('.');
				path.push_str(name);
			}
			format!("missing properties: {property}")
		},
		_ => err.to_string(),
	};
	format!("{path}: {message}")
}

/// Rewrite a JSON pointer into a dotted/indexed path under `root`:
/// `("inputs[0]", "/a/b/0/c")` becomes `inputs[0].a.b[0].c`.
pub fn format_instance_path(root: &str, pointer: &str) -> String {
	let mut path = root.to_string();
	for segment in pointer.split('/').skip(1) {
		let segment = segment.replace("~1", "/").replace("~0", "~");
		if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
			path.push('[');
			path.push_str(&segment);
			path.push(']');
		} else {
			path.push('.');
			path.push_str(&segment);
		}
	}
	path
}

/// Validate every record of a batch against `schema`.
///
/// Paths are rooted at `origin[i]`. Returns `Ok` only when all records
/// validate.
pub fn validate(records: &[Record], schema: &CompiledSchema, origin: &str) -> Result<(), ValidationError> {
	let entries = records
		.iter()
		.enumerate()
		.flat_map(|(idx, record)| schema.record_errors(record, &format!("{origin}[{idx}]")))
		.collect_vec();
	if entries.is_empty() {
		Ok(())
	} else {
		Err(ValidationError::new(entries))
	}
}
