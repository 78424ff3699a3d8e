// `$ref` expansion for definition documents
//
// `#/<pointer>` points into the document currently being expanded,
// `<name>#/<pointer>` and `<name>` point into an additional document.
// Targets are deep-copied in place; sibling keys on the `$ref` node win.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::ComponentError;

const REF: &str = "$ref";

/// Expands references against a root document and named extra documents.
#[derive(Debug)]
pub(crate) struct RefResolver<'d> {
	root: &'d Value,
	extras: &'d HashMap<String, Value>,
}

impl<'d> RefResolver<'d> {
	pub(crate) fn new(root: &'d Value, extras: &'d HashMap<String, Value>) -> Self {
		Self { root, extras }
	}

	/// Return a copy of `value` (taken from the root document) with every
	/// reference expanded.
	pub(crate) fn resolve(&self, value: &Value) -> Result<Value, ComponentError> {
		self.resolve_in(value, None, &mut Vec::new())
	}

	fn document(&self, doc: Option<&str>) -> Result<&'d Value, ComponentError> {
		match doc {
			None => Ok(self.root),
			Some(name) => self
				.extras
				.get(name)
				.ok_or_else(|| ComponentError::malformed(format!("unknown document '{name}'"))),
		}
	}

	/// Split a reference into the document it targets and a JSON pointer.
	fn locate(&self, reference: &str, current: Option<&'d str>) -> Result<(Option<&'d str>, String), ComponentError> {
		let (name, pointer) = reference.split_once('#').unwrap_or((reference, ""));
		if name.is_empty() {
			return Ok((current, pointer.to_string()));
		}
		match self.extras.get_key_value(name) {
			Some((name, _)) => Ok((Some(name.as_str()), pointer.to_string())),
			None => Err(ComponentError::malformed(format!(
				"$ref '{reference}' points to unknown document '{name}'"
			))),
		}
	}

	fn resolve_in(
		&self,
		value: &Value,
		doc: Option<&'d str>,
		stack: &mut Vec<String>,
	) -> Result<Value, ComponentError> {
		match value {
			Value::Object(node) => match node.get(REF) {
				Some(Value::String(reference)) => self.expand(node, reference, doc, stack),
				Some(_) => Err(ComponentError::malformed("$ref must be a string")),
				None => {
					let mut resolved = Map::with_capacity(node.len());
					for (key, child) in node {
						resolved.insert(key.clone(), self.resolve_in(child, doc, stack)?);
					}
					Ok(Value::Object(resolved))
				},
			},
			Value::Array(items) => items
				.iter()
				.map(|item| self.resolve_in(item, doc, stack))
				.collect::<Result<Vec<_>, _>>()
				.map(Value::Array),
			other => Ok(other.clone()),
		}
	}

	fn expand(
		&self,
		node: &Map<String, Value>,
		reference: &str,
		doc: Option<&'d str>,
		stack: &mut Vec<String>,
	) -> Result<Value, ComponentError> {
		let (target_doc, pointer) = self.locate(reference, doc)?;
		let key = format!("{}#{}", target_doc.unwrap_or_default(), pointer);
		if stack.contains(&key) {
			return Err(ComponentError::malformed(format!("circular $ref '{reference}'")));
		}
		let target = self
			.document(target_doc)?
			.pointer(&pointer)
			.ok_or_else(|| ComponentError::malformed(format!("unresolvable $ref '{reference}'")))?;

		stack.push(key);
		let expanded = self.resolve_in(target, target_doc, stack);
		stack.pop();
		let expanded = expanded?;

		if node.len() == 1 {
			return Ok(expanded);
		}
		let Value::Object(mut merged) = expanded else {
			return Err(ComponentError::malformed(format!(
				"$ref '{reference}' with sibling keys must point to an object"
			)));
		};
		for (key, child) in node {
			if key != REF {
				merged.insert(key.clone(), self.resolve_in(child, doc, stack)?);
			}
		}
		Ok(Value::Object(merged))
	}
}
