// Array shorthand normalisation
//
// `instillFormat: "array:T"` and `instillAcceptFormats: ["array:T"]` are
// rewritten into an array node whose `items` carry the scalar form.

use serde_json::{Map, Value};

use super::keywords::{INSTILL_ACCEPT_FORMATS, INSTILL_FORMAT};

pub const ARRAY_PREFIX: &str = "array:";

/// Keywords whose values are instance data, not sub-schemas.
const DATA_KEYWORDS: &[&str] = &["const", "default", "enum", "examples", "example"];

/// Keywords whose values map arbitrary names to sub-schemas.
const SCHEMA_MAP_KEYWORDS: &[&str] = &[
	"properties",
	"patternProperties",
	"$defs",
	"definitions",
	"dependentSchemas",
];

/// Rewrite every `array:` shorthand in `schema` in place.
pub fn normalize_array_shorthand(schema: &mut Value) {
	match schema {
		Value::Object(node) => {
			rewrite_instill_format(node);
			rewrite_accept_formats(node);
			for (key, child) in node.iter_mut() {
				match (key.as_str(), child) {
					(k, _) if DATA_KEYWORDS.contains(&k) => {},
					// Names under these keywords are user-chosen, so a property
					// called `default` is still a schema.
					(k, Value::Object(named)) if SCHEMA_MAP_KEYWORDS.contains(&k) => {
						named.values_mut().for_each(normalize_array_shorthand)
					},
					(_, child) => normalize_array_shorthand(child),
				}
			}
		},
		Value::Array(items) => items.iter_mut().for_each(normalize_array_shorthand),
		_ => {},
	}
}

/// Whether any `instillFormat` / `instillAcceptFormats` in `schema` still uses
/// the `array:` shorthand.
pub fn contains_array_shorthand(schema: &Value) -> bool {
	match schema {
		Value::Object(node) => node.iter().any(|(key, value)| match (key.as_str(), value) {
			(INSTILL_FORMAT, _) => value.as_str().is_some_and(|f| f.starts_with(ARRAY_PREFIX)),
			(INSTILL_ACCEPT_FORMATS, _) => value.as_array().is_some_and(|formats| {
				formats
					.iter()
					.any(|f| f.as_str().is_some_and(|f| f.starts_with(ARRAY_PREFIX)))
			}),
			(k, _) if DATA_KEYWORDS.contains(&k) => false,
			(k, Value::Object(named)) if SCHEMA_MAP_KEYWORDS.contains(&k) => {
				named.values().any(contains_array_shorthand)
			},
			_ => contains_array_shorthand(value),
		}),
		Value::Array(items) => items.iter().any(contains_array_shorthand),
		_ => false,
	}
}

fn rewrite_instill_format(node: &mut Map<String, Value>) {
	let item_format = node
		.get(INSTILL_FORMAT)
		.and_then(Value::as_str)
		.and_then(|f| f.strip_prefix(ARRAY_PREFIX))
		.map(str::to_string);
	let Some(item_format) = item_format else {
		return;
	};

	node.remove(INSTILL_FORMAT);
	mark_array(node);
	items_schema(node).insert(INSTILL_FORMAT.to_string(), Value::String(item_format));
}

fn rewrite_accept_formats(node: &mut Map<String, Value>) {
	let Some(Value::Array(formats)) = node.get(INSTILL_ACCEPT_FORMATS) else {
		return;
	};

	let mut item_formats = Vec::new();
	let mut kept = Vec::new();
	for format in formats {
		match format.as_str().and_then(|f| f.strip_prefix(ARRAY_PREFIX)) {
			Some(item) => item_formats.push(Value::String(item.to_string())),
			None => kept.push(format.clone()),
		}
	}
	if item_formats.is_empty() {
		return;
	}

	if kept.is_empty() {
		node.remove(INSTILL_ACCEPT_FORMATS);
	} else {
		node.insert(INSTILL_ACCEPT_FORMATS.to_string(), Value::Array(kept));
	}
	mark_array(node);

	let items = items_schema(node);
	match items.get_mut(INSTILL_ACCEPT_FORMATS) {
		Some(Value::Array(existing)) => {
			for format in item_formats {
				if !existing.contains(&format) {
					existing.push(format);
				}
			}
		},
		_ => {
			items.insert(INSTILL_ACCEPT_FORMATS.to_string(), Value::Array(item_formats));
		},
	}
}

fn mark_array(node: &mut Map<String, Value>) {
	node
		.entry("type")
		.or_insert_with(|| Value::String("array".to_string()));
}

fn items_schema(node: &mut Map<String, Value>) -> &mut Map<String, Value> {
	let items = node
		.entry("items")
		.or_insert_with(|| Value::Object(Map::new()));
	if !items.is_object() {
		*items = Value::Object(Map::new());
	}
	match items {
		Value::Object(items) => items,
		_ => unreachable!("items was just replaced with an object"),
	}
}
