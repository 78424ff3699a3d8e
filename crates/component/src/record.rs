// Generic records and typed conversion helpers
//
// Records are the key/value structures exchanged with the pipeline runtime.
// Typed contracts name their fields in kebab-case; incoming field names are
// matched with case/kebab tolerance so `inputTokens`, `input_tokens` and
// `input-tokens` all land on the same field. Keys of map-typed fields are
// data and pass through untouched.

use heck::ToKebabCase;
use serde::de::value::{MapDeserializer, SeqDeserializer};
use serde::de::{DeserializeOwned, Deserializer, IntoDeserializer, Visitor};
use serde::{Deserialize, Serialize, forward_to_deserialize_any};
use serde_json::{Map, Value};
use thiserror::Error;

/// An ordered mapping from field names to dynamically typed values.
pub type Record = Map<String, Value>;

#[derive(Error, Debug)]
pub enum ConversionError {
	#[error("failed to convert record: {0}")]
	Serde(#[from] serde_json::Error),

	#[error("expected a record, got {0}")]
	NotARecord(&'static str),
}

/// Convert a field name to its canonical kebab-case form.
pub fn to_kebab_case(name: &str) -> String {
	name.to_kebab_case()
}

/// Deserializer over a JSON value that applies name tolerance to struct
/// fields only.
struct FieldTolerant(Value);

impl<'de> IntoDeserializer<'de, serde_json::Error> for FieldTolerant {
	type Deserializer = Self;

	fn into_deserializer(self) -> Self {
		self
	}
}

impl<'de> Deserializer<'de> for FieldTolerant {
	type Error = serde_json::Error;

	fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
		match self.0 {
			Value::Array(items) => visit_array(items, visitor),
			Value::Object(fields) => visit_object(fields, visitor),
			scalar => scalar.deserialize_any(visitor),
		}
	}

	fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
		match self.0 {
			Value::Null => visitor.visit_none(),
			value => visitor.visit_some(FieldTolerant(value)),
		}
	}

	fn deserialize_newtype_struct<V: Visitor<'de>>(
		self,
		_name: &'static str,
		visitor: V,
	) -> Result<V::Value, Self::Error> {
		visitor.visit_newtype_struct(self)
	}

	fn deserialize_struct<V: Visitor<'de>>(
		self,
		name: &'static str,
		fields: &'static [&'static str],
		visitor: V,
	) -> Result<V::Value, Self::Error> {
		match self.0 {
			Value::Object(record) => visit_object(match_fields(record, fields), visitor),
			other => other.deserialize_struct(name, fields, visitor),
		}
	}

	fn deserialize_enum<V: Visitor<'de>>(
		self,
		name: &'static str,
		variants: &'static [&'static str],
		visitor: V,
	) -> Result<V::Value, Self::Error> {
		self.0.deserialize_enum(name, variants, visitor)
	}

	forward_to_deserialize_any! {
		bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
		bytes byte_buf unit unit_struct seq tuple tuple_struct map identifier ignored_any
	}
}

fn visit_array<'de, V: Visitor<'de>>(items: Vec<Value>, visitor: V) -> Result<V::Value, serde_json::Error> {
	let mut seq = SeqDeserializer::<_, serde_json::Error>::new(items.into_iter().map(FieldTolerant));
	let value = visitor.visit_seq(&mut seq)?;
	seq.end()?;
	Ok(value)
}

fn visit_object<'de, V: Visitor<'de>>(
	fields: Map<String, Value>,
	visitor: V,
) -> Result<V::Value, serde_json::Error> {
	let mut map = MapDeserializer::<_, serde_json::Error>::new(
		fields.into_iter().map(|(k, v)| (k, FieldTolerant(v))),
	);
	let value = visitor.visit_map(&mut map)?;
	map.end()?;
	Ok(value)
}

/// Rename keys of `record` onto the declared `names` they match once both
/// are kebab-cased. An exact key wins over a tolerated one.
fn match_fields(record: Map<String, Value>, names: &[&str]) -> Map<String, Value> {
	let mut matched = Map::with_capacity(record.len());
	let mut tolerated = Vec::new();
	for (key, value) in record {
		if names.contains(&key.as_str()) {
			matched.insert(key, value);
			continue;
		}
		let canonical = to_kebab_case(&key);
		match names.iter().find(|name| to_kebab_case(name) == canonical) {
			Some(name) => tolerated.push((name.to_string(), value)),
			None => {
				matched.insert(key, value);
			},
		}
	}
	for (name, value) in tolerated {
		matched.entry(name).or_insert(value);
	}
	matched
}

fn kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "sequence",
		Value::Object(_) => "record",
	}
}

/// Decode a record into a typed contract. Missing fields take the
/// contract's defaults.
pub fn from_record<T: DeserializeOwned>(record: &Record) -> Result<T, ConversionError> {
	Ok(T::deserialize(FieldTolerant(Value::Object(record.clone())))?)
}

/// Encode a typed contract as a record.
pub fn to_record<T: Serialize>(value: &T) -> Result<Record, ConversionError> {
	match serde_json::to_value(value)? {
		Value::Object(record) => Ok(record),
		other => Err(ConversionError::NotARecord(kind(&other))),
	}
}

/// Decode a batch of records, preserving order.
pub fn from_records<T: DeserializeOwned>(records: &[Record]) -> Result<Vec<T>, ConversionError> {
	records.iter().map(from_record).collect()
}

/// Encode a batch of contracts, preserving order.
pub fn to_records<T: Serialize>(values: &[T]) -> Result<Vec<Record>, ConversionError> {
	values.iter().map(to_record).collect()
}

/// Build a record from a JSON object literal.
///
/// Panics when `value` is not an object.
#[cfg(any(test, feature = "testing"))]
pub fn record(value: Value) -> Record {
	match value {
		Value::Object(record) => record,
		other => panic!("expected a JSON object, got {other}"),
	}
}
