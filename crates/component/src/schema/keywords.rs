// Custom keyword extensions registered on the JSON-Schema compiler

use std::iter::once;

use jsonschema::paths::{JSONPointer, JsonPointerNode};
use jsonschema::{ErrorIterator, Keyword, ValidationError};
use serde_json::{Map, Value};

use super::formats::{detect_mime_type, format_matches, is_unconstrained};

pub const INSTILL_FORMAT: &str = "instillFormat";
pub const INSTILL_ACCEPT_FORMATS: &str = "instillAcceptFormats";
/// Presentation-only ordering hint. Never validated.
pub const INSTILL_UI_ORDER: &str = "instillUIOrder";

const CANNOT_DECODE: &str = "can not decode file";

/// Outcome of checking one string instance against a set of formats.
enum FormatCheck {
	Accepted,
	Undecodable,
	Mismatch(String),
}

fn check_formats(formats: &[String], value: &str) -> FormatCheck {
	if formats.iter().any(|f| is_unconstrained(f)) {
		return FormatCheck::Accepted;
	}
	let mime = match detect_mime_type(value) {
		Ok(mime) => mime,
		Err(_) => return FormatCheck::Undecodable,
	};
	if formats.iter().any(|f| format_matches(f, &mime)) {
		FormatCheck::Accepted
	} else {
		FormatCheck::Mismatch(mime)
	}
}

fn format_error<'i>(
	instance: &'i Value,
	instance_path: &JsonPointerNode,
	message: String,
) -> ErrorIterator<'i> {
	Box::new(once(ValidationError::custom(
		JSONPointer::default(),
		instance_path.into(),
		instance,
		message,
	)))
}

/// `instillFormat`: a single semantic format for the node.
#[derive(Debug)]
pub(crate) struct InstillFormat {
	format: String,
}

impl Keyword for InstillFormat {
	fn validate<'instance>(
		&self,
		instance: &'instance Value,
		instance_path: &JsonPointerNode,
	) -> ErrorIterator<'instance> {
		let Value::String(value) = instance else {
			return Box::new(std::iter::empty());
		};
		match check_formats(std::slice::from_ref(&self.format), value) {
			FormatCheck::Accepted => Box::new(std::iter::empty()),
			FormatCheck::Undecodable => format_error(instance, instance_path, CANNOT_DECODE.to_string()),
			FormatCheck::Mismatch(mime) => format_error(
				instance,
				instance_path,
				format!("expected {}, but got {}", self.format, mime),
			),
		}
	}

	fn is_valid(&self, instance: &Value) -> bool {
		match instance {
			Value::String(value) => matches!(
				check_formats(std::slice::from_ref(&self.format), value),
				FormatCheck::Accepted
			),
			_ => true,
		}
	}
}

/// `instillAcceptFormats`: the node accepts any of several formats.
#[derive(Debug)]
pub(crate) struct InstillAcceptFormats {
	formats: Vec<String>,
}

impl Keyword for InstillAcceptFormats {
	fn validate<'instance>(
		&self,
		instance: &'instance Value,
		instance_path: &JsonPointerNode,
	) -> ErrorIterator<'instance> {
		let Value::String(value) = instance else {
			return Box::new(std::iter::empty());
		};
		match check_formats(&self.formats, value) {
			FormatCheck::Accepted => Box::new(std::iter::empty()),
			FormatCheck::Undecodable => format_error(instance, instance_path, CANNOT_DECODE.to_string()),
			FormatCheck::Mismatch(mime) => format_error(
				instance,
				instance_path,
				format!("expected one of [{}], but got {}", self.formats.join(" "), mime),
			),
		}
	}

	fn is_valid(&self, instance: &Value) -> bool {
		match instance {
			Value::String(value) => matches!(check_formats(&self.formats, value), FormatCheck::Accepted),
			_ => true,
		}
	}
}

pub(crate) fn instill_format_factory<'a>(
	_parent: &'a Map<String, Value>,
	value: &'a Value,
	path: JSONPointer,
) -> Result<Box<dyn Keyword>, ValidationError<'a>> {
	match value {
		Value::String(format) => Ok(Box::new(InstillFormat {
			format: format.clone(),
		})),
		_ => Err(ValidationError::custom(
			JSONPointer::default(),
			path,
			value,
			"instillFormat must be a string",
		)),
	}
}

pub(crate) fn instill_accept_formats_factory<'a>(
	_parent: &'a Map<String, Value>,
	value: &'a Value,
	path: JSONPointer,
) -> Result<Box<dyn Keyword>, ValidationError<'a>> {
	let formats = value.as_array().and_then(|items| {
		items
			.iter()
			.map(|item| item.as_str().map(str::to_string))
			.collect::<Option<Vec<_>>>()
	});
	match formats {
		Some(formats) => Ok(Box::new(InstillAcceptFormats { formats })),
		None => Err(ValidationError::custom(
			JSONPointer::default(),
			path,
			value,
			"instillAcceptFormats must be an array of strings",
		)),
	}
}
