// Global secret resolution
//
// A setup field whose value is the `__INSTILL_SECRET` sentinel asks for the
// value injected for the component at start-up. Substitution happens once,
// when an execution is created, on a fresh copy of the setup.

use std::collections::HashMap;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use crate::error::ComponentError;
use crate::record::Record;

/// Sentinel value requesting a globally injected secret.
pub const SECRET_KEYWORD: &str = "__INSTILL_SECRET";

/// Secrets injected for one component, keyed by setup field.
pub type SecretMap = HashMap<String, SecretString>;

/// A setup with every sentinel substituted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedSetup {
	pub setup: Record,
	/// True when at least one field was substituted.
	pub uses_instill_credentials: bool,
}

fn lookup<'s>(secrets: &'s SecretMap, path: &str, leaf: &str) -> Option<&'s SecretString> {
	secrets
		.get(path)
		.or_else(|| secrets.get(leaf))
		.or_else(|| secrets.get(&leaf.replace(['-', '_'], "")))
}

/// Substitute every sentinel in `setup` with the matching injected secret.
///
/// Nested fields are named by their dotted path and array elements by
/// `field[i]`. A secret is looked up by that path, then by the field name,
/// then by the field name with `-` and `_` removed. A sentinel without a matching secret is an
/// `UnresolvedCredential` error. `setup` itself is left untouched.
pub fn resolve_setup(setup: &Record, secrets: &SecretMap) -> Result<ResolvedSetup, ComponentError> {
	let mut resolved = setup.clone();
	let mut substituted = 0usize;
	substitute(&mut resolved, "", secrets, &mut substituted)?;
	if substituted > 0 {
		debug!(target: "component", fields = substituted, "substituted global secrets in setup");
	}
	Ok(ResolvedSetup {
		setup: resolved,
		uses_instill_credentials: substituted > 0,
	})
}

fn substitute(
	record: &mut Record,
	prefix: &str,
	secrets: &SecretMap,
	substituted: &mut usize,
) -> Result<(), ComponentError> {
	for (key, value) in record.iter_mut() {
		let path = if prefix.is_empty() {
			key.clone()
		} else {
			format!("{prefix}.{key}")
		};
		substitute_value(value, &path, key, secrets, substituted)?;
	}
	Ok(())
}

/// Array elements are named `path[i]` and share the field name of their
/// array as the leaf.
fn substitute_value(
	value: &mut Value,
	path: &str,
	leaf: &str,
	secrets: &SecretMap,
	substituted: &mut usize,
) -> Result<(), ComponentError> {
	match value {
		Value::String(s) if s == SECRET_KEYWORD => {
			let secret = lookup(secrets, path, leaf).ok_or_else(|| ComponentError::unresolved_credential(path))?;
			*value = Value::String(secret.expose_secret().to_string());
			*substituted += 1;
		},
		Value::Object(nested) => substitute(nested, path, secrets, substituted)?,
		Value::Array(items) => {
			for (idx, item) in items.iter_mut().enumerate() {
				substitute_value(item, &format!("{path}[{idx}]"), leaf, secrets, substituted)?;
			}
		},
		_ => {},
	}
	Ok(())
}
