// File payload helpers for the `instill*` format keywords

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

const DATA_URI_PREFIX: &str = "data:";
const OCTET_STREAM: &str = "application/octet-stream";
const TEXT_PLAIN: &str = "text/plain";

/// Raised when a payload is not valid base64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndecodablePayload;

/// Strip a `data:<mime>;base64,` header, returning the bare payload.
pub fn trim_base64_mime(b64: &str) -> &str {
	b64.rsplit(',').next().unwrap_or(b64)
}

/// Media type declared by a `data:` URI header, if any.
fn declared_mime_type(value: &str) -> Option<&str> {
	let header = value.strip_prefix(DATA_URI_PREFIX)?;
	let (header, _) = header.split_once(',')?;
	let mime = header.split(';').next().unwrap_or_default().trim();
	(!mime.is_empty()).then_some(mime)
}

fn decode(value: &str) -> Result<Vec<u8>, UndecodablePayload> {
	STANDARD
		.decode(trim_base64_mime(value).trim())
		.map_err(|_| UndecodablePayload)
}

fn sniff(bytes: &[u8]) -> String {
	match infer::get(bytes) {
		Some(kind) => kind.mime_type().to_string(),
		None if std::str::from_utf8(bytes).is_ok() => TEXT_PLAIN.to_string(),
		None => OCTET_STREAM.to_string(),
	}
}

/// Determine the MIME type of a base64 file payload.
///
/// A `data:` URI reports the media type in its header (the payload must
/// still decode); bare base64 is sniffed from its magic bytes.
pub fn detect_mime_type(value: &str) -> Result<String, UndecodablePayload> {
	let bytes = decode(value)?;
	match declared_mime_type(value) {
		Some(mime) => Ok(mime.to_ascii_lowercase()),
		None => Ok(sniff(&bytes)),
	}
}

/// File extension of a base64 payload, preferring the sniffed type over the
/// declared one.
pub fn file_extension(value: &str) -> Option<String> {
	let bytes = decode(value).ok()?;
	if let Some(kind) = infer::get(&bytes) {
		return Some(kind.extension().to_string());
	}
	let mime = declared_mime_type(value)?;
	let (_, subtype) = mime.split_once('/')?;
	Some(subtype.split('+').next().unwrap_or(subtype).to_string())
}

/// Formats that carry no payload constraint for string instances.
pub(crate) fn is_unconstrained(format: &str) -> bool {
	matches!(format, "string" | "*" | "*/*")
		|| format.starts_with("semi-structured")
		|| format.starts_with("structured")
		|| !format.contains('/')
}

/// Match a detected MIME type against a declared format. A `/*` subtype in
/// the declaration accepts any subtype of the same top-level type.
pub fn format_matches(declared: &str, mime: &str) -> bool {
	let Some((declared_type, declared_subtype)) = declared.split_once('/') else {
		return false;
	};
	if declared_subtype == "*" {
		return mime
			.split_once('/')
			.is_some_and(|(mime_type, _)| mime_type.eq_ignore_ascii_case(declared_type));
	}
	declared.eq_ignore_ascii_case(mime)
}
