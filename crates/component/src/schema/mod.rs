// Schema Engine
//
// JSON-Schema evaluation extended with the `instill*` keywords:
// - `instillFormat` / `instillAcceptFormats` checks on file payloads
// - `array:` shorthand rewriting at load time
// - batch validation with human-readable error paths

mod compiled;
mod formats;
mod keywords;
mod normalize;

pub use compiled::{CompiledSchema, SchemaError, ValidationError, format_instance_path, validate};
pub use formats::{detect_mime_type, file_extension, format_matches, trim_base64_mime};
pub use keywords::{INSTILL_ACCEPT_FORMATS, INSTILL_FORMAT, INSTILL_UI_ORDER};
pub use normalize::{ARRAY_PREFIX, contains_array_shorthand, normalize_array_shorthand};
