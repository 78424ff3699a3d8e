// Shared data contracts
//
// Record shapes referenced by many task schemas. The matching JSON-Schema
// fragments ship as the `instill-types` additional document so task
// documents can `$ref` them (`instill-types#/$defs/chat-message`).

use serde::{Deserialize, Serialize};

/// Name under which the shared schema fragments are registered.
pub const INSTILL_TYPES: &str = "instill-types";

/// Embedded shared schema fragments.
pub const INSTILL_TYPES_SCHEMA: &[u8] = include_bytes!("../resources/instill-types.json");

/// The shared fragments as an additional document entry for the loader.
pub fn shared_documents() -> [(&'static str, &'static [u8]); 1] {
	[(INSTILL_TYPES, INSTILL_TYPES_SCHEMA)]
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ChatMessage {
	pub role: String,
	pub content: Vec<MultiModalContent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ImageUrl {
	pub url: String,
}

/// One part of a multi-modal message: text or an image reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MultiModalContent {
	#[serde(rename = "type")]
	pub content_type: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub text: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub image_url: Option<ImageUrl>,
}

impl MultiModalContent {
	pub fn text(text: impl Into<String>) -> Self {
		Self {
			content_type: "text".to_string(),
			text: Some(text.into()),
			image_url: None,
		}
	}

	pub fn image_url(url: impl Into<String>) -> Self {
		Self {
			content_type: "image_url".to_string(),
			text: None,
			image_url: Some(ImageUrl { url: url.into() }),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GenerativeTextModelUsage {
	pub input_tokens: i64,
	pub output_tokens: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EmbeddingTextModelUsage {
	pub tokens: i64,
}

/// Input of the templated text-generation task shared by model vendors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TemplateTextGenerationInput {
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub chat_history: Vec<ChatMessage>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_new_tokens: Option<i64>,
	pub model_name: String,
	pub prompt: String,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub prompt_images: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub seed: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub system_message: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub temperature: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub top_k: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TemplateTextGenerationOutput {
	pub text: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub usage: Option<GenerativeTextModelUsage>,
}
