// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! JSON parsing for ChatGPT conversation exports.
//!
//! A ChatGPT data export ships a `conversations.json` file holding an array
//! of conversation records. Each record stores its messages as a tree of
//! nodes keyed by id, where every node points at its parent. The node the
//! user last saw is recorded as `current_node`.
//!
//! # Format Overview
//!
//! - `title`, `create_time` and `current_node` describe the conversation
//! - `mapping` holds every node, including branches that were abandoned
//!   when a message was edited or regenerated
//! - message content parts are either bare strings (older exports) or
//!   objects carrying a `content_type` and optional asset pointers
//!
//! # Example
//!
//! ```
//! use gpt2md::parser::parse_conversations;
//!
//! let json = r#"[{
//!     "title": "Greeting",
//!     "current_node": "a",
//!     "mapping": {
//!         "a": {
//!             "message": {
//!                 "author": { "role": "user" },
//!                 "content": { "content_type": "text", "parts": ["Hello"] }
//!             },
//!             "parent": null
//!         }
//!     }
//! }]"#;
//!
//! let conversations = parse_conversations(json).unwrap();
//! assert_eq!(conversations[0].title, "Greeting");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use snafu::prelude::*;
use std::collections::HashMap;

/// Error type for JSON parsing failures.
#[derive(Debug, Snafu)]
pub enum ParseError {
    /// Failed to parse JSON content.
    #[snafu(display("failed to parse JSON: {source}"))]
    Json {
        /// The underlying JSON parsing error.
        source: serde_json::Error,
    },
}

/// One exported chat session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Conversation {
    /// The conversation title shown in the ChatGPT sidebar.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    /// Creation time in seconds since the Unix epoch.
    #[serde(default)]
    pub create_time: Option<f64>,

    /// Id of the most recent leaf; linearizing starts here.
    ///
    /// Empty when the export carries no current node.
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_node: String,

    /// Every node of the conversation tree, keyed by node id.
    #[serde(default, deserialize_with = "null_as_default")]
    pub mapping: HashMap<String, Node>,
}

impl Conversation {
    /// Returns the creation time, if the export records a valid one.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let secs = self.create_time.filter(|t| t.is_finite())?;
        DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
    }
}

/// One point in the conversation tree.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Node {
    /// The message stored at this node.
    ///
    /// `None` for structural placeholders such as the synthetic root.
    #[serde(default)]
    pub message: Option<MessageRecord>,

    /// Id of the parent node, or `None` at the root.
    #[serde(default)]
    pub parent: Option<String>,
}

/// A single message as stored in the export.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageRecord {
    /// Who wrote the message.
    pub author: Author,

    /// The message body.
    pub content: Content,

    /// Additional flags attached to the message.
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Metadata,
}

/// The author of a message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Author {
    /// Role name: `user`, `assistant`, `system`, `tool`, ...
    pub role: String,
}

/// The body of a message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Content {
    /// Message-level content type (`text`, `multimodal_text`, `code`, ...).
    #[serde(default, deserialize_with = "null_as_default")]
    pub content_type: String,

    /// The content parts in display order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub parts: Vec<RawContentPart>,
}

/// Message metadata the converter cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct Metadata {
    /// Set on system messages that hold the user's custom instructions.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_user_system_message: bool,
}

/// One content part exactly as it appears in the export.
///
/// Older exports store plain strings; newer ones store objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawContentPart {
    /// A bare string, equivalent to a structured part with content type
    /// `text` and no asset pointers.
    Text(String),

    /// A structured part.
    Structured(StructuredPart),
}

impl RawContentPart {
    /// Returns the part's content type; bare strings report `text`.
    #[must_use]
    pub fn content_type(&self) -> &str {
        match self {
            Self::Text(_) => "text",
            Self::Structured(part) => &part.content_type,
        }
    }

    /// Returns the part's text, empty when it has none.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Structured(part) => &part.text,
        }
    }
}

impl<'de> Deserialize<'de> for RawContentPart {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let value = serde_json::Value::deserialize(deserializer)?;

        match value {
            serde_json::Value::String(text) => Ok(Self::Text(text)),
            serde_json::Value::Object(map) => serde_json::from_value(map.into())
                .map(Self::Structured)
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!(
                "content part must be a string or an object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

/// A structured content part.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct StructuredPart {
    /// Part-level content type (`audio_transcription`, `image_asset_pointer`, ...).
    #[serde(default, deserialize_with = "null_as_default")]
    pub content_type: String,

    /// Inline text, empty for pure asset parts.
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,

    /// The part's own asset URI, set on `*_asset_pointer` parts.
    #[serde(default)]
    pub asset_pointer: Option<String>,

    /// Audio track of a real-time voice/video part.
    #[serde(default)]
    pub audio_asset_pointer: Option<AssetPointer>,

    /// Video track of a real-time voice/video part.
    #[serde(default)]
    pub video_container_asset_pointer: Option<AssetPointer>,

    /// Still frames of a real-time video part; entries may be `null`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub frame_asset_pointers: Vec<Option<AssetPointer>>,
}

/// A pointer to media stored outside the JSON document.
///
/// Only the identifying fields are kept. Sizes, formats and other
/// descriptive fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct AssetPointer {
    /// Kind of asset (`audio_asset_pointer`, `image_asset_pointer`, ...).
    #[serde(default)]
    pub content_type: Option<String>,

    /// Asset URI, e.g. `file-service://file-abc123`.
    #[serde(default)]
    pub asset_pointer: Option<String>,
}

/// Deserializes `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Describes a JSON value's type for error messages.
const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Parses the contents of a `conversations.json` file.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or doesn't match the expected
/// export schema, including content parts that are neither strings nor
/// objects.
///
/// # Example
///
/// ```
/// use gpt2md::parser::parse_conversations;
///
/// let conversations = parse_conversations("[]").unwrap();
/// assert!(conversations.is_empty());
/// ```
pub fn parse_conversations(json_str: &str) -> Result<Vec<Conversation>, ParseError> {
    serde_json::from_str(json_str).context(JsonSnafu)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation_json(mapping_json: &str) -> String {
        format!(
            r#"[{{
                "title": "Test",
                "create_time": 1733356800.5,
                "current_node": "n1",
                "mapping": {{ {mapping_json} }}
            }}]"#
        )
    }

    fn node_json(id: &str, parts_json: &str) -> String {
        format!(
            r#""{id}": {{
                "message": {{
                    "author": {{ "role": "user" }},
                    "content": {{ "content_type": "multimodal_text", "parts": [{parts_json}] }},
                    "metadata": {{ "is_user_system_message": false }}
                }},
                "parent": "root"
            }}"#
        )
    }

    fn parse_single(mapping_json: &str) -> Conversation {
        parse_conversations(&conversation_json(mapping_json))
            .unwrap()
            .remove(0)
    }

    fn parts_of(conversation: &Conversation, id: &str) -> Vec<RawContentPart> {
        conversation.mapping[id]
            .message
            .as_ref()
            .unwrap()
            .content
            .parts
            .clone()
    }

    #[test]
    fn parses_conversation_fields() {
        let conversation = parse_single(&node_json("n1", r#""Hi""#));

        assert_eq!(conversation.title, "Test");
        assert_eq!(conversation.current_node, "n1");
        assert_eq!(conversation.create_time, Some(1_733_356_800.5));
        assert_eq!(conversation.mapping.len(), 1);
        assert_eq!(conversation.mapping["n1"].parent.as_deref(), Some("root"));
    }

    #[test]
    fn converts_create_time_to_datetime() {
        let conversation = parse_single(&node_json("n1", r#""Hi""#));
        let created = conversation.created_at().unwrap();

        assert_eq!(created.timestamp_millis(), 1_733_356_800_500);
    }

    #[test]
    fn parses_string_part_as_text() {
        let conversation = parse_single(&node_json("n1", r#""Hello there""#));
        let parts = parts_of(&conversation, "n1");

        assert_eq!(parts, vec![RawContentPart::Text("Hello there".into())]);
        assert_eq!(parts[0].content_type(), "text");
        assert_eq!(parts[0].text(), "Hello there");
    }

    #[test]
    fn parses_structured_asset_part() {
        let conversation = parse_single(&node_json(
            "n1",
            r#"{
                "content_type": "image_asset_pointer",
                "asset_pointer": "file-service://file-abc",
                "size_bytes": 1024,
                "width": 512,
                "height": 512
            }"#,
        ));

        match &parts_of(&conversation, "n1")[0] {
            RawContentPart::Structured(part) => {
                assert_eq!(part.content_type, "image_asset_pointer");
                assert!(part.text.is_empty());
                assert_eq!(part.asset_pointer.as_deref(), Some("file-service://file-abc"));
            }
            other => panic!("Expected Structured, got {other:?}"),
        }
    }

    #[test]
    fn parses_real_time_part_with_null_frames() {
        let conversation = parse_single(&node_json(
            "n1",
            r#"{
                "content_type": "real_time_user_audio_video_asset_pointer",
                "audio_asset_pointer": {
                    "content_type": "audio_asset_pointer",
                    "asset_pointer": "sediment://audio",
                    "format": "wav"
                },
                "video_container_asset_pointer": null,
                "frame_asset_pointers": [
                    { "asset_pointer": "sediment://frame-1" },
                    null
                ]
            }"#,
        ));

        match &parts_of(&conversation, "n1")[0] {
            RawContentPart::Structured(part) => {
                let audio = part.audio_asset_pointer.as_ref().unwrap();
                assert_eq!(audio.content_type.as_deref(), Some("audio_asset_pointer"));
                assert_eq!(audio.asset_pointer.as_deref(), Some("sediment://audio"));
                assert!(part.video_container_asset_pointer.is_none());
                assert_eq!(part.frame_asset_pointers.len(), 2);
                assert!(part.frame_asset_pointers[1].is_none());
            }
            other => panic!("Expected Structured, got {other:?}"),
        }
    }

    #[test]
    fn parses_mixed_part_shapes_in_order() {
        let conversation = parse_single(&node_json(
            "n1",
            r#""caption", { "content_type": "audio_transcription", "text": "spoken" }"#,
        ));
        let parts = parts_of(&conversation, "n1");

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].text(), "caption");
        assert_eq!(parts[1].content_type(), "audio_transcription");
        assert_eq!(parts[1].text(), "spoken");
    }

    #[test]
    fn parses_nulls_as_empty_values() {
        let json = r#"[{
            "title": null,
            "current_node": null,
            "mapping": {
                "root": { "message": null, "parent": null },
                "n1": {
                    "message": {
                        "author": { "role": "system" },
                        "content": { "content_type": "text", "parts": null },
                        "metadata": null
                    },
                    "parent": "root"
                }
            }
        }]"#;
        let conversation = parse_conversations(json).unwrap().remove(0);

        assert!(conversation.title.is_empty());
        assert!(conversation.current_node.is_empty());
        assert!(conversation.create_time.is_none());
        assert!(conversation.mapping["root"].message.is_none());
        assert!(conversation.mapping["root"].parent.is_none());

        let message = conversation.mapping["n1"].message.as_ref().unwrap();
        assert!(message.content.parts.is_empty());
        assert!(!message.metadata.is_user_system_message);
    }

    #[test]
    fn parses_missing_metadata_and_parts() {
        let json = r#"[{
            "title": "Code",
            "current_node": "n1",
            "mapping": {
                "n1": {
                    "message": {
                        "author": { "role": "assistant" },
                        "content": { "content_type": "code", "text": "print(1)" }
                    }
                }
            }
        }]"#;
        let conversation = parse_conversations(json).unwrap().remove(0);
        let message = conversation.mapping["n1"].message.as_ref().unwrap();

        assert_eq!(message.content.content_type, "code");
        assert!(message.content.parts.is_empty());
        assert!(conversation.mapping["n1"].parent.is_none());
    }

    #[test]
    fn parses_user_system_message_flag() {
        let json = r#"[{
            "title": "Custom",
            "current_node": "n1",
            "mapping": {
                "n1": {
                    "message": {
                        "author": { "role": "system" },
                        "content": { "content_type": "text", "parts": ["About me"] },
                        "metadata": { "is_user_system_message": true }
                    }
                }
            }
        }]"#;
        let conversation = parse_conversations(json).unwrap().remove(0);
        let message = conversation.mapping["n1"].message.as_ref().unwrap();

        assert!(message.metadata.is_user_system_message);
    }

    #[test]
    fn parses_empty_export() {
        assert!(parse_conversations("[]").unwrap().is_empty());
    }

    #[test]
    fn rejects_numeric_content_part() {
        let result = parse_conversations(&conversation_json(&node_json("n1", "42")));
        let message = result.unwrap_err().to_string();

        assert!(message.contains("content part must be a string or an object"));
        assert!(message.contains("a number"));
    }

    #[test]
    fn rejects_structured_part_with_wrong_field_type() {
        let result = parse_conversations(&conversation_json(&node_json(
            "n1",
            r#"{ "content_type": "text", "text": 7 }"#,
        )));

        assert!(result.is_err());
    }

    #[test]
    fn returns_error_for_invalid_json() {
        assert!(parse_conversations("not valid json").is_err());
    }

    #[test]
    fn returns_error_for_non_array_root() {
        assert!(parse_conversations(r#"{"title": "Test"}"#).is_err());
    }

    #[test]
    fn returns_error_for_missing_author() {
        let json = r#"[{
            "title": "Broken",
            "current_node": "n1",
            "mapping": {
                "n1": { "message": { "content": { "content_type": "text", "parts": [] } } }
            }
        }]"#;

        assert!(parse_conversations(json).is_err());
    }
}
