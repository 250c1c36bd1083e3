// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Reconstruction of the visible message thread.
//!
//! A conversation's `mapping` contains every message ever produced,
//! including branches abandoned by edits and regenerations. The thread the
//! user actually sees is the chain of parents leading up from
//! `current_node`. [`linearize`] walks that chain, keeps the messages worth
//! showing and returns them oldest first.

use crate::normalizer::{NormalizedPart, normalize};
use crate::parser::{Conversation, MessageRecord};
use std::collections::HashSet;

/// Author label used for assistant and tool messages.
pub const ASSISTANT_LABEL: &str = "CHATGPT";

/// Author label used for system messages holding the user's custom
/// instructions.
pub const CUSTOM_INSTRUCTIONS_LABEL: &str = "Custom User Info";

/// A message ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMessage {
    /// Display label for the author.
    pub author: String,

    /// The message's content, never empty.
    pub parts: Vec<NormalizedPart>,
}

/// Returns the visible messages of a conversation in chronological order.
///
/// The walk starts at `current_node` and follows parent links until it
/// reaches an empty parent id, a node missing from the mapping, or a node
/// it has already visited. Nodes without a message are passed through.
///
/// A message is kept when it has content parts, is not a hidden system
/// message, has a `text` or `multimodal` content type and normalizes to at
/// least one part.
///
/// # Example
///
/// ```
/// use gpt2md::linearizer::linearize;
/// use gpt2md::parser::parse_conversations;
///
/// let json = r#"[{
///     "title": "Hi",
///     "current_node": "b",
///     "mapping": {
///         "a": {
///             "message": {
///                 "author": { "role": "user" },
///                 "content": { "content_type": "text", "parts": ["Hi"] }
///             }
///         },
///         "b": {
///             "message": {
///                 "author": { "role": "assistant" },
///                 "content": { "content_type": "text", "parts": ["Hello!"] }
///             },
///             "parent": "a"
///         }
///     }
/// }]"#;
///
/// let conversation = parse_conversations(json).unwrap().remove(0);
/// let messages = linearize(&conversation);
///
/// assert_eq!(messages[0].author, "user");
/// assert_eq!(messages[1].author, "CHATGPT");
/// ```
#[must_use]
pub fn linearize(conversation: &Conversation) -> Vec<NormalizedMessage> {
    let mut messages = Vec::new();
    let mut visited = HashSet::new();
    let mut cursor = Some(conversation.current_node.as_str());

    while let Some(id) = cursor.filter(|id| !id.is_empty()) {
        if !visited.insert(id) {
            break;
        }
        let Some(node) = conversation.mapping.get(id) else {
            break;
        };

        if let Some(message) = node.message.as_ref().and_then(to_normalized) {
            messages.push(message);
        }

        cursor = node.parent.as_deref();
    }

    messages.reverse();
    messages
}

/// Converts a stored message, or returns `None` if it should not be shown.
fn to_normalized(message: &MessageRecord) -> Option<NormalizedMessage> {
    if !is_candidate(message) || !has_renderable_type(message) {
        return None;
    }

    let parts = normalize(&message.content.parts);
    if parts.is_empty() {
        return None;
    }

    Some(NormalizedMessage {
        author: author_label(message),
        parts,
    })
}

/// Returns `true` for messages with content that aren't hidden system prompts.
fn is_candidate(message: &MessageRecord) -> bool {
    !message.content.parts.is_empty()
        && (message.author.role != "system" || message.metadata.is_user_system_message)
}

fn has_renderable_type(message: &MessageRecord) -> bool {
    matches!(message.content.content_type.as_str(), "text" | "multimodal")
}

/// Maps an author role to its display label.
fn author_label(message: &MessageRecord) -> String {
    match message.author.role.as_str() {
        "assistant" | "tool" => ASSISTANT_LABEL.to_owned(),
        "system" if message.metadata.is_user_system_message => {
            CUSTOM_INSTRUCTIONS_LABEL.to_owned()
        }
        role => role.to_owned(),
    }
}
