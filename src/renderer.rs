// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Markdown rendering for linearized conversations.
//!
//! # Output Format
//!
//! The rendered Markdown includes:
//! - A `# <title>` heading
//! - Optionally, the conversation's creation time
//! - A `**<author>:**` block per message, followed by each part's body
//! - A `---` rule after every message
//!
//! Message text is emitted verbatim. Transcripts are prefixed with a
//! `[Transcript]` line and assets are shown as a fixed placeholder, since
//! the media itself is not part of the export JSON.
//!
//! # Example
//!
//! ```
//! use gpt2md::linearizer::NormalizedMessage;
//! use gpt2md::normalizer::NormalizedPart;
//! use gpt2md::renderer::{render_messages, RenderOptions};
//!
//! let messages = vec![NormalizedMessage {
//!     author: "user".into(),
//!     parts: vec![NormalizedPart::Text("Hi".into())],
//! }];
//!
//! let markdown = render_messages("Test", &messages, &RenderOptions::default());
//! assert_eq!(markdown, "# Test\n\n**user:**\n\nHi\n\n\n---\n\n");
//! ```

use crate::linearizer::{NormalizedMessage, linearize};
use crate::normalizer::NormalizedPart;
use crate::parser::Conversation;
use std::fmt::Write;

/// Placeholder written in place of an asset.
pub const ASSET_PLACEHOLDER: &str = "[File]: [asset_pointer]";

/// Configuration options for Markdown rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Whether to include the conversation's creation time under the title.
    pub show_timestamps: bool,

    /// Number of heading levels to shift (0-5).
    ///
    /// A value of 0 produces an H1 title (default).
    pub heading_offset: u8,
}

/// Returns a markdown heading prefix with the given level and offset.
///
/// The heading level is clamped to a maximum of 6 (H6).
fn heading(level: u8, offset: u8) -> String {
    let actual = level.saturating_add(offset).min(6);
    "#".repeat(actual as usize)
}

/// Renders a conversation as Markdown.
///
/// Linearizes the conversation and renders the resulting messages under
/// the conversation title.
#[must_use]
pub fn render_conversation(conversation: &Conversation, opts: &RenderOptions) -> String {
    let timestamp = if opts.show_timestamps {
        conversation
            .created_at()
            .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
    } else {
        None
    };

    let messages = linearize(conversation);
    let mut out = String::new();
    write_document(
        &mut out,
        &conversation.title,
        timestamp.as_deref(),
        &messages,
        opts,
    );
    out
}

/// Renders already linearized messages under the given title.
///
/// An empty message list renders just the title heading.
#[must_use]
pub fn render_messages(title: &str, messages: &[NormalizedMessage], opts: &RenderOptions) -> String {
    let mut out = String::new();
    write_document(&mut out, title, None, messages, opts);
    out
}

fn write_document(
    out: &mut String,
    title: &str,
    timestamp: Option<&str>,
    messages: &[NormalizedMessage],
    opts: &RenderOptions,
) {
    writeln!(out, "{} {title}\n", heading(1, opts.heading_offset)).unwrap();
    if let Some(ts) = timestamp {
        writeln!(out, "*{ts}*\n").unwrap();
    }

    for message in messages {
        render_message(out, message);
    }
}

fn render_message(out: &mut String, message: &NormalizedMessage) {
    writeln!(out, "**{}:**\n", message.author).unwrap();

    for part in &message.parts {
        match part {
            NormalizedPart::Text(text) => writeln!(out, "{text}\n").unwrap(),
            NormalizedPart::Transcript(text) => writeln!(out, "[Transcript]\n{text}\n").unwrap(),
            NormalizedPart::Asset(_) => writeln!(out, "{ASSET_PLACEHOLDER}\n").unwrap(),
        }
    }

    out.push_str("\n---\n\n");
}
