// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Convert ChatGPT conversation exports to Markdown.
//!
//! This crate provides parsing, linearizing and rendering functionality for
//! transforming the `conversations.json` file of a ChatGPT data export into
//! one readable Markdown document per conversation.
//!
//! # Overview
//!
//! ChatGPT stores each conversation as a tree of messages linked by parent
//! ids. This crate:
//!
//! 1. Parses the JSON structure into typed Rust representations
//! 2. Walks the tree from the current leaf back to the root, keeping the
//!    messages worth showing and normalizing their content
//! 3. Renders the resulting thread as Markdown
//!
//! # Example
//!
//! ```no_run
//! use gpt2md::{parser, renderer};
//!
//! let json = std::fs::read_to_string("conversations.json").unwrap();
//! let conversations = parser::parse_conversations(&json).unwrap();
//!
//! let opts = renderer::RenderOptions {
//!     show_timestamps: true,
//!     ..Default::default()
//! };
//!
//! for conversation in &conversations {
//!     let markdown = renderer::render_conversation(conversation, &opts);
//!     println!("{markdown}");
//! }
//! ```
//!
//! # Modules
//!
//! - [`parser`]: JSON parsing and type definitions for ChatGPT exports
//! - [`normalizer`]: Mapping of raw content parts to a uniform shape
//! - [`linearizer`]: Reconstruction of the visible message thread
//! - [`renderer`]: Markdown generation with configurable output options
//! - [`output`]: Output file naming and writing

#![deny(missing_docs)]

pub mod linearizer;
pub mod normalizer;
pub mod output;
pub mod parser;
pub mod renderer;
