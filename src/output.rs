// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Output file naming and writing.
//!
//! Each conversation is written to its own Markdown file named after its
//! title. Titles are free text, so they are sanitized before use, and
//! conversations sharing a title get numbered suffixes instead of
//! overwriting each other.

use crate::parser::Conversation;
use chrono::{DateTime, Utc};
use snafu::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Error type for output failures.
#[derive(Debug, Snafu)]
pub enum OutputError {
    /// Failed to create the directory that holds an output file.
    #[snafu(display("failed to create directory {}: {source}", path.display()))]
    CreateDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to write an output file.
    #[snafu(display("failed to write {}: {source}", path.display()))]
    Write {
        /// The file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Result of [`write_document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was written.
    Written,
    /// The file already existed and overwriting was not allowed.
    Skipped,
}

/// Replaces whitespace and path-unsafe characters with underscores.
///
/// # Example
///
/// ```
/// use gpt2md::output::sanitize_title;
///
/// assert_eq!(sanitize_title("Rust / Go: a comparison"), "Rust___Go__a_comparison");
/// ```
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Returns a file stem derived from a timestamp, e.g. `conversation_1733356800000`.
#[must_use]
pub fn timestamp_stem(time: DateTime<Utc>) -> String {
    format!("conversation_{}", time.timestamp_millis())
}

/// Hands out unique Markdown file names for a batch of conversations.
#[derive(Debug, Default)]
pub struct FileNamer {
    used: HashSet<String>,
}

impl FileNamer {
    /// Creates a namer with no names handed out yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the file name for a conversation.
    ///
    /// Uses the sanitized title, or a timestamp stem when the title is
    /// empty. A name already handed out gets a `_2`, `_3`, ... suffix.
    pub fn file_name(&mut self, conversation: &Conversation) -> String {
        let mut stem = sanitize_title(&conversation.title);
        if stem.is_empty() {
            stem = timestamp_stem(conversation.created_at().unwrap_or_else(Utc::now));
        }

        let mut candidate = format!("{stem}.md");
        let mut n = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{stem}_{n}.md");
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

/// Writes a rendered document, creating parent directories as needed.
///
/// An existing file is left alone unless `force` is set.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the file
/// cannot be written.
pub fn write_document(path: &Path, contents: &str, force: bool) -> Result<WriteOutcome, OutputError> {
    if path.exists() && !force {
        return Ok(WriteOutcome::Skipped);
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).context(CreateDirSnafu { path: parent })?;
    }
    std::fs::write(path, contents).context(WriteSnafu { path })?;

    Ok(WriteOutcome::Written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn titled(title: &str, create_time: Option<f64>) -> Conversation {
        Conversation {
            title: title.into(),
            create_time,
            current_node: String::new(),
            mapping: HashMap::new(),
        }
    }

    #[test]
    fn replaces_spaces_and_slashes() {
        assert_eq!(sanitize_title("My chat/notes"), "My_chat_notes");
    }

    #[test]
    fn replaces_reserved_characters() {
        assert_eq!(sanitize_title(r#"a\b:c*d?e"f<g>h|i"#), "a_b_c_d_e_f_g_h_i");
        assert_eq!(sanitize_title("tab\there"), "tab_here");
    }

    #[test]
    fn keeps_unicode_letters() {
        assert_eq!(sanitize_title("Café résumé"), "Café_résumé");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(sanitize_title("  padded  "), "padded");
        assert_eq!(sanitize_title("   "), "");
    }

    #[test]
    fn names_file_after_title() {
        let mut namer = FileNamer::new();

        assert_eq!(namer.file_name(&titled("Hello world", None)), "Hello_world.md");
    }

    #[test]
    fn numbers_duplicate_titles() {
        let mut namer = FileNamer::new();

        assert_eq!(namer.file_name(&titled("Chat", None)), "Chat.md");
        assert_eq!(namer.file_name(&titled("Chat", None)), "Chat_2.md");
        assert_eq!(namer.file_name(&titled("Chat", None)), "Chat_3.md");
    }

    #[test]
    fn numbering_skips_names_taken_by_other_titles() {
        let mut namer = FileNamer::new();

        assert_eq!(namer.file_name(&titled("Chat_2", None)), "Chat_2.md");
        assert_eq!(namer.file_name(&titled("Chat", None)), "Chat.md");
        assert_eq!(namer.file_name(&titled("Chat", None)), "Chat_3.md");
    }

    #[test]
    fn falls_back_to_create_time_for_empty_title() {
        let mut namer = FileNamer::new();

        assert_eq!(
            namer.file_name(&titled("", Some(1_733_356_800.0))),
            "conversation_1733356800000.md"
        );
    }

    #[test]
    fn falls_back_to_current_time_without_create_time() {
        let mut namer = FileNamer::new();
        let name = namer.file_name(&titled("", None));

        assert!(name.starts_with("conversation_"));
        assert!(name.ends_with(".md"));
    }

    #[test]
    fn writes_new_file_and_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/chat.md");

        let outcome = write_document(&path, "# Chat\n\n", false).unwrap();

        assert_eq!(outcome, WriteOutcome::Written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Chat\n\n");
    }

    #[test]
    fn skips_existing_file_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.md");
        std::fs::write(&path, "original").unwrap();

        let outcome = write_document(&path, "replacement", false).unwrap();

        assert_eq!(outcome, WriteOutcome::Skipped);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn overwrites_existing_file_with_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.md");
        std::fs::write(&path, "original").unwrap();

        let outcome = write_document(&path, "replacement", true).unwrap();

        assert_eq!(outcome, WriteOutcome::Written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "replacement");
    }

    #[test]
    fn reports_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the file makes the write fail.
        let path = dir.path().join("taken");
        std::fs::create_dir(&path).unwrap();

        let err = write_document(&path, "x", true).unwrap_err();

        assert!(matches!(err, OutputError::Write { .. }));
    }
}
