// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Command-line interface for gpt2md.
//!
//! This binary provides the `gpt2md` command for converting ChatGPT
//! conversation exports from JSON to Markdown format.

use gpt2md::output::{self, FileNamer, WriteOutcome};
use gpt2md::parser::{self, Conversation};
use gpt2md::renderer;
use lexopt::prelude::*;
use snafu::{ensure, prelude::*};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File name of the conversation list inside a ChatGPT export.
const EXPORT_FILE_NAME: &str = "conversations.json";

/// Where to write the rendered output.
#[derive(Clone)]
enum OutputTarget {
    /// Write each conversation to the specified directory.
    Directory(PathBuf),
    /// Write to stdout.
    Stdout,
}

struct Cli {
    input: Vec<PathBuf>,
    output: OutputTarget,
    limit: i64,
    concat: bool,
    show_timestamps: bool,
    heading_offset: u8,
    quiet: bool,
    dry_run: bool,
    force: bool,
}

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to parse arguments: {source}"))]
    ParseArgs { source: lexopt::Error },

    #[snafu(display("at least one input file or directory is required"))]
    NoInputFiles,

    #[snafu(display("no {EXPORT_FILE_NAME} found in the given inputs"))]
    NoExportFiles,

    #[snafu(display("cannot output multiple conversations to stdout without --concat"))]
    MultipleConversationsToStdout,

    #[snafu(display("failed to create output directory: {source}"))]
    CreateOutputDir { source: std::io::Error },

    #[snafu(display("failed to read {}: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse {}: {source}", path.display()))]
    ParseFile {
        path: PathBuf,
        source: parser::ParseError,
    },

    #[snafu(display("{source}"))]
    WriteOutput { source: output::OutputError },

    #[snafu(display("{count} conversation(s) could not be written"))]
    WriteFailures { count: usize },
}

fn print_help() {
    println!(
        "\
{name} {version}
Convert ChatGPT conversation exports to Markdown

Usage: {name} [OPTIONS] <INPUT>...

Arguments:
  <INPUT>...  conversations.json files, or export directories containing them

Options:
  -o, --output <OUTPUT>     Output directory (or file with --concat, or - for stdout)
                            (default: ./output)
  -l, --limit <N>           Process only the first N conversations (0 for all)
      --concat              Combine all conversations into a single output
      --heading-offset <N>  Shift heading levels by N (0-5, default: 0)

Metadata display (use --show-* or --hide-*):
      --show-timestamps     Include conversation creation time (default: off)
      --hide-timestamps     Hide conversation creation time

Other options:
  -q, --quiet               Suppress progress messages
  -n, --dry-run             Show what would be processed without writing
  -f, --force               Overwrite existing output files
  -h, --help                Print help
  -V, --version             Print version",
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
    );
}

fn parse_args() -> Result<Cli, lexopt::Error> {
    // Show help if no arguments provided
    if std::env::args().len() == 1 {
        print_help();
        std::process::exit(0);
    }

    let mut input = Vec::new();
    let mut output = OutputTarget::Directory(PathBuf::from("./output"));
    let mut limit: i64 = 0;
    let mut concat = false;
    let mut show_timestamps = false;
    let mut heading_offset: u8 = 0;
    let mut quiet = false;
    let mut dry_run = false;
    let mut force = false;

    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('o') | Long("output") => {
                let val: PathBuf = parser.value()?.parse()?;
                output = if val == Path::new("-") {
                    OutputTarget::Stdout
                } else {
                    OutputTarget::Directory(val)
                };
            }
            Short('l') | Long("limit") => {
                limit = parser
                    .value()?
                    .parse()
                    .map_err(|_| "limit must be a whole number")?;
            }
            Long("concat") => concat = true,
            // Show/hide flags - last one wins
            Long("show-timestamps") => show_timestamps = true,
            Long("hide-timestamps") => show_timestamps = false,
            Long("heading-offset") => {
                let val: u8 = parser
                    .value()?
                    .parse()
                    .map_err(|_| "heading-offset must be a number 0-5")?;
                if val > 5 {
                    return Err("heading-offset must be 0-5".into());
                }
                heading_offset = val;
            }
            Short('q') | Long("quiet") => quiet = true,
            Short('n') | Long("dry-run") => dry_run = true,
            Short('f') | Long("force") => force = true,
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            Short('V') | Long("version") => {
                println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            Value(val) => input.push(val.parse()?),
            _ => return Err(arg.unexpected()),
        }
    }

    Ok(Cli {
        input,
        output,
        limit,
        concat,
        show_timestamps,
        heading_offset,
        quiet,
        dry_run,
        force,
    })
}

fn main() -> Result<(), Error> {
    let cli = parse_args().context(ParseArgsSnafu)?;

    ensure!(!cli.input.is_empty(), NoInputFilesSnafu);

    let files = collect_input_files(&cli.input);
    ensure!(!files.is_empty(), NoExportFilesSnafu);

    let mut conversations = load_conversations(&files)?;
    apply_limit(&mut conversations, cli.limit);

    if conversations.is_empty() {
        if !cli.quiet {
            eprintln!("No conversations found");
        }
        return Ok(());
    }

    if cli.concat {
        process_concat(&conversations, &cli)
    } else {
        match &cli.output {
            OutputTarget::Stdout => {
                ensure!(conversations.len() == 1, MultipleConversationsToStdoutSnafu);
                process_to_stdout(&conversations[0], &cli);
                Ok(())
            }
            OutputTarget::Directory(dir) => process_to_directory(&conversations, dir, &cli),
        }
    }
}

/// Collects export files from the given inputs (files and directories).
///
/// Directories are searched recursively for `conversations.json`.
fn collect_input_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file() && e.file_name() == EXPORT_FILE_NAME)
            {
                files.push(entry.path().to_path_buf());
            }
        } else {
            files.push(input.clone());
        }
    }
    files
}

/// Reads and parses every export file, keeping input order.
fn load_conversations(files: &[PathBuf]) -> Result<Vec<Conversation>, Error> {
    let mut conversations = Vec::new();
    for path in files {
        let json = std::fs::read_to_string(path).context(ReadFileSnafu { path })?;
        let parsed = parser::parse_conversations(&json).context(ParseFileSnafu { path })?;
        conversations.extend(parsed);
    }
    Ok(conversations)
}

/// Keeps the first `limit` conversations; zero, negative or oversized limits keep all.
fn apply_limit(conversations: &mut Vec<Conversation>, limit: i64) {
    if let Ok(limit) = usize::try_from(limit)
        && limit > 0
    {
        conversations.truncate(limit);
    }
}

/// Creates render options from CLI arguments.
const fn make_render_options(cli: &Cli) -> renderer::RenderOptions {
    renderer::RenderOptions {
        show_timestamps: cli.show_timestamps,
        heading_offset: cli.heading_offset,
    }
}

/// Renders a single conversation to stdout.
fn process_to_stdout(conversation: &Conversation, cli: &Cli) {
    if cli.dry_run {
        eprintln!("Would output \"{}\"", conversation.title);
        return;
    }

    let markdown = renderer::render_conversation(conversation, &make_render_options(cli));
    print!("{markdown}");
}

/// Renders conversations into one document with a single rule between each.
///
/// Documents with messages already end in a rule, so only message-less
/// documents get one added.
fn concat_documents(conversations: &[Conversation], opts: &renderer::RenderOptions) -> String {
    let mut output = String::new();

    for conversation in conversations {
        if !output.is_empty() && !output.ends_with("\n---\n\n") {
            output.push_str("---\n\n");
        }
        output.push_str(&renderer::render_conversation(conversation, opts));
    }

    output
}

/// Renders all conversations into a single output.
fn process_concat(conversations: &[Conversation], cli: &Cli) -> Result<(), Error> {
    let output = concat_documents(conversations, &make_render_options(cli));

    match &cli.output {
        OutputTarget::Stdout => {
            if cli.dry_run {
                eprintln!("Would output {} conversations concatenated", conversations.len());
            } else {
                print!("{output}");
            }
        }
        OutputTarget::Directory(path) => {
            // In concat mode, treat path as a file, not directory
            if cli.dry_run {
                eprintln!(
                    "Would write {} ({} conversations concatenated)",
                    path.display(),
                    conversations.len()
                );
                return Ok(());
            }
            match output::write_document(path, &output, cli.force).context(WriteOutputSnafu)? {
                WriteOutcome::Written if !cli.quiet => eprintln!(
                    "Wrote {} ({} conversations)",
                    path.display(),
                    conversations.len()
                ),
                WriteOutcome::Skipped => eprintln!(
                    "Skipping {} (already exists, use --force to overwrite)",
                    path.display()
                ),
                WriteOutcome::Written => {}
            }
        }
    }

    Ok(())
}

/// Writes each conversation to its own file in `out_dir`.
///
/// A conversation that fails to write is reported and the rest are still
/// processed.
fn process_to_directory(conversations: &[Conversation], out_dir: &Path, cli: &Cli) -> Result<(), Error> {
    if !cli.dry_run {
        std::fs::create_dir_all(out_dir).context(CreateOutputDirSnafu)?;
    }

    let opts = make_render_options(cli);
    let mut namer = FileNamer::new();
    let mut failures: usize = 0;

    for conversation in conversations {
        let out_path = out_dir.join(namer.file_name(conversation));

        if cli.dry_run {
            eprintln!("Would write {}", out_path.display());
            continue;
        }

        let markdown = renderer::render_conversation(conversation, &opts);
        match output::write_document(&out_path, &markdown, cli.force) {
            Ok(WriteOutcome::Written) => {
                if !cli.quiet {
                    eprintln!("Wrote {}", out_path.display());
                }
            }
            Ok(WriteOutcome::Skipped) => eprintln!(
                "Skipping {} (already exists, use --force to overwrite)",
                out_path.display()
            ),
            Err(e) => {
                eprintln!("Error: {e}");
                failures += 1;
            }
        }
    }

    ensure!(failures == 0, WriteFailuresSnafu { count: failures });
    Ok(())
}
