mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use frames::{DocumentState, FrameError, FrameTree};
use session::{SessionConfig, SessionError};
use tracing::debug;

#[derive(Parser)]
#[command(name = "frames", version, about = "Frame-based structured code editor model")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log every tree mutation to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Session configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that a persisted document is well formed
    Check(DocumentArgs),

    /// Print the frame outline of a document (the default document if none)
    Outline(OutlineArgs),

    /// Run .test.toml scenario files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct DocumentArgs {
    /// JSON document file
    file: String,
}

#[derive(clap::Args)]
struct OutlineArgs {
    /// JSON document file
    file: Option<String>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.toml file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let config = match &cli.config {
        Some(path) => match SessionConfig::load(path) {
            Ok(config) => {
                debug!(path = %path.display(), ?config, "session config loaded");
                config
            }
            Err(error) => {
                report_session_error(color_choice, &error);
                process::exit(1);
            }
        },
        None => SessionConfig::default(),
    };

    match cli.command {
        Command::Check(args) => do_check(&args.file, color_choice),
        Command::Outline(args) => do_outline(args.file.as_deref(), color_choice),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category, config);
            process::exit(exit_code);
        }
    }
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("frames=debug,session=debug,info")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn do_check(file: &str, color_choice: ColorChoice) {
    let tree = load_document(file, color_choice);
    eprintln!("ok: {} is a valid document ({} frames)", file, tree.len());
}

fn do_outline(file: Option<&str>, color_choice: ColorChoice) {
    let tree = match file {
        Some(file) => load_document(file, color_choice),
        None => FrameTree::new(),
    };
    print!("{}", tree.outline());
}

/// Read, parse and validate a document, reporting any problem and exiting.
fn load_document(file: &str, color_choice: ColorChoice) -> FrameTree {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", file, e);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(file.to_string(), source.clone());
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();

    let state = match DocumentState::from_json(&source) {
        Ok(state) => state,
        Err(error) => {
            let offset = byte_offset(&source, error.line(), error.column());
            let diagnostic = Diagnostic::error()
                .with_message("document is not valid JSON for a frame tree")
                .with_labels(vec![
                    Label::primary(file_id, offset..offset).with_message(error.to_string()),
                ]);
            let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
            process::exit(1);
        }
    };

    match FrameTree::from_state(state) {
        Ok(tree) => {
            debug!(file, frames = tree.len(), "document loaded");
            tree
        }
        Err(error) => {
            let diagnostic: Diagnostic<usize> = error.to_diagnostic();
            let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
            process::exit(1);
        }
    }
}

/// Convert the JSON parser's 1-based line and column into a byte offset.
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(source.len())
}

fn report_session_error(color_choice: ColorChoice, error: &SessionError) {
    let diagnostic: Diagnostic<usize> = match error.as_frame_error() {
        Some(frame_error) => frame_error.to_diagnostic(),
        None => Diagnostic::error().with_message(error.to_string()),
    };
    let files: SimpleFiles<String, String> = SimpleFiles::new();
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    if term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic).is_err() {
        eprintln!("error: {}", error);
    }
}

/// Render a session error as a one-line message for test output.
pub(crate) fn describe(error: &SessionError) -> String {
    match error.as_frame_error() {
        Some(frame_error) => describe_frame_error(frame_error),
        None => error.to_string(),
    }
}

fn describe_frame_error(error: &FrameError) -> String {
    format!("[{}] {}", error.code(), error)
}
