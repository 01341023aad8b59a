//! Tooldriver - tool-using agent loop
//!
//! Main entry point for the CLI application.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tooldriver::{logging, Agent, AnthropicClient, Config, Outcome, Session};

/// Tooldriver - run a prompt through the model with file-editor and shell tools
#[derive(Parser, Debug)]
#[command(name = "tooldriver")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Prompt to start the session with
    prompt: Option<String>,

    /// Read the prompt from a file instead
    #[arg(long, conflicts_with = "prompt")]
    prompt_file: Option<PathBuf>,

    /// Model identifier
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Directory the file editor is confined to
    #[arg(long)]
    editor_dir: Option<PathBuf>,

    /// Do not execute shell commands
    #[arg(long)]
    mock_shell: bool,

    /// Maximum output tokens per response
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Stop after this many model responses
    #[arg(long)]
    max_turns: Option<usize>,

    /// Directory for session log files
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Print the default configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Write the default configuration file if none exists, then exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if args.print_config {
        print!("{}", Config::default_config_toml());
        return ExitCode::SUCCESS;
    }

    if args.init_config {
        return match init_config() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{}", error_line(&e));
                ExitCode::FAILURE
            }
        };
    }

    match run(args).await {
        Ok(outcome) => {
            if let Some(text) = outcome.final_text() {
                println!("{}", text);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", error_line(&e));
            ExitCode::FAILURE
        }
    }
}

/// One-line report for a fatal error.
///
/// `DriverError` messages already carry their cause, so the chain is not
/// appended again.
fn error_line(e: &anyhow::Error) -> String {
    format!("error: {}", e)
}

fn init_config() -> anyhow::Result<()> {
    let path = Config::config_file();
    if path.exists() {
        anyhow::bail!("config file already exists at {}", path.display());
    }
    Config::default().save()?;
    eprintln!("Wrote default configuration to {}", path.display());
    Ok(())
}

async fn run(args: Args) -> anyhow::Result<Outcome> {
    let prompt = match (args.prompt, args.prompt_file) {
        (Some(prompt), _) => prompt,
        (None, Some(path)) => std::fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("failed to read prompt file {}: {}", path.display(), e)
        })?,
        (None, None) => anyhow::bail!("no prompt given; pass PROMPT or --prompt-file"),
    };

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(model) = args.model {
        config.anthropic.model = model;
    }
    if let Some(dir) = args.editor_dir {
        config.editor.root = dir;
    }
    if args.mock_shell {
        config.shell.mock = true;
    }
    if let Some(max_tokens) = args.max_tokens {
        config.anthropic.max_tokens = max_tokens;
    }
    if args.max_turns.is_some() {
        config.agent.max_turns = args.max_turns;
    }
    if let Some(dir) = args.log_dir {
        config.logging.dir = dir;
    }
    if args.debug {
        config.logging.level = "debug".to_string();
    }

    let session = Session::new();
    let log_file = logging::init_logger(&config.logging.dir, &config.logging.level, session.id())?;
    tracing::debug!(log_file = %log_file.display(), "Session log initialized");

    let client = Arc::new(AnthropicClient::from_config(&config)?);
    let mut agent = Agent::new(config, client, session);

    Ok(agent.run(&prompt).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tooldriver::DriverError;

    #[test]
    fn test_error_line_names_cause_once() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = anyhow::Error::from(DriverError::with_context("Failed to read 'a.txt'", io));
        assert_eq!(error_line(&err), "error: Failed to read 'a.txt': gone");
    }

    #[test]
    fn test_args_parse_overrides() {
        let args = Args::parse_from([
            "tooldriver",
            "--mock-shell",
            "--max-turns",
            "3",
            "create hello.txt",
        ]);
        assert!(args.mock_shell);
        assert_eq!(args.max_turns, Some(3));
        assert_eq!(args.prompt.as_deref(), Some("create hello.txt"));
    }
}
