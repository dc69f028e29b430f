//! Shellbox CLI - execute shell source against a fresh sandbox
//!
//! Usage:
//!   shellbox -c 'echo hello'       # execute a command string
//!   shellbox script.sh             # execute a script file
//!   shellbox --json -c 'echo hi'   # print the captured result as JSON
//!
//! Every run starts from an empty in-memory filesystem; nothing on the
//! host is read or written.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

/// Shellbox - sandboxed shell engine
#[derive(Parser, Debug)]
#[command(name = "shellbox")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Execute the given command string
    #[arg(short = 'c')]
    command: Option<String>,

    /// Script file to execute
    #[arg()]
    script: Option<PathBuf>,

    /// Environment variables for the script (NAME=value)
    #[arg(short = 'e', long = "env")]
    env: Vec<String>,

    /// Print the captured result as a JSON object
    #[arg(long)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let source = if let Some(command) = &args.command {
        command.clone()
    } else if let Some(path) = &args.script {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script: {}", path.display()))?
    } else {
        eprintln!("shellbox: nothing to run");
        eprintln!("usage: shellbox -c 'command' or shellbox script.sh");
        std::process::exit(2);
    };

    let mut builder = shellbox::Shell::builder();
    for pair in &args.env {
        match pair.split_once('=') {
            Some((name, value)) => builder = builder.env(name, value),
            None => {
                eprintln!("shellbox: invalid --env '{}', expected NAME=value", pair);
                std::process::exit(2);
            }
        }
    }
    let mut shell = builder.build();

    let result = shell
        .exec(&source)
        .await
        .context("failed to execute script")?;

    if args.json {
        let value = serde_json::json!({
            "stdout": result.stdout_text(),
            "stderr": result.stderr_text(),
            "exit_code": result.exit_code,
        });
        println!("{}", value);
    } else {
        std::io::stdout().write_all(&result.stdout)?;
        std::io::stderr().write_all(&result.stderr)?;
    }

    std::process::exit(result.exit_code);
}
