//! head and tail builtins

use async_trait::async_trait;

use super::{Builtin, Context};
use crate::error::Result;

/// The head builtin - first N lines (default 10).
pub struct Head;

/// The tail builtin - last N lines (default 10).
pub struct Tail;

struct LineRange {
    count: usize,
    files: Vec<String>,
}

/// Parse `-n N` / `-N` plus file arguments.
fn parse_args(args: &[String]) -> LineRange {
    let mut count = 10;
    let mut files = Vec::new();
    let mut iter = args.iter().peekable();

    while let Some(arg) = iter.next() {
        if arg == "-n" {
            if let Some(n) = iter.next().and_then(|v| v.parse().ok()) {
                count = n;
            }
        } else if let Some(rest) = arg.strip_prefix('-') {
            if let Ok(n) = rest.parse() {
                count = n;
            }
        } else {
            files.push(arg.clone());
        }
    }
    LineRange { count, files }
}

async fn gather(ctx: &mut Context<'_>, name: &str, files: &[String]) -> Result<Option<String>> {
    if files.is_empty() {
        return Ok(Some(ctx.stdin.text().await?));
    }
    let mut text = String::new();
    for file in files {
        let path = ctx.resolve(file);
        match ctx.fs.read_file(&path).await {
            Ok(content) => text.push_str(&String::from_utf8_lossy(&content)),
            Err(e) => {
                ctx.stderr
                    .write_text(&format!("{}: {}: {}\n", name, file, super::error_line(&e)))?;
                return Ok(None);
            }
        }
    }
    Ok(Some(text))
}

#[async_trait]
impl Builtin for Head {
    async fn run(&self, mut ctx: Context<'_>) -> Result<i32> {
        let range = parse_args(ctx.args);
        let text = match gather(&mut ctx, "head", &range.files).await? {
            Some(text) => text,
            None => return Ok(1),
        };
        let mut output = String::new();
        for line in text.lines().take(range.count) {
            output.push_str(line);
            output.push('\n');
        }
        ctx.stdout.write_text(&output)?;
        Ok(0)
    }
}

#[async_trait]
impl Builtin for Tail {
    async fn run(&self, mut ctx: Context<'_>) -> Result<i32> {
        let range = parse_args(ctx.args);
        let text = match gather(&mut ctx, "tail", &range.files).await? {
            Some(text) => text,
            None => return Ok(1),
        };
        let lines: Vec<&str> = text.lines().collect();
        let start = lines.len().saturating_sub(range.count);
        let mut output = String::new();
        for line in &lines[start..] {
            output.push_str(line);
            output.push('\n');
        }
        ctx.stdout.write_text(&output)?;
        Ok(0)
    }
}
