//! sort and uniq builtins

use async_trait::async_trait;

use super::{Builtin, Context};
use crate::error::Result;

/// The sort builtin. Supports `-r` (reverse) and `-n` (numeric).
pub struct Sort;

/// The uniq builtin. Collapses adjacent duplicate lines; `-c` prefixes
/// each line with its repeat count.
pub struct Uniq;

async fn input_text(ctx: &mut Context<'_>, name: &str, files: &[&String]) -> Result<Option<String>> {
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
impl Builtin for Sort {
    async fn run(&self, mut ctx: Context<'_>) -> Result<i32> {
        let reverse = ctx.args.iter().any(|a| a == "-r");
        let numeric = ctx.args.iter().any(|a| a == "-n");
        let files: Vec<&String> = ctx.args.iter().filter(|a| !a.starts_with('-')).collect();

        let text = match input_text(&mut ctx, "sort", &files).await? {
            Some(text) => text,
            None => return Ok(1),
        };

        let mut lines: Vec<&str> = text.lines().collect();
        if numeric {
            lines.sort_by_key(|line| line.trim().parse::<i64>().unwrap_or(0));
        } else {
            lines.sort_unstable();
        }
        if reverse {
            lines.reverse();
        }

        let mut output = String::new();
        for line in lines {
            output.push_str(line);
            output.push('\n');
        }
        ctx.stdout.write_text(&output)?;
        Ok(0)
    }
}

#[async_trait]
impl Builtin for Uniq {
    async fn run(&self, mut ctx: Context<'_>) -> Result<i32> {
        let counted = ctx.args.iter().any(|a| a == "-c");
        let files: Vec<&String> = ctx.args.iter().filter(|a| !a.starts_with('-')).collect();

        let text = match input_text(&mut ctx, "uniq", &files).await? {
            Some(text) => text,
            None => return Ok(1),
        };

        let mut output = String::new();
        let mut previous: Option<&str> = None;
        let mut count = 0usize;

        let mut flush = |line: &str, count: usize, output: &mut String| {
            if counted {
                output.push_str(&format!("{:>7} {}\n", count, line));
            } else {
                output.push_str(line);
                output.push('\n');
            }
        };

        for line in text.lines() {
            match previous {
                Some(prev) if prev == line => count += 1,
                Some(prev) => {
                    flush(prev, count, &mut output);
                    previous = Some(line);
                    count = 1;
                }
                None => {
                    previous = Some(line);
                    count = 1;
                }
            }
        }
        if let Some(prev) = previous {
            flush(prev, count, &mut output);
        }

        ctx.stdout.write_text(&output)?;
        Ok(0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::builtins::testutil::run;

    #[tokio::test]
    async fn test_sort_lexicographic() {
        let (_, out, _) = run(&Sort, &[], "banana\napple\ncherry\n").await;
        assert_eq!(out, "apple\nbanana\ncherry\n");
    }

    #[tokio::test]
    async fn test_sort_reverse() {
        let (_, out, _) = run(&Sort, &["-r"], "a\nc\nb\n").await;
        assert_eq!(out, "c\nb\na\n");
    }

    #[tokio::test]
    async fn test_sort_numeric() {
        let (_, out, _) = run(&Sort, &["-n"], "10\n9\n100\n").await;
        assert_eq!(out, "9\n10\n100\n");
    }

    #[tokio::test]
    async fn test_uniq_collapses_adjacent() {
        let (_, out, _) = run(&Uniq, &[], "a\na\nb\na\n").await;
        assert_eq!(out, "a\nb\na\n");
    }

    #[tokio::test]
    async fn test_uniq_count() {
        let (_, out, _) = run(&Uniq, &["-c"], "x\nx\ny\n").await;
        assert_eq!(out, format!("{:>7} x\n{:>7} y\n", 2, 1));
    }
}
