//! Word count builtin - count lines, words, and bytes

use async_trait::async_trait;

use super::{Builtin, Context};
use crate::error::Result;

/// The wc builtin - print newline, word, and byte counts.
///
/// Usage: wc [-lwc] [FILE...]
///
/// With no options, prints all three counts.
pub struct Wc;

#[async_trait]
impl Builtin for Wc {
    async fn run(&self, mut ctx: Context<'_>) -> Result<i32> {
        let show_lines = ctx.args.iter().any(|a| a.starts_with('-') && a.contains('l'));
        let show_words = ctx.args.iter().any(|a| a.starts_with('-') && a.contains('w'));
        let show_bytes = ctx.args.iter().any(|a| a.starts_with('-') && a.contains('c'));

        // No flags means all three.
        let (show_lines, show_words, show_bytes) = if !show_lines && !show_words && !show_bytes {
            (true, true, true)
        } else {
            (show_lines, show_words, show_bytes)
        };

        let files: Vec<&String> = ctx.args.iter().filter(|a| !a.starts_with('-')).collect();

        let mut output = String::new();
        let mut totals = (0usize, 0usize, 0usize);

        if files.is_empty() {
            let text = ctx.stdin.text().await?;
            let counts = count_text(&text);
            output.push_str(&format_counts(counts, show_lines, show_words, show_bytes, None));
            output.push('\n');
        } else {
            for file in &files {
                let path = ctx.resolve(file);
                match ctx.fs.read_file(&path).await {
                    Ok(content) => {
                        let text = String::from_utf8_lossy(&content);
                        let counts = count_text(&text);
                        totals.0 += counts.0;
                        totals.1 += counts.1;
                        totals.2 += counts.2;
                        output.push_str(&format_counts(
                            counts,
                            show_lines,
                            show_words,
                            show_bytes,
                            Some(file),
                        ));
                        output.push('\n');
                    }
                    Err(e) => {
                        ctx.stderr
                            .write_text(&format!("wc: {}: {}\n", file, super::error_line(&e)))?;
                        return Ok(1);
                    }
                }
            }
            if files.len() > 1 {
                output.push_str(&format_counts(
                    totals,
                    show_lines,
                    show_words,
                    show_bytes,
                    Some(&"total".to_string()),
                ));
                output.push('\n');
            }
        }

        ctx.stdout.write_text(&output)?;
        Ok(0)
    }
}

/// Count (lines, words, bytes) in text.
fn count_text(text: &str) -> (usize, usize, usize) {
    let lines = text.lines().count();
    let words = text.split_whitespace().count();
    let bytes = text.len();
    (lines, words, bytes)
}

fn format_counts(
    (lines, words, bytes): (usize, usize, usize),
    show_lines: bool,
    show_words: bool,
    show_bytes: bool,
    filename: Option<&String>,
) -> String {
    let mut parts = Vec::new();
    if show_lines {
        parts.push(format!("{:>8}", lines));
    }
    if show_words {
        parts.push(format!("{:>8}", words));
    }
    if show_bytes {
        parts.push(format!("{:>8}", bytes));
    }

    let mut result = parts.join("");
    if let Some(name) = filename {
        result.push(' ');
        result.push_str(name);
    }
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::builtins::testutil::run;

    #[tokio::test]
    async fn test_wc_all_counts() {
        let (exit, out, _) = run(&Wc, &[], "one two three\nfour five\n").await;
        assert_eq!(exit, 0);
        assert_eq!(out, format!("{:>8}{:>8}{:>8}\n", 2, 5, 24));
    }

    #[tokio::test]
    async fn test_wc_lines_only() {
        let (_, out, _) = run(&Wc, &["-l"], "one\ntwo\nthree\n").await;
        assert_eq!(out.trim(), "3");
    }

    #[tokio::test]
    async fn test_wc_words_only() {
        let (_, out, _) = run(&Wc, &["-w"], "a b c d e").await;
        assert_eq!(out.trim(), "5");
    }

    #[tokio::test]
    async fn test_wc_bytes_only() {
        let (_, out, _) = run(&Wc, &["-c"], "hello").await;
        assert_eq!(out.trim(), "5");
    }

    #[tokio::test]
    async fn test_wc_missing_file() {
        let (exit, _, err) = run(&Wc, &["/absent"], "").await;
        assert_eq!(exit, 1);
        assert!(err.contains("/absent"));
    }
}
