//! grep - pattern matching builtin
//!
//! Usage:
//!   grep pattern file...
//!   echo "text" | grep pattern
//!   grep -i pattern file        # case insensitive
//!   grep -v pattern file        # invert match
//!   grep -n pattern file        # show line numbers
//!   grep -c pattern file        # count matching lines

use async_trait::async_trait;
use regex::RegexBuilder;

use super::{Builtin, Context};
use crate::error::Result;

/// grep command - pattern matching over lines.
pub struct Grep;

struct GrepOptions {
    pattern: String,
    files: Vec<String>,
    ignore_case: bool,
    invert_match: bool,
    line_numbers: bool,
    count_only: bool,
}

impl GrepOptions {
    fn parse(args: &[String]) -> Option<Self> {
        let mut opts = GrepOptions {
            pattern: String::new(),
            files: Vec::new(),
            ignore_case: false,
            invert_match: false,
            line_numbers: false,
            count_only: false,
        };

        let mut positional = Vec::new();
        for arg in args {
            if arg.starts_with('-') && arg.len() > 1 {
                for c in arg[1..].chars() {
                    match c {
                        'i' => opts.ignore_case = true,
                        'v' => opts.invert_match = true,
                        'n' => opts.line_numbers = true,
                        'c' => opts.count_only = true,
                        'E' => {} // extended regex is the default
                        _ => {}
                    }
                }
            } else {
                positional.push(arg.clone());
            }
        }

        if positional.is_empty() {
            return None;
        }
        opts.pattern = positional.remove(0);
        opts.files = positional;
        Some(opts)
    }
}

#[async_trait]
impl Builtin for Grep {
    async fn run(&self, mut ctx: Context<'_>) -> Result<i32> {
        let opts = match GrepOptions::parse(ctx.args) {
            Some(opts) => opts,
            None => {
                ctx.stderr.write_text("grep: missing pattern\n")?;
                return Ok(2);
            }
        };

        let regex = match RegexBuilder::new(&opts.pattern)
            .case_insensitive(opts.ignore_case)
            .build()
        {
            Ok(regex) => regex,
            Err(e) => {
                ctx.stderr.write_text(&format!("grep: {}\n", e))?;
                return Ok(2);
            }
        };

        let mut matched_any = false;

        if opts.files.is_empty() {
            let text = ctx.stdin.text().await?;
            let (output, count) = scan(&regex, &opts, &text, None);
            matched_any |= count > 0;
            if opts.count_only {
                ctx.stdout.write_text(&format!("{}\n", count))?;
            } else {
                ctx.stdout.write_text(&output)?;
            }
        } else {
            let label_files = opts.files.len() > 1;
            for file in &opts.files {
                let path = ctx.resolve(file);
                let content = match ctx.fs.read_file(&path).await {
                    Ok(content) => content,
                    Err(e) => {
                        ctx.stderr
                            .write_text(&format!("grep: {}: {}\n", file, super::error_line(&e)))?;
                        return Ok(2);
                    }
                };
                let text = String::from_utf8_lossy(&content);
                let label = label_files.then_some(file.as_str());
                let (output, count) = scan(&regex, &opts, &text, label);
                matched_any |= count > 0;
                if opts.count_only {
                    match label {
                        Some(name) => ctx.stdout.write_text(&format!("{}:{}\n", name, count))?,
                        None => ctx.stdout.write_text(&format!("{}\n", count))?,
                    }
                } else {
                    ctx.stdout.write_text(&output)?;
                }
            }
        }

        Ok(if matched_any { 0 } else { 1 })
    }
}

/// Collect matching lines (with optional `file:` and line-number
/// prefixes); returns the rendered output and the match count.
fn scan(
    regex: &regex::Regex,
    opts: &GrepOptions,
    text: &str,
    label: Option<&str>,
) -> (String, usize) {
    let mut output = String::new();
    let mut count = 0;

    for (number, line) in text.lines().enumerate() {
        let is_match = regex.is_match(line) != opts.invert_match;
        if !is_match {
            continue;
        }
        count += 1;
        if opts.count_only {
            continue;
        }
        if let Some(name) = label {
            output.push_str(name);
            output.push(':');
        }
        if opts.line_numbers {
            output.push_str(&format!("{}:", number + 1));
        }
        output.push_str(line);
        output.push('\n');
    }
    (output, count)
}
