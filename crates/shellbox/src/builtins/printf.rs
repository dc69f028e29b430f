//! printf builtin

use async_trait::async_trait;

use super::{Builtin, Context};
use crate::error::Result;

/// The printf builtin.
///
/// Supports `%s`, `%d`, `%x`, `%%`, and the usual backslash escapes. Like
/// the shell version, the format string is reapplied until all arguments
/// are consumed.
pub struct Printf;

#[async_trait]
impl Builtin for Printf {
    async fn run(&self, ctx: Context<'_>) -> Result<i32> {
        let (format, args) = match ctx.args.split_first() {
            Some((format, args)) => (format, args),
            None => {
                ctx.stderr.write_text("printf: missing format string\n")?;
                return Ok(1);
            }
        };

        let mut output = String::new();
        let mut remaining = args.iter();
        loop {
            let consumed = render(format, &mut remaining, &mut output);
            // Reapply the format only while arguments remain and the
            // format actually consumes them.
            if remaining.as_slice().is_empty() || consumed == 0 {
                break;
            }
        }

        ctx.stdout.write_text(&output)?;
        Ok(0)
    }
}

/// Render one pass of the format string; returns how many arguments were
/// consumed.
fn render<'a>(
    format: &str,
    args: &mut std::slice::Iter<'a, String>,
    output: &mut String,
) -> usize {
    let mut consumed = 0;
    let mut chars = format.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '%' => match chars.next() {
                Some('%') => output.push('%'),
                Some('s') => {
                    if let Some(arg) = args.next() {
                        consumed += 1;
                        output.push_str(arg);
                    }
                }
                Some('d') => {
                    let value = args
                        .next()
                        .map(|a| {
                            consumed += 1;
                            a.trim().parse::<i64>().unwrap_or(0)
                        })
                        .unwrap_or(0);
                    output.push_str(&value.to_string());
                }
                Some('x') => {
                    let value = args
                        .next()
                        .map(|a| {
                            consumed += 1;
                            a.trim().parse::<i64>().unwrap_or(0)
                        })
                        .unwrap_or(0);
                    output.push_str(&format!("{:x}", value));
                }
                Some(other) => {
                    output.push('%');
                    output.push(other);
                }
                None => output.push('%'),
            },
            '\\' => match chars.next() {
                Some('n') => output.push('\n'),
                Some('t') => output.push('\t'),
                Some('r') => output.push('\r'),
                Some('\\') => output.push('\\'),
                Some('0') => output.push('\0'),
                Some(other) => {
                    output.push('\\');
                    output.push(other);
                }
                None => output.push('\\'),
            },
            other => output.push(other),
        }
    }
    consumed
}
