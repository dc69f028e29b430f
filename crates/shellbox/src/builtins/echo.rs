//! echo builtin command

use async_trait::async_trait;

use super::{Builtin, Context};
use crate::error::Result;

/// The echo builtin command.
///
/// Supports `-n` (no trailing newline), `-e` (interpret escapes), and
/// `-E` (no escapes, the default).
pub struct Echo;

#[async_trait]
impl Builtin for Echo {
    async fn run(&self, ctx: Context<'_>) -> Result<i32> {
        let mut add_newline = true;
        let mut interpret_escapes = false;
        let mut args = ctx.args.iter().peekable();

        while let Some(arg) = args.peek() {
            match arg.as_str() {
                "-n" => {
                    add_newline = false;
                    args.next();
                }
                "-e" => {
                    interpret_escapes = true;
                    args.next();
                }
                "-E" => {
                    interpret_escapes = false;
                    args.next();
                }
                _ => break,
            }
        }

        let mut output = String::new();
        for (i, arg) in args.enumerate() {
            if i > 0 {
                output.push(' ');
            }
            if interpret_escapes {
                output.push_str(&interpret_escape_sequences(arg));
            } else {
                output.push_str(arg);
            }
        }
        if add_newline {
            output.push('\n');
        }

        ctx.stdout.write_text(&output)?;
        Ok(0)
    }
}

fn interpret_escape_sequences(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('\\') => result.push('\\'),
            Some('a') => result.push('\x07'),
            Some('b') => result.push('\x08'),
            Some('f') => result.push('\x0c'),
            Some('v') => result.push('\x0b'),
            Some('0') => result.push('\0'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}
