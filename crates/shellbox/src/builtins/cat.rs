//! cat builtin command

use async_trait::async_trait;

use super::{Builtin, Context};
use crate::error::Result;

/// The cat builtin command. Concatenates file arguments (or stdin, with no
/// arguments or `-`) to stdout, byte for byte.
pub struct Cat;

#[async_trait]
impl Builtin for Cat {
    async fn run(&self, mut ctx: Context<'_>) -> Result<i32> {
        if ctx.args.is_empty() {
            let bytes = ctx.stdin.buffer().await?;
            ctx.stdout.write(&bytes)?;
            return Ok(0);
        }

        let mut exit = 0;
        for arg in ctx.args {
            if arg == "-" {
                let bytes = ctx.stdin.buffer().await.unwrap_or_default();
                ctx.stdout.write(&bytes)?;
                continue;
            }
            let path = ctx.resolve(arg);
            match ctx.fs.read_file(&path).await {
                Ok(content) => ctx.stdout.write(&content)?,
                Err(e) => {
                    ctx.stderr
                        .write_text(&format!("cat: {}: {}\n", arg, super::error_line(&e)))?;
                    exit = 1;
                }
            }
        }
        Ok(exit)
    }
}
