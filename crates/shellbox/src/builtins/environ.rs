//! env builtin

use async_trait::async_trait;

use super::{Builtin, Context};
use crate::error::Result;

/// The env builtin - print `NAME=value` lines, sorted by name.
pub struct Env;

#[async_trait]
impl Builtin for Env {
    async fn run(&self, ctx: Context<'_>) -> Result<i32> {
        let mut pairs: Vec<(&String, &String)> = ctx.env.iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));

        let mut output = String::new();
        for (name, value) in pairs {
            output.push_str(&format!("{}={}\n", name, value));
        }
        ctx.stdout.write_text(&output)?;
        Ok(0)
    }
}
