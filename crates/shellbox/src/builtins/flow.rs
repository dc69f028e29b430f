//! Exit-status builtins: true, false

use async_trait::async_trait;

use super::{Builtin, Context};
use crate::error::Result;

/// The true builtin - exits 0.
pub struct True;

/// The false builtin - exits 1.
pub struct False;

#[async_trait]
impl Builtin for True {
    async fn run(&self, _ctx: Context<'_>) -> Result<i32> {
        Ok(0)
    }
}

#[async_trait]
impl Builtin for False {
    async fn run(&self, _ctx: Context<'_>) -> Result<i32> {
        Ok(1)
    }
}
