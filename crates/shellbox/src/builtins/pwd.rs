//! pwd builtin

use async_trait::async_trait;

use super::{Builtin, Context};
use crate::error::Result;

/// The pwd builtin - print the working directory.
pub struct Pwd;

#[async_trait]
impl Builtin for Pwd {
    async fn run(&self, ctx: Context<'_>) -> Result<i32> {
        ctx.stdout
            .write_text(&format!("{}\n", ctx.cwd.display()))?;
        Ok(0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::builtins::testutil::run;

    #[tokio::test]
    async fn test_pwd() {
        let (exit, out, _) = run(&Pwd, &[], "").await;
        assert_eq!(exit, 0);
        assert_eq!(out, "/\n");
    }
}
