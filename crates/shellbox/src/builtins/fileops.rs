//! File operation builtins: mkdir, rm, touch, cp, mv

use async_trait::async_trait;

use super::{Builtin, Context};
use crate::error::Result;

/// The mkdir builtin. `-p` creates parents and tolerates existing
/// directories.
pub struct Mkdir;

/// The rm builtin. `-r` removes directories recursively; `-f` ignores
/// missing operands.
pub struct Rm;

/// The touch builtin - create empty files (contents are left alone if the
/// file exists).
pub struct Touch;

/// The cp builtin - copy one file to another path.
pub struct Cp;

/// The mv builtin - copy then remove the source.
pub struct Mv;

#[async_trait]
impl Builtin for Mkdir {
    async fn run(&self, ctx: Context<'_>) -> Result<i32> {
        let recursive = ctx.args.iter().any(|a| a == "-p");
        let dirs: Vec<&String> = ctx.args.iter().filter(|a| !a.starts_with('-')).collect();

        if dirs.is_empty() {
            ctx.stderr.write_text("mkdir: missing operand\n")?;
            return Ok(1);
        }

        let mut exit = 0;
        for dir in dirs {
            let path = ctx.resolve(dir);
            if let Err(e) = ctx.fs.mkdir(&path, recursive).await {
                ctx.stderr
                    .write_text(&format!("mkdir: {}: {}\n", dir, super::error_line(&e)))?;
                exit = 1;
            }
        }
        Ok(exit)
    }
}

#[async_trait]
impl Builtin for Rm {
    async fn run(&self, ctx: Context<'_>) -> Result<i32> {
        let recursive = ctx.args.iter().any(|a| a == "-r" || a == "-rf" || a == "-fr");
        let force = ctx.args.iter().any(|a| a == "-f" || a == "-rf" || a == "-fr");
        let targets: Vec<&String> = ctx.args.iter().filter(|a| !a.starts_with('-')).collect();

        if targets.is_empty() {
            ctx.stderr.write_text("rm: missing operand\n")?;
            return Ok(1);
        }

        let mut exit = 0;
        for target in targets {
            let path = ctx.resolve(target);
            if let Err(e) = ctx.fs.remove(&path, recursive).await {
                if !force {
                    ctx.stderr
                        .write_text(&format!("rm: {}: {}\n", target, super::error_line(&e)))?;
                    exit = 1;
                }
            }
        }
        Ok(exit)
    }
}

#[async_trait]
impl Builtin for Touch {
    async fn run(&self, ctx: Context<'_>) -> Result<i32> {
        if ctx.args.is_empty() {
            ctx.stderr.write_text("touch: missing operand\n")?;
            return Ok(1);
        }

        let mut exit = 0;
        for arg in ctx.args {
            let path = ctx.resolve(arg);
            let exists = ctx.fs.exists(&path).await.unwrap_or(false);
            if exists {
                continue;
            }
            if let Err(e) = ctx.fs.write_file(&path, b"").await {
                ctx.stderr
                    .write_text(&format!("touch: {}: {}\n", arg, super::error_line(&e)))?;
                exit = 1;
            }
        }
        Ok(exit)
    }
}

#[async_trait]
impl Builtin for Cp {
    async fn run(&self, ctx: Context<'_>) -> Result<i32> {
        copy_or_move(&ctx, "cp", false).await
    }
}

#[async_trait]
impl Builtin for Mv {
    async fn run(&self, ctx: Context<'_>) -> Result<i32> {
        copy_or_move(&ctx, "mv", true).await
    }
}

async fn copy_or_move(ctx: &Context<'_>, name: &str, remove_source: bool) -> Result<i32> {
    let operands: Vec<&String> = ctx.args.iter().filter(|a| !a.starts_with('-')).collect();
    let (src, dst) = match operands.as_slice() {
        [src, dst] => (src, dst),
        _ => {
            ctx.stderr
                .write_text(&format!("{}: expected source and destination\n", name))?;
            return Ok(1);
        }
    };

    let src_path = ctx.resolve(src);
    let dst_path = ctx.resolve(dst);

    let content = match ctx.fs.read_file(&src_path).await {
        Ok(content) => content,
        Err(e) => {
            ctx.stderr
                .write_text(&format!("{}: {}: {}\n", name, src, super::error_line(&e)))?;
            return Ok(1);
        }
    };

    // A directory destination receives the source's file name.
    let dst_path = match ctx.fs.stat(&dst_path).await {
        Ok(meta) if meta.file_type.is_dir() => match src_path.file_name() {
            Some(file_name) => dst_path.join(file_name),
            None => dst_path,
        },
        _ => dst_path,
    };

    if let Err(e) = ctx.fs.write_file(&dst_path, &content).await {
        ctx.stderr
            .write_text(&format!("{}: {}: {}\n", name, dst, super::error_line(&e)))?;
        return Ok(1);
    }
    if remove_source {
        if let Err(e) = ctx.fs.remove(&src_path, false).await {
            ctx.stderr
                .write_text(&format!("{}: {}: {}\n", name, src, super::error_line(&e)))?;
            return Ok(1);
        }
    }
    Ok(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::builtins::testutil::{run, run_with_fs};
    use crate::fs::{MemoryStore, VirtualFs};
    use std::path::Path;
    use std::sync::Arc;

    fn vfs() -> Arc<VirtualFs> {
        Arc::new(VirtualFs::new(Arc::new(MemoryStore::new())))
    }

    #[tokio::test]
    async fn test_mkdir_and_touch() {
        let fs = vfs();
        let (exit, _, _) = run_with_fs(&Mkdir, &["/dir"], "", Arc::clone(&fs)).await;
        assert_eq!(exit, 0);
        let (exit, _, _) = run_with_fs(&Touch, &["/dir/file"], "", Arc::clone(&fs)).await;
        assert_eq!(exit, 0);
        assert!(fs.exists(Path::new("/dir/file")).await.unwrap());
    }

    #[tokio::test]
    async fn test_mkdir_p_nested() {
        let fs = vfs();
        let (exit, _, _) = run_with_fs(&Mkdir, &["-p", "/a/b/c"], "", Arc::clone(&fs)).await;
        assert_eq!(exit, 0);
        assert!(fs.exists(Path::new("/a/b/c")).await.unwrap());
    }

    #[tokio::test]
    async fn test_touch_preserves_contents() {
        let fs = vfs();
        fs.write_file(Path::new("/f"), b"keep").await.unwrap();
        run_with_fs(&Touch, &["/f"], "", Arc::clone(&fs)).await;
        assert_eq!(fs.read_file(Path::new("/f")).await.unwrap(), b"keep");
    }

    #[tokio::test]
    async fn test_rm_file() {
        let fs = vfs();
        fs.write_file(Path::new("/f"), b"x").await.unwrap();
        let (exit, _, _) = run_with_fs(&Rm, &["/f"], "", Arc::clone(&fs)).await;
        assert_eq!(exit, 0);
        assert!(!fs.exists(Path::new("/f")).await.unwrap());
    }

    #[tokio::test]
    async fn test_rm_missing_without_force_fails() {
        let (exit, _, err) = run(&Rm, &["/absent"], "").await;
        assert_eq!(exit, 1);
        assert!(!err.is_empty());
    }

    #[tokio::test]
    async fn test_rm_rf_missing_is_quiet() {
        let (exit, _, err) = run(&Rm, &["-rf", "/absent"], "").await;
        assert_eq!(exit, 0);
        assert!(err.is_empty());
    }

    #[tokio::test]
    async fn test_cp_and_mv() {
        let fs = vfs();
        fs.write_file(Path::new("/src"), b"payload").await.unwrap();

        let (exit, _, _) = run_with_fs(&Cp, &["/src", "/copy"], "", Arc::clone(&fs)).await;
        assert_eq!(exit, 0);
        assert_eq!(fs.read_file(Path::new("/copy")).await.unwrap(), b"payload");

        let (exit, _, _) = run_with_fs(&Mv, &["/copy", "/moved"], "", Arc::clone(&fs)).await;
        assert_eq!(exit, 0);
        assert!(!fs.exists(Path::new("/copy")).await.unwrap());
        assert_eq!(fs.read_file(Path::new("/moved")).await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_cp_into_directory() {
        let fs = vfs();
        fs.write_file(Path::new("/src.txt"), b"x").await.unwrap();
        fs.mkdir(Path::new("/dest"), false).await.unwrap();
        let (exit, _, _) = run_with_fs(&Cp, &["/src.txt", "/dest"], "", Arc::clone(&fs)).await;
        assert_eq!(exit, 0);
        assert!(fs.exists(Path::new("/dest/src.txt")).await.unwrap());
    }
}
