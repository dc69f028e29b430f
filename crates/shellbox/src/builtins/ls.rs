//! ls builtin

use async_trait::async_trait;

use super::{Builtin, Context};
use crate::error::Result;

/// The ls builtin - list directory entries, one per line, sorted.
/// `-a` includes hidden entries.
pub struct Ls;

#[async_trait]
impl Builtin for Ls {
    async fn run(&self, ctx: Context<'_>) -> Result<i32> {
        let show_hidden = ctx.args.iter().any(|a| a == "-a" || a == "-la" || a == "-al");
        let targets: Vec<&String> = ctx.args.iter().filter(|a| !a.starts_with('-')).collect();

        let cwd_string = ctx.cwd.to_string_lossy().into_owned();
        let targets: Vec<&str> = if targets.is_empty() {
            vec![cwd_string.as_str()]
        } else {
            targets.iter().map(|s| s.as_str()).collect()
        };
        let label_targets = targets.len() > 1;

        let mut exit = 0;
        let mut output = String::new();
        for (i, target) in targets.iter().enumerate() {
            let path = ctx.resolve(target);

            // A file operand lists itself.
            match ctx.fs.stat(&path).await {
                Ok(meta) if meta.file_type.is_file() => {
                    output.push_str(target);
                    output.push('\n');
                    continue;
                }
                Err(e) => {
                    ctx.stderr
                        .write_text(&format!("ls: {}: {}\n", target, super::error_line(&e)))?;
                    exit = 1;
                    continue;
                }
                Ok(_) => {}
            }

            match ctx.fs.read_dir(&path).await {
                Ok(entries) => {
                    if label_targets {
                        if i > 0 {
                            output.push('\n');
                        }
                        output.push_str(&format!("{}:\n", target));
                    }
                    for entry in entries {
                        if entry.name.starts_with('.') && !show_hidden {
                            continue;
                        }
                        output.push_str(&entry.name);
                        output.push('\n');
                    }
                }
                Err(e) => {
                    ctx.stderr
                        .write_text(&format!("ls: {}: {}\n", target, super::error_line(&e)))?;
                    exit = 1;
                }
            }
        }

        ctx.stdout.write_text(&output)?;
        Ok(exit)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::builtins::testutil::run_with_fs;
    use crate::fs::{MemoryStore, VirtualFs};
    use std::path::Path;
    use std::sync::Arc;

    fn vfs() -> Arc<VirtualFs> {
        Arc::new(VirtualFs::new(Arc::new(MemoryStore::new())))
    }

    #[tokio::test]
    async fn test_ls_lists_sorted_entries() {
        let fs = vfs();
        fs.write_file(Path::new("/b.txt"), b"").await.unwrap();
        fs.write_file(Path::new("/a.txt"), b"").await.unwrap();

        let (exit, out, _) = run_with_fs(&Ls, &["/"], "", fs).await;
        assert_eq!(exit, 0);
        assert_eq!(out, "a.txt\nb.txt\n");
    }

    #[tokio::test]
    async fn test_ls_hides_dotfiles_by_default() {
        let fs = vfs();
        fs.write_file(Path::new("/.hidden"), b"").await.unwrap();
        fs.write_file(Path::new("/seen"), b"").await.unwrap();

        let (_, out, _) = run_with_fs(&Ls, &["/"], "", Arc::clone(&fs)).await;
        assert_eq!(out, "seen\n");

        let (_, out, _) = run_with_fs(&Ls, &["-a", "/"], "", fs).await;
        assert_eq!(out, ".hidden\nseen\n");
    }

    #[tokio::test]
    async fn test_ls_file_operand() {
        let fs = vfs();
        fs.write_file(Path::new("/f.txt"), b"").await.unwrap();
        let (exit, out, _) = run_with_fs(&Ls, &["/f.txt"], "", fs).await;
        assert_eq!(exit, 0);
        assert_eq!(out, "/f.txt\n");
    }

    #[tokio::test]
    async fn test_ls_missing_path() {
        let fs = vfs();
        let (exit, _, err) = run_with_fs(&Ls, &["/missing"], "", fs).await;
        assert_eq!(exit, 1);
        assert!(err.contains("/missing"));
    }
}
