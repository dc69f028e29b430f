//! Sandboxed filesystem facade.
//!
//! [`VirtualFs`] wraps a [`FileStore`] and enforces the sandbox contract:
//! path containment (no escape above the virtual root or the mount base)
//! and rule-based permissions. All interpreter and builtin I/O goes
//! through this facade; the store itself never sees an uncontained path.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::glob::{brace_expand, segment_regex};
use super::perms::{Access, RuleSet};
use super::store::{DirEntry, FileStore, Metadata};
use crate::error::{Error, Result};
use crate::logging::log_trace;

/// Sandboxed filesystem facade over a byte store.
pub struct VirtualFs {
    store: Arc<dyn FileStore>,
    /// Absolute host path all virtual paths are confined to, when the
    /// store maps onto host storage.
    mount_base: Option<PathBuf>,
    rules: RuleSet,
}

impl VirtualFs {
    /// A sandbox with no rules: everything read-write.
    pub fn new(store: Arc<dyn FileStore>) -> Self {
        Self {
            store,
            mount_base: None,
            rules: RuleSet::empty(Access::ReadWrite),
        }
    }

    /// A sandbox with permission rules; unmatched paths are read-write.
    pub fn with_rules(store: Arc<dyn FileStore>, rules: &[(String, Access)]) -> Self {
        Self {
            store,
            mount_base: None,
            rules: RuleSet::new(rules, Access::ReadWrite),
        }
    }

    /// The read-only variant: identical, but unmatched paths default to
    /// read-only.
    pub fn read_only(store: Arc<dyn FileStore>, rules: &[(String, Access)]) -> Self {
        Self {
            store,
            mount_base: None,
            rules: RuleSet::new(rules, Access::ReadOnly),
        }
    }

    /// Set the mount base used to verify host-path containment.
    pub fn with_mount_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.mount_base = Some(base.into());
        self
    }

    /// The underlying store.
    pub fn store(&self) -> Arc<dyn FileStore> {
        Arc::clone(&self.store)
    }

    /// Resolve a virtual path safely: a running depth over the non-empty
    /// segments must never go negative (`..` decrements, non-`.` segments
    /// increment), then the path is normalized and, when a mount base is
    /// configured, the joined host path is verified to stay under it.
    pub fn resolve_safe(&self, path: &Path) -> Result<PathBuf> {
        let raw = path.to_string_lossy();

        let mut depth: i64 = 0;
        for segment in raw.split('/').filter(|s| !s.is_empty()) {
            match segment {
                ".." => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(Error::PathTraversal(raw.into_owned()));
                    }
                }
                "." => {}
                _ => depth += 1,
            }
        }

        let mut normalized = PathBuf::from("/");
        for segment in raw.split('/').filter(|s| !s.is_empty()) {
            match segment {
                ".." => {
                    normalized.pop();
                }
                "." => {}
                other => normalized.push(other),
            }
        }

        if let Some(base) = &self.mount_base {
            let relative = normalized.strip_prefix("/").unwrap_or(&normalized);
            let host = base.join(relative);
            if host != *base && !host.starts_with(base) {
                return Err(Error::PathTraversal(raw.into_owned()));
            }
        }

        Ok(normalized)
    }

    /// The host path a virtual path maps to, when a mount base is set.
    pub fn host_path(&self, path: &Path) -> Result<Option<PathBuf>> {
        let normalized = self.resolve_safe(path)?;
        Ok(self.mount_base.as_ref().map(|base| {
            let relative = normalized.strip_prefix("/").unwrap_or(&normalized);
            base.join(relative)
        }))
    }

    /// The access level the rule set grants a path.
    pub fn access_for(&self, path: &Path) -> Result<Access> {
        let normalized = self.resolve_safe(path)?;
        Ok(self.rules.access_for(&normalized.to_string_lossy()))
    }

    fn check_read(&self, path: &Path) -> Result<()> {
        if self.rules.access_for(&path.to_string_lossy()) == Access::Excluded {
            log_trace!(path = %path.display(), "read denied by rule");
            return Err(Error::AccessDenied {
                path: path.display().to_string(),
                reason: "excluded",
            });
        }
        Ok(())
    }

    fn check_write(&self, path: &Path) -> Result<()> {
        match self.rules.access_for(&path.to_string_lossy()) {
            Access::ReadWrite => Ok(()),
            Access::ReadOnly => {
                log_trace!(path = %path.display(), "write denied by rule");
                Err(Error::AccessDenied {
                    path: path.display().to_string(),
                    reason: "read-only",
                })
            }
            Access::Excluded => {
                log_trace!(path = %path.display(), "write denied by rule");
                Err(Error::AccessDenied {
                    path: path.display().to_string(),
                    reason: "excluded",
                })
            }
        }
    }

    /// Check that a path could be written, without performing I/O. Used by
    /// redirect setup so permission failures abort a command up front.
    pub fn ensure_writable(&self, path: &Path) -> Result<()> {
        let path = self.resolve_safe(path)?;
        self.check_write(&path)
    }

    pub async fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        let path = self.resolve_safe(path)?;
        self.check_read(&path)?;
        self.store.read(&path).await
    }

    pub async fn write_file(&self, path: &Path, content: &[u8]) -> Result<()> {
        let path = self.resolve_safe(path)?;
        self.check_write(&path)?;
        self.store.write(&path, content).await
    }

    pub async fn append_file(&self, path: &Path, content: &[u8]) -> Result<()> {
        let path = self.resolve_safe(path)?;
        self.check_write(&path)?;
        self.store.append(&path, content).await
    }

    pub async fn mkdir(&self, path: &Path, recursive: bool) -> Result<()> {
        let path = self.resolve_safe(path)?;
        self.check_write(&path)?;
        self.store.mkdir(&path, recursive).await
    }

    pub async fn remove(&self, path: &Path, recursive: bool) -> Result<()> {
        let path = self.resolve_safe(path)?;
        self.check_write(&path)?;
        self.store.remove(&path, recursive).await
    }

    pub async fn stat(&self, path: &Path) -> Result<Metadata> {
        let path = self.resolve_safe(path)?;
        self.check_read(&path)?;
        self.store.stat(&path).await
    }

    pub async fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let path = self.resolve_safe(path)?;
        self.check_read(&path)?;
        Ok(self
            .store
            .read_dir(&path)
            .await?
            .into_iter()
            .filter(|entry| {
                self.rules
                    .access_for(&path.join(&entry.name).to_string_lossy())
                    != Access::Excluded
            })
            .collect())
    }

    /// Existence check; excluded paths report absent.
    pub async fn exists(&self, path: &Path) -> Result<bool> {
        let path = self.resolve_safe(path)?;
        if self.rules.access_for(&path.to_string_lossy()) == Access::Excluded {
            return Ok(false);
        }
        self.store.exists(&path).await
    }

    /// Expand a glob pattern against the store. Brace groups expand first;
    /// each expanded pattern is walked segment by segment, with `**`
    /// matching zero or more directory levels. Results are sorted,
    /// de-duplicated, and filtered of excluded paths. Patterns without a
    /// leading `/` are resolved against (and reported relative to) `cwd`.
    pub async fn glob(&self, pattern: &str, cwd: &Path) -> Result<Vec<String>> {
        let relative = !pattern.starts_with('/');
        let mut results = BTreeSet::new();

        for pat in brace_expand(pattern) {
            let full = if relative {
                let cwd = self.resolve_safe(cwd)?;
                format!("{}/{}", cwd.display(), pat)
            } else {
                pat
            };
            let segments: Vec<String> = full
                .split('/')
                .filter(|s| !s.is_empty() && *s != ".")
                .map(String::from)
                .collect();
            self.walk_glob(&segments, &mut results).await;
        }

        let mut out: Vec<String> = results.into_iter().collect();
        if relative {
            let prefix = format!(
                "{}/",
                self.resolve_safe(cwd)?.display().to_string().trim_end_matches('/')
            );
            out = out
                .into_iter()
                .map(|p| {
                    if let Some(stripped) = p.strip_prefix(&prefix) {
                        return stripped.to_string();
                    }
                    p
                })
                .collect();
        }
        Ok(out)
    }

    /// Directory entries for glob walking; unreadable or excluded
    /// directories yield nothing rather than failing the expansion.
    async fn read_dir_quiet(&self, dir: &Path) -> Vec<DirEntry> {
        if self.rules.access_for(&dir.to_string_lossy()) == Access::Excluded {
            return Vec::new();
        }
        self.store.read_dir(dir).await.unwrap_or_default()
    }

    async fn walk_glob(&self, segments: &[String], results: &mut BTreeSet<String>) {
        let mut dirs: Vec<PathBuf> = vec![PathBuf::from("/")];

        for (i, segment) in segments.iter().enumerate() {
            let last = i + 1 == segments.len();

            if segment == "**" {
                // `**` matches zero segments at the current position or
                // descends into every accessible subdirectory.
                let mut all_dirs = dirs.clone();
                let mut queue = dirs.clone();
                while let Some(dir) = queue.pop() {
                    for entry in self.read_dir_quiet(&dir).await {
                        if entry.metadata.file_type.is_dir() && !entry.name.starts_with('.') {
                            let path = dir.join(&entry.name);
                            if !all_dirs.contains(&path) {
                                all_dirs.push(path.clone());
                                queue.push(path);
                            }
                        }
                    }
                }
                if last {
                    for dir in &all_dirs {
                        for entry in self.read_dir_quiet(dir).await {
                            if entry.name.starts_with('.') {
                                continue;
                            }
                            let path = dir.join(&entry.name);
                            if self.rules.access_for(&path.to_string_lossy())
                                != Access::Excluded
                            {
                                results.insert(path.display().to_string());
                            }
                        }
                    }
                    return;
                }
                dirs = all_dirs;
            } else {
                let regex = segment_regex(segment);
                let match_hidden = segment.starts_with('.');
                let mut next = Vec::new();
                for dir in &dirs {
                    for entry in self.read_dir_quiet(dir).await {
                        if entry.name.starts_with('.') && !match_hidden {
                            continue;
                        }
                        if !regex.is_match(&entry.name) {
                            continue;
                        }
                        let path = dir.join(&entry.name);
                        if self.rules.access_for(&path.to_string_lossy()) == Access::Excluded {
                            continue;
                        }
                        if last {
                            results.insert(path.display().to_string());
                        } else if entry.metadata.file_type.is_dir() {
                            next.push(path);
                        }
                    }
                }
                if last {
                    return;
                }
                dirs = next;
                if dirs.is_empty() {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fs::MemoryStore;

    fn vfs() -> VirtualFs {
        VirtualFs::new(Arc::new(MemoryStore::new()))
    }

    fn vfs_with(rules: &[(&str, Access)]) -> VirtualFs {
        let owned: Vec<(String, Access)> =
            rules.iter().map(|(p, a)| (p.to_string(), *a)).collect();
        VirtualFs::with_rules(Arc::new(MemoryStore::new()), &owned)
    }

    #[tokio::test]
    async fn test_round_trip() {
        let fs = vfs();
        fs.write_file(Path::new("/f.txt"), b"data").await.unwrap();
        assert_eq!(fs.read_file(Path::new("/f.txt")).await.unwrap(), b"data");
    }

    #[test]
    fn test_resolve_normalizes() {
        let fs = vfs();
        assert_eq!(
            fs.resolve_safe(Path::new("/a/./b/../c")).unwrap(),
            PathBuf::from("/a/c")
        );
    }

    #[test]
    fn test_traversal_blocked() {
        let fs = vfs();
        let err = fs.resolve_safe(Path::new("/../etc/passwd")).unwrap_err();
        assert!(matches!(err, Error::PathTraversal(_)));

        // Dipping below the root mid-path is blocked even if the final
        // depth is positive again.
        let err = fs.resolve_safe(Path::new("/a/../../b/c")).unwrap_err();
        assert!(matches!(err, Error::PathTraversal(_)));
    }

    #[test]
    fn test_traversal_allowed_when_balanced() {
        let fs = vfs();
        assert_eq!(
            fs.resolve_safe(Path::new("/a/b/../c")).unwrap(),
            PathBuf::from("/a/c")
        );
    }

    #[test]
    fn test_host_path_under_mount_base() {
        let fs = vfs().with_mount_base("/srv/sandbox");
        let host = fs.host_path(Path::new("/data/x.txt")).unwrap().unwrap();
        assert_eq!(host, PathBuf::from("/srv/sandbox/data/x.txt"));
    }

    #[tokio::test]
    async fn test_excluded_read_denied() {
        let fs = vfs_with(&[("/secrets/**", Access::Excluded)]);
        fs.mkdir(Path::new("/data"), false).await.unwrap();
        let err = fs.read_file(Path::new("/secrets/key")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::AccessDenied {
                reason: "excluded",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_read_only_write_denied() {
        let fs = vfs_with(&[("/etc/**", Access::ReadOnly)]);
        // The rule covers the directory's contents, not the directory itself.
        fs.mkdir(Path::new("/etc"), false).await.unwrap();
        let err = fs
            .write_file(Path::new("/etc/conf"), b"x")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::AccessDenied {
                reason: "read-only",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_read_only_variant_defaults() {
        let fs = VirtualFs::read_only(
            Arc::new(MemoryStore::new()),
            &[("/scratch/**".to_string(), Access::ReadWrite)],
        );
        assert!(fs.write_file(Path::new("/top.txt"), b"x").await.is_err());
        // The explicit read-write carve-out still applies.
        assert_eq!(
            fs.access_for(Path::new("/scratch/tmp")).unwrap(),
            Access::ReadWrite
        );
    }

    #[tokio::test]
    async fn test_exists_hides_excluded() {
        let fs = vfs_with(&[("/hidden", Access::Excluded)]);
        assert!(!fs.exists(Path::new("/hidden")).await.unwrap());
    }

    #[tokio::test]
    async fn test_glob_star() {
        let fs = vfs();
        fs.mkdir(Path::new("/tmp"), false).await.unwrap();
        fs.write_file(Path::new("/tmp/a.txt"), b"").await.unwrap();
        fs.write_file(Path::new("/tmp/b.txt"), b"").await.unwrap();
        fs.write_file(Path::new("/tmp/c.log"), b"").await.unwrap();

        let matches = fs.glob("/tmp/*.txt", Path::new("/")).await.unwrap();
        assert_eq!(matches, vec!["/tmp/a.txt", "/tmp/b.txt"]);
    }

    #[tokio::test]
    async fn test_glob_question_mark() {
        let fs = vfs();
        fs.write_file(Path::new("/a1"), b"").await.unwrap();
        fs.write_file(Path::new("/a2"), b"").await.unwrap();
        fs.write_file(Path::new("/a10"), b"").await.unwrap();

        let matches = fs.glob("/a?", Path::new("/")).await.unwrap();
        assert_eq!(matches, vec!["/a1", "/a2"]);
    }

    #[tokio::test]
    async fn test_glob_relative_to_cwd() {
        let fs = vfs();
        fs.mkdir(Path::new("/work"), false).await.unwrap();
        fs.write_file(Path::new("/work/x.txt"), b"").await.unwrap();

        let matches = fs.glob("*.txt", Path::new("/work")).await.unwrap();
        assert_eq!(matches, vec!["x.txt"]);
    }

    #[tokio::test]
    async fn test_glob_brace_expansion() {
        let fs = vfs();
        fs.write_file(Path::new("/a.txt"), b"").await.unwrap();
        fs.write_file(Path::new("/a.log"), b"").await.unwrap();
        fs.write_file(Path::new("/a.bin"), b"").await.unwrap();

        let matches = fs.glob("/a.{txt,log}", Path::new("/")).await.unwrap();
        assert_eq!(matches, vec!["/a.log", "/a.txt"]);
    }

    #[tokio::test]
    async fn test_glob_double_star() {
        let fs = vfs();
        fs.mkdir(Path::new("/src"), false).await.unwrap();
        fs.mkdir(Path::new("/src/deep"), false).await.unwrap();
        fs.write_file(Path::new("/src/top.rs"), b"").await.unwrap();
        fs.write_file(Path::new("/src/deep/inner.rs"), b"").await.unwrap();

        let matches = fs.glob("/src/**/*.rs", Path::new("/")).await.unwrap();
        assert_eq!(matches, vec!["/src/deep/inner.rs", "/src/top.rs"]);
    }

    #[tokio::test]
    async fn test_glob_filters_excluded() {
        let fs = vfs_with(&[("/private/**", Access::Excluded)]);
        fs.mkdir(Path::new("/private"), false).await.unwrap();
        // Seed through the store: the facade itself refuses this write.
        fs.store()
            .write(Path::new("/private/key"), b"")
            .await
            .unwrap();
        fs.write_file(Path::new("/public.txt"), b"").await.unwrap();

        let matches = fs.glob("/**", Path::new("/")).await.unwrap();
        assert!(matches.contains(&"/public.txt".to_string()));
        // The directory itself is visible; its contents are not.
        assert!(matches.contains(&"/private".to_string()));
        assert!(!matches.contains(&"/private/key".to_string()));
    }

    #[tokio::test]
    async fn test_glob_no_matches_is_empty() {
        let fs = vfs();
        let matches = fs.glob("/nope/*.xyz", Path::new("/")).await.unwrap();
        assert!(matches.is_empty());
    }
}
