//! Shellbox - embeddable sandboxed shell engine
//!
//! Shellbox executes Bourne-shell-flavored command strings (pipelines,
//! logical operators, redirections, variable expansion, command
//! substitution, globs, heredocs) against a sandboxed virtual filesystem
//! and an in-memory registry of builtin commands, returning captured
//! stdout, stderr, and an exit code. Nothing touches the host process
//! environment or any path outside the sandbox.
//!
//! # Quick Start
//!
//! ```rust
//! use shellbox::Shell;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> shellbox::Result<()> {
//! let mut shell = Shell::new();
//! let result = shell.exec("echo 'Hello, World!'").await?;
//! assert_eq!(result.stdout_text(), "Hello, World!\n");
//! assert_eq!(result.exit_code, 0);
//! # Ok(())
//! # }
//! ```
//!
//! # Pipelines, booleans, redirections
//!
//! ```rust
//! use shellbox::Shell;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> shellbox::Result<()> {
//! let mut shell = Shell::new();
//!
//! shell.exec("echo hello > /greeting.txt").await?;
//! let result = shell.exec("cat /greeting.txt | wc -c").await?;
//! assert_eq!(result.stdout_text().trim(), "6");
//!
//! let result = shell.exec("false || echo fallback").await?;
//! assert_eq!(result.stdout_text(), "fallback\n");
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! Use [`Shell::builder()`] to set environment variables, the working
//! directory, permission rules, a custom command registry, or
//! host-supplied redirect objects:
//!
//! ```rust
//! use shellbox::{Access, Shell};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> shellbox::Result<()> {
//! let mut shell = Shell::builder()
//!     .env("USER", "alice")
//!     .rule("/secrets/**", Access::Excluded)
//!     .build();
//!
//! let result = shell.exec("echo \"Hello, $USER\"").await?;
//! assert_eq!(result.stdout_text(), "Hello, alice\n");
//! # Ok(())
//! # }
//! ```
//!
//! # Filesystem access
//!
//! The sandboxed filesystem is available via [`Shell::fs()`] for
//! pre-populating inputs and reading outputs, including binary data:
//!
//! ```rust
//! use shellbox::Shell;
//! use std::path::Path;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> shellbox::Result<()> {
//! let mut shell = Shell::new();
//! shell.fs().write_file(Path::new("/data.txt"), b"foo\nbar\n").await?;
//!
//! let result = shell.exec("grep foo /data.txt").await?;
//! assert_eq!(result.stdout_text(), "foo\n");
//! # Ok(())
//! # }
//! ```

// Prefer proper error handling over unwrap() outside tests.
#![warn(clippy::unwrap_used)]

mod builtins;
mod error;
mod fs;
mod interp;
mod io;
mod logging;
/// Parser module - exposed for fuzzing and host-side syntax checks
pub mod parser;

pub use async_trait::async_trait;
pub use builtins::{Builtin, Context, Registry};
pub use error::{Error, Result};
pub use fs::{Access, DirEntry, FileStore, FileType, MemoryStore, Metadata, RuleSet, VirtualFs};
pub use interp::{ExecOutput, Interpreter, RedirectObject};
pub use io::{
    BufferSink, ByteCollector, ByteStream, ChunkReader, Input, Lines, OutputHandle, PipeBuffer,
    StdinReader,
};

use logging::log_debug;
use parser::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Main entry point: a sandboxed shell execution environment.
///
/// Each instance is isolated; environment variables set by scripts and
/// files written by builtins persist across [`exec`](Shell::exec) calls
/// on the same instance and nowhere else.
///
/// Background execution is not honored: a bare `&` is treated as an
/// ordinary word, never as a job-control operator.
pub struct Shell {
    fs: Arc<VirtualFs>,
    interpreter: Interpreter,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell {
    /// A shell with an empty in-memory filesystem, no permission rules,
    /// the default builtin registry, and `/` as the working directory.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// A [`ShellBuilder`] for customized configuration.
    pub fn builder() -> ShellBuilder {
        ShellBuilder::default()
    }

    /// Parse and execute a source string, returning the captured result
    /// once all asynchronous I/O has drained.
    ///
    /// Lex and parse errors surface as `Err`; command failures surface
    /// through [`ExecOutput::exit_code`] and captured stderr (127 for an
    /// unknown command name, 1 for a failing redirect or builtin error).
    pub async fn exec(&mut self, source: &str) -> Result<ExecOutput> {
        log_debug!(source_len = source.len(), "exec");
        let ast = Parser::new(source)?.parse()?;
        self.interpreter.execute(&ast).await
    }

    /// The sandboxed filesystem, for pre-populating files or reading
    /// script output directly.
    pub fn fs(&self) -> Arc<VirtualFs> {
        Arc::clone(&self.fs)
    }
}

/// Builder for customized [`Shell`] configuration.
#[derive(Default)]
pub struct ShellBuilder {
    store: Option<Arc<dyn FileStore>>,
    rules: Vec<(String, Access)>,
    read_only_default: bool,
    mount_base: Option<PathBuf>,
    env: HashMap<String, String>,
    cwd: Option<PathBuf>,
    registry: Option<Registry>,
    redirect_objects: Vec<(String, RedirectObject)>,
    max_loop_iterations: Option<usize>,
}

impl ShellBuilder {
    /// Use a custom byte store instead of the default [`MemoryStore`].
    pub fn store(mut self, store: Arc<dyn FileStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Append a permission rule mapping a glob pattern to an access
    /// level. More specific patterns win regardless of insertion order;
    /// see [`Access`] and the rule scoring documented on [`RuleSet`].
    pub fn rule(mut self, pattern: impl Into<String>, access: Access) -> Self {
        self.rules.push((pattern.into(), access));
        self
    }

    /// Default unmatched paths to read-only instead of read-write.
    pub fn read_only(mut self) -> Self {
        self.read_only_default = true;
        self
    }

    /// Set the absolute host path that contains the sandbox, for stores
    /// that map onto host storage.
    pub fn mount_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.mount_base = Some(base.into());
        self
    }

    /// Set an environment variable visible to scripts via `$NAME`.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the working directory (default `/`).
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Replace the builtin registry.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Bind a host-supplied redirect object to an opaque marker string.
    /// When a redirect target evaluates to the marker, the object is used
    /// in place of a file path.
    pub fn redirect_object(
        mut self,
        marker: impl Into<String>,
        object: RedirectObject,
    ) -> Self {
        self.redirect_objects.push((marker.into(), object));
        self
    }

    /// Cap loop iterations (default 10,000).
    pub fn max_loop_iterations(mut self, max: usize) -> Self {
        self.max_loop_iterations = Some(max);
        self
    }

    /// Build the configured [`Shell`].
    pub fn build(self) -> Shell {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let mut vfs = if self.read_only_default {
            VirtualFs::read_only(store, &self.rules)
        } else {
            VirtualFs::with_rules(store, &self.rules)
        };
        if let Some(base) = self.mount_base {
            vfs = vfs.with_mount_base(base);
        }
        let fs = Arc::new(vfs);

        let mut interpreter = Interpreter::new(Arc::clone(&fs));
        for (key, value) in &self.env {
            interpreter.set_env(key, value);
        }
        if let Some(cwd) = self.cwd {
            interpreter.set_cwd(cwd);
        }
        if let Some(registry) = self.registry {
            interpreter.set_registry(registry);
        }
        for (marker, object) in self.redirect_objects {
            interpreter.add_redirect_object(marker, object);
        }
        if let Some(max) = self.max_loop_iterations {
            interpreter.set_max_loop_iterations(max);
        }

        Shell { fs, interpreter }
    }
}
