//! Built-in shell commands.
//!
//! A builtin receives a [`Context`] carrying its arguments, I/O handles,
//! filesystem handle, working directory, and environment, and returns an
//! integer exit code (0 = success). Errors returned from a builtin are
//! caught once per command by the interpreter and reported as a
//! `<name>: <detail>` line on stderr with exit code 1.

mod cat;
mod echo;
mod environ;
mod fileops;
mod flow;
mod grep;
mod headtail;
mod ls;
mod printf;
mod pwd;
mod seq;
mod sortuniq;
mod wc;

pub use cat::Cat;
pub use echo::Echo;
pub use environ::Env;
pub use fileops::{Cp, Mkdir, Mv, Rm, Touch};
pub use flow::{False, True};
pub use grep::Grep;
pub use headtail::{Head, Tail};
pub use ls::Ls;
pub use printf::Printf;
pub use pwd::Pwd;
pub use seq::Seq;
pub use sortuniq::{Sort, Uniq};
pub use test::Test;
pub use wc::Wc;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::fs::VirtualFs;
use crate::io::{OutputHandle, StdinReader};

/// Context for builtin command execution.
pub struct Context<'a> {
    /// Command arguments (not including the command name)
    pub args: &'a [String],
    /// Standard input
    pub stdin: StdinReader,
    /// Standard output sink
    pub stdout: OutputHandle,
    /// Standard error sink
    pub stderr: OutputHandle,
    /// Sandboxed filesystem
    pub fs: Arc<VirtualFs>,
    /// Caller's working directory
    pub cwd: &'a Path,
    /// Environment (parent environment plus this command's assignments)
    pub env: &'a HashMap<String, String>,
}

impl Context<'_> {
    /// Resolve a command-line path argument against the working directory.
    pub fn resolve(&self, arg: &str) -> PathBuf {
        if arg.starts_with('/') {
            PathBuf::from(arg)
        } else {
            self.cwd.join(arg)
        }
    }
}

/// Short error text for `<cmd>: <path>: <detail>` diagnostic lines.
pub(crate) fn error_line(err: &crate::error::Error) -> String {
    match err {
        crate::error::Error::Io(io) => io.to_string(),
        other => other.to_string(),
    }
}

/// Trait for builtin commands.
#[async_trait]
pub trait Builtin: Send + Sync {
    /// Execute the builtin and return its exit code.
    async fn run(&self, ctx: Context<'_>) -> Result<i32>;
}

/// Name → builtin registry.
///
/// [`Registry::with_defaults`] installs the standard command set; hosts
/// can [`register`](Registry::register) additional commands or start from
/// [`Registry::new`] for a locked-down surface.
pub struct Registry {
    commands: HashMap<String, Arc<dyn Builtin>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// A registry with the standard builtin set installed.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("cat", Arc::new(Cat));
        registry.register("cp", Arc::new(Cp));
        registry.register("echo", Arc::new(Echo));
        registry.register("env", Arc::new(Env));
        registry.register("false", Arc::new(False));
        registry.register("grep", Arc::new(Grep));
        registry.register("head", Arc::new(Head));
        registry.register("ls", Arc::new(Ls));
        registry.register("mkdir", Arc::new(Mkdir));
        registry.register("mv", Arc::new(Mv));
        registry.register("printf", Arc::new(Printf));
        registry.register("pwd", Arc::new(Pwd));
        registry.register("rm", Arc::new(Rm));
        registry.register("seq", Arc::new(Seq));
        registry.register("sort", Arc::new(Sort));
        registry.register("tail", Arc::new(Tail));
        registry.register("test", Arc::new(Test));
        registry.register("[", Arc::new(Test));
        registry.register("touch", Arc::new(Touch));
        registry.register("true", Arc::new(True));
        registry.register("uniq", Arc::new(Uniq));
        registry.register("wc", Arc::new(Wc));
        registry
    }

    /// Register (or replace) a command.
    pub fn register(&mut self, name: impl Into<String>, builtin: Arc<dyn Builtin>) {
        self.commands.insert(name.into(), builtin);
    }

    /// Look up a command by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Builtin>> {
        self.commands.get(name).cloned()
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }
}
