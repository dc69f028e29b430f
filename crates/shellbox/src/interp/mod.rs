//! Tree-walking interpreter.
//!
//! Executes a parsed [`Node`] against the sandboxed filesystem and the
//! builtin registry, wiring pipeline stages through in-memory pipes and
//! resolving redirections to files or host-supplied objects. Execution is
//! cooperative: concurrent pipeline stages are plain futures driven
//! together on one scheduler, and every redirect-owned sink is closed and
//! flushed before its command returns.

mod arith;

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use futures_util::future::{join_all, BoxFuture};
use futures_util::FutureExt;
use regex::Regex;

use crate::builtins::{Context, Registry};
use crate::error::{Error, Result};
use crate::fs::VirtualFs;
use crate::io::{BufferSink, ByteCollector, Input, OutputHandle, PipeBuffer, StdinReader};
use crate::logging::log_debug;
use crate::parser::{CaseNode, Expr, ForNode, IfNode, LoopNode, Node, RedirectMode, SimpleCommand};

/// Captured result of one `execute` call.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ExecOutput {
    /// Captured standard output
    pub stdout: Vec<u8>,
    /// Captured standard error
    pub stderr: Vec<u8>,
    /// Final exit code (0 = success, 127 = command not found)
    pub exit_code: i32,
}

impl ExecOutput {
    /// Stdout decoded as UTF-8 (lossy).
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr decoded as UTF-8 (lossy).
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A host-supplied value bound to an opaque marker string and substituted
/// for a file path at redirect time.
///
/// Inputs (`<`) accept any variant; output redirects require a
/// [`Buffer`](RedirectObject::Buffer) and fail with a typed error
/// otherwise. The buffer's length is its capacity: output beyond it is
/// silently truncated.
#[derive(Clone)]
pub enum RedirectObject {
    /// A fixed byte source
    Bytes(Arc<Vec<u8>>),
    /// A fixed-size mutable byte buffer
    Buffer(Arc<Mutex<Vec<u8>>>),
}

impl RedirectObject {
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        RedirectObject::Bytes(Arc::new(bytes.into()))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::bytes(text.into().into_bytes())
    }

    pub fn buffer(buffer: Arc<Mutex<Vec<u8>>>) -> Self {
        RedirectObject::Buffer(buffer)
    }
}

/// The stdin/stdout/stderr wiring a node executes under.
#[derive(Clone)]
struct Stdio {
    stdin: Input,
    stdout: OutputHandle,
    stderr: OutputHandle,
}

/// A `>`-family redirect whose collected bytes are written to the
/// filesystem once the command exits.
struct PendingWrite {
    path: PathBuf,
    collector: ByteCollector,
    append: bool,
}

/// Effective I/O for one simple command after redirections.
struct RedirectSetup {
    stdin: Input,
    stdout: OutputHandle,
    stderr: OutputHandle,
    /// Sinks created by this command's redirects, closed on exit
    private: Vec<OutputHandle>,
    pending: Vec<PendingWrite>,
}

/// Tree-walking executor.
pub struct Interpreter {
    fs: Arc<VirtualFs>,
    cwd: PathBuf,
    env: Mutex<HashMap<String, String>>,
    registry: Registry,
    redirect_objects: HashMap<String, RedirectObject>,
    max_loop_iterations: usize,
}

impl Interpreter {
    /// Create an interpreter with the default builtin registry, an empty
    /// environment, and `/` as the working directory.
    pub fn new(fs: Arc<VirtualFs>) -> Self {
        Self {
            fs,
            cwd: PathBuf::from("/"),
            env: Mutex::new(HashMap::new()),
            registry: Registry::with_defaults(),
            redirect_objects: HashMap::new(),
            max_loop_iterations: 10_000,
        }
    }

    pub fn set_env(&self, key: &str, value: &str) {
        self.env_lock().insert(key.to_string(), value.to_string());
    }

    pub fn set_cwd(&mut self, cwd: PathBuf) {
        self.cwd = cwd;
    }

    pub fn set_registry(&mut self, registry: Registry) {
        self.registry = registry;
    }

    pub fn add_redirect_object(&mut self, marker: impl Into<String>, object: RedirectObject) {
        self.redirect_objects.insert(marker.into(), object);
    }

    pub fn set_max_loop_iterations(&mut self, max: usize) {
        self.max_loop_iterations = max;
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    fn env_lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.env.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn env_snapshot(&self) -> HashMap<String, String> {
        self.env_lock().clone()
    }

    /// Execute a command tree and return the captured result once all
    /// asynchronous I/O has drained.
    pub async fn execute(&self, node: &Node) -> Result<ExecOutput> {
        let stdout = ByteCollector::new();
        let stderr = ByteCollector::new();
        let io = Stdio {
            stdin: Input::Null,
            stdout: OutputHandle::collector(stdout.clone()),
            stderr: OutputHandle::collector(stderr.clone()),
        };
        let exit_code = self.exec_node(node, io).await?;
        stdout.close();
        stderr.close();
        Ok(ExecOutput {
            stdout: stdout.collect().await,
            stderr: stderr.collect().await,
            exit_code,
        })
    }

    fn exec_node<'a>(&'a self, node: &'a Node, io: Stdio) -> BoxFuture<'a, Result<i32>> {
        Box::pin(async move {
            match node {
                Node::Command(cmd) => self.exec_simple(cmd, io).await,
                Node::Pipeline { stages } => self.exec_pipeline(stages, io).await,
                Node::And { left, right } => {
                    let code = self.exec_node(left, io.clone()).await?;
                    if code == 0 {
                        self.exec_node(right, io).await
                    } else {
                        Ok(code)
                    }
                }
                Node::Or { left, right } => {
                    let code = self.exec_node(left, io.clone()).await?;
                    if code == 0 {
                        Ok(0)
                    } else {
                        self.exec_node(right, io).await
                    }
                }
                Node::Sequence { list } => self.exec_list(list, io).await,
                Node::If(if_node) => self.exec_if(if_node, io).await,
                Node::For(for_node) => self.exec_for(for_node, io).await,
                Node::While(loop_node) => self.exec_loop(loop_node, false, io).await,
                Node::Until(loop_node) => self.exec_loop(loop_node, true, io).await,
                Node::Case(case_node) => self.exec_case(case_node, io).await,
            }
        })
    }

    /// Run nodes in order sharing the parent I/O; the last exit code wins.
    async fn exec_list(&self, list: &[Node], io: Stdio) -> Result<i32> {
        let mut exit = 0;
        for node in list {
            exit = self.exec_node(node, io.clone()).await?;
        }
        Ok(exit)
    }

    /// Launch all stages concurrently over N-1 pipes; each stage closes
    /// its write pipe on completion so downstream readers observe
    /// end-of-stream. The pipeline's exit code is the last stage's.
    async fn exec_pipeline(&self, stages: &[Node], io: Stdio) -> Result<i32> {
        let pipes: Vec<PipeBuffer> = (1..stages.len()).map(|_| PipeBuffer::new()).collect();

        let mut futures = Vec::with_capacity(stages.len());
        for (i, stage) in stages.iter().enumerate() {
            let stdin = if i == 0 {
                io.stdin.clone()
            } else {
                Input::Pipe(pipes[i - 1].clone())
            };
            let (stdout, closes) = if i + 1 < stages.len() {
                (OutputHandle::pipe(pipes[i].clone()), Some(pipes[i].clone()))
            } else {
                (io.stdout.clone(), None)
            };
            let stage_io = Stdio {
                stdin,
                stdout,
                stderr: io.stderr.clone(),
            };
            futures.push(async move {
                let result = self.exec_node(stage, stage_io).await;
                if let Some(pipe) = closes {
                    pipe.close();
                }
                result
            });
        }

        let mut exit = 0;
        for result in join_all(futures).await {
            exit = result?;
        }
        Ok(exit)
    }

    async fn exec_if(&self, node: &IfNode, io: Stdio) -> Result<i32> {
        if self.exec_list(&node.condition, io.clone()).await? == 0 {
            return self.exec_list(&node.then_branch, io).await;
        }
        for (condition, body) in &node.elif_branches {
            if self.exec_list(condition, io.clone()).await? == 0 {
                return self.exec_list(body, io).await;
            }
        }
        match &node.else_branch {
            Some(body) => self.exec_list(body, io).await,
            None => Ok(0),
        }
    }

    async fn exec_for(&self, node: &ForNode, io: Stdio) -> Result<i32> {
        let env = self.env_snapshot();
        let mut items = Vec::new();
        for word in &node.words {
            match word {
                Expr::Glob(pattern) => {
                    let matches = self.fs.glob(pattern, &self.cwd).await?;
                    if matches.is_empty() {
                        items.push(pattern.clone());
                    } else {
                        items.extend(matches);
                    }
                }
                other => items.push(self.eval_expr(other, &env).await?),
            }
        }

        let mut exit = 0;
        for (iteration, item) in items.iter().enumerate() {
            if iteration >= self.max_loop_iterations {
                return Err(Error::ResourceLimit(
                    "maximum loop iterations exceeded".to_string(),
                ));
            }
            self.env_lock()
                .insert(node.variable.clone(), item.clone());
            exit = self.exec_list(&node.body, io.clone()).await?;
        }
        Ok(exit)
    }

    async fn exec_loop(&self, node: &LoopNode, until: bool, io: Stdio) -> Result<i32> {
        let mut exit = 0;
        let mut iterations = 0usize;
        loop {
            let condition = self.exec_list(&node.condition, io.clone()).await?;
            let run_body = if until {
                condition != 0
            } else {
                condition == 0
            };
            if !run_body {
                break;
            }
            iterations += 1;
            if iterations > self.max_loop_iterations {
                return Err(Error::ResourceLimit(
                    "maximum loop iterations exceeded".to_string(),
                ));
            }
            exit = self.exec_list(&node.body, io.clone()).await?;
        }
        Ok(exit)
    }

    async fn exec_case(&self, node: &CaseNode, io: Stdio) -> Result<i32> {
        let env = self.env_snapshot();
        let subject = self.eval_expr(&node.subject, &env).await?;

        for arm in &node.arms {
            for pattern in &arm.patterns {
                let pattern = self.eval_expr(pattern, &env).await?;
                if case_pattern_matches(&pattern, &subject) {
                    return self.exec_list(&arm.body, io).await;
                }
            }
        }
        Ok(0)
    }

    /// Evaluate an expression to a string against the given environment.
    fn eval_expr<'a>(
        &'a self,
        expr: &'a Expr,
        env: &'a HashMap<String, String>,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            Ok(match expr {
                Expr::Literal(s) => s.clone(),
                Expr::Variable(name) => env.get(name).cloned().unwrap_or_default(),
                // The pattern itself; expansion happens at argument binding.
                Expr::Glob(pattern) => pattern.clone(),
                Expr::Arithmetic(src) => arith::eval(src, env)
                    .map_err(|msg| Error::Io(std::io::Error::other(msg)))?
                    .to_string(),
                Expr::Concat(parts) => {
                    let mut out = String::new();
                    for part in parts {
                        out.push_str(&self.eval_expr(part, env).await?);
                    }
                    out
                }
                Expr::Substitution(inner) => self.execute_captured(inner).await?,
            })
        })
    }

    /// Execute a substitution body with a fresh captured stdout/stderr
    /// pair and null stdin; returns captured stdout with trailing
    /// newlines stripped.
    async fn execute_captured(&self, node: &Node) -> Result<String> {
        let stdout = ByteCollector::new();
        let stderr = ByteCollector::new();
        let io = Stdio {
            stdin: Input::Null,
            stdout: OutputHandle::collector(stdout.clone()),
            stderr: OutputHandle::collector(stderr.clone()),
        };
        self.exec_node(node, io).await?;
        stdout.close();
        stderr.close();
        let bytes = stdout.collect().await;
        let mut text = String::from_utf8_lossy(&bytes).into_owned();
        while text.ends_with('\n') {
            text.pop();
        }
        Ok(text)
    }

    fn resolve_path(&self, target: &str) -> PathBuf {
        if target.starts_with('/') {
            PathBuf::from(target)
        } else {
            self.cwd.join(target)
        }
    }

    /// Report a command-scoped error: an error line on the parent stderr
    /// and exit code 1. Resource limits propagate to the host instead.
    fn report(&self, io: &Stdio, name: &str, err: Error) -> Result<i32> {
        if matches!(err, Error::ResourceLimit(_)) {
            return Err(err);
        }
        let name = if name.is_empty() { "shellbox" } else { name };
        let _ = io
            .stderr
            .write_text(&format!("{}: {}\n", name, error_detail(&err)));
        Ok(1)
    }

    async fn exec_simple(&self, cmd: &SimpleCommand, io: Stdio) -> Result<i32> {
        // 1. Local environment: parent environment plus this command's
        // assignments, applied in order against the growing map.
        let mut local_env = self.env_snapshot();
        for assignment in &cmd.assignments {
            match self.eval_expr(&assignment.value, &local_env).await {
                Ok(value) => {
                    local_env.insert(assignment.name.clone(), value);
                }
                Err(err) => return self.report(&io, &assignment.name, err),
            }
        }

        // 2. Command name.
        let name = match &cmd.name {
            Some(expr) => match self.eval_expr(expr, &local_env).await {
                Ok(name) => name,
                Err(err) => return self.report(&io, "", err),
            },
            None => String::new(),
        };

        // 3. Arguments, splicing sorted glob matches; a pattern with no
        // matches is kept literally.
        let mut args: Vec<String> = Vec::new();
        for arg in &cmd.args {
            match arg {
                Expr::Glob(pattern) => match self.fs.glob(pattern, &self.cwd).await {
                    Ok(matches) if matches.is_empty() => args.push(pattern.clone()),
                    Ok(matches) => args.extend(matches),
                    Err(err) => return self.report(&io, &name, err),
                },
                other => match self.eval_expr(other, &local_env).await {
                    Ok(value) => args.push(value),
                    Err(err) => return self.report(&io, &name, err),
                },
            }
        }

        // 4. Redirections.
        let setup = match self.apply_redirects(cmd, &local_env, &io).await {
            Ok(setup) => setup,
            Err(err) => return self.report(&io, &name, err),
        };

        // Pure assignment (and redirect-only) commands: merge assignments
        // into the persistent environment, run the redirect side effects,
        // exit 0.
        if name.is_empty() {
            if !cmd.assignments.is_empty() {
                let mut env = self.env_lock();
                for assignment in &cmd.assignments {
                    if let Some(value) = local_env.get(&assignment.name) {
                        env.insert(assignment.name.clone(), value.clone());
                    }
                }
            }
            if let Err(err) = self.finish_redirects(setup).await {
                return self.report(&io, "", err);
            }
            return Ok(0);
        }

        // 5. Lookup.
        let builtin = match self.registry.get(&name) {
            Some(builtin) => builtin,
            None => {
                let _ = io
                    .stderr
                    .write_text(&format!("{}: command not found\n", name));
                // Redirect side effects still happen (the file is created).
                let _ = self.finish_redirects(setup).await;
                return Ok(127);
            }
        };

        log_debug!(command = %name, args = args.len(), "dispatch");

        // 6. Invoke with panic containment.
        let ctx = Context {
            args: &args,
            stdin: StdinReader::new(setup.stdin.clone()),
            stdout: setup.stdout.clone(),
            stderr: setup.stderr.clone(),
            fs: Arc::clone(&self.fs),
            cwd: &self.cwd,
            env: &local_env,
        };
        let outcome = AssertUnwindSafe(builtin.run(ctx)).catch_unwind().await;

        let exit = match outcome {
            Ok(Ok(code)) => code,
            Ok(Err(err)) => {
                if matches!(err, Error::ResourceLimit(_)) {
                    let _ = self.finish_redirects(setup).await;
                    return Err(err);
                }
                let _ = io
                    .stderr
                    .write_text(&format!("{}: {}\n", name, error_detail(&err)));
                1
            }
            Err(panic) => {
                let _ = io
                    .stderr
                    .write_text(&format!("{}: {}\n", name, panic_message(&panic)));
                1
            }
        };

        // 7. Close private sinks and await pending file writes so callers
        // observe the redirected files once this command returns.
        if let Err(err) = self.finish_redirects(setup).await {
            return self.report(&io, &name, err);
        }
        Ok(exit)
    }

    /// Resolve each redirect in order into effective stdin/stdout/stderr.
    async fn apply_redirects(
        &self,
        cmd: &SimpleCommand,
        env: &HashMap<String, String>,
        io: &Stdio,
    ) -> Result<RedirectSetup> {
        let mut setup = RedirectSetup {
            stdin: io.stdin.clone(),
            stdout: io.stdout.clone(),
            stderr: io.stderr.clone(),
            private: Vec::new(),
            pending: Vec::new(),
        };

        for redirect in &cmd.redirects {
            let target = self.eval_expr(&redirect.target, env).await?;

            if redirect.heredoc {
                setup.stdin = Input::bytes(target);
                continue;
            }

            match redirect.mode {
                RedirectMode::In => {
                    if let Some(object) = self.redirect_objects.get(&target) {
                        setup.stdin = match object {
                            RedirectObject::Bytes(bytes) => Input::Bytes(Arc::clone(bytes)),
                            RedirectObject::Buffer(buffer) => Input::bytes(
                                buffer.lock().unwrap_or_else(|e| e.into_inner()).clone(),
                            ),
                        };
                    } else {
                        let path = self.resolve_path(&target);
                        let bytes = self.fs.read_file(&path).await?;
                        setup.stdin = Input::bytes(bytes);
                    }
                }
                RedirectMode::ErrToOut => setup.stderr = setup.stdout.clone(),
                RedirectMode::OutToErr => setup.stdout = setup.stderr.clone(),
                mode => {
                    let handle = if let Some(object) = self.redirect_objects.get(&target) {
                        match object {
                            RedirectObject::Buffer(buffer) => OutputHandle::buffer(Arc::new(
                                BufferSink::new(Arc::clone(buffer)),
                            )),
                            RedirectObject::Bytes(_) => {
                                return Err(Error::RedirectObject(format!(
                                    "'{}' is not a writable buffer",
                                    target
                                )))
                            }
                        }
                    } else {
                        let path = self.resolve_path(&target);
                        // Permission failures abort the command before it
                        // runs, not after its output is collected.
                        self.fs.ensure_writable(&path)?;
                        let collector = ByteCollector::new();
                        let handle = OutputHandle::collector(collector.clone());
                        setup.pending.push(PendingWrite {
                            path,
                            collector,
                            append: mode.is_append(),
                        });
                        setup.private.push(handle.clone());
                        handle
                    };

                    let to_stdout = matches!(
                        mode,
                        RedirectMode::Out
                            | RedirectMode::Append
                            | RedirectMode::BothOut
                            | RedirectMode::BothAppend
                    );
                    let to_stderr = matches!(
                        mode,
                        RedirectMode::ErrOut
                            | RedirectMode::ErrAppend
                            | RedirectMode::BothOut
                            | RedirectMode::BothAppend
                    );
                    if to_stdout {
                        setup.stdout = handle.clone();
                    }
                    if to_stderr {
                        setup.stderr = handle;
                    }
                }
            }
        }
        Ok(setup)
    }

    /// Close redirect-owned sinks and flush collected bytes to the
    /// filesystem.
    async fn finish_redirects(&self, setup: RedirectSetup) -> Result<()> {
        for handle in &setup.private {
            handle.close();
        }
        for write in setup.pending {
            let bytes = write.collector.collect().await;
            if write.append {
                self.fs.append_file(&write.path, &bytes).await?;
            } else {
                self.fs.write_file(&write.path, &bytes).await?;
            }
        }
        Ok(())
    }
}

/// Strip the outer error wrapper for user-facing `<name>: <detail>` lines.
fn error_detail(err: &Error) -> String {
    match err {
        Error::Io(io) => io.to_string(),
        other => other.to_string(),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "builtin panicked".to_string()
    }
}

/// Case patterns match the whole subject: `*` spans any text, `?` one
/// character, `[...]` classes preserved, everything else literal.
fn case_pattern_matches(pattern: &str, subject: &str) -> bool {
    let mut source = String::from("^");
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            '[' => {
                if let Some(end) = chars[i + 1..].iter().position(|&c| c == ']') {
                    let class: String = chars[i..=i + 1 + end].iter().collect();
                    source.push_str(&class);
                    i += end + 1;
                } else {
                    source.push_str("\\[");
                }
            }
            other => source.push_str(&regex::escape(&other.to_string())),
        }
        i += 1;
    }
    source.push('$');
    Regex::new(&source).map(|re| re.is_match(subject)).unwrap_or(false)
}
