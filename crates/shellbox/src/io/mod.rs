//! I/O primitives: byte collectors, pipe buffers, stdin readers, sinks.
//!
//! All buffers are unbounded in-memory chunk lists, so writes never block;
//! the suspension points are reads waiting for data and `collect()` waiting
//! for close. Wakeups go through `tokio::sync::Notify`; the notified future
//! is always created before the state check so a close between check and
//! await cannot be missed.

use std::io::{Error as IoError, ErrorKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::error::Result;

fn write_after_close() -> crate::error::Error {
    IoError::new(ErrorKind::BrokenPipe, "write after close").into()
}

fn lock_poisoned() -> crate::error::Error {
    IoError::other("io buffer lock poisoned").into()
}

#[derive(Default)]
struct ChunkState {
    chunks: Vec<Vec<u8>>,
    closed: bool,
    /// Read cursor, advanced only by single-consumer pipe reads
    read_pos: usize,
}

struct ChunkBuffer {
    state: Mutex<ChunkState>,
    notify: Notify,
}

impl ChunkBuffer {
    fn new() -> Self {
        Self {
            state: Mutex::new(ChunkState::default()),
            notify: Notify::new(),
        }
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        let mut state = self.state.lock().map_err(|_| lock_poisoned())?;
        if state.closed {
            return Err(write_after_close());
        }
        if !bytes.is_empty() {
            state.chunks.push(bytes.to_vec());
        }
        drop(state);
        self.notify.notify_waiters();
        Ok(())
    }

    fn close(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.closed = true;
        }
        self.notify.notify_waiters();
    }

    fn is_closed(&self) -> bool {
        self.state.lock().map(|s| s.closed).unwrap_or(true)
    }

    /// Wait until closed, then return all bytes concatenated.
    async fn collect(&self) -> Vec<u8> {
        loop {
            let notified = self.notify.notified();
            {
                if let Ok(state) = self.state.lock() {
                    if state.closed {
                        return state.chunks.concat();
                    }
                }
            }
            notified.await;
        }
    }

    /// Return the chunk at `index`, waiting while the buffer is open and
    /// has not yet grown that far. `None` once closed and drained.
    async fn chunk_at(&self, index: usize) -> Option<Vec<u8>> {
        loop {
            let notified = self.notify.notified();
            {
                if let Ok(state) = self.state.lock() {
                    if index < state.chunks.len() {
                        return Some(state.chunks[index].clone());
                    }
                    if state.closed {
                        return None;
                    }
                }
            }
            notified.await;
        }
    }

    /// Take the next unread chunk, advancing the shared read cursor.
    async fn take_next(&self) -> Option<Vec<u8>> {
        loop {
            let notified = self.notify.notified();
            {
                if let Ok(mut state) = self.state.lock() {
                    let pos = state.read_pos;
                    if pos < state.chunks.len() {
                        state.read_pos += 1;
                        // Release the memory; the cursor never moves back.
                        return Some(std::mem::take(&mut state.chunks[pos]));
                    }
                    if state.closed {
                        return None;
                    }
                }
            }
            notified.await;
        }
    }
}

/// A growable ordered byte buffer.
///
/// Writers append chunks; [`collect`](Self::collect) waits for close and
/// returns everything; [`reader`](Self::reader) lazily yields chunks in
/// insertion order, suspending while the collector is open and drained.
/// Clones share the same buffer.
#[derive(Clone)]
pub struct ByteCollector {
    inner: Arc<ChunkBuffer>,
}

impl Default for ByteCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteCollector {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ChunkBuffer::new()),
        }
    }

    /// Append a chunk. Fails after [`close`](Self::close).
    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        self.inner.write(bytes)
    }

    pub fn close(&self) {
        self.inner.close();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Wait until closed, then return all written bytes.
    pub async fn collect(&self) -> Vec<u8> {
        self.inner.collect().await
    }

    /// A lazy chunk reader starting at the first chunk.
    pub fn reader(&self) -> ChunkReader {
        ChunkReader {
            buffer: Arc::clone(&self.inner),
            index: 0,
        }
    }
}

/// Lazy reader over a [`ByteCollector`]; each reader has its own cursor.
pub struct ChunkReader {
    buffer: Arc<ChunkBuffer>,
    index: usize,
}

impl ChunkReader {
    /// Next chunk in insertion order; `None` after close and drain.
    pub async fn next_chunk(&mut self) -> Option<Vec<u8>> {
        let chunk = self.buffer.chunk_at(self.index).await?;
        self.index += 1;
        Some(chunk)
    }
}

/// A single-consumer byte pipe connecting two pipeline stages.
///
/// Like [`ByteCollector`] but reads advance a monotonic cursor shared by
/// all clones, so each byte is observed once. The writing stage closes the
/// pipe on completion; the reader then drains remaining chunks and
/// observes end-of-stream.
#[derive(Clone)]
pub struct PipeBuffer {
    inner: Arc<ChunkBuffer>,
}

impl Default for PipeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PipeBuffer {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ChunkBuffer::new()),
        }
    }

    /// Append a chunk and wake a suspended reader. Fails after close.
    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        self.inner.write(bytes)
    }

    pub fn close(&self) {
        self.inner.close();
    }

    /// Next unread chunk; `None` once the pipe is closed and drained.
    pub async fn read_chunk(&self) -> Option<Vec<u8>> {
        self.inner.take_next().await
    }
}

/// Where a command's stdin bytes come from.
#[derive(Clone, Default)]
pub enum Input {
    /// No stdin; reads yield end-of-stream immediately
    #[default]
    Null,
    /// A fixed byte buffer (file contents, heredoc text, host object)
    Bytes(Arc<Vec<u8>>),
    /// The pipe written by the previous pipeline stage
    Pipe(PipeBuffer),
}

impl Input {
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Input::Bytes(Arc::new(bytes.into()))
    }
}

/// The stdin surface handed to builtins.
///
/// The underlying byte sequence is single-use: after any of
/// [`stream`](Self::stream), [`buffer`](Self::buffer),
/// [`text`](Self::text), or [`lines`](Self::lines) has claimed it, further
/// claims fail with "stdin already consumed".
pub struct StdinReader {
    source: Option<Input>,
}

impl StdinReader {
    pub fn new(source: Input) -> Self {
        Self {
            source: Some(source),
        }
    }

    /// Empty stdin.
    pub fn null() -> Self {
        Self::new(Input::Null)
    }

    fn claim(&mut self) -> Result<Input> {
        self.source
            .take()
            .ok_or_else(|| IoError::other("stdin already consumed").into())
    }

    /// Claim the raw chunk stream.
    pub fn stream(&mut self) -> Result<ByteStream> {
        Ok(ByteStream {
            source: self.claim()?,
        })
    }

    /// Collect all bytes.
    pub async fn buffer(&mut self) -> Result<Vec<u8>> {
        let mut stream = self.stream()?;
        let mut bytes = Vec::new();
        while let Some(chunk) = stream.next_chunk().await {
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }

    /// Collect all bytes and decode as UTF-8 (lossy).
    pub async fn text(&mut self) -> Result<String> {
        let bytes = self.buffer().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Claim a lazy line reader.
    pub fn lines(&mut self) -> Result<Lines> {
        Ok(Lines {
            stream: self.stream()?,
            pending: Vec::new(),
            done: false,
        })
    }
}

/// Lazy chunk stream over a claimed stdin source.
pub struct ByteStream {
    source: Input,
}

impl ByteStream {
    pub async fn next_chunk(&mut self) -> Option<Vec<u8>> {
        match &mut self.source {
            Input::Null => None,
            Input::Bytes(bytes) => {
                let bytes = Arc::clone(bytes);
                self.source = Input::Null;
                if bytes.is_empty() {
                    None
                } else {
                    Some(bytes.as_ref().clone())
                }
            }
            Input::Pipe(pipe) => pipe.read_chunk().await,
        }
    }

    /// Adapt into a [`futures_core::Stream`] of chunks.
    pub fn into_stream(self) -> impl futures_core::Stream<Item = Vec<u8>> {
        futures_util::stream::unfold(self, |mut stream| async move {
            stream.next_chunk().await.map(|chunk| (chunk, stream))
        })
    }
}

/// Lazy line reader: UTF-8 decoded, newline-terminated segments, with any
/// final unterminated segment yielded once the source ends.
pub struct Lines {
    stream: ByteStream,
    pending: Vec<u8>,
    done: bool,
}

impl Lines {
    pub async fn next_line(&mut self) -> Option<String> {
        loop {
            if let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                let rest = self.pending.split_off(pos + 1);
                let mut line = std::mem::replace(&mut self.pending, rest);
                line.pop(); // drop the newline
                return Some(String::from_utf8_lossy(&line).into_owned());
            }
            if self.done {
                if self.pending.is_empty() {
                    return None;
                }
                let line = std::mem::take(&mut self.pending);
                return Some(String::from_utf8_lossy(&line).into_owned());
            }
            match self.stream.next_chunk().await {
                Some(chunk) => self.pending.extend_from_slice(&chunk),
                None => self.done = true,
            }
        }
    }
}

/// A fixed-capacity sink writing into a host-provided mutable buffer.
///
/// Bytes beyond the buffer's length are silently truncated. The filled
/// prefix length is observable via [`filled`](Self::filled).
pub struct BufferSink {
    target: Arc<Mutex<Vec<u8>>>,
    written: AtomicUsize,
}

impl BufferSink {
    pub fn new(target: Arc<Mutex<Vec<u8>>>) -> Self {
        Self {
            target,
            written: AtomicUsize::new(0),
        }
    }

    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        let mut target = self.target.lock().map_err(|_| lock_poisoned())?;
        let offset = self.written.load(Ordering::Relaxed);
        let capacity = target.len();
        let n = bytes.len().min(capacity.saturating_sub(offset));
        target[offset..offset + n].copy_from_slice(&bytes[..n]);
        // Count all bytes as consumed so late writes keep truncating.
        self.written
            .store((offset + bytes.len()).min(capacity), Ordering::Relaxed);
        Ok(())
    }

    /// Length of the filled prefix of the target buffer.
    pub fn filled(&self) -> usize {
        self.written.load(Ordering::Relaxed)
    }
}

/// Destination of a command's stdout/stderr bytes.
#[derive(Clone)]
enum OutputTarget {
    Collector(ByteCollector),
    Pipe(PipeBuffer),
    Buffer(Arc<BufferSink>),
}

/// Writer handle handed to builtins as stdout/stderr.
///
/// Cloning yields another handle to the same sink. `close()` closes the
/// underlying collector or pipe; redirect-owned sinks are closed by the
/// interpreter when the command exits.
#[derive(Clone)]
pub struct OutputHandle {
    target: OutputTarget,
}

impl OutputHandle {
    pub fn collector(collector: ByteCollector) -> Self {
        Self {
            target: OutputTarget::Collector(collector),
        }
    }

    pub fn pipe(pipe: PipeBuffer) -> Self {
        Self {
            target: OutputTarget::Pipe(pipe),
        }
    }

    pub fn buffer(sink: Arc<BufferSink>) -> Self {
        Self {
            target: OutputTarget::Buffer(sink),
        }
    }

    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        match &self.target {
            OutputTarget::Collector(c) => c.write(bytes),
            OutputTarget::Pipe(p) => p.write(bytes),
            OutputTarget::Buffer(b) => b.write(bytes),
        }
    }

    pub fn write_text(&self, text: &str) -> Result<()> {
        self.write(text.as_bytes())
    }

    pub fn close(&self) {
        match &self.target {
            OutputTarget::Collector(c) => c.close(),
            OutputTarget::Pipe(p) => p.close(),
            OutputTarget::Buffer(_) => {}
        }
    }
}
