//! Structured logging shim.
//!
//! Shellbox logs through `tracing` when built with the `logging` feature
//! and compiles the call sites away otherwise. Events never include script
//! content or file contents, only shapes: source length, command names,
//! argument counts, rule decisions.

#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {{}};
}

#[cfg(feature = "logging")]
macro_rules! log_trace {
    ($($arg:tt)*) => { tracing::trace!($($arg)*) };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {{}};
}

pub(crate) use log_debug;
pub(crate) use log_trace;
