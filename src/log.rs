//! Forwards `tracing` events to the host's log.
//!
//! The binding engine reports through `tracing`. [`init`] installs a
//! formatting subscriber whose output goes to a [`LogSink`], by default the
//! UE4SS console when the `link` feature is enabled and standard error
//! otherwise.

use std::{
    ffi::{CStr, CString},
    io::{self, Write},
};

use tracing::{Level, Metadata, Subscriber};
use tracing_subscriber::{EnvFilter, fmt::MakeWriter};

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "UE4SS_BINDINGS_LOG";

/// Severity levels understood by the host's log.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    /// Uncategorized output.
    Default = 0,
    /// Regular messages.
    Normal = 1,
    /// Detailed messages.
    Verbose = 2,
    /// Warnings.
    Warning = 3,
    /// Errors.
    Error = 4,
}

impl From<&Level> for LogLevel {
    fn from(level: &Level) -> Self {
        match *level {
            Level::ERROR => Self::Error,
            Level::WARN => Self::Warning,
            Level::INFO => Self::Normal,
            Level::DEBUG | Level::TRACE => Self::Verbose,
        }
    }
}

/// Receives one formatted log line.
pub type LogSink = fn(LogLevel, &CStr);

fn stderr_sink(level: LogLevel, message: &CStr) {
    let _ = writeln!(io::stderr(), "[{level:?}] {}", message.to_string_lossy());
}

cfg_if::cfg_if! {
    if #[cfg(feature = "link")] {
        fn host_sink(level: LogLevel, message: &CStr) {
            unsafe { crate::ffi::ue4ss_log(level, message.as_ptr()) };
        }

        /// The sink used by [`init`].
        pub const DEFAULT_SINK: LogSink = host_sink;
    } else {
        /// The sink used by [`init`].
        pub const DEFAULT_SINK: LogSink = stderr_sink;
    }
}

/// A [`MakeWriter`] sending each formatted event to a [`LogSink`], tagged
/// with the host level matching the event's level.
#[derive(Debug, Clone, Copy)]
pub struct HostWriter {
    sink: LogSink,
}

impl HostWriter {
    /// Creates a writer for a sink.
    #[must_use]
    pub fn new(sink: LogSink) -> Self {
        Self { sink }
    }

    /// Creates a writer for standard error.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(stderr_sink)
    }
}

impl Default for HostWriter {
    fn default() -> Self {
        Self::new(DEFAULT_SINK)
    }
}

impl<'a> MakeWriter<'a> for HostWriter {
    type Writer = HostLine;

    fn make_writer(&'a self) -> Self::Writer {
        HostLine::new(self.sink, LogLevel::Default)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        HostLine::new(self.sink, meta.level().into())
    }
}

/// Buffers one formatted event and hands it to the sink when dropped.
#[derive(Debug)]
pub struct HostLine {
    sink: LogSink,
    level: LogLevel,
    buffer: Vec<u8>,
}

impl HostLine {
    fn new(sink: LogSink, level: LogLevel) -> Self {
        Self {
            sink,
            level,
            buffer: Vec::new(),
        }
    }
}

impl Write for HostLine {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for HostLine {
    fn drop(&mut self) {
        while self.buffer.last().is_some_and(|b| matches!(b, b'\n' | b'\r')) {
            self.buffer.pop();
        }
        if self.buffer.is_empty() {
            return;
        }
        let mut bytes = std::mem::take(&mut self.buffer);
        bytes.retain(|b| *b != 0);
        if let Ok(message) = CString::new(bytes) {
            (self.sink)(self.level, &message);
        }
    }
}

/// Builds a subscriber writing to `sink`, filtered by [`LOG_ENV`] or, when
/// that is unset or invalid, by `default_directive`.
#[must_use]
pub fn subscriber(default_directive: &str, sink: LogSink) -> impl Subscriber + Send + Sync {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_writer(HostWriter::new(sink))
        .with_env_filter(filter)
        .with_ansi(false)
        .with_level(false)
        .without_time()
        .finish()
}

/// Installs the global subscriber with the [`DEFAULT_SINK`]. Returns `false`
/// if a global subscriber was already installed.
pub fn init(default_directive: &str) -> bool {
    init_with_sink(default_directive, DEFAULT_SINK)
}

/// Installs the global subscriber with a custom sink. Returns `false` if a
/// global subscriber was already installed.
pub fn init_with_sink(default_directive: &str, sink: LogSink) -> bool {
    tracing::subscriber::set_global_default(subscriber(default_directive, sink)).is_ok()
}
