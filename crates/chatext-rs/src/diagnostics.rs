//! Tracing layer that captures diagnostics into a drainable buffer.
//!
//! Renderers never write to stderr themselves. The registry reports failed
//! preconditions through `tracing::error!`; installing a [`DiagnosticLayer`]
//! turns those events into [`LogLine`]s that a host (or the `chatext` CLI)
//! drains after dispatch and shows wherever it likes.

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::Subscriber;
use tracing_subscriber::layer::Layer;
use tracing_subscriber::registry::LookupSpan;

/// Maximum buffered lines before the oldest are trimmed.
pub const MAX_LOG_LINES: usize = 2000;
/// Number of lines kept after a trim.
pub const LOG_TRIM_TO: usize = 1200;

/// A captured log event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    /// Local wall-clock time, `HH:MM:SS`.
    pub time: String,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.time, self.level.label(), self.message)
    }
}

/// Log severity level (mirrors tracing levels).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Short fixed-width label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO ",
            Self::Warn => "WARN ",
            Self::Error => "ERROR",
        }
    }
}

impl From<tracing::Level> for LogLevel {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Self::Trace,
            tracing::Level::DEBUG => Self::Debug,
            tracing::Level::INFO => Self::Info,
            tracing::Level::WARN => Self::Warn,
            tracing::Level::ERROR => Self::Error,
        }
    }
}

/// A shared buffer of captured log lines.
///
/// Cloning shares the underlying buffer.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticBuffer(Arc<Mutex<Vec<LogLine>>>);

impl DiagnosticBuffer {
    /// Drain all pending lines, oldest first.
    pub fn drain(&self) -> Vec<LogLine> {
        let mut buf = self.0.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *buf)
    }

    /// Drain only lines at or above `level`; lower lines are discarded.
    pub fn drain_at_least(&self, level: LogLevel) -> Vec<LogLine> {
        self.drain()
            .into_iter()
            .filter(|line| line.level >= level)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, line: LogLine) {
        let mut buf = self.0.lock().unwrap_or_else(|e| e.into_inner());
        buf.push(line);
        if buf.len() > MAX_LOG_LINES {
            let trim_to = buf.len() - LOG_TRIM_TO;
            buf.drain(..trim_to);
        }
    }
}

/// A [`tracing_subscriber::Layer`] that captures events into a
/// [`DiagnosticBuffer`].
pub struct DiagnosticLayer {
    buffer: DiagnosticBuffer,
}

impl DiagnosticLayer {
    /// Create a layer and the buffer it writes into.
    pub fn new() -> (Self, DiagnosticBuffer) {
        let buffer = DiagnosticBuffer::default();
        (
            Self {
                buffer: buffer.clone(),
            },
            buffer,
        )
    }
}

impl<S: Subscriber + for<'a> LookupSpan<'a>> Layer<S> for DiagnosticLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let mut message = visitor.message;
        if !visitor.fields.is_empty() {
            let extras: Vec<String> = visitor
                .fields
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            if message.is_empty() {
                message = extras.join(" ");
            } else {
                message = format!("{message} {{{}}}", extras.join(", "));
            }
        }

        self.buffer.push(LogLine {
            time: Local::now().format("%H:%M:%S").to_string(),
            level: (*event.metadata().level()).into(),
            message,
        });
    }
}

/// Visitor that extracts the message and extra fields from a tracing event.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields
                .push((field.name().to_string(), format!("{value:?}")));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;
    use tracing_subscriber::layer::SubscriberExt;

    use crate::channel::{InteractionChannel, NoopChannel};
    use crate::config::ExtensionConfig;
    use crate::dom::Container;
    use crate::ext::{EXT_VIDEO, ExtensionRegistry};
    use crate::trace::Trace;

    fn capture(f: impl FnOnce()) -> DiagnosticBuffer {
        let (layer, buffer) = DiagnosticLayer::new();
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, f);
        buffer
    }

    #[test]
    fn log_level_labels() {
        assert_eq!(LogLevel::Info.label(), "INFO ");
        assert_eq!(LogLevel::Error.label(), "ERROR");
        assert_eq!(LogLevel::Debug.label(), "DEBUG");
        assert_eq!(LogLevel::Trace.label(), "TRACE");
        assert_eq!(LogLevel::Warn.label(), "WARN ");
    }

    #[test]
    fn captures_message_and_fields() {
        let buffer = capture(|| {
            tracing::warn!(key = "ext_video", "odd payload");
            tracing::info!("plain");
        });
        let lines = buffer.drain();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].level, LogLevel::Warn);
        assert_eq!(lines[0].message, "odd payload {key=ext_video}");
        assert_eq!(lines[1].message, "plain");
        assert_eq!(lines[1].time.len(), 8);
        assert!(buffer.is_empty());
    }

    #[test]
    fn failed_render_produces_error_line() {
        let registry = ExtensionRegistry::builtin(&ExtensionConfig::default());
        let channel: Arc<dyn InteractionChannel> = Arc::new(NoopChannel);
        let mut container = Container::new();
        let buffer = capture(|| {
            registry.dispatch(
                &Trace::new(EXT_VIDEO, json!({"videoURL": ""})),
                &mut container,
                &channel,
            );
        });
        let errors = buffer.drain_at_least(LogLevel::Error);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Video: no videoURL provided");
        assert!(container.is_empty());
    }

    #[test]
    fn buffer_is_capped() {
        let buffer = capture(|| {
            for i in 0..=MAX_LOG_LINES {
                tracing::info!("line {i}");
            }
        });
        let lines = buffer.drain();
        assert_eq!(lines.len(), LOG_TRIM_TO);
        assert_eq!(lines.last().unwrap().message, format!("line {MAX_LOG_LINES}"));
    }

    #[test]
    fn poisoned_buffer_keeps_capturing() {
        let buffer = DiagnosticBuffer::default();
        let shared = buffer.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.0.lock().unwrap();
            panic!("writer died holding the lock");
        })
        .join();
        assert!(buffer.0.is_poisoned());

        buffer.push(LogLine {
            time: "12:00:00".into(),
            level: LogLevel::Warn,
            message: "after".into(),
        });
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.drain()[0].message, "after");
    }

    #[test]
    fn display_includes_label() {
        let line = LogLine {
            time: "12:00:00".into(),
            level: LogLevel::Error,
            message: "boom".into(),
        };
        assert_eq!(line.to_string(), "12:00:00 ERROR boom");
    }
}
