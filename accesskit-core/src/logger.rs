//! Forwarding of SDK logs to the host platform.

use std::fmt;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{EnvFilter, Layer};

/// Trait representing a logger that can log messages at various levels.
///
/// This trait should be implemented by any logger that wants to receive log messages.
/// It is exported via `UniFFI` for use in foreign languages.
///
/// # Examples
///
/// Implementing the `Logger` trait:
///
/// ```rust
/// use accesskit_core::logger::{Logger, LogLevel};
///
/// struct MyLogger;
///
/// impl Logger for MyLogger {
///     fn log(&self, level: LogLevel, message: String) {
///         println!("[{:?}] {}", level, message);
///     }
/// }
/// ```
///
/// ## Swift
///
/// ```swift
/// class AccessKitLoggerBridge: AccessKit.Logger {
///     static let shared = AccessKitLoggerBridge()
///
///     func log(level: AccessKit.LogLevel, message: String) {
///         Log.log(level.toCoreLevel(), message)
///     }
/// }
///
/// AccessKit.setLogger(logger: AccessKitLoggerBridge.shared) // once, at launch
/// ```
#[uniffi::export(with_foreign)]
pub trait Logger: Sync + Send {
    /// Logs a message at the specified log level.
    fn log(&self, level: LogLevel, message: String);
}

/// Enumeration of possible log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum LogLevel {
    /// Designates very low priority, often extremely detailed messages.
    Trace,
    /// Designates lower priority debugging information.
    Debug,
    /// Designates informational messages that highlight the progress of the application.
    Info,
    /// Designates potentially harmful situations.
    Warn,
    /// Designates error events that might still allow the application to continue running.
    Error,
}

impl From<&Level> for LogLevel {
    fn from(level: &Level) -> Self {
        match *level {
            Level::ERROR => Self::Error,
            Level::WARN => Self::Warn,
            Level::INFO => Self::Info,
            Level::DEBUG => Self::Debug,
            _ => Self::Trace,
        }
    }
}

/// Debug and trace output is only forwarded from this crate; everything else from info up.
const DEFAULT_FILTER: &str = "info,accesskit_core=trace";

/// A `tracing` layer that forwards every event to a foreign [`Logger`].
struct ForeignLayer {
    logger: Arc<dyn Logger>,
}

impl<S: Subscriber> Layer<S> for ForeignLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.logger
            .log(LogLevel::from(event.metadata().level()), visitor.finish());
    }
}

/// Collects the `message` field and renders the remaining fields as `key=value`.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            return self.message;
        }
        format!("{} {}", self.message, self.fields.join(" "))
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            // metadata attached by the `log` bridge
            name if name.starts_with("log.") => {}
            name => self.fields.push(format!("{name}={value}")),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{value:?}"),
            name if name.starts_with("log.") => {}
            name => self.fields.push(format!("{name}={value:?}")),
        }
    }
}

/// Sets the global logger.
///
/// Installs a `tracing` subscriber that forwards events to `logger` and bridges
/// records emitted through the `log` crate by dependencies. Filtering follows
/// `RUST_LOG` when set.
///
/// # Note
///
/// Only the first call takes effect; later calls print a message and do nothing.
#[uniffi::export]
pub fn set_logger(logger: Arc<dyn Logger>) {
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Logger already set: {e}");
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let subscriber =
        tracing_subscriber::registry().with(ForeignLayer { logger }.with_filter(filter));

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set logger: {e}");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct CapturingLogger(Mutex<Vec<(LogLevel, String)>>);

    impl Logger for CapturingLogger {
        fn log(&self, level: LogLevel, message: String) {
            self.0.lock().unwrap().push((level, message));
        }
    }

    #[test]
    fn test_events_are_forwarded_with_fields() {
        let logger = Arc::new(CapturingLogger::default());
        let subscriber = tracing_subscriber::registry().with(ForeignLayer {
            logger: Arc::clone(&logger) as Arc<dyn Logger>,
        });

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("radio unavailable");
            tracing::info!(credential_id = "c-1", granted = true, "tap processed");
            tracing::trace!(count = 3, "loaded");
        });

        assert_eq!(
            *logger.0.lock().unwrap(),
            vec![
                (LogLevel::Warn, "radio unavailable".to_string()),
                (
                    LogLevel::Info,
                    "tap processed credential_id=c-1 granted=true".to_string()
                ),
                (LogLevel::Trace, "loaded count=3".to_string()),
            ]
        );
    }
}
