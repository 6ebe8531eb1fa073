//! Where a crawl reports its progress.
//!
//! The controller only ever writes to a [`LogSink`], it never reads back.
//! Embedders provide their own sink (a UI log panel, a channel) or use one of the
//! implementations here.

use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Local};

const TIME_FMT: &str = "%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
    Success,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Info => "INFO",
            Level::Warning => "WARN",
            Level::Error => "ERROR",
            Level::Success => "OK",
        };
        f.pad(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub timestamp: DateTime<Local>,
    pub level: Level,
    pub message: String,
}

impl LogEvent {
    pub fn now(level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            message: message.into(),
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {:<5} {}",
            self.timestamp.format(TIME_FMT),
            self.level,
            self.message
        )
    }
}

pub trait LogSink {
    fn record(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.record(Level::Info, message);
    }

    fn warning(&self, message: &str) {
        self.record(Level::Warning, message);
    }

    fn error(&self, message: &str) {
        self.record(Level::Error, message);
    }

    fn success(&self, message: &str) {
        self.record(Level::Success, message);
    }
}

impl<S: LogSink + ?Sized> LogSink for &S {
    fn record(&self, level: Level, message: &str) {
        (**self).record(level, message);
    }
}

/// Prints timestamped lines, errors and warnings go to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn record(&self, level: Level, message: &str) {
        let event = LogEvent::now(level, message);
        match level {
            Level::Error | Level::Warning => eprintln!("{event}"),
            Level::Info | Level::Success => println!("{event}"),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LogEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn count(&self, level: Level) -> usize {
        self.events().iter().filter(|e| e.level == level).count()
    }
}

impl LogSink for MemorySink {
    fn record(&self, level: Level, message: &str) {
        let event = LogEvent::now(level, message);
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Forwards events to `tracing`, for running without a dedicated log surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&self, level: Level, message: &str) {
        match level {
            Level::Info => tracing::info!("{message}"),
            Level::Success => tracing::info!(success = true, "{message}"),
            Level::Warning => tracing::warn!("{message}"),
            Level::Error => tracing::error!("{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_order_and_levels() {
        let sink = MemorySink::new();
        sink.info("first");
        sink.error("second");
        sink.success("third");

        let events = sink.events();
        let messages: Vec<_> = events.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["first", "second", "third"]);
        assert_eq!(sink.count(Level::Error), 1);
        assert_eq!(sink.count(Level::Warning), 0);
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn tracing_sink_forwards_levels() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            TracingSink.error("page 2 failed");
            TracingSink.success("page 3 done");
            TracingSink.warning("odd date group");
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("ERROR") && lines[0].contains("page 2 failed"));
        assert!(lines[1].contains("INFO") && lines[1].contains("success=true"));
        assert!(lines[2].contains("WARN") && lines[2].contains("odd date group"));
    }

    #[test]
    fn event_line_has_clock_time() {
        let event = LogEvent::now(Level::Error, "page 2 failed");
        let line = event.to_string();
        assert!(line.starts_with('['));
        assert_eq!(&line[9..], "] ERROR page 2 failed");
    }
}
