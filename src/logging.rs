//! In-memory capture of recent log events.
//!
//! Abandoned verifications are only reported through the log, so moderators
//! can pull the recent lines for a member with `/verification_log` and follow
//! up by hand.

use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// A single log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub level: String,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    /// Format as a string for display
    pub fn format(&self) -> String {
        format!(
            "{} {} [{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level,
            self.target,
            self.message
        )
    }
}

/// Ring buffer of the most recent log entries
pub struct LogBuffer {
    recent: RwLock<VecDeque<LogEntry>>,
    max_entries: usize,
}

impl LogBuffer {
    pub fn new(max_entries: usize) -> Self {
        Self {
            recent: RwLock::new(VecDeque::with_capacity(max_entries)),
            max_entries,
        }
    }

    pub fn push(&self, entry: LogEntry) {
        let mut recent = self.recent.write();
        if recent.len() >= self.max_entries {
            recent.pop_front();
        }
        recent.push_back(entry);
    }

    /// Get the last `count` entries, oldest first
    pub fn get_recent(&self, count: usize) -> Vec<LogEntry> {
        let recent = self.recent.read();
        let start = recent.len().saturating_sub(count);
        recent.iter().skip(start).cloned().collect()
    }

    /// Get the last `count` entries whose message contains `needle`, oldest first
    pub fn get_matching(&self, needle: &str, count: usize) -> Vec<LogEntry> {
        let recent = self.recent.read();
        let mut matching: Vec<LogEntry> = recent
            .iter()
            .rev()
            .filter(|e| e.message.contains(needle))
            .take(count)
            .cloned()
            .collect();
        matching.reverse();
        matching
    }
}

/// Shared log buffer type
pub type SharedLogBuffer = Arc<LogBuffer>;

pub fn create_log_buffer(max_entries: usize) -> SharedLogBuffer {
    Arc::new(LogBuffer::new(max_entries))
}

/// Tracing layer that captures logs to the buffer
pub struct LogCaptureLayer {
    buffer: SharedLogBuffer,
}

impl LogCaptureLayer {
    pub fn new(buffer: SharedLogBuffer) -> Self {
        Self { buffer }
    }
}

impl<S> Layer<S> for LogCaptureLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.buffer.push(LogEntry {
            timestamp: chrono::Utc::now(),
            level: event.metadata().level().to_string(),
            target: event.metadata().target().to_string(),
            message: visitor.finish(),
        });
    }
}

/// Collects the message plus any extra fields as `key=value`
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.join(", ")
        } else {
            format!("{} {}", self.message, self.fields.join(", "))
        }
    }
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }
}
