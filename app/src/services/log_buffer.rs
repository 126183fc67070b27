//! Recent log lines kept in memory for `/api/logs`.

use std::collections::VecDeque;
use std::sync::{LazyLock, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

const MAX_LOG_ENTRIES: usize = 500;

/// Bus chatter below this level never reaches the buffer.
const DEPENDENCY_TARGETS: [&str; 3] = ["zbus", "hyper", "reqwest"];

/// One captured event. Structured fields other than `message` are kept
/// as JSON values.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    #[serde(rename = "timestamp")]
    pub at: DateTime<Utc>,
    pub level: String,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
}

static ENTRIES: LazyLock<Mutex<VecDeque<LogEntry>>> =
    LazyLock::new(|| Mutex::new(VecDeque::with_capacity(MAX_LOG_ENTRIES)));

/// The newest `limit` entries, oldest first, optionally only those at
/// `min_level` or more severe.
pub fn recent(limit: usize, min_level: Option<Level>) -> Vec<LogEntry> {
    let limit = limit.clamp(1, MAX_LOG_ENTRIES);
    let Ok(entries) = ENTRIES.lock() else {
        return Vec::new();
    };

    let mut logs = entries
        .iter()
        .rev()
        .filter(|e| match min_level {
            Some(min) => parse_level(&e.level).is_some_and(|l| l <= min),
            None => true,
        })
        .take(limit)
        .cloned()
        .collect::<Vec<_>>();
    logs.reverse();
    logs
}

pub fn clear() -> usize {
    let Ok(mut entries) = ENTRIES.lock() else {
        return 0;
    };
    let cleared = entries.len();
    entries.clear();
    cleared
}

pub fn parse_level(level: &str) -> Option<Level> {
    level.trim().parse().ok()
}

fn push(entry: LogEntry) {
    let Ok(mut entries) = ENTRIES.lock() else {
        return;
    };
    if entries.len() >= MAX_LOG_ENTRIES {
        entries.pop_front();
    }
    entries.push_back(entry);
}

fn is_dependency_noise(target: &str, level: &Level) -> bool {
    *level > Level::INFO && DEPENDENCY_TARGETS.iter().any(|t| target.starts_with(t))
}

#[derive(Default)]
pub struct LogCaptureLayer;

impl LogCaptureLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for LogCaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if is_dependency_noise(meta.target(), meta.level()) {
            return;
        }

        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);

        let JsonVisitor { message, fields } = visitor;
        push(LogEntry {
            at: Utc::now(),
            level: meta.level().as_str().to_ascii_lowercase(),
            target: meta.target().to_owned(),
            message: message.unwrap_or_else(|| meta.name().to_owned()),
            fields,
        });
    }
}

#[derive(Default)]
struct JsonVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl JsonVisitor {
    fn record_value(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for JsonVisitor {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_value(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record_value(field, Value::from(format!("{value:?}")));
    }
}

#[cfg(test)]
pub(crate) static TEST_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

#[cfg(test)]
pub(crate) fn push_for_test(level: &str, message: &str) {
    push(LogEntry {
        at: Utc::now(),
        level: level.into(),
        target: "discord_push_lib::test".into(),
        message: message.into(),
        fields: Map::default(),
    });
}
