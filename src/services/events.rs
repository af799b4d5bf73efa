use serde::Serialize;
use serde_json::json;

use std::io::{self, Write};
use std::sync::Mutex;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Where a job reports what it is doing. Calls are fire-and-forget.
pub trait EventSink {
    fn log(&self, level: LogLevel, message: &str);
    fn progress(&self, percent: f64);
    fn done(&self);
}

pub struct NoopSink;

impl EventSink for NoopSink {
    fn log(&self, _level: LogLevel, _message: &str) {}
    fn progress(&self, _percent: f64) {}
    fn done(&self) {}
}

/// Sends notifications to the `tracing` subscriber (CLI mode).
pub struct TracingSink;

impl EventSink for TracingSink {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info | LogLevel::Success => tracing::info!("{message}"),
            LogLevel::Warning => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        }
    }

    fn progress(&self, percent: f64) {
        tracing::info!("progress {percent:.1}%");
    }

    fn done(&self) {
        tracing::info!("done");
    }
}

/// Streams notifications as JSON event lines to the shell on the other end of stdout.
pub struct ProtocolSink<W: Write> {
    id: serde_json::Value,
    out: Mutex<W>,
}

impl ProtocolSink<io::Stdout> {
    pub fn stdout(id: serde_json::Value) -> Self {
        Self::new(id, io::stdout())
    }
}

impl<W: Write> ProtocolSink<W> {
    pub fn new(id: serde_json::Value, out: W) -> Self {
        Self {
            id,
            out: Mutex::new(out),
        }
    }

    fn emit(&self, event: serde_json::Value) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{event}");
            let _ = out.flush();
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write> EventSink for ProtocolSink<W> {
    fn log(&self, level: LogLevel, message: &str) {
        self.emit(json!({
            "id": self.id,
            "event": "log",
            "payload": { "msg": message, "type": level }
        }));
    }

    fn progress(&self, percent: f64) {
        self.emit(json!({
            "id": self.id,
            "event": "progress",
            "payload": percent
        }));
    }

    fn done(&self) {
        self.emit(json!({ "id": self.id, "event": "done" }));
    }
}
