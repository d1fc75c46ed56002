//! Per-call traffic log.
//!
//! Every call writes one outbound line (the serialized envelope) and one
//! inbound line (the payload or the failure), both tagged with the call's
//! [`CallId`]. Sinks never report failures back to the caller.

use chrono::{SecondsFormat, Utc};
use std::fmt;
use std::io::Write;
use std::sync::Mutex;
use uuid::Uuid;

/// Correlation id pairing the outbound and inbound lines of one call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallId(String);

impl CallId {
    /// Generate a fresh, process-unique id
    pub fn generate() -> Self {
        CallId(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sink for call traffic
pub trait ActivityLog: Send + Sync {
    /// Record what is about to be sent
    fn log_outbound(&self, call_id: &CallId, message: &str);

    /// Record how the call settled
    fn log_inbound(&self, call_id: &CallId, message: &str);
}

/// Emits traffic as `tracing` events on the `sellsy::activity` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingActivityLog;

impl ActivityLog for TracingActivityLog {
    fn log_outbound(&self, call_id: &CallId, message: &str) {
        tracing::info!(target: "sellsy::activity", call_id = %call_id, "--> {}", message);
    }

    fn log_inbound(&self, call_id: &CallId, message: &str) {
        tracing::info!(target: "sellsy::activity", call_id = %call_id, "<-- {}", message);
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopActivityLog;

impl ActivityLog for NoopActivityLog {
    fn log_outbound(&self, _call_id: &CallId, _message: &str) {}

    fn log_inbound(&self, _call_id: &CallId, _message: &str) {}
}

/// Writes `[<call id>]<timestamp> --> <message>` lines to any writer,
/// e.g. stdout or a log file.
pub struct WriterActivityLog<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterActivityLog<W> {
    pub fn new(writer: W) -> Self {
        WriterActivityLog {
            writer: Mutex::new(writer),
        }
    }

    /// Take the writer back, e.g. to inspect a buffer
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_line(&self, call_id: &CallId, arrow: &str, message: &str) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false);
        let mut writer = match self.writer.lock() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(writer, "[{}]{} {} {}", call_id, timestamp, arrow, message) {
            tracing::warn!(call_id = %call_id, error = %e, "failed to write activity log");
        }
    }
}

impl<W: Write + Send> ActivityLog for WriterActivityLog<W> {
    fn log_outbound(&self, call_id: &CallId, message: &str) {
        self.write_line(call_id, "-->", message);
    }

    fn log_inbound(&self, call_id: &CallId, message: &str) {
        self.write_line(call_id, "<--", message);
    }
}
