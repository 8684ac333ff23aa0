use chrono::{Local, Utc};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Where log lines end up.
#[derive(Clone, Debug)]
enum Sink {
    Stdio,
    Capture(Arc<Mutex<String>>),
    Discard,
}

#[derive(Clone, Debug)]
pub struct Logger {
    rid: u64,
    sink: Sink,
}

impl Logger {
    /// Creates a new `Logger` writing JSONL to stdout/stderr.
    ///
    /// # Panics
    ///
    /// Panics if `rid` is zero.
    #[must_use]
    pub fn new(rid: u64) -> Self {
        assert!(rid > 0, "Logger rid must be non-zero");
        Self { rid, sink: Sink::Stdio }
    }

    /// Logger that appends every line to `buffer` instead of printing it.
    #[must_use]
    pub fn capturing(rid: u64, buffer: Arc<Mutex<String>>) -> Self {
        assert!(rid > 0, "Logger rid must be non-zero");
        Self { rid, sink: Sink::Capture(buffer) }
    }

    #[must_use]
    pub fn discard() -> Self {
        Self { rid: 1, sink: Sink::Discard }
    }

    /// Request id derived from the wall clock and the process id.
    #[must_use]
    pub fn next_rid() -> u64 {
        let rid = (Local::now().timestamp_millis() as u64) ^ u64::from(std::process::id());
        rid.max(1)
    }

    pub fn rid(&self) -> u64 {
        self.rid
    }

    pub fn info(&self, subsystem: &str, action: &str, message: &str) {
        self.emit("info", subsystem, action, message);
    }

    pub fn error(&self, subsystem: &str, action: &str, message: &str) {
        self.emit("error", subsystem, action, message);
    }

    fn emit(&self, level: &str, subsystem: &str, action: &str, message: &str) {
        if matches!(self.sink, Sink::Discard) {
            return;
        }

        let log_entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "level": level,
            "rid": self.rid,
            "subsystem": subsystem,
            "action": action,
            "msg": message,
        });

        match &self.sink {
            Sink::Stdio if level == "error" => eprintln!("{log_entry}"),
            Sink::Stdio => println!("{log_entry}"),
            Sink::Capture(buffer) => {
                if let Ok(mut buf) = buffer.lock() {
                    buf.push_str(&log_entry.to_string());
                    buf.push('\n');
                }
            }
            Sink::Discard => {}
        }
    }
}
