use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

const RESERVED_KEYS: [&str; 4] = ["type", "session_id", "seq", "ts"];

/// Everything a session writes to its log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SessionStarted,
    AssetLoaded,
    AssetLoadFailed,
    PlanReady,
    InterpretationDegraded,
    PlanApplied,
    PlanDiscarded,
    ManualEdit,
}

impl SessionEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SessionStarted => "session_started",
            Self::AssetLoaded => "asset_loaded",
            Self::AssetLoadFailed => "asset_load_failed",
            Self::PlanReady => "plan_ready",
            Self::InterpretationDegraded => "interpretation_degraded",
            Self::PlanApplied => "plan_applied",
            Self::PlanDiscarded => "plan_discarded",
            Self::ManualEdit => "manual_edit",
        }
    }
}

/// Append-only JSONL log for one session. Each row carries `type`,
/// `session_id`, a per-log `seq` and an RFC 3339 `ts`; payload keys that
/// collide with those are dropped.
#[derive(Debug, Clone)]
pub struct EventLog {
    inner: Arc<EventLogInner>,
}

#[derive(Debug)]
struct EventLogInner {
    path: PathBuf,
    session_id: String,
    next_seq: Mutex<u64>,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(EventLogInner {
                path: path.into(),
                session_id: session_id.into(),
                next_seq: Mutex::new(0),
            }),
        }
    }

    /// `payload` must be a JSON object or null.
    pub fn record(&self, event: SessionEvent, payload: Value) -> Result<Value> {
        let fields = match payload {
            Value::Object(fields) => fields,
            Value::Null => Map::new(),
            other => bail!("{} payload must be a JSON object, got {other}", event.as_str()),
        };

        let mut next_seq = self
            .inner
            .next_seq
            .lock()
            .map_err(|_| anyhow!("event log lock poisoned"))?;
        let mut row = Map::new();
        row.insert("type".to_string(), Value::from(event.as_str()));
        row.insert(
            "session_id".to_string(),
            Value::from(self.inner.session_id.as_str()),
        );
        row.insert("seq".to_string(), Value::from(*next_seq));
        row.insert(
            "ts".to_string(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)),
        );
        for (key, value) in fields {
            if !RESERVED_KEYS.contains(&key.as_str()) {
                row.insert(key, value);
            }
        }

        let path = &self.inner.path;
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open event log {}", path.display()))?;
        writeln!(file, "{}", serde_json::to_string(&row)?)?;
        *next_seq += 1;
        Ok(Value::Object(row))
    }
}

/// Parses a log back into rows, skipping blank lines.
pub fn read_event_log(path: &Path) -> Result<Vec<Value>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read event log {}", path.display()))?;
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(index, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{} line {} is not JSON", path.display(), index + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use serde_json::{json, Value};

    use super::{read_event_log, EventLog, SessionEvent};

    #[test]
    fn record_appends_one_row_per_event() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("logs").join("events.jsonl");
        let log = EventLog::new(&path, "session-123");

        let emitted = log.record(SessionEvent::AssetLoaded, json!({"surfaces": 3}))?;
        log.clone().record(SessionEvent::PlanReady, Value::Null)?;

        let rows = read_event_log(&path)?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], emitted);
        assert_eq!(rows[0]["type"], "asset_loaded");
        assert_eq!(rows[0]["session_id"], "session-123");
        assert_eq!(rows[0]["surfaces"], 3);
        assert_eq!(rows[1]["type"], "plan_ready");
        assert_eq!(
            rows.iter().map(|row| row["seq"].clone()).collect::<Vec<_>>(),
            vec![json!(0), json!(1)]
        );
        DateTime::parse_from_rfc3339(rows[0]["ts"].as_str().unwrap_or(""))?;
        Ok(())
    }

    #[test]
    fn payload_cannot_override_reserved_fields() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let log = EventLog::new(temp.path().join("events.jsonl"), "session-123");
        let emitted = log.record(
            SessionEvent::ManualEdit,
            json!({"type": "forged", "seq": 99, "surface": "sole"}),
        )?;
        assert_eq!(emitted["type"], "manual_edit");
        assert_eq!(emitted["seq"], 0);
        assert_eq!(emitted["surface"], "sole");
        Ok(())
    }

    #[test]
    fn non_object_payload_is_rejected_without_writing() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let log = EventLog::new(&path, "session-123");
        assert!(log.record(SessionEvent::PlanApplied, json!([1, 2])).is_err());
        assert!(!path.exists());
        Ok(())
    }
}
