use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value, json};

/// Opt-in JSONL event log shared by every conversion of one `Converter`.
///
/// Each line is one JSON object with a `type` field. Counters live in a
/// [`DebugScope`], one per conversion, so concurrent conversions in a batch never
/// mix their `debug.summary` lines.
#[derive(Clone)]
pub(crate) struct DebugLogger {
    writer: Arc<Mutex<BufWriter<File>>>,
}

impl DebugLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: Arc::new(Mutex::new(BufWriter::new(file))),
        })
    }

    pub fn scope(&self) -> DebugScope<'_> {
        DebugScope {
            logger: self,
            counters: BTreeMap::new(),
        }
    }

    /// Writes `{"type": kind, ...fields}`. Non-object `fields` land under `"data"`.
    pub fn log_event(&self, kind: &str, fields: Value) {
        let mut line = Map::new();
        line.insert("type".to_string(), Value::String(kind.to_string()));
        match fields {
            Value::Object(map) => line.extend(map),
            Value::Null => {}
            other => {
                line.insert("data".to_string(), other);
            }
        }
        self.write_line(&Value::Object(line));
    }

    pub fn flush(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }

    fn write_line(&self, line: &Value) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{line}");
        }
    }
}

/// Counters for one conversion, written as a single `debug.summary` line by `finish`.
pub(crate) struct DebugScope<'a> {
    logger: &'a DebugLogger,
    counters: BTreeMap<String, u64>,
}

impl DebugScope<'_> {
    pub fn log_event(&self, kind: &str, fields: Value) {
        self.logger.log_event(kind, fields);
    }

    pub fn increment(&mut self, key: &str, amount: u64) {
        let entry = self.counters.entry(key.to_string()).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    pub fn finish(self, context: &str) {
        self.logger.write_line(&json!({
            "type": "debug.summary",
            "context": context,
            "counts": self.counters,
        }));
        self.logger.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("vectorlift-{}-{}.jsonl", name, std::process::id()))
    }

    #[test]
    fn events_and_summary_are_one_json_object_per_line() {
        let path = temp_log("events");
        let logger = DebugLogger::new(&path).unwrap();
        let mut scope = logger.scope();
        scope.log_event("convert.start", json!({"bytes": 42}));
        scope.increment("element.rect", 2);
        scope.increment("element.rect", 1);
        scope.finish("test");

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "convert.start");
        assert_eq!(lines[0]["bytes"], 42);
        assert_eq!(lines[1]["type"], "debug.summary");
        assert_eq!(lines[1]["counts"]["element.rect"], 3);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn interleaved_scopes_keep_their_own_counts() {
        let path = temp_log("scopes");
        let logger = DebugLogger::new(&path).unwrap();
        let mut first = logger.scope();
        let mut second = logger.scope();
        first.increment("a", 1);
        second.increment("b", 2);
        first.increment("a", 1);
        second.finish("second");
        first.finish("first");

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["context"], "second");
        assert_eq!(lines[0]["counts"], json!({"b": 2}));
        assert_eq!(lines[1]["context"], "first");
        assert_eq!(lines[1]["counts"], json!({"a": 2}));
        let _ = std::fs::remove_file(path);
    }
}
