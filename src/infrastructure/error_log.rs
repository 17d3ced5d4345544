//! # Error Recorder
//!
//! Fire-and-forget error recording behind the [`ErrorSink`] trait: every entry
//! goes to the structured log, and a bounded in-memory ring keeps the most
//! recent entries around for diagnostics. Durable persistence lives with an
//! external collaborator, not here.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::domain::error::Severity;
use crate::domain::traits::ErrorSink;

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct ErrorEntry {
    pub at: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
    pub user_id: Option<i64>,
    pub context: Option<serde_json::Value>,
}

pub struct ErrorRecorder {
    entries: Mutex<VecDeque<ErrorEntry>>,
    capacity: usize,
}

impl ErrorRecorder {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Most recent entries first. Read by the diagnostics surface.
    #[allow(dead_code)]
    pub fn recent(&self, limit: usize) -> Vec<ErrorEntry> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.iter().rev().take(limit).cloned().collect()
    }
}

impl ErrorSink for ErrorRecorder {
    fn record(
        &self,
        severity: Severity,
        error: &dyn std::fmt::Display,
        user_id: Option<i64>,
        context: Option<serde_json::Value>,
    ) {
        let message = error.to_string();
        match severity {
            Severity::Warning => {
                tracing::warn!(severity = severity.as_str(), user_id, %message, "recorded")
            }
            _ => tracing::error!(severity = severity.as_str(), user_id, %message, "recorded"),
        }

        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(ErrorEntry {
            at: Utc::now(),
            severity,
            message,
            user_id,
            context,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_returns_newest_first() {
        let recorder = ErrorRecorder::new(8);
        recorder.record(Severity::Error, &"first", Some(1), None);
        recorder.record(Severity::Warning, &"second", None, None);

        let recent = recorder.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "second");
        assert_eq!(recent[1].message, "first");
        assert_eq!(recent[1].user_id, Some(1));
    }

    #[test]
    fn test_ring_is_bounded() {
        let recorder = ErrorRecorder::new(3);
        for i in 0..10 {
            recorder.record(Severity::Error, &format!("err {i}"), None, None);
        }

        let recent = recorder.recent(10);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].message, "err 9");
        assert_eq!(recent[2].message, "err 7");
    }

    #[test]
    fn test_context_is_kept() {
        let recorder = ErrorRecorder::new(3);
        recorder.record(
            Severity::Critical,
            &"boom",
            Some(7),
            Some(serde_json::json!({ "text": "📅 18.05.2025" })),
        );

        let entry = &recorder.recent(1)[0];
        assert_eq!(entry.context.as_ref().unwrap()["text"], "📅 18.05.2025");
    }
}
