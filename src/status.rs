//! Process-wide record of what the mirror is doing.
//!
//! The tracker is owned by the server and shared by reference with the
//! mirror, which is the only writer. Every update overwrites the record in
//! place; no history is kept.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Lifecycle tag reported by `/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorState {
    Starting,
    Cloning,
    Pulling,
    Running,
    Error,
}

impl MirrorState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Cloning => "cloning",
            Self::Pulling => "pulling",
            Self::Running => "running",
            Self::Error => "error",
        }
    }
}

/// Snapshot of the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusRecord {
    pub state: MirrorState,
    pub message: String,
    /// Unix time in seconds, with sub-second precision.
    pub last_updated: f64,
}

/// Returns the current Unix timestamp in fractional seconds.
fn now_unix() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

pub struct StatusTracker {
    record: Mutex<StatusRecord>,
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusTracker {
    /// Create a tracker in the `starting` state.
    pub fn new() -> Self {
        Self {
            record: Mutex::new(StatusRecord {
                state: MirrorState::Starting,
                message: "Server is starting...".to_string(),
                last_updated: now_unix(),
            }),
        }
    }

    /// Overwrite the record and stamp it with the current time.
    pub fn update(&self, state: MirrorState, message: impl Into<String>) {
        let message = message.into();
        log::debug!("status -> {}: {}", state.as_str(), message);

        let mut record = self.record.lock().unwrap_or_else(|e| e.into_inner());
        record.state = state;
        record.message = message;
        record.last_updated = now_unix();
    }

    /// Return the current record verbatim.
    pub fn read(&self) -> StatusRecord {
        self.record
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_starting_state() {
        let tracker = StatusTracker::new();
        let record = tracker.read();
        assert_eq!(record.state, MirrorState::Starting);
        assert_eq!(record.message, "Server is starting...");
        assert!(record.last_updated > 0.0);
    }

    #[test]
    fn update_overwrites_record() {
        let tracker = StatusTracker::new();
        let before = tracker.read().last_updated;

        tracker.update(MirrorState::Cloning, "Cloning repository...");
        let record = tracker.read();
        assert_eq!(record.state, MirrorState::Cloning);
        assert_eq!(record.message, "Cloning repository...");
        assert!(record.last_updated >= before);

        tracker.update(MirrorState::Error, "Repository error: boom");
        let record = tracker.read();
        assert_eq!(record.state, MirrorState::Error);
        assert_eq!(record.message, "Repository error: boom");
    }

    #[test]
    fn any_state_may_follow_any_other() {
        let tracker = StatusTracker::new();
        tracker.update(MirrorState::Running, "ok");
        tracker.update(MirrorState::Starting, "again");
        assert_eq!(tracker.read().state, MirrorState::Starting);
    }

    #[test]
    fn state_serializes_lowercase() {
        let json = serde_json::to_string(&MirrorState::Pulling).unwrap();
        assert_eq!(json, "\"pulling\"");
        assert_eq!(MirrorState::Error.as_str(), "error");
    }

    #[test]
    fn concurrent_updates_leave_a_consistent_record() {
        use std::sync::Arc;

        let tracker = Arc::new(StatusTracker::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        tracker.update(MirrorState::Pulling, format!("writer {}", i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let record = tracker.read();
        assert_eq!(record.state, MirrorState::Pulling);
        assert!(record.message.starts_with("writer "));
    }
}
