use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome recorded for one container operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Applied,
    Stacked,
    Refreshed,
    Resisted,
    Rejected,
    Removed,
    Expired,
}

impl EventKind {
    /// Whether the operation changed the container in the caller's favour
    pub fn is_success(&self) -> bool {
        matches!(self, EventKind::Applied | EventKind::Stacked | EventKind::Refreshed)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Applied => "applied",
            EventKind::Stacked => "stacked",
            EventKind::Refreshed => "refreshed",
            EventKind::Resisted => "resisted",
            EventKind::Rejected => "rejected",
            EventKind::Removed => "removed",
            EventKind::Expired => "expired",
        };
        write!(f, "{}", s)
    }
}

/// Immutable record appended to a container's event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationEvent {
    pub kind: EventKind,
    pub status_key: String,
    /// Instance involved, when one exists
    pub status_id: Option<String>,
    pub message: String,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl ApplicationEvent {
    pub fn new(
        kind: EventKind,
        status_key: impl Into<String>,
        status_id: Option<String>,
        message: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        ApplicationEvent {
            kind,
            status_key: status_key.into(),
            status_id,
            message: message.into(),
            timestamp,
        }
    }
}
