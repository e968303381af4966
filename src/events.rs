// Events that flow from the controller to observing hosts
//
// Every externally visible action of the binding layer is mirrored as an
// event: lifecycle transitions, search dispatch/apply, discarded stale
// responses, sink writes, fetch failures. Using an enum allows pattern
// matching and keeps the host's observability surface type-safe. The stream
// is optional and purely observational - nothing in the core reads it back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// One observable action taken by the controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")] // Creates JSON like {"type": "initialized", ...}
#[serde(rename_all = "snake_case")]
pub enum SelectEvent {
    /// A widget instance became active for a control
    Initialized {
        control_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A widget instance was detached and unregistered
    Destroyed {
        control_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A search request was dispatched after the debounce window closed
    SearchDispatched {
        control_id: String,
        term: String,
        page: u32,
        sequence: u64,
        timestamp: DateTime<Utc>,
    },

    /// A result page was applied and handed to the host for rendering
    PageApplied {
        control_id: String,
        page: u32,
        count: usize,
        has_more: bool,
        sequence: u64,
        timestamp: DateTime<Utc>,
    },

    /// A late response for a superseded request was silently dropped
    StaleResponseDiscarded {
        control_id: String,
        sequence: u64,
        timestamp: DateTime<Utc>,
    },

    /// The selection binder wrote a value to the external sink
    SelectionWritten {
        control_id: String,
        key: String,
        value: String,
        timestamp: DateTime<Utc>,
    },

    /// A remote fetch failed and was degraded to an empty page
    FetchFailed {
        control_id: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl SelectEvent {
    /// The control this event belongs to
    pub fn control_id(&self) -> &str {
        match self {
            Self::Initialized { control_id, .. }
            | Self::Destroyed { control_id, .. }
            | Self::SearchDispatched { control_id, .. }
            | Self::PageApplied { control_id, .. }
            | Self::StaleResponseDiscarded { control_id, .. }
            | Self::SelectionWritten { control_id, .. }
            | Self::FetchFailed { control_id, .. } => control_id,
        }
    }
}

/// Handle for publishing events to an optional observer channel.
///
/// When no observer is attached, publishing is a no-op. A full channel drops
/// the event rather than blocking the controller (try_send, never await).
#[derive(Clone)]
pub(crate) struct EventPublisher {
    tx: Option<mpsc::Sender<SelectEvent>>,
}

impl EventPublisher {
    /// Publisher with no observer attached
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Publisher paired with a receiving channel of the given capacity
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SelectEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx: Some(tx) }, rx)
    }

    pub fn publish(&self, event: SelectEvent) {
        if let Some(tx) = &self.tx {
            // Use try_send to avoid blocking if the channel is full
            let _ = tx.try_send(event);
        }
    }
}
