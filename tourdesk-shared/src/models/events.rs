use serde::{Deserialize, Serialize};

/// Change notifications published by the booking desk after every committed mutation.
/// Subscribers re-read the desk instead of relying on the payload being exhaustive.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum DeskEvent {
    Loaded {
        generation: u64,
        bookings: usize,
        timestamp: i64,
    },
    LoadFailed {
        message: String,
        timestamp: i64,
    },
    SelectionChanged {
        booking_id: Option<String>,
        size: usize,
        timestamp: i64,
    },
    CancellationRequested {
        booking_id: String,
        traveler_ids: Vec<String>,
        reason: Option<String>,
        timestamp: i64,
    },
    CancellationWithdrawn {
        booking_id: String,
        traveler_id: String,
        timestamp: i64,
    },
}

impl DeskEvent {
    /// Event name used for SSE framing.
    pub fn name(&self) -> &'static str {
        match self {
            DeskEvent::Loaded { .. } => "loaded",
            DeskEvent::LoadFailed { .. } => "load_failed",
            DeskEvent::SelectionChanged { .. } => "selection_changed",
            DeskEvent::CancellationRequested { .. } => "cancellation_requested",
            DeskEvent::CancellationWithdrawn { .. } => "cancellation_withdrawn",
        }
    }

    pub fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }
}
