//! Intake Event Logger
//!
//! One structured event per request lifecycle step, on the
//! `intake_events` target. Events carry field names, counts and status.
//! The only extracted value is the ID number, masked to its last four
//! digits.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::{mask_id_number, redact_sensitive_data};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntakeEvent {
    Received {
        front_bytes: usize,
        back_bytes: usize,
    },
    Rejected {
        reasons: Vec<String>,
    },
    Completed {
        status: String,
        fields: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        id_number: Option<String>,
        warnings: usize,
        latency_ms: u64,
    },
    Failed {
        kind: String,
        error_msg: String,
        latency_ms: u64,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: IntakeEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Redact free text in the event, then hand it to `tracing`.
    pub fn log_event(request_id: &str, event: IntakeEvent) {
        let entry = Self::entry(request_id, event);
        info!(target: "intake_events", event = ?entry, "Intake event");
    }

    fn entry(request_id: &str, mut event: IntakeEvent) -> EventLogEntry {
        match &mut event {
            IntakeEvent::Rejected { reasons } => {
                for reason in reasons.iter_mut() {
                    *reason = redact_sensitive_data(reason);
                }
            }
            IntakeEvent::Failed { error_msg, .. } => {
                *error_msg = redact_sensitive_data(error_msg);
            }
            IntakeEvent::Completed { id_number, .. } => {
                if let Some(id) = id_number {
                    *id = mask_id_number(id);
                }
            }
            IntakeEvent::Received { .. } => {}
        }

        EventLogEntry {
            request_id: request_id.into(),
            timestamp: Utc::now(),
            event,
        }
    }
}
