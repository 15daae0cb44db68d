//! Structured logging for the intake service.
//!
//! Console and rolling NDJSON output, PII redaction, and per-request intake
//! events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogEntry, EventLogger, IntakeEvent};
pub use logger::init_logger;
pub use redact::{mask_id_number, redact_sensitive_data};
