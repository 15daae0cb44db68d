//! Intake Gateway HTTP API Server
//!
//! The HTTP boundary of the intake pipeline: document processing, health,
//! API-key auth, rate limiting and CORS.

pub mod auth;
pub mod health_api;
pub mod ocr_api;
pub mod rate_limit;
pub mod server;

pub use ocr_api::IntakeResponse;
pub use server::{GatewayOptions, GatewayState, build_router, start_server};
