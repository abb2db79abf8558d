//! Dialogue relay HTTP API
//!
//! Routes served by `robot-scenario serve`:
//! - POST /listenUser - STT → reply generation → TTS for one recording
//! - GET /ttsBytes?prompt= - Synthesize a scripted line
//! - GET /startScenario - Reset conversation history
//! - GET /health - Health check
//!
//! `RelayClient` is the matching client used by the scenario harness.

mod client;
mod handlers;
pub mod messages;
mod routes;
mod state;

pub use client::RelayClient;
pub use routes::create_router;
pub use state::AppState;
