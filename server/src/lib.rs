//! Inbound HTTP surface for taskforce.
//!
//! Routes, mirroring the orchestrator's external contract:
//!
//! - `POST /chat` — submit a task. `target = "pm"` runs full
//!   decomposition-and-dispatch; a worker target runs the
//!   direct-addressing bypass. Returns the structured task result.
//! - `POST /assign` — placeholder; always `501 Not Implemented`.
//! - `GET /health` — probes the PM's configured endpoint and reports
//!   `ok` / `degraded`.
//!
//! When inbound authentication is configured, `/chat` and `/assign`
//! require `Authorization: Bearer <token>`; `/health` stays open.

pub mod auth;
pub mod routes;

pub use auth::AuthConfig;
pub use routes::{AppState, router, serve};
