//! Coach session client.
//!
//! `CoachBackend` is the seam to the remote coaching service; `HttpCoachBackend`
//! talks to it over HTTP. `CoachClient` runs one exchange at a time against a
//! backend and keeps the session's advice and in-flight flag current.

pub mod backend;
pub mod client;

pub use backend::{CoachBackend, CoachReply, CoachRequest, HealthStatus, HttpCoachBackend};
pub use client::{COACH_ERROR_MESSAGE, CoachClient, ExchangeOutcome};
