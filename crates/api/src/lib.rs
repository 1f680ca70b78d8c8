//! HTTP boundary for the broadcast service.
//!
//! Endpoints:
//! - POST /sendSmsToAll: text-message broadcast to every user
//! - POST /sendEmailToAll: email broadcast to every user
//! - GET  /: liveness text
//! - GET  /health: JSON health check
//! - GET  /favicon.ico: empty 204

pub mod routes;
pub mod state;
