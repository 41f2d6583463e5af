//! # Leadflow Gateway
//!
//! Thin HTTP surface over the automation controller: the manual
//! start/pause/stop/force-send controls the CRM UI calls, plus minimal
//! lead/template CRUD so the engine is drivable end to end.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
