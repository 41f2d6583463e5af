//! # Leadflow Automation
//!
//! The automation controller: for one lead, resolve the stage template,
//! substitute variables, send through the mailer, and apply the stage
//! transition — recording history and errors along the way. Plus the
//! periodic runner that stands in for an external cron trigger.

pub mod controller;
pub mod runner;

pub use controller::{AutomationController, AutomationSettings, ProcessOutcome, SkipReason};
pub use runner::{run_once, spawn_automation_loop};
