//! # Leadflow Core
//!
//! Shared foundation for the Leadflow workspace: the error taxonomy, the
//! outreach stage enum, the lead data model, per-user settings, the process
//! configuration file, and the store traits injected into the automation
//! controller.

pub mod config;
pub mod error;
pub mod lead;
pub mod settings;
pub mod stage;
pub mod traits;

pub use config::LeadflowConfig;
pub use error::{LeadflowError, Result};
pub use lead::{EmailHistoryEntry, EmailStatus, Lead, SendFailure, SequenceState};
pub use settings::{CompanySettings, SmtpCredentials, StageTiming, TimingUnit};
pub use stage::Stage;
pub use traits::{ConfigSource, LeadStore};
