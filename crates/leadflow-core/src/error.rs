//! Error taxonomy for the Leadflow workspace.

use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T> = std::result::Result<T, LeadflowError>;

/// All errors surfaced by Leadflow components.
///
/// The SMTP variants carry the number of attempts the mailer made before
/// giving up; the sequence retry counter on the lead is tracked separately
/// by the automation controller.
#[derive(Debug, Error)]
pub enum LeadflowError {
    #[error("unknown stage key '{0}'")]
    InvalidStage(String),

    #[error("missing SMTP credentials: {0}")]
    MissingCredentials(String),

    #[error("SMTP authentication failed after {attempts} attempt(s): {message}")]
    SmtpAuth { message: String, attempts: u32 },

    #[error("SMTP network error after {attempts} attempt(s): {message}")]
    SmtpNetwork { message: String, attempts: u32 },

    #[error("SMTP timeout after {attempts} attempt(s): {message}")]
    SmtpTimeout { message: String, attempts: u32 },

    #[error("SMTP envelope rejected after {attempts} attempt(s): {message}")]
    SmtpEnvelope { message: String, attempts: u32 },

    #[error("SMTP send failed after {attempts} attempt(s): {message}")]
    Smtp { message: String, attempts: u32 },

    #[error("email sequence already active for lead {0}")]
    AlreadyActive(String),

    #[error("retry cap reached for lead {0} — automation halted")]
    MaxRetriesExceeded(String),

    #[error("lead not found: {0}")]
    LeadNotFound(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LeadflowError {
    /// Attempt count for the SMTP error classes, if applicable.
    pub fn smtp_attempts(&self) -> Option<u32> {
        match self {
            LeadflowError::SmtpAuth { attempts, .. }
            | LeadflowError::SmtpNetwork { attempts, .. }
            | LeadflowError::SmtpTimeout { attempts, .. }
            | LeadflowError::SmtpEnvelope { attempts, .. }
            | LeadflowError::Smtp { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// True for errors produced by the mail transport (retried per-cycle).
    pub fn is_smtp(&self) -> bool {
        self.smtp_attempts().is_some()
    }
}
