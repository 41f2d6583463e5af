//! Store traits injected into the automation layer.
//!
//! The controller and mailer never talk to a database directly; they go
//! through these interfaces so per-user isolation works and tests can fake
//! every collaborator.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::lead::{EmailStatus, Lead};
use crate::settings::{CompanySettings, SmtpCredentials};

/// Lead persistence.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Fetch a lead by id, `LeadNotFound` otherwise.
    async fn find_lead(&self, id: &str) -> Result<Lead>;

    /// Upsert the full lead record.
    async fn save_lead(&self, lead: &Lead) -> Result<()>;

    /// Leads eligible for automatic processing at `now`: active state,
    /// schedule elapsed, not halted.
    async fn leads_due(&self, now: DateTime<Utc>) -> Result<Vec<Lead>>;

    /// Atomically flip the lead's status to `sending` unless it already is.
    /// Returns whether this caller won the claim; the loser must skip.
    async fn claim_sending(&self, id: &str) -> Result<bool>;

    /// Overwrite the status field only — used to make sure a lead never
    /// stays in `sending` when a send path fails before the full save.
    async fn set_email_status(&self, id: &str, status: EmailStatus) -> Result<()>;

    /// All leads, optionally filtered by owning user.
    async fn list_leads(&self, user_id: Option<&str>) -> Result<Vec<Lead>>;
}

/// Per-user configuration lookups, resolved at call time — never cached as
/// a process-wide singleton.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Substitution defaults and timing overrides. Missing records degrade
    /// to empty defaults rather than failing.
    async fn company_settings(&self, user_id: &str) -> Result<CompanySettings>;

    /// The user's SMTP account. Missing or incomplete records fail with
    /// `MissingCredentials` before any send attempt.
    async fn smtp_credentials(&self, user_id: &str) -> Result<SmtpCredentials>;
}
