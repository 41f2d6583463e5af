//! Lead data model — the automation-relevant subset of a CRM lead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stage::Stage;

/// How many failure records a lead retains. The UI only shows the last few;
/// older entries are dropped from the front.
pub const MAX_EMAIL_ERRORS: usize = 10;

/// Default cross-cycle retry cap before automation halts for a lead.
pub const DEFAULT_RETRY_CAP: u32 = 10;

/// Lifecycle of a lead's email sequence.
///
/// An explicit enum instead of an `active` boolean: "completed", "halted",
/// and "stopped" are all terminal-but-distinct and must not be inferred from
/// other fields. Only `Active` leads are picked up by the periodic trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceState {
    /// Never started (or reset).
    #[default]
    Inactive,
    /// Eligible for automatic processing.
    Active,
    /// Temporarily excluded from automatic processing; stage/step retained.
    Paused,
    /// Seventh-stage send succeeded — sequence ran to completion.
    Completed,
    /// Retry cap reached — inert until a human intervenes.
    Halted,
    /// Manually stopped.
    Stopped,
}

impl SequenceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SequenceState::Inactive => "inactive",
            SequenceState::Active => "active",
            SequenceState::Paused => "paused",
            SequenceState::Completed => "completed",
            SequenceState::Halted => "halted",
            SequenceState::Stopped => "stopped",
        }
    }

    pub fn parse(s: &str) -> SequenceState {
        match s {
            "active" => SequenceState::Active,
            "paused" => SequenceState::Paused,
            "completed" => SequenceState::Completed,
            "halted" => SequenceState::Halted,
            "stopped" => SequenceState::Stopped,
            _ => SequenceState::Inactive,
        }
    }
}

/// Per-lead send status. `Sending` doubles as the mutual-exclusion marker:
/// it is claimed atomically before a send begins and always cleared to
/// `Sent`/`Failed` before the controller returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    #[default]
    Ready,
    Sending,
    Sent,
    Failed,
    MaxRetriesExceeded,
}

impl EmailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStatus::Ready => "ready",
            EmailStatus::Sending => "sending",
            EmailStatus::Sent => "sent",
            EmailStatus::Failed => "failed",
            EmailStatus::MaxRetriesExceeded => "max_retries_exceeded",
        }
    }

    pub fn parse(s: &str) -> EmailStatus {
        match s {
            "sending" => EmailStatus::Sending,
            "sent" => EmailStatus::Sent,
            "failed" => EmailStatus::Failed,
            "max_retries_exceeded" => EmailStatus::MaxRetriesExceeded,
            _ => EmailStatus::Ready,
        }
    }
}

/// One completed send, appended to the lead's history. Immutable once
/// written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailHistoryEntry {
    pub stage: Stage,
    pub sent_at: DateTime<Utc>,
    pub status: EmailStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    /// Set when the entry came from a manual force-send rather than the
    /// periodic trigger.
    #[serde(default)]
    pub force_progressed: bool,
}

/// One failed send cycle, kept in a bounded log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendFailure {
    pub attempt: u32,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// A CRM lead, reduced to the fields the automation engine reads and writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    /// Owning CRM user — selects templates, settings, and SMTP credentials.
    pub user_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub company_review: Option<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub state: SequenceState,
    #[serde(default = "Stage::first")]
    pub stage: Stage,
    #[serde(default)]
    pub email_status: EmailStatus,
    #[serde(default)]
    pub email_retry_count: u32,
    /// Lifetime failure total; never reset.
    #[serde(default)]
    pub email_failure_count: u32,
    #[serde(default)]
    pub next_scheduled_email: Option<DateTime<Utc>>,
    #[serde(default)]
    pub email_history: Vec<EmailHistoryEntry>,
    #[serde(default)]
    pub email_errors: Vec<SendFailure>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Create a fresh lead outside any sequence.
    pub fn new(user_id: &str, name: &str, email: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            company_name: None,
            company_review: None,
            owner_name: None,
            state: SequenceState::Inactive,
            stage: Stage::first(),
            email_status: EmailStatus::Ready,
            email_retry_count: 0,
            email_failure_count: 0,
            next_scheduled_email: None,
            email_history: Vec::new(),
            email_errors: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The 1-based step, derived from the stage. Never stored.
    pub fn step(&self) -> u8 {
        self.stage.ordinal()
    }

    /// Whether the periodic trigger should process this lead now.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.state == SequenceState::Active
            && self.email_status != EmailStatus::MaxRetriesExceeded
            && self.next_scheduled_email.is_some_and(|at| now >= at)
    }

    /// Append a failure record, dropping the oldest beyond the bound.
    pub fn push_error(&mut self, attempt: u32, error: String, now: DateTime<Utc>) {
        self.email_errors.push(SendFailure {
            attempt,
            error,
            timestamp: now,
        });
        if self.email_errors.len() > MAX_EMAIL_ERRORS {
            let excess = self.email_errors.len() - MAX_EMAIL_ERRORS;
            self.email_errors.drain(..excess);
        }
    }

    /// Append a completed send to the history log.
    pub fn record_send(
        &mut self,
        stage: Stage,
        now: DateTime<Utc>,
        retry_count: Option<u32>,
        force_progressed: bool,
    ) {
        self.email_history.push(EmailHistoryEntry {
            stage,
            sent_at: now,
            status: EmailStatus::Sent,
            retry_count,
            force_progressed,
        });
    }
}
