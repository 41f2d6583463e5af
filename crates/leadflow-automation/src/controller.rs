//! The automation controller.
//!
//! Public operations return structured outcomes; nothing throws past this
//! boundary, and no code path may leave a lead stuck in `sending`.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use leadflow_core::error::{LeadflowError, Result};
use leadflow_core::lead::{EmailStatus, Lead, SequenceState};
use leadflow_core::settings::CompanySettings;
use leadflow_core::stage::Stage;
use leadflow_core::traits::{ConfigSource, LeadStore};
use leadflow_mailer::{Mailer, OutboundEmail};
use leadflow_sequence::{SequencePlan, Transition, advance_on_success, apply_forced_jump, record_failure};
use leadflow_templates::{TemplateStore, VariableSet, render};

/// Controller tuning, usually derived from `LeadflowConfig`.
#[derive(Debug, Clone)]
pub struct AutomationSettings {
    /// Cross-cycle retry cap; reaching it halts the lead.
    pub retry_cap: u32,
    /// Delay before a failed send is retried by the periodic trigger.
    pub failure_backoff: Duration,
    /// Sender name used when company settings leave it blank.
    pub default_sender_name: String,
    /// Sender address used when company settings leave it blank.
    pub default_sender_email: String,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            retry_cap: leadflow_core::lead::DEFAULT_RETRY_CAP,
            failure_backoff: Duration::minutes(10),
            default_sender_name: "Leadflow".into(),
            default_sender_email: String::new(),
        }
    }
}

/// Why `process_due` declined to touch a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Sequence is not in the `active` state.
    NotActive,
    /// `next_scheduled_email` has not elapsed yet.
    NotDue,
    /// Another trigger holds the `sending` claim.
    AlreadySending,
    /// Retry cap was reached earlier; needs manual intervention.
    Halted,
}

/// Structured result of `process_due` / `force_send`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProcessOutcome {
    Sent {
        stage: Stage,
        step: u8,
        next_stage: Option<Stage>,
        next_scheduled_email: Option<DateTime<Utc>>,
        message_id: String,
        forced: bool,
    },
    Completed {
        stage: Stage,
        message_id: String,
        forced: bool,
    },
    Skipped {
        reason: SkipReason,
    },
    Failed {
        error: String,
        retry_count: u32,
        halted: bool,
    },
}

/// Orchestrates Template Store → Variable Substitution → Mailer → Stage
/// Scheduler for one lead at a time.
pub struct AutomationController {
    store: Arc<dyn LeadStore>,
    templates: TemplateStore,
    mailer: Arc<dyn Mailer>,
    config: Arc<dyn ConfigSource>,
    settings: AutomationSettings,
}

impl AutomationController {
    pub fn new(
        store: Arc<dyn LeadStore>,
        templates: TemplateStore,
        mailer: Arc<dyn Mailer>,
        config: Arc<dyn ConfigSource>,
        settings: AutomationSettings,
    ) -> Self {
        Self {
            store,
            templates,
            mailer,
            config,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn LeadStore> {
        &self.store
    }

    /// Enroll a lead: stage back to the first touch, sequence active, first
    /// send due immediately (the first stage's delay is zero by default).
    pub async fn start(&self, lead_id: &str) -> Result<Lead> {
        let mut lead = self.store.find_lead(lead_id).await?;
        if matches!(lead.state, SequenceState::Active | SequenceState::Paused) {
            return Err(LeadflowError::AlreadyActive(lead_id.to_string()));
        }

        let plan = self.plan_for(&lead.user_id).await;
        let now = Utc::now();
        lead.state = SequenceState::Active;
        lead.stage = Stage::first();
        lead.email_status = EmailStatus::Ready;
        lead.email_retry_count = 0;
        lead.next_scheduled_email = Some(plan.next_send_time(Stage::first(), now));
        lead.updated_at = now;
        self.store.save_lead(&lead).await?;
        tracing::info!("▶️ Sequence started for lead {lead_id}");
        Ok(lead)
    }

    /// Exclude the lead from automatic processing without losing its place.
    pub async fn pause(&self, lead_id: &str) -> Result<Lead> {
        let mut lead = self.store.find_lead(lead_id).await?;
        if lead.state != SequenceState::Active {
            return Err(LeadflowError::InvalidOperation(format!(
                "cannot pause lead {lead_id} in state '{}'",
                lead.state.as_str()
            )));
        }
        lead.state = SequenceState::Paused;
        lead.updated_at = Utc::now();
        self.store.save_lead(&lead).await?;
        tracing::info!("⏸️ Sequence paused for lead {lead_id}");
        Ok(lead)
    }

    /// Re-include a paused lead; stage, step, and schedule are untouched.
    pub async fn resume(&self, lead_id: &str) -> Result<Lead> {
        let mut lead = self.store.find_lead(lead_id).await?;
        if lead.state != SequenceState::Paused {
            return Err(LeadflowError::InvalidOperation(format!(
                "cannot resume lead {lead_id} in state '{}'",
                lead.state.as_str()
            )));
        }
        lead.state = SequenceState::Active;
        lead.updated_at = Utc::now();
        self.store.save_lead(&lead).await?;
        tracing::info!("▶️ Sequence resumed for lead {lead_id}");
        Ok(lead)
    }

    /// Permanently take the lead out of automation. Distinct from
    /// completion — the state records which one happened.
    pub async fn stop(&self, lead_id: &str) -> Result<Lead> {
        let mut lead = self.store.find_lead(lead_id).await?;
        if !matches!(lead.state, SequenceState::Active | SequenceState::Paused) {
            return Err(LeadflowError::InvalidOperation(format!(
                "cannot stop lead {lead_id} in state '{}'",
                lead.state.as_str()
            )));
        }
        lead.state = SequenceState::Stopped;
        lead.next_scheduled_email = None;
        lead.updated_at = Utc::now();
        self.store.save_lead(&lead).await?;
        tracing::info!("⏹️ Sequence stopped for lead {lead_id}");
        Ok(lead)
    }

    /// One automatic processing pass, as invoked by the periodic trigger.
    pub async fn process_due(&self, lead_id: &str) -> Result<ProcessOutcome> {
        let lead = self.store.find_lead(lead_id).await?;
        let now = Utc::now();

        if lead.email_status == EmailStatus::MaxRetriesExceeded
            || lead.state == SequenceState::Halted
        {
            return Ok(ProcessOutcome::Skipped {
                reason: SkipReason::Halted,
            });
        }
        if lead.state != SequenceState::Active {
            return Ok(ProcessOutcome::Skipped {
                reason: SkipReason::NotActive,
            });
        }
        if lead.email_status == EmailStatus::Sending {
            return Ok(ProcessOutcome::Skipped {
                reason: SkipReason::AlreadySending,
            });
        }
        if !lead.next_scheduled_email.is_some_and(|at| now >= at) {
            return Ok(ProcessOutcome::Skipped {
                reason: SkipReason::NotDue,
            });
        }

        // Claim the sending flag atomically; a concurrent trigger on the
        // same lead loses and skips.
        if !self.store.claim_sending(lead_id).await? {
            return Ok(ProcessOutcome::Skipped {
                reason: SkipReason::AlreadySending,
            });
        }

        self.execute_send(lead, None, false, now).await
    }

    /// Manual send, bypassing the schedule gate. With `to_stage`, jumps the
    /// lead there; the history entry is flagged either way. Also the
    /// sanctioned way to revive a halted lead.
    pub async fn force_send(
        &self,
        lead_id: &str,
        to_stage: Option<Stage>,
    ) -> Result<ProcessOutcome> {
        let lead = self.store.find_lead(lead_id).await?;
        if matches!(
            lead.state,
            SequenceState::Inactive | SequenceState::Stopped | SequenceState::Completed
        ) {
            return Err(LeadflowError::InvalidOperation(format!(
                "cannot force-send for lead {lead_id} in state '{}'",
                lead.state.as_str()
            )));
        }
        if lead.email_status == EmailStatus::Sending {
            return Ok(ProcessOutcome::Skipped {
                reason: SkipReason::AlreadySending,
            });
        }
        if !self.store.claim_sending(lead_id).await? {
            return Ok(ProcessOutcome::Skipped {
                reason: SkipReason::AlreadySending,
            });
        }

        self.execute_send(lead, to_stage, true, Utc::now()).await
    }

    /// The send pipeline. The `sending` claim is already held; every exit
    /// path below persists a terminal status for it.
    async fn execute_send(
        &self,
        mut lead: Lead,
        target: Option<Stage>,
        forced: bool,
        now: DateTime<Utc>,
    ) -> Result<ProcessOutcome> {
        lead.email_status = EmailStatus::Sending;
        let stage_to_send = target.unwrap_or(lead.stage);

        match self.attempt_send(&lead, stage_to_send).await {
            Ok(message_id) => {
                // A forced send out of a halt revives the sequence.
                if lead.state == SequenceState::Halted {
                    lead.state = SequenceState::Active;
                }
                let plan = self.plan_for(&lead.user_id).await;
                let transition = match target {
                    Some(stage) => apply_forced_jump(&mut lead, &plan, stage, now),
                    None => advance_on_success(&mut lead, &plan, now, forced),
                };
                if let Err(save_err) = self.store.save_lead(&lead).await {
                    // The email went out; make sure the claim is still
                    // released before surfacing the storage problem.
                    self.store
                        .set_email_status(&lead.id, EmailStatus::Sent)
                        .await
                        .ok();
                    return Err(save_err);
                }

                Ok(match transition {
                    Transition::Advanced { to, next_send, .. } => ProcessOutcome::Sent {
                        stage: stage_to_send,
                        step: lead.step(),
                        next_stage: Some(to),
                        next_scheduled_email: Some(next_send),
                        message_id,
                        forced,
                    },
                    Transition::Completed { last } => ProcessOutcome::Completed {
                        stage: last,
                        message_id,
                        forced,
                    },
                })
            }
            Err(e) => {
                let error = e.to_string();
                tracing::warn!("✉️ Send failed for lead {}: {error}", lead.id);
                let outcome = record_failure(
                    &mut lead,
                    error.clone(),
                    now,
                    self.settings.retry_cap,
                    self.settings.failure_backoff,
                );
                // Persist the terminal status; if even that fails, fall back
                // to a bare status write so the lead cannot stay `sending`.
                if let Err(save_err) = self.store.save_lead(&lead).await {
                    tracing::error!(
                        "Failed to persist failure for lead {}: {save_err}",
                        lead.id
                    );
                    self.store
                        .set_email_status(&lead.id, EmailStatus::Failed)
                        .await?;
                }
                Ok(ProcessOutcome::Failed {
                    error,
                    retry_count: lead.email_retry_count,
                    halted: matches!(outcome, leadflow_sequence::FailureOutcome::Halted),
                })
            }
        }
    }

    /// Resolve template, substitute variables, and run the mailer.
    async fn attempt_send(&self, lead: &Lead, stage: Stage) -> Result<String> {
        let company = self.company_settings(&lead.user_id).await;
        let template = self.templates.resolve(stage, Some(&lead.user_id)).await?;
        let vars = VariableSet::for_send(lead, &company, &self.settings.default_sender_name, None);
        let rendered = render(&template, &vars);

        let sender_email = if company.sender_email.is_empty() {
            self.settings.default_sender_email.clone()
        } else {
            company.sender_email.clone()
        };
        let sender_name = vars
            .get("SENDER_NAME")
            .unwrap_or(&self.settings.default_sender_name)
            .to_string();

        let creds = self.config.smtp_credentials(&lead.user_id).await?;
        let outbound = OutboundEmail {
            to: lead.email.clone(),
            to_name: Some(lead.name.clone()),
            subject: rendered.subject,
            html: rendered.html,
            text: rendered.text,
            sender_name,
            sender_email,
        };

        let receipt = self.mailer.send(&creds, &outbound).await?;
        Ok(receipt.message_id)
    }

    async fn plan_for(&self, user_id: &str) -> SequencePlan {
        SequencePlan::new(self.company_settings(user_id).await)
    }

    /// Missing or unreadable settings degrade to empty defaults — template
    /// rendering tolerates blanks, it never fails on them.
    async fn company_settings(&self, user_id: &str) -> CompanySettings {
        match self.config.company_settings(user_id).await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Company settings unavailable for {user_id}: {e}");
                CompanySettings::default_for(user_id)
            }
        }
    }
}
