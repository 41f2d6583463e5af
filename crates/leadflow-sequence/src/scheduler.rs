//! Stage transitions.
//!
//! A transition fires only on a successful send for the lead's current
//! stage. Stages are never skipped and never regress; the only
//! non-sequential move is a forced jump, which is recorded as such.

use chrono::{DateTime, Duration, Utc};

use leadflow_core::lead::{EmailStatus, Lead, SequenceState};
use leadflow_core::stage::Stage;

use crate::timing::SequencePlan;

/// What a successful send did to the lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Moved to the next stage; the new `next_scheduled_email` is set.
    Advanced {
        from: Stage,
        to: Stage,
        next_send: DateTime<Utc>,
    },
    /// The seventh stage was sent — the sequence is complete.
    Completed { last: Stage },
}

/// What a failed send cycle did to the lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Retry scheduled for `next_attempt`.
    Rescheduled { next_attempt: DateTime<Utc> },
    /// Retry cap reached — automation halted for this lead.
    Halted,
}

/// Apply a successful automatic (or current-stage forced) send.
///
/// Appends history for the stage that was sent, resets the retry counter,
/// and either advances the stage pointer with its configured delay or marks
/// the sequence completed after the seventh stage.
pub fn advance_on_success(
    lead: &mut Lead,
    plan: &SequencePlan,
    now: DateTime<Utc>,
    forced: bool,
) -> Transition {
    let sent_stage = lead.stage;
    let retry_count = (lead.email_retry_count > 0).then_some(lead.email_retry_count);
    lead.record_send(sent_stage, now, retry_count, forced);
    lead.email_retry_count = 0;
    lead.email_status = EmailStatus::Sent;
    lead.updated_at = now;

    match sent_stage.next() {
        Some(next) => {
            let next_send = plan.next_send_time(next, now);
            lead.stage = next;
            lead.next_scheduled_email = Some(next_send);
            tracing::info!(
                "📬 Lead {} advanced {} → {} (next send {next_send})",
                lead.id,
                sent_stage.key(),
                next.key()
            );
            Transition::Advanced {
                from: sent_stage,
                to: next,
                next_send,
            }
        }
        None => {
            lead.state = SequenceState::Completed;
            lead.next_scheduled_email = None;
            tracing::info!("🏁 Lead {} completed the sequence", lead.id);
            Transition::Completed { last: sent_stage }
        }
    }
}

/// Apply a successful forced send to an explicit target stage.
///
/// The stage pointer lands exactly on the target (intermediate stages are
/// bypassed) and the history entry is flagged, so a forced jump is always
/// distinguishable from automatic progression.
pub fn apply_forced_jump(
    lead: &mut Lead,
    plan: &SequencePlan,
    target: Stage,
    now: DateTime<Utc>,
) -> Transition {
    let retry_count = (lead.email_retry_count > 0).then_some(lead.email_retry_count);
    lead.record_send(target, now, retry_count, true);
    lead.email_retry_count = 0;
    lead.email_status = EmailStatus::Sent;
    lead.stage = target;
    lead.updated_at = now;

    if target.is_last() {
        lead.state = SequenceState::Completed;
        lead.next_scheduled_email = None;
        tracing::info!("🏁 Lead {} force-completed at {}", lead.id, target.key());
        return Transition::Completed { last: target };
    }

    let next_send = plan.next_send_time(target, now);
    lead.next_scheduled_email = Some(next_send);
    tracing::info!(
        "⏭️ Lead {} force-progressed to {} (next send {next_send})",
        lead.id,
        target.key()
    );
    Transition::Advanced {
        from: target,
        to: target,
        next_send,
    }
}

/// Apply a failed send cycle: bump the counters, log the error, and either
/// reschedule within the cap or halt.
pub fn record_failure(
    lead: &mut Lead,
    error: String,
    now: DateTime<Utc>,
    retry_cap: u32,
    failure_backoff: Duration,
) -> FailureOutcome {
    lead.email_retry_count += 1;
    lead.email_failure_count += 1;
    lead.push_error(lead.email_retry_count, error, now);
    lead.updated_at = now;

    if lead.email_retry_count >= retry_cap {
        lead.email_status = EmailStatus::MaxRetriesExceeded;
        lead.state = SequenceState::Halted;
        lead.next_scheduled_email = None;
        tracing::warn!(
            "🛑 Lead {} halted after {} failed cycles",
            lead.id,
            lead.email_retry_count
        );
        FailureOutcome::Halted
    } else {
        let next_attempt = now + failure_backoff;
        lead.email_status = EmailStatus::Failed;
        lead.next_scheduled_email = Some(next_attempt);
        tracing::warn!(
            "🔁 Lead {} send failed ({}/{retry_cap}), retry at {next_attempt}",
            lead.id,
            lead.email_retry_count
        );
        FailureOutcome::Rescheduled { next_attempt }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::settings::CompanySettings;

    fn plan() -> SequencePlan {
        SequencePlan::new(CompanySettings::default_for("u1"))
    }

    fn active_lead() -> Lead {
        let mut lead = Lead::new("u1", "Ada", "ada@example.com");
        lead.state = SequenceState::Active;
        lead
    }

    #[test]
    fn test_advance_from_first_stage() {
        let mut lead = active_lead();
        let now = Utc::now();
        let t = advance_on_success(&mut lead, &plan(), now, false);

        assert_eq!(
            t,
            Transition::Advanced {
                from: Stage::CalledOnce,
                to: Stage::CalledTwice,
                next_send: now + Duration::days(7),
            }
        );
        assert_eq!(lead.stage, Stage::CalledTwice);
        assert_eq!(lead.step(), 2);
        assert_eq!(lead.email_status, EmailStatus::Sent);
        assert_eq!(lead.email_retry_count, 0);
        assert_eq!(lead.email_history.len(), 1);
        assert_eq!(lead.email_history[0].stage, Stage::CalledOnce);
        assert!(!lead.email_history[0].force_progressed);
        assert_eq!(lead.next_scheduled_email, Some(now + Duration::days(7)));
    }

    #[test]
    fn test_step_increases_by_exactly_one_per_success() {
        let mut lead = active_lead();
        let now = Utc::now();
        let mut prev_step = lead.step();
        while lead.state == SequenceState::Active {
            advance_on_success(&mut lead, &plan(), now, false);
            if lead.state == SequenceState::Active {
                assert_eq!(lead.step(), prev_step + 1);
                prev_step = lead.step();
            }
        }
        assert_eq!(lead.email_history.len(), 7);
    }

    #[test]
    fn test_seventh_stage_completes() {
        let mut lead = active_lead();
        lead.stage = Stage::CalledSevenTimes;
        let now = Utc::now();
        let t = advance_on_success(&mut lead, &plan(), now, false);

        assert_eq!(
            t,
            Transition::Completed {
                last: Stage::CalledSevenTimes
            }
        );
        assert_eq!(lead.state, SequenceState::Completed);
        assert_eq!(lead.next_scheduled_email, None);
        assert_eq!(lead.stage, Stage::CalledSevenTimes);
    }

    #[test]
    fn test_next_send_never_before_now() {
        let mut lead = active_lead();
        let now = Utc::now();
        advance_on_success(&mut lead, &plan(), now, false);
        assert!(lead.next_scheduled_email.unwrap() >= now);
    }

    #[test]
    fn test_forced_jump_lands_exactly_on_target() {
        let mut lead = active_lead();
        lead.stage = Stage::CalledTwice;
        let now = Utc::now();
        let t = apply_forced_jump(&mut lead, &plan(), Stage::CalledFiveTimes, now);

        assert_eq!(lead.stage, Stage::CalledFiveTimes);
        assert_eq!(lead.step(), 5);
        let entry = lead.email_history.last().unwrap();
        assert!(entry.force_progressed);
        assert_eq!(entry.stage, Stage::CalledFiveTimes);
        match t {
            Transition::Advanced { next_send, .. } => assert!(next_send >= now),
            other => panic!("unexpected transition: {other:?}"),
        }
    }

    #[test]
    fn test_forced_jump_to_last_completes() {
        let mut lead = active_lead();
        let now = Utc::now();
        let t = apply_forced_jump(&mut lead, &plan(), Stage::CalledSevenTimes, now);
        assert_eq!(
            t,
            Transition::Completed {
                last: Stage::CalledSevenTimes
            }
        );
        assert_eq!(lead.state, SequenceState::Completed);
    }

    #[test]
    fn test_failure_reschedules_below_cap() {
        let mut lead = active_lead();
        lead.next_scheduled_email = Some(Utc::now());
        let now = Utc::now();
        let outcome = record_failure(&mut lead, "boom".into(), now, 10, Duration::minutes(10));

        assert_eq!(
            outcome,
            FailureOutcome::Rescheduled {
                next_attempt: now + Duration::minutes(10)
            }
        );
        assert_eq!(lead.email_retry_count, 1);
        assert_eq!(lead.email_failure_count, 1);
        assert_eq!(lead.email_status, EmailStatus::Failed);
        assert_eq!(lead.email_errors.len(), 1);
        assert_eq!(lead.stage, Stage::CalledOnce); // unchanged
    }

    #[test]
    fn test_failure_halts_at_cap() {
        let mut lead = active_lead();
        lead.email_retry_count = 9;
        let now = Utc::now();
        let outcome = record_failure(&mut lead, "boom".into(), now, 10, Duration::minutes(10));

        assert_eq!(outcome, FailureOutcome::Halted);
        assert_eq!(lead.email_retry_count, 10);
        assert_eq!(lead.email_status, EmailStatus::MaxRetriesExceeded);
        assert_eq!(lead.state, SequenceState::Halted);
        assert_eq!(lead.next_scheduled_email, None);
    }

    #[test]
    fn test_failure_count_is_cumulative() {
        let mut lead = active_lead();
        let now = Utc::now();
        record_failure(&mut lead, "a".into(), now, 10, Duration::minutes(10));
        record_failure(&mut lead, "b".into(), now, 10, Duration::minutes(10));
        // A success resets the retry counter but not the lifetime total
        advance_on_success(&mut lead, &plan(), now, false);
        assert_eq!(lead.email_retry_count, 0);
        assert_eq!(lead.email_failure_count, 2);
        // History records how many retries the send took
        assert_eq!(lead.email_history[0].retry_count, Some(2));
    }
}
