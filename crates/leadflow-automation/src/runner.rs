//! Periodic runner — the in-process stand-in for an external cron trigger.
//!
//! Each tick queries the store for due leads and spawns one task per lead,
//! so a slow SMTP conversation on one lead never blocks the others. The
//! per-lead `sending` claim inside the controller keeps overlapping ticks
//! from double-processing.

use std::sync::Arc;

use chrono::Utc;

use crate::controller::{AutomationController, ProcessOutcome};

/// Process every currently-due lead once. Returns how many sends were
/// attempted (sent, completed, or failed — skips don't count).
pub async fn run_once(controller: &Arc<AutomationController>) -> usize {
    let now = Utc::now();
    let due = match controller.store().leads_due(now).await {
        Ok(leads) => leads,
        Err(e) => {
            tracing::error!("Due-lead query failed: {e}");
            return 0;
        }
    };

    if due.is_empty() {
        return 0;
    }
    tracing::info!("⏰ {} lead(s) due for processing", due.len());

    let mut handles = Vec::with_capacity(due.len());
    for lead in due {
        let ctrl = controller.clone();
        handles.push(tokio::spawn(async move {
            let id = lead.id.clone();
            match ctrl.process_due(&id).await {
                Ok(ProcessOutcome::Sent { stage, .. }) => {
                    tracing::info!("✅ Sent {} email for lead {id}", stage.key());
                    true
                }
                Ok(ProcessOutcome::Completed { stage, .. }) => {
                    tracing::info!("🏁 Lead {id} completed at {}", stage.key());
                    true
                }
                Ok(ProcessOutcome::Failed { error, halted, .. }) => {
                    if halted {
                        tracing::warn!("🛑 Lead {id} halted: {error}");
                    }
                    true
                }
                Ok(ProcessOutcome::Skipped { reason }) => {
                    tracing::debug!("Lead {id} skipped: {reason:?}");
                    false
                }
                Err(e) => {
                    tracing::error!("Processing lead {id} failed: {e}");
                    false
                }
            }
        }));
    }

    let mut attempted = 0;
    for handle in handles {
        if let Ok(true) = handle.await {
            attempted += 1;
        }
    }
    attempted
}

/// Tick forever. Intended to be `tokio::spawn`ed next to the gateway.
pub async fn spawn_automation_loop(controller: Arc<AutomationController>, interval_secs: u64) {
    tracing::info!("⏰ Automation runner started (check every {interval_secs}s)");
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
    loop {
        interval.tick().await;
        run_once(&controller).await;
    }
}
