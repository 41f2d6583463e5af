//! Effective per-stage delays for one user.

use chrono::{DateTime, Duration, Utc};

use leadflow_core::settings::CompanySettings;
use leadflow_core::stage::Stage;

/// Delay table resolved from a user's company settings, falling back to the
/// builtin stage defaults. Cheap to build per send; read-only afterwards.
#[derive(Debug, Clone)]
pub struct SequencePlan {
    settings: CompanySettings,
}

impl SequencePlan {
    pub fn new(settings: CompanySettings) -> Self {
        Self { settings }
    }

    /// Delay before `stage`'s email goes out.
    pub fn delay_for(&self, stage: Stage) -> Duration {
        self.settings.delay_for(stage)
    }

    /// Earliest time `stage`'s email may be sent, counted from `now`.
    pub fn next_send_time(&self, stage: Stage, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.delay_for(stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::settings::{StageTiming, TimingUnit};

    #[test]
    fn test_builtin_delays() {
        let plan = SequencePlan::new(CompanySettings::default_for("u1"));
        let now = Utc::now();
        assert_eq!(plan.next_send_time(Stage::CalledOnce, now), now);
        assert_eq!(
            plan.next_send_time(Stage::CalledTwice, now),
            now + Duration::days(7)
        );
    }

    #[test]
    fn test_user_override_applies() {
        let mut settings = CompanySettings::default_for("u1");
        settings.email_timings.insert(
            Stage::CalledThreeTimes,
            StageTiming::new(48, TimingUnit::Hours, "two days"),
        );
        let plan = SequencePlan::new(settings);
        let now = Utc::now();
        assert_eq!(
            plan.next_send_time(Stage::CalledThreeTimes, now),
            now + Duration::hours(48)
        );
        // Other stages still use builtins
        assert_eq!(
            plan.next_send_time(Stage::CalledFourTimes, now),
            now + Duration::days(7)
        );
    }
}
