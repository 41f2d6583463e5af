//! Per-user records: company settings (substitution defaults + stage
//! timings) and SMTP credentials.

use std::collections::HashMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{LeadflowError, Result};
use crate::stage::Stage;

/// Unit for a configured stage delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingUnit {
    Minutes,
    Hours,
    Days,
}

/// When a stage's email goes out, relative to the previous send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTiming {
    pub delay: i64,
    pub unit: TimingUnit,
    #[serde(default)]
    pub description: String,
}

impl StageTiming {
    pub fn new(delay: i64, unit: TimingUnit, description: &str) -> Self {
        Self {
            delay,
            unit,
            description: description.to_string(),
        }
    }

    pub fn to_duration(&self) -> Duration {
        match self.unit {
            TimingUnit::Minutes => Duration::minutes(self.delay),
            TimingUnit::Hours => Duration::hours(self.delay),
            TimingUnit::Days => Duration::days(self.delay),
        }
    }
}

/// Per-user substitution defaults and stage timing overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanySettings {
    pub user_id: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub sender_email: String,
    #[serde(default)]
    pub website_url: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub industry: String,
    /// Stage → timing override; absent stages fall back to the builtin
    /// delay for that stage.
    #[serde(default)]
    pub email_timings: HashMap<Stage, StageTiming>,
}

impl CompanySettings {
    /// Empty settings for a user with nothing configured — substitution
    /// degrades to empty strings, timings to builtins.
    pub fn default_for(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            ..Default::default()
        }
    }

    /// Effective delay before `stage`'s email: user override, else builtin.
    pub fn delay_for(&self, stage: Stage) -> Duration {
        self.email_timings
            .get(&stage)
            .map(|t| t.to_duration())
            .unwrap_or_else(|| stage.default_delay())
    }
}

/// Per-user SMTP account. All four fields are required before any send is
/// attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpCredentials {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl SmtpCredentials {
    /// Precondition check, surfaced before a transport is ever built.
    pub fn validate(&self) -> Result<()> {
        let missing = [
            ("host", self.host.is_empty()),
            ("port", self.port == 0),
            ("username", self.username.is_empty()),
            ("password", self.password.is_empty()),
        ]
        .into_iter()
        .filter_map(|(name, empty)| empty.then_some(name))
        .collect::<Vec<_>>();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(LeadflowError::MissingCredentials(missing.join(", ")))
        }
    }

    /// Port 465 speaks TLS from the first byte; everything else upgrades
    /// via STARTTLS.
    pub fn implicit_tls(&self) -> bool {
        self.port == 465
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_units() {
        assert_eq!(
            StageTiming::new(30, TimingUnit::Minutes, "").to_duration(),
            Duration::minutes(30)
        );
        assert_eq!(
            StageTiming::new(12, TimingUnit::Hours, "").to_duration(),
            Duration::hours(12)
        );
        assert_eq!(
            StageTiming::new(7, TimingUnit::Days, "").to_duration(),
            Duration::days(7)
        );
    }

    #[test]
    fn test_delay_for_falls_back_to_builtin() {
        let mut settings = CompanySettings::default_for("u1");
        assert_eq!(settings.delay_for(Stage::CalledOnce), Duration::zero());
        assert_eq!(settings.delay_for(Stage::CalledTwice), Duration::days(7));

        settings.email_timings.insert(
            Stage::CalledTwice,
            StageTiming::new(3, TimingUnit::Days, "quick follow-up"),
        );
        assert_eq!(settings.delay_for(Stage::CalledTwice), Duration::days(3));
    }

    #[test]
    fn test_credentials_validate() {
        let creds = SmtpCredentials {
            host: "smtp.example.com".into(),
            port: 587,
            username: "mailer@example.com".into(),
            password: "hunter2".into(),
        };
        assert!(creds.validate().is_ok());
        assert!(!creds.implicit_tls());

        let creds = SmtpCredentials {
            host: String::new(),
            port: 465,
            username: "mailer@example.com".into(),
            password: String::new(),
        };
        let err = creds.validate().unwrap_err();
        match err {
            LeadflowError::MissingCredentials(fields) => {
                assert!(fields.contains("host"));
                assert!(fields.contains("password"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(creds.implicit_tls());
    }
}
