//! Email template records.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use leadflow_core::settings::StageTiming;
use leadflow_core::stage::Stage;

/// A per-stage email template. `user_id = None` marks a global template
/// shared by every user; builtin defaults are compiled in as the last
/// fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub stage: Stage,
    pub subject: String,
    pub html_content: String,
    #[serde(default)]
    pub text_content: String,
    /// `{{TOKEN}}` names appearing in subject or body, recomputed on save.
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub timing: StageTiming,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl EmailTemplate {
    pub fn new(
        user_id: Option<&str>,
        stage: Stage,
        subject: &str,
        html_content: &str,
        text_content: &str,
        timing: StageTiming,
    ) -> Self {
        let mut template = Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.map(String::from),
            stage,
            subject: subject.to_string(),
            html_content: html_content.to_string(),
            text_content: text_content.to_string(),
            variables: Vec::new(),
            is_active: true,
            timing,
            updated_at: Utc::now(),
        };
        template.refresh_variables();
        template
    }

    /// Rescan subject and bodies for `{{TOKEN}}` placeholders.
    pub fn refresh_variables(&mut self) {
        let re = token_regex();
        let mut seen = Vec::new();
        for text in [&self.subject, &self.html_content, &self.text_content] {
            for cap in re.captures_iter(text) {
                let name = cap[1].to_string();
                if !seen.contains(&name) {
                    seen.push(name);
                }
            }
        }
        self.variables = seen;
    }

    /// Mark the template as edited.
    pub fn touch(&mut self) {
        self.refresh_variables();
        self.updated_at = Utc::now();
    }

    pub fn is_global(&self) -> bool {
        self.user_id.is_none()
    }
}

/// The placeholder shape: `{{UPPER_SNAKE}}`, matched case-sensitively.
pub(crate) fn token_regex() -> Regex {
    Regex::new(r"\{\{([A-Z][A-Z0-9_]*)\}\}").expect("static regex")
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::settings::TimingUnit;

    #[test]
    fn test_variable_extraction() {
        let template = EmailTemplate::new(
            None,
            Stage::CalledOnce,
            "Hi {{LEAD_NAME}}, a note from {{COMPANY_NAME}}",
            "<p>Hello {{LEAD_NAME}}, we loved {{COMPANY_REVIEW}}.</p>",
            "Hello {{LEAD_NAME}}",
            StageTiming::new(0, TimingUnit::Days, "immediate"),
        );
        assert_eq!(
            template.variables,
            vec!["LEAD_NAME", "COMPANY_NAME", "COMPANY_REVIEW"]
        );
    }

    #[test]
    fn test_lowercase_tokens_ignored() {
        let template = EmailTemplate::new(
            None,
            Stage::CalledOnce,
            "{{lead_name}} is not a token",
            "but {{WEBSITE_URL}} is",
            "",
            StageTiming::new(0, TimingUnit::Days, ""),
        );
        assert_eq!(template.variables, vec!["WEBSITE_URL"]);
    }

    #[test]
    fn test_touch_refreshes() {
        let mut template = EmailTemplate::new(
            Some("u1"),
            Stage::CalledTwice,
            "Subject",
            "Body",
            "",
            StageTiming::new(7, TimingUnit::Days, ""),
        );
        assert!(template.variables.is_empty());
        template.subject = "Hi {{LEAD_NAME}}".into();
        template.touch();
        assert_eq!(template.variables, vec!["LEAD_NAME"]);
    }
}
