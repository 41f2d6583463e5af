//! `{{TOKEN}}` variable substitution.
//!
//! Substitution is literal, global, and case-sensitive. Recognized tokens
//! with no supplied value render as empty strings; unknown tokens pass
//! through verbatim so template authors can keep ad hoc placeholders for
//! preview-only use. Rendering never fails.

use std::collections::HashMap;

use leadflow_core::lead::Lead;
use leadflow_core::settings::CompanySettings;

use crate::template::{EmailTemplate, token_regex};

/// Tokens the engine knows about; these default to "" when unset.
pub const RECOGNIZED_TOKENS: [&str; 9] = [
    "LEAD_NAME",
    "OWNER_NAME",
    "COMPANY_NAME",
    "COMPANY_REVIEW",
    "SENDER_NAME",
    "SENDER_EMAIL",
    "COMPANY_SERVICE",
    "TARGET_INDUSTRY",
    "WEBSITE_URL",
];

/// A rendered email, ready for the mailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Token → value map assembled from a lead, its user's company settings,
/// and the process defaults.
#[derive(Debug, Clone, Default)]
pub struct VariableSet {
    values: HashMap<String, String>,
}

impl VariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the standard set for one send.
    ///
    /// `SENDER_NAME` precedence: per-send override, then the company
    /// settings value, then the process default.
    pub fn for_send(
        lead: &Lead,
        settings: &CompanySettings,
        default_sender_name: &str,
        sender_override: Option<&str>,
    ) -> Self {
        let sender_name = sender_override
            .filter(|s| !s.is_empty())
            .map(String::from)
            .unwrap_or_else(|| {
                if settings.sender_name.is_empty() {
                    default_sender_name.to_string()
                } else {
                    settings.sender_name.clone()
                }
            });

        let mut vars = Self::new();
        vars.set("LEAD_NAME", &lead.name);
        vars.set("OWNER_NAME", lead.owner_name.as_deref().unwrap_or_default());
        vars.set(
            "COMPANY_NAME",
            lead.company_name.as_deref().unwrap_or_default(),
        );
        vars.set(
            "COMPANY_REVIEW",
            lead.company_review.as_deref().unwrap_or_default(),
        );
        vars.set("SENDER_NAME", &sender_name);
        vars.set("SENDER_EMAIL", &settings.sender_email);
        vars.set("COMPANY_SERVICE", &settings.service);
        vars.set("TARGET_INDUSTRY", &settings.industry);
        vars.set("WEBSITE_URL", &settings.website_url);
        vars
    }

    pub fn set(&mut self, token: &str, value: &str) -> &mut Self {
        self.values.insert(token.to_string(), value.to_string());
        self
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.values.get(token).map(String::as_str)
    }
}

/// Substitute variables into a template's subject and bodies.
pub fn render(template: &EmailTemplate, vars: &VariableSet) -> RenderedEmail {
    RenderedEmail {
        subject: substitute(&template.subject, vars),
        html: substitute(&template.html_content, vars),
        text: substitute(&template.text_content, vars),
    }
}

fn substitute(input: &str, vars: &VariableSet) -> String {
    let re = token_regex();
    re.replace_all(input, |caps: &regex::Captures| {
        let token = &caps[1];
        match vars.get(token) {
            Some(value) => value.to_string(),
            None if RECOGNIZED_TOKENS.contains(&token) => String::new(),
            // Unknown placeholder: leave it exactly as written
            None => caps[0].to_string(),
        }
    })
    .into_owned()
}
