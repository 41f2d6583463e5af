//! SMTP sending via async lettre.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use regex::Regex;

use leadflow_core::error::{LeadflowError, Result};
use leadflow_core::settings::SmtpCredentials;

use crate::retry::RetryPolicy;

/// A fully rendered email ready for transmission.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub sender_name: String,
    pub sender_email: String,
}

/// Result of a successful send.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub message_id: String,
    pub attempts: u32,
}

/// Sending interface — the automation controller only sees this, so tests
/// swap in stubs and never touch the network.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, creds: &SmtpCredentials, email: &OutboundEmail) -> Result<SendReceipt>;
}

/// Production mailer: one transport per attempt, verified before use.
pub struct SmtpMailer {
    policy: RetryPolicy,
    socket_timeout: std::time::Duration,
}

impl Default for SmtpMailer {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::default(),
            socket_timeout: std::time::Duration::from_secs(90),
        }
    }
}

impl SmtpMailer {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    fn build_transport(
        &self,
        creds: &SmtpCredentials,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let auth = Credentials::new(creds.username.clone(), creds.password.clone());
        // 465 speaks TLS from the first byte; everything else upgrades via
        // STARTTLS on the configured port.
        let builder = if creds.implicit_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&creds.host)
                .map_err(|e| LeadflowError::SmtpNetwork {
                    message: format!("SMTP relay setup: {e}"),
                    attempts: 0,
                })?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&creds.host)
                .map_err(|e| LeadflowError::SmtpNetwork {
                    message: format!("SMTP relay setup: {e}"),
                    attempts: 0,
                })?
                .port(creds.port)
        };
        Ok(builder
            .credentials(auth)
            .timeout(Some(self.socket_timeout))
            .build())
    }

    fn build_message(&self, email: &OutboundEmail) -> Result<(Message, String)> {
        let from: Mailbox = format!("{} <{}>", email.sender_name, email.sender_email)
            .parse()
            .map_err(|e| LeadflowError::SmtpEnvelope {
                message: format!("invalid sender address: {e}"),
                attempts: 0,
            })?;

        let to: Mailbox = match &email.to_name {
            Some(name) => format!("{} <{}>", name, email.to),
            None => email.to.clone(),
        }
        .parse()
        .map_err(|e| LeadflowError::SmtpEnvelope {
            message: format!("invalid recipient address: {e}"),
            attempts: 0,
        })?;

        let message_id = format!("<{}@leadflow>", uuid::Uuid::new_v4());
        let body = if email.text.is_empty() {
            MultiPart::mixed().singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(email.html.clone()),
            )
        } else {
            MultiPart::alternative_plain_html(email.text.clone(), email.html.clone())
        };

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject.as_str())
            .message_id(Some(message_id.clone()))
            .multipart(body)
            .map_err(|e| LeadflowError::SmtpEnvelope {
                message: format!("message build: {e}"),
                attempts: 0,
            })?;

        Ok((message, message_id))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, creds: &SmtpCredentials, email: &OutboundEmail) -> Result<SendReceipt> {
        // Preconditions, before any connection is opened
        creds.validate()?;
        check_preconditions(email)?;

        let (message, message_id) = self.build_message(email)?;

        let mut last_error = String::new();
        for attempt in 1..=self.policy.max_attempts {
            // Fresh transport per attempt so one dead connection cannot
            // poison the remaining tries
            let transport = self.build_transport(creds)?;

            let verified = match transport.test_connection().await {
                Ok(ok) => ok,
                Err(e) => {
                    last_error = e.to_string();
                    tracing::warn!(
                        "SMTP verify failed (attempt {attempt}/{}): {last_error}",
                        self.policy.max_attempts
                    );
                    if self.policy.should_retry(attempt) {
                        tokio::time::sleep(self.policy.backoff(attempt)).await;
                    }
                    continue;
                }
            };
            if !verified {
                last_error = "SMTP connection verification returned false".into();
                if self.policy.should_retry(attempt) {
                    tokio::time::sleep(self.policy.backoff(attempt)).await;
                }
                continue;
            }

            match transport.send(message.clone()).await {
                Ok(_) => {
                    tracing::info!("📤 Email sent to {} (attempt {attempt})", email.to);
                    return Ok(SendReceipt {
                        message_id,
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    last_error = e.to_string();
                    tracing::warn!(
                        "SMTP send failed (attempt {attempt}/{}): {last_error}",
                        self.policy.max_attempts
                    );
                    if self.policy.should_retry(attempt) {
                        tokio::time::sleep(self.policy.backoff(attempt)).await;
                    }
                }
            }
        }

        Err(classify(&last_error, self.policy.max_attempts))
    }
}

/// Basic shape checks: recipient address, non-empty subject and html.
fn check_preconditions(email: &OutboundEmail) -> Result<()> {
    if !email_shape().is_match(&email.to) {
        return Err(LeadflowError::SmtpEnvelope {
            message: format!("recipient '{}' is not a valid email address", email.to),
            attempts: 0,
        });
    }
    if email.subject.trim().is_empty() {
        return Err(LeadflowError::SmtpEnvelope {
            message: "empty subject".into(),
            attempts: 0,
        });
    }
    if email.html.trim().is_empty() {
        return Err(LeadflowError::SmtpEnvelope {
            message: "empty body".into(),
            attempts: 0,
        });
    }
    Ok(())
}

fn email_shape() -> Regex {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex")
}

/// Map a transport error message onto the error taxonomy. SMTP servers are
/// wildly inconsistent, so this goes by reply codes first and well-known
/// phrases second.
fn classify(message: &str, attempts: u32) -> LeadflowError {
    let lower = message.to_lowercase();
    let msg = message.to_string();

    if lower.contains("535")
        || lower.contains("authentication")
        || lower.contains("username and password")
        || lower.contains("invalid credentials")
    {
        LeadflowError::SmtpAuth {
            message: msg,
            attempts,
        }
    } else if lower.contains("timed out") || lower.contains("timeout") {
        LeadflowError::SmtpTimeout {
            message: msg,
            attempts,
        }
    } else if lower.contains("550")
        || lower.contains("553")
        || lower.contains("recipient")
        || lower.contains("mailbox")
        || lower.contains("envelope")
    {
        LeadflowError::SmtpEnvelope {
            message: msg,
            attempts,
        }
    } else if lower.contains("connection")
        || lower.contains("refused")
        || lower.contains("dns")
        || lower.contains("resolve")
        || lower.contains("network")
        || lower.contains("broken pipe")
    {
        LeadflowError::SmtpNetwork {
            message: msg,
            attempts,
        }
    } else {
        LeadflowError::Smtp {
            message: msg,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> SmtpCredentials {
        SmtpCredentials {
            host: "smtp.example.com".into(),
            port: 587,
            username: "mailer@example.com".into(),
            password: "hunter2".into(),
        }
    }

    fn email() -> OutboundEmail {
        OutboundEmail {
            to: "lead@example.com".into(),
            to_name: Some("Ada".into()),
            subject: "Hello".into(),
            html: "<p>Hi</p>".into(),
            text: "Hi".into(),
            sender_name: "Sender".into(),
            sender_email: "sender@example.com".into(),
        }
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_send() {
        let mailer = SmtpMailer::default();
        let mut c = creds();
        c.password.clear();
        let err = mailer.send(&c, &email()).await.unwrap_err();
        assert!(matches!(err, LeadflowError::MissingCredentials(_)));
    }

    #[tokio::test]
    async fn test_bad_recipient_rejected_without_network() {
        let mailer = SmtpMailer::default();
        let mut e = email();
        e.to = "not-an-address".into();
        let err = mailer.send(&creds(), &e).await.unwrap_err();
        assert!(matches!(err, LeadflowError::SmtpEnvelope { .. }));
    }

    #[tokio::test]
    async fn test_empty_subject_rejected() {
        let mailer = SmtpMailer::default();
        let mut e = email();
        e.subject = "  ".into();
        let err = mailer.send(&creds(), &e).await.unwrap_err();
        assert!(matches!(err, LeadflowError::SmtpEnvelope { .. }));
    }

    #[test]
    fn test_email_shape() {
        let re = email_shape();
        assert!(re.is_match("a@b.co"));
        assert!(re.is_match("first.last+tag@mail.example.org"));
        assert!(!re.is_match("a@b"));
        assert!(!re.is_match("a b@c.d"));
        assert!(!re.is_match("@c.d"));
    }

    #[test]
    fn test_classify_auth() {
        let err = classify("535 5.7.8 Username and Password not accepted", 3);
        assert!(matches!(err, LeadflowError::SmtpAuth { attempts: 3, .. }));
    }

    #[test]
    fn test_classify_timeout() {
        let err = classify("connection timed out after 60s", 3);
        assert!(matches!(err, LeadflowError::SmtpTimeout { .. }));
    }

    #[test]
    fn test_classify_envelope() {
        let err = classify("550 5.1.1 mailbox unavailable", 3);
        assert!(matches!(err, LeadflowError::SmtpEnvelope { .. }));
    }

    #[test]
    fn test_classify_network() {
        let err = classify("connection refused", 3);
        assert!(matches!(err, LeadflowError::SmtpNetwork { .. }));
    }

    #[test]
    fn test_classify_generic_carries_attempts() {
        let err = classify("451 temporary local problem", 3);
        match err {
            LeadflowError::Smtp { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected: {other}"),
        }
    }
}
