//! # Leadflow Mailer
//!
//! Outbound email over per-user SMTP accounts: async lettre transport,
//! implicit TLS on 465 / STARTTLS elsewhere, and a bounded retry loop with
//! exponential backoff. Errors come back classified so the automation layer
//! can log something a human can act on.

pub mod retry;
pub mod smtp;

pub use retry::RetryPolicy;
pub use smtp::{Mailer, OutboundEmail, SendReceipt, SmtpMailer};
