//! SQLite store for leads, templates, company settings, and SMTP
//! credentials.
//!
//! Nested lists (history, errors, variables, timings) are JSON text
//! columns. Timestamps are fixed-width RFC 3339 UTC strings so the due
//! query can compare them lexicographically in SQL.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};

use leadflow_core::error::{LeadflowError, Result};
use leadflow_core::lead::{EmailStatus, Lead, SequenceState};
use leadflow_core::settings::{CompanySettings, SmtpCredentials, StageTiming};
use leadflow_core::stage::Stage;
use leadflow_core::traits::{ConfigSource, LeadStore};
use leadflow_templates::{EmailTemplate, TemplateRepo};

/// SQLite-backed store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn db_err(e: impl std::fmt::Display) -> LeadflowError {
    LeadflowError::Database(e.to_string())
}

impl SqliteStore {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        // WAL keeps template/settings reads cheap while a send writes
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        tracing::debug!("💾 SQLite store ready: {}", path.display());
        Ok(store)
    }

    /// In-memory database, mainly for tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(db_err)?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS leads (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL,
                company_name TEXT,
                company_review TEXT,
                owner_name TEXT,
                state TEXT NOT NULL DEFAULT 'inactive',
                stage TEXT NOT NULL DEFAULT 'called_once',
                email_status TEXT NOT NULL DEFAULT 'ready',
                email_retry_count INTEGER NOT NULL DEFAULT 0,
                email_failure_count INTEGER NOT NULL DEFAULT 0,
                next_scheduled_email TEXT,
                email_history TEXT NOT NULL DEFAULT '[]',
                email_errors TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_leads_due
                ON leads(state, next_scheduled_email);

            CREATE TABLE IF NOT EXISTS email_templates (
                id TEXT PRIMARY KEY,
                user_id TEXT,                    -- NULL marks a global template
                stage TEXT NOT NULL,
                subject TEXT NOT NULL,
                html_content TEXT NOT NULL,
                text_content TEXT NOT NULL DEFAULT '',
                variables TEXT NOT NULL DEFAULT '[]',
                is_active INTEGER NOT NULL DEFAULT 1,
                timing TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_templates_lookup
                ON email_templates(user_id, stage, is_active);

            CREATE TABLE IF NOT EXISTS company_settings (
                user_id TEXT PRIMARY KEY,
                company_name TEXT NOT NULL DEFAULT '',
                sender_name TEXT NOT NULL DEFAULT '',
                sender_email TEXT NOT NULL DEFAULT '',
                website_url TEXT NOT NULL DEFAULT '',
                service TEXT NOT NULL DEFAULT '',
                industry TEXT NOT NULL DEFAULT '',
                email_timings TEXT NOT NULL DEFAULT '{}'
            );

            CREATE TABLE IF NOT EXISTS smtp_credentials (
                user_id TEXT PRIMARY KEY,
                host TEXT NOT NULL DEFAULT '',
                port INTEGER NOT NULL DEFAULT 587,
                username TEXT NOT NULL DEFAULT '',
                password TEXT NOT NULL DEFAULT ''
            );
        ",
        )
        .map_err(|e| LeadflowError::Database(format!("migration: {e}")))?;
        Ok(())
    }

    fn row_to_lead(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lead> {
        let state: String = row.get("state")?;
        let stage: String = row.get("stage")?;
        let status: String = row.get("email_status")?;
        let history: String = row.get("email_history")?;
        let errors: String = row.get("email_errors")?;
        let next: Option<String> = row.get("next_scheduled_email")?;
        let created: String = row.get("created_at")?;
        let updated: String = row.get("updated_at")?;

        Ok(Lead {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            company_name: row.get("company_name")?,
            company_review: row.get("company_review")?,
            owner_name: row.get("owner_name")?,
            state: SequenceState::parse(&state),
            stage: Stage::from_key(&stage).unwrap_or_else(|_| Stage::first()),
            email_status: EmailStatus::parse(&status),
            email_retry_count: row.get("email_retry_count")?,
            email_failure_count: row.get("email_failure_count")?,
            next_scheduled_email: next.as_deref().map(parse_ts),
            email_history: serde_json::from_str(&history).unwrap_or_default(),
            email_errors: serde_json::from_str(&errors).unwrap_or_default(),
            created_at: parse_ts(&created),
            updated_at: parse_ts(&updated),
        })
    }

    fn row_to_template(row: &rusqlite::Row<'_>) -> rusqlite::Result<EmailTemplate> {
        let stage: String = row.get("stage")?;
        let variables: String = row.get("variables")?;
        let timing: String = row.get("timing")?;
        let updated: String = row.get("updated_at")?;

        Ok(EmailTemplate {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            stage: Stage::from_key(&stage).unwrap_or_else(|_| Stage::first()),
            subject: row.get("subject")?,
            html_content: row.get("html_content")?,
            text_content: row.get("text_content")?,
            variables: serde_json::from_str(&variables).unwrap_or_default(),
            is_active: row.get::<_, i64>("is_active")? != 0,
            timing: serde_json::from_str(&timing).unwrap_or_else(|_| {
                StageTiming::new(7, leadflow_core::settings::TimingUnit::Days, "")
            }),
            updated_at: parse_ts(&updated),
        })
    }

    /// Upsert a user's company settings.
    pub fn save_company_settings(&self, settings: &CompanySettings) -> Result<()> {
        let conn = self.conn.lock().map_err(db_err)?;
        let timings = serde_json::to_string(&settings.email_timings)
            .map_err(|e| LeadflowError::Database(format!("serialize timings: {e}")))?;
        conn.execute(
            "INSERT OR REPLACE INTO company_settings
             (user_id, company_name, sender_name, sender_email, website_url, service, industry, email_timings)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                settings.user_id,
                settings.company_name,
                settings.sender_name,
                settings.sender_email,
                settings.website_url,
                settings.service,
                settings.industry,
                timings,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Upsert a user's SMTP account.
    pub fn save_smtp_credentials(&self, user_id: &str, creds: &SmtpCredentials) -> Result<()> {
        let conn = self.conn.lock().map_err(db_err)?;
        conn.execute(
            "INSERT OR REPLACE INTO smtp_credentials (user_id, host, port, username, password)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user_id, creds.host, creds.port, creds.username, creds.password],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Remove a stored template.
    pub fn delete_template(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().map_err(db_err)?;
        conn.execute("DELETE FROM email_templates WHERE id = ?1", [id])
            .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl LeadStore for SqliteStore {
    async fn find_lead(&self, id: &str) -> Result<Lead> {
        let conn = self.conn.lock().map_err(db_err)?;
        let mut stmt = conn
            .prepare("SELECT * FROM leads WHERE id = ?1")
            .map_err(db_err)?;
        let mut rows = stmt
            .query_map([id], Self::row_to_lead)
            .map_err(db_err)?;
        match rows.next() {
            Some(lead) => lead.map_err(db_err),
            None => Err(LeadflowError::LeadNotFound(id.to_string())),
        }
    }

    async fn save_lead(&self, lead: &Lead) -> Result<()> {
        let history = serde_json::to_string(&lead.email_history)
            .map_err(|e| LeadflowError::Database(format!("serialize history: {e}")))?;
        let errors = serde_json::to_string(&lead.email_errors)
            .map_err(|e| LeadflowError::Database(format!("serialize errors: {e}")))?;

        let conn = self.conn.lock().map_err(db_err)?;
        conn.execute(
            "INSERT OR REPLACE INTO leads
             (id, user_id, name, email, company_name, company_review, owner_name,
              state, stage, email_status, email_retry_count, email_failure_count,
              next_scheduled_email, email_history, email_errors, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                lead.id,
                lead.user_id,
                lead.name,
                lead.email,
                lead.company_name,
                lead.company_review,
                lead.owner_name,
                lead.state.as_str(),
                lead.stage.key(),
                lead.email_status.as_str(),
                lead.email_retry_count,
                lead.email_failure_count,
                lead.next_scheduled_email.map(ts),
                history,
                errors,
                ts(lead.created_at),
                ts(lead.updated_at),
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    async fn leads_due(&self, now: DateTime<Utc>) -> Result<Vec<Lead>> {
        let conn = self.conn.lock().map_err(db_err)?;
        let mut stmt = conn
            .prepare(
                "SELECT * FROM leads
                 WHERE state = 'active'
                   AND email_status != 'max_retries_exceeded'
                   AND next_scheduled_email IS NOT NULL
                   AND next_scheduled_email <= ?1
                 ORDER BY next_scheduled_email",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([ts(now)], Self::row_to_lead)
            .map_err(db_err)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    async fn claim_sending(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().map_err(db_err)?;
        // Compare-and-swap on the status column: exactly one concurrent
        // trigger can flip it to 'sending'.
        let changed = conn
            .execute(
                "UPDATE leads SET email_status = 'sending', updated_at = ?2
                 WHERE id = ?1 AND email_status != 'sending'",
                params![id, ts(Utc::now())],
            )
            .map_err(db_err)?;
        Ok(changed == 1)
    }

    async fn set_email_status(&self, id: &str, status: EmailStatus) -> Result<()> {
        let conn = self.conn.lock().map_err(db_err)?;
        conn.execute(
            "UPDATE leads SET email_status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, status.as_str(), ts(Utc::now())],
        )
        .map_err(db_err)?;
        Ok(())
    }

    async fn list_leads(&self, user_id: Option<&str>) -> Result<Vec<Lead>> {
        let conn = self.conn.lock().map_err(db_err)?;
        let mut collect = |stmt: &mut rusqlite::Statement<'_>,
                           params: &[&dyn rusqlite::ToSql]|
         -> Result<Vec<Lead>> {
            let rows = stmt
                .query_map(params, Self::row_to_lead)
                .map_err(db_err)?;
            Ok(rows.filter_map(|r| r.ok()).collect())
        };
        match user_id {
            Some(uid) => {
                let mut stmt = conn
                    .prepare("SELECT * FROM leads WHERE user_id = ?1 ORDER BY created_at")
                    .map_err(db_err)?;
                collect(&mut stmt, &[&uid])
            }
            None => {
                let mut stmt = conn
                    .prepare("SELECT * FROM leads ORDER BY created_at")
                    .map_err(db_err)?;
                collect(&mut stmt, &[])
            }
        }
    }
}

#[async_trait]
impl TemplateRepo for SqliteStore {
    async fn find_user_template(
        &self,
        user_id: &str,
        stage: Stage,
    ) -> Result<Option<EmailTemplate>> {
        let conn = self.conn.lock().map_err(db_err)?;
        let mut stmt = conn
            .prepare(
                "SELECT * FROM email_templates
                 WHERE user_id = ?1 AND stage = ?2 AND is_active = 1
                 ORDER BY updated_at DESC LIMIT 1",
            )
            .map_err(db_err)?;
        let mut rows = stmt
            .query_map(params![user_id, stage.key()], Self::row_to_template)
            .map_err(db_err)?;
        match rows.next() {
            Some(t) => Ok(Some(t.map_err(db_err)?)),
            None => Ok(None),
        }
    }

    async fn find_global_template(&self, stage: Stage) -> Result<Option<EmailTemplate>> {
        let conn = self.conn.lock().map_err(db_err)?;
        let mut stmt = conn
            .prepare(
                "SELECT * FROM email_templates
                 WHERE user_id IS NULL AND stage = ?1 AND is_active = 1
                 ORDER BY updated_at DESC LIMIT 1",
            )
            .map_err(db_err)?;
        let mut rows = stmt
            .query_map(params![stage.key()], Self::row_to_template)
            .map_err(db_err)?;
        match rows.next() {
            Some(t) => Ok(Some(t.map_err(db_err)?)),
            None => Ok(None),
        }
    }

    async fn save_template(&self, template: &EmailTemplate) -> Result<()> {
        let variables = serde_json::to_string(&template.variables)
            .map_err(|e| LeadflowError::Database(format!("serialize variables: {e}")))?;
        let timing = serde_json::to_string(&template.timing)
            .map_err(|e| LeadflowError::Database(format!("serialize timing: {e}")))?;

        let conn = self.conn.lock().map_err(db_err)?;
        conn.execute(
            "INSERT OR REPLACE INTO email_templates
             (id, user_id, stage, subject, html_content, text_content,
              variables, is_active, timing, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                template.id,
                template.user_id,
                template.stage.key(),
                template.subject,
                template.html_content,
                template.text_content,
                variables,
                template.is_active as i64,
                timing,
                ts(template.updated_at),
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    async fn list_templates(&self, user_id: Option<&str>) -> Result<Vec<EmailTemplate>> {
        let conn = self.conn.lock().map_err(db_err)?;
        let mut collect = |stmt: &mut rusqlite::Statement<'_>,
                           params: &[&dyn rusqlite::ToSql]|
         -> Result<Vec<EmailTemplate>> {
            let rows = stmt
                .query_map(params, Self::row_to_template)
                .map_err(db_err)?;
            Ok(rows.filter_map(|r| r.ok()).collect())
        };
        match user_id {
            Some(uid) => {
                let mut stmt = conn
                    .prepare("SELECT * FROM email_templates WHERE user_id = ?1 ORDER BY stage")
                    .map_err(db_err)?;
                collect(&mut stmt, &[&uid])
            }
            None => {
                let mut stmt = conn
                    .prepare("SELECT * FROM email_templates ORDER BY user_id, stage")
                    .map_err(db_err)?;
                collect(&mut stmt, &[])
            }
        }
    }
}

#[async_trait]
impl ConfigSource for SqliteStore {
    async fn company_settings(&self, user_id: &str) -> Result<CompanySettings> {
        let conn = self.conn.lock().map_err(db_err)?;
        let mut stmt = conn
            .prepare("SELECT * FROM company_settings WHERE user_id = ?1")
            .map_err(db_err)?;
        let mut rows = stmt
            .query_map([user_id], |row| {
                let timings: String = row.get("email_timings")?;
                let email_timings: HashMap<Stage, StageTiming> =
                    serde_json::from_str(&timings).unwrap_or_default();
                Ok(CompanySettings {
                    user_id: row.get("user_id")?,
                    company_name: row.get("company_name")?,
                    sender_name: row.get("sender_name")?,
                    sender_email: row.get("sender_email")?,
                    website_url: row.get("website_url")?,
                    service: row.get("service")?,
                    industry: row.get("industry")?,
                    email_timings,
                })
            })
            .map_err(db_err)?;
        match rows.next() {
            Some(settings) => settings.map_err(db_err),
            // No record yet — substitution degrades to empty defaults
            None => Ok(CompanySettings::default_for(user_id)),
        }
    }

    async fn smtp_credentials(&self, user_id: &str) -> Result<SmtpCredentials> {
        let conn = self.conn.lock().map_err(db_err)?;
        let mut stmt = conn
            .prepare("SELECT host, port, username, password FROM smtp_credentials WHERE user_id = ?1")
            .map_err(db_err)?;
        let mut rows = stmt
            .query_map([user_id], |row| {
                Ok(SmtpCredentials {
                    host: row.get(0)?,
                    port: row.get(1)?,
                    username: row.get(2)?,
                    password: row.get(3)?,
                })
            })
            .map_err(db_err)?;
        match rows.next() {
            Some(creds) => {
                let creds = creds.map_err(db_err)?;
                creds.validate()?;
                Ok(creds)
            }
            None => Err(LeadflowError::MissingCredentials(format!(
                "no SMTP account configured for user {user_id}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use leadflow_core::settings::TimingUnit;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn lead() -> Lead {
        let mut lead = Lead::new("u1", "Ada", "ada@example.com");
        lead.state = SequenceState::Active;
        lead.next_scheduled_email = Some(Utc::now() - Duration::seconds(10));
        lead
    }

    #[test]
    fn test_open_and_migrate_on_disk() {
        let dir = std::env::temp_dir().join("leadflow-store-test");
        std::fs::create_dir_all(&dir).ok();
        let path = dir.join(format!("{}.db", uuid::Uuid::new_v4()));
        let _ = SqliteStore::open(&path).unwrap();
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_lead_round_trip() {
        let store = store();
        let mut l = lead();
        l.company_name = Some("Ada's Bakery".into());
        l.push_error(1, "first failure".into(), Utc::now());
        l.record_send(Stage::CalledOnce, Utc::now(), None, false);
        store.save_lead(&l).await.unwrap();

        let loaded = store.find_lead(&l.id).await.unwrap();
        assert_eq!(loaded.user_id, "u1");
        assert_eq!(loaded.company_name.as_deref(), Some("Ada's Bakery"));
        assert_eq!(loaded.state, SequenceState::Active);
        assert_eq!(loaded.stage, Stage::CalledOnce);
        assert_eq!(loaded.email_history.len(), 1);
        assert_eq!(loaded.email_errors.len(), 1);
        assert_eq!(loaded.email_errors[0].error, "first failure");
    }

    #[tokio::test]
    async fn test_find_missing_lead() {
        let err = store().find_lead("ghost").await.unwrap_err();
        assert!(matches!(err, LeadflowError::LeadNotFound(_)));
    }

    #[tokio::test]
    async fn test_leads_due_filters() {
        let store = store();
        let now = Utc::now();

        let due = lead();
        store.save_lead(&due).await.unwrap();

        let mut not_yet = lead();
        not_yet.next_scheduled_email = Some(now + Duration::days(1));
        store.save_lead(&not_yet).await.unwrap();

        let mut paused = lead();
        paused.state = SequenceState::Paused;
        store.save_lead(&paused).await.unwrap();

        let mut halted = lead();
        halted.email_status = EmailStatus::MaxRetriesExceeded;
        store.save_lead(&halted).await.unwrap();

        let found = store.leads_due(now).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, due.id);
    }

    #[tokio::test]
    async fn test_claim_is_exclusive() {
        let store = store();
        let l = lead();
        store.save_lead(&l).await.unwrap();

        assert!(store.claim_sending(&l.id).await.unwrap());
        // Second claim loses
        assert!(!store.claim_sending(&l.id).await.unwrap());

        // Releasing via a status write reopens the claim
        store
            .set_email_status(&l.id, EmailStatus::Failed)
            .await
            .unwrap();
        assert!(store.claim_sending(&l.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_template_lookup_chain() {
        let store = store();
        let timing = StageTiming::new(7, TimingUnit::Days, "");

        let global = EmailTemplate::new(
            None,
            Stage::CalledTwice,
            "global subject",
            "<p>g</p>",
            "g",
            timing.clone(),
        );
        store.save_template(&global).await.unwrap();

        // No user template yet — global wins
        let found = store
            .find_user_template("u1", Stage::CalledTwice)
            .await
            .unwrap();
        assert!(found.is_none());
        let found = store.find_global_template(Stage::CalledTwice).await.unwrap();
        assert_eq!(found.unwrap().subject, "global subject");

        let user = EmailTemplate::new(
            Some("u1"),
            Stage::CalledTwice,
            "user subject",
            "<p>u</p>",
            "u",
            timing.clone(),
        );
        store.save_template(&user).await.unwrap();
        let found = store
            .find_user_template("u1", Stage::CalledTwice)
            .await
            .unwrap();
        assert_eq!(found.unwrap().subject, "user subject");

        // Deactivated templates are invisible to resolution
        let mut inactive = user.clone();
        inactive.is_active = false;
        store.save_template(&inactive).await.unwrap();
        let found = store
            .find_user_template("u1", Stage::CalledTwice)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_company_settings_default_when_absent() {
        let store = store();
        let settings = store.company_settings("u1").await.unwrap();
        assert_eq!(settings.user_id, "u1");
        assert!(settings.company_name.is_empty());

        let mut custom = CompanySettings::default_for("u1");
        custom.company_name = "Acme".into();
        custom
            .email_timings
            .insert(Stage::CalledTwice, StageTiming::new(3, TimingUnit::Days, ""));
        store.save_company_settings(&custom).unwrap();

        let settings = store.company_settings("u1").await.unwrap();
        assert_eq!(settings.company_name, "Acme");
        assert_eq!(
            settings.delay_for(Stage::CalledTwice),
            Duration::days(3)
        );
    }

    #[tokio::test]
    async fn test_smtp_credentials_missing_and_incomplete() {
        let store = store();
        let err = store.smtp_credentials("u1").await.unwrap_err();
        assert!(matches!(err, LeadflowError::MissingCredentials(_)));

        store
            .save_smtp_credentials(
                "u1",
                &SmtpCredentials {
                    host: "smtp.example.com".into(),
                    port: 465,
                    username: "mailer".into(),
                    password: String::new(), // incomplete
                },
            )
            .unwrap();
        let err = store.smtp_credentials("u1").await.unwrap_err();
        assert!(matches!(err, LeadflowError::MissingCredentials(_)));

        store
            .save_smtp_credentials(
                "u1",
                &SmtpCredentials {
                    host: "smtp.example.com".into(),
                    port: 465,
                    username: "mailer".into(),
                    password: "secret".into(),
                },
            )
            .unwrap();
        let creds = store.smtp_credentials("u1").await.unwrap();
        assert!(creds.implicit_tls());
    }

    #[tokio::test]
    async fn test_list_leads_by_user() {
        let store = store();
        store.save_lead(&lead()).await.unwrap();
        store.save_lead(&lead()).await.unwrap();
        let mut other = lead();
        other.user_id = "u2".into();
        store.save_lead(&other).await.unwrap();

        assert_eq!(store.list_leads(Some("u1")).await.unwrap().len(), 2);
        assert_eq!(store.list_leads(None).await.unwrap().len(), 3);
    }
}
