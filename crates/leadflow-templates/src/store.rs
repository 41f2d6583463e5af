//! Template resolution: user-specific → global → builtin.

use std::sync::Arc;

use async_trait::async_trait;

use leadflow_core::error::Result;
use leadflow_core::stage::Stage;

use crate::defaults;
use crate::template::EmailTemplate;

/// Persistence interface for stored templates. The SQLite store implements
/// this; tests use in-memory fakes.
#[async_trait]
pub trait TemplateRepo: Send + Sync {
    /// Active template owned by `user_id` for `stage`, if any.
    async fn find_user_template(&self, user_id: &str, stage: Stage)
    -> Result<Option<EmailTemplate>>;

    /// Active global (ownerless) template for `stage`, if any.
    async fn find_global_template(&self, stage: Stage) -> Result<Option<EmailTemplate>>;

    /// Upsert a template.
    async fn save_template(&self, template: &EmailTemplate) -> Result<()>;

    /// All stored templates, optionally restricted to one user's.
    async fn list_templates(&self, user_id: Option<&str>) -> Result<Vec<EmailTemplate>>;
}

/// Read-mostly template lookup with the fallback chain. Safe for concurrent
/// use during sends; resolution has no side effects.
#[derive(Clone)]
pub struct TemplateStore {
    repo: Arc<dyn TemplateRepo>,
}

impl TemplateStore {
    pub fn new(repo: Arc<dyn TemplateRepo>) -> Self {
        Self { repo }
    }

    /// Resolve the template for `(stage, user_id)`.
    ///
    /// Order: active user template, active global template, builtin
    /// default. Cannot fail for a valid stage — the builtin always exists.
    pub async fn resolve(&self, stage: Stage, user_id: Option<&str>) -> Result<EmailTemplate> {
        if let Some(user_id) = user_id
            && let Some(template) = self.repo.find_user_template(user_id, stage).await?
        {
            tracing::debug!("Resolved user template for ({user_id}, {})", stage.key());
            return Ok(template);
        }

        if let Some(template) = self.repo.find_global_template(stage).await? {
            tracing::debug!("Resolved global template for {}", stage.key());
            return Ok(template);
        }

        tracing::debug!("Falling back to builtin template for {}", stage.key());
        Ok(defaults::builtin(stage))
    }

    pub fn repo(&self) -> &Arc<dyn TemplateRepo> {
        &self.repo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::settings::{StageTiming, TimingUnit};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeRepo {
        user: Mutex<HashMap<(String, Stage), EmailTemplate>>,
        global: Mutex<HashMap<Stage, EmailTemplate>>,
    }

    #[async_trait]
    impl TemplateRepo for FakeRepo {
        async fn find_user_template(
            &self,
            user_id: &str,
            stage: Stage,
        ) -> Result<Option<EmailTemplate>> {
            Ok(self
                .user
                .lock()
                .unwrap()
                .get(&(user_id.to_string(), stage))
                .filter(|t| t.is_active)
                .cloned())
        }

        async fn find_global_template(&self, stage: Stage) -> Result<Option<EmailTemplate>> {
            Ok(self
                .global
                .lock()
                .unwrap()
                .get(&stage)
                .filter(|t| t.is_active)
                .cloned())
        }

        async fn save_template(&self, template: &EmailTemplate) -> Result<()> {
            match &template.user_id {
                Some(uid) => {
                    self.user
                        .lock()
                        .unwrap()
                        .insert((uid.clone(), template.stage), template.clone());
                }
                None => {
                    self.global
                        .lock()
                        .unwrap()
                        .insert(template.stage, template.clone());
                }
            }
            Ok(())
        }

        async fn list_templates(&self, _user_id: Option<&str>) -> Result<Vec<EmailTemplate>> {
            Ok(Vec::new())
        }
    }

    fn make(user_id: Option<&str>, stage: Stage, subject: &str) -> EmailTemplate {
        EmailTemplate::new(
            user_id,
            stage,
            subject,
            "<p>body</p>",
            "body",
            StageTiming::new(7, TimingUnit::Days, ""),
        )
    }

    #[tokio::test]
    async fn test_user_template_wins() {
        let repo = Arc::new(FakeRepo::default());
        repo.save_template(&make(Some("u1"), Stage::CalledTwice, "user subject"))
            .await
            .unwrap();
        repo.save_template(&make(None, Stage::CalledTwice, "global subject"))
            .await
            .unwrap();

        let store = TemplateStore::new(repo);
        let resolved = store
            .resolve(Stage::CalledTwice, Some("u1"))
            .await
            .unwrap();
        assert_eq!(resolved.subject, "user subject");
    }

    #[tokio::test]
    async fn test_global_fallback() {
        let repo = Arc::new(FakeRepo::default());
        repo.save_template(&make(None, Stage::CalledTwice, "global subject"))
            .await
            .unwrap();

        let store = TemplateStore::new(repo);
        // u1 has no template of their own
        let resolved = store
            .resolve(Stage::CalledTwice, Some("u1"))
            .await
            .unwrap();
        assert_eq!(resolved.subject, "global subject");
    }

    #[tokio::test]
    async fn test_builtin_fallback() {
        let store = TemplateStore::new(Arc::new(FakeRepo::default()));
        let resolved = store
            .resolve(Stage::CalledTwice, Some("u1"))
            .await
            .unwrap();
        assert_eq!(resolved.id, "builtin-called_twice");
        assert!(resolved.is_active);
    }

    #[tokio::test]
    async fn test_inactive_user_template_skipped() {
        let repo = Arc::new(FakeRepo::default());
        let mut t = make(Some("u1"), Stage::CalledTwice, "inactive");
        t.is_active = false;
        repo.save_template(&t).await.unwrap();
        repo.save_template(&make(None, Stage::CalledTwice, "global subject"))
            .await
            .unwrap();

        let store = TemplateStore::new(repo);
        let resolved = store
            .resolve(Stage::CalledTwice, Some("u1"))
            .await
            .unwrap();
        assert_eq!(resolved.subject, "global subject");
    }
}
