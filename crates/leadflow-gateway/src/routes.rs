//! API route handlers for the gateway.
//!
//! Every controller outcome is serialized as-is; errors map to an
//! `{ok: false, error}` envelope with the closest HTTP status. Manual
//! operations run one send inline, so they return within request latency.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use leadflow_core::error::LeadflowError;
use leadflow_core::lead::Lead;
use leadflow_core::settings::{CompanySettings, SmtpCredentials};
use leadflow_core::stage::Stage;
use leadflow_templates::{EmailTemplate, TemplateRepo};

use super::server::AppState;

fn error_response(e: LeadflowError) -> Response {
    let status = match &e {
        LeadflowError::LeadNotFound(_) => StatusCode::NOT_FOUND,
        LeadflowError::AlreadyActive(_) => StatusCode::CONFLICT,
        LeadflowError::InvalidStage(_) | LeadflowError::InvalidOperation(_) => {
            StatusCode::BAD_REQUEST
        }
        LeadflowError::MissingCredentials(_) => StatusCode::PRECONDITION_FAILED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(serde_json::json!({"ok": false, "error": e.to_string()})),
    )
        .into_response()
}

fn lead_json(lead: &Lead) -> serde_json::Value {
    serde_json::json!({
        "id": lead.id,
        "user_id": lead.user_id,
        "name": lead.name,
        "email": lead.email,
        "company_name": lead.company_name,
        "state": lead.state.as_str(),
        "stage": lead.stage.key(),
        "step": lead.step(),
        "email_status": lead.email_status.as_str(),
        "email_retry_count": lead.email_retry_count,
        "email_failure_count": lead.email_failure_count,
        "next_scheduled_email": lead.next_scheduled_email,
    })
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "leadflow-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

#[derive(Deserialize)]
pub struct LeadFilter {
    pub user_id: Option<String>,
}

/// List leads, optionally for one user.
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<LeadFilter>,
) -> Response {
    match state
        .controller
        .store()
        .list_leads(filter.user_id.as_deref())
        .await
    {
        Ok(leads) => Json(serde_json::json!({
            "ok": true,
            "leads": leads.iter().map(lead_json).collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct CreateLead {
    pub user_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub company_review: Option<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
}

/// Create a lead outside any sequence.
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateLead>,
) -> Response {
    let mut lead = Lead::new(&body.user_id, &body.name, &body.email);
    lead.company_name = body.company_name;
    lead.company_review = body.company_review;
    lead.owner_name = body.owner_name;

    match state.controller.store().save_lead(&lead).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({"ok": true, "lead": lead_json(&lead)})),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Fetch one lead.
pub async fn get_lead(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.controller.store().find_lead(&id).await {
        Ok(lead) => Json(serde_json::json!({"ok": true, "lead": lead_json(&lead)})).into_response(),
        Err(e) => error_response(e),
    }
}

/// Full automation status block, including history and recent errors.
pub async fn automation_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.controller.store().find_lead(&id).await {
        Ok(lead) => Json(serde_json::json!({
            "ok": true,
            "lead": lead_json(&lead),
            "email_history": lead.email_history,
            // The UI shows the last few failures
            "email_errors": lead.email_errors.iter().rev().take(3).collect::<Vec<_>>(),
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Enroll the lead into the sequence.
pub async fn start_automation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.controller.start(&id).await {
        Ok(lead) => Json(serde_json::json!({"ok": true, "lead": lead_json(&lead)})).into_response(),
        Err(e) => error_response(e),
    }
}

/// Pause automatic processing.
pub async fn pause_automation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.controller.pause(&id).await {
        Ok(lead) => Json(serde_json::json!({"ok": true, "lead": lead_json(&lead)})).into_response(),
        Err(e) => error_response(e),
    }
}

/// Resume a paused lead.
pub async fn resume_automation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.controller.resume(&id).await {
        Ok(lead) => Json(serde_json::json!({"ok": true, "lead": lead_json(&lead)})).into_response(),
        Err(e) => error_response(e),
    }
}

/// Permanently stop the sequence.
pub async fn stop_automation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.controller.stop(&id).await {
        Ok(lead) => Json(serde_json::json!({"ok": true, "lead": lead_json(&lead)})).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize, Default)]
pub struct ForceSendParams {
    pub to_stage: Option<String>,
}

/// Manual send, optionally jumping to a target stage
/// (`?to_stage=called_five_times`).
pub async fn force_send(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<ForceSendParams>,
) -> Response {
    let to_stage = match params.to_stage {
        Some(key) => match Stage::from_key(&key) {
            Ok(stage) => Some(stage),
            Err(e) => return error_response(e),
        },
        None => None,
    };

    match state.controller.force_send(&id, to_stage).await {
        Ok(outcome) => {
            Json(serde_json::json!({"ok": true, "result": outcome})).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// One `process_due` pass for this lead — the manual version of the cron
/// trigger.
pub async fn process_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.controller.process_due(&id).await {
        Ok(outcome) => {
            Json(serde_json::json!({"ok": true, "result": outcome})).into_response()
        }
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct TemplateFilter {
    pub user_id: Option<String>,
}

/// List stored templates.
pub async fn list_templates(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<TemplateFilter>,
) -> Response {
    match state
        .templates
        .repo()
        .list_templates(filter.user_id.as_deref())
        .await
    {
        Ok(templates) => {
            Json(serde_json::json!({"ok": true, "templates": templates})).into_response()
        }
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct SaveTemplate {
    pub user_id: Option<String>,
    pub stage: String,
    pub subject: String,
    pub html_content: String,
    #[serde(default)]
    pub text_content: String,
    #[serde(default)]
    pub timing: Option<leadflow_core::settings::StageTiming>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Create or replace a template; the variable list is recomputed on save.
pub async fn save_template(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SaveTemplate>,
) -> Response {
    let stage = match Stage::from_key(&body.stage) {
        Ok(stage) => stage,
        Err(e) => return error_response(e),
    };
    let timing = body.timing.unwrap_or_else(|| {
        leadflow_core::settings::StageTiming::new(
            stage.default_delay().num_days(),
            leadflow_core::settings::TimingUnit::Days,
            "",
        )
    });

    let mut template = EmailTemplate::new(
        body.user_id.as_deref(),
        stage,
        &body.subject,
        &body.html_content,
        &body.text_content,
        timing,
    );
    template.is_active = body.is_active;

    match state.templates.repo().save_template(&template).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({"ok": true, "template": template})),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Upsert a user's company settings.
pub async fn save_settings(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(mut settings): Json<CompanySettings>,
) -> Response {
    settings.user_id = user_id;
    match state.store.save_company_settings(&settings) {
        Ok(()) => Json(serde_json::json!({"ok": true})).into_response(),
        Err(e) => error_response(e),
    }
}

/// Upsert a user's SMTP account.
pub async fn save_credentials(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(creds): Json<SmtpCredentials>,
) -> Response {
    if let Err(e) = creds.validate() {
        return error_response(e);
    }
    match state.store.save_smtp_credentials(&user_id, &creds) {
        Ok(()) => Json(serde_json::json!({"ok": true})).into_response(),
        Err(e) => error_response(e),
    }
}
