use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::prompt::{self, Phase};
use crate::state::AppState;

/// Multipart field carrying the uploaded log.
const FILE_FIELD: &str = "file";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub log_path: String,
    pub result_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRootCauseRequest {
    pub log_path: String,
    pub chosen_root_cause: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRootCauseResponse {
    pub result_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmFixPlanRequest {
    pub log_path: String,
    pub fix_plan: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmFixPlanResponse {
    pub result_text: String,
    pub report_path: String,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Send one phase instruction to the agent and wait for its text.
async fn run_phase(app: &AppState, phase: Phase, instruction: String) -> Result<String, AppError> {
    tracing::info!(phase = phase.as_str(), "dispatching agent task");
    let started = std::time::Instant::now();
    let text = app
        .dispatcher
        .dispatch(&instruction, phase.tool_access())
        .await?;
    tracing::info!(
        phase = phase.as_str(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        chars = text.len(),
        "agent task finished"
    );
    Ok(text)
}

/// Pull the text of the first `file` field. A `file` field without a
/// filename is a plain form value, not an upload.
async fn read_upload(multipart: &mut Multipart) -> Result<String, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        if field.file_name().is_none() {
            break;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }
    Err(AppError::bad_request("no file"))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/upload-log: store the log and ask the agent for candidate
/// root causes.
pub async fn upload_log(
    State(app): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let text = read_upload(&mut multipart).await?;
    let log_path = app.logs.write(&text).await?;
    tracing::info!(%log_path, bytes = text.len(), "log uploaded");

    let result_text = run_phase(&app, Phase::Analyze, prompt::analyze_instruction(&log_path)).await?;
    Ok(Json(UploadResponse {
        log_path,
        result_text,
    }))
}

/// POST /api/confirm-root-cause: ask for fix plans for the chosen cause.
pub async fn confirm_root_cause(
    State(app): State<AppState>,
    Json(body): Json<ConfirmRootCauseRequest>,
) -> Result<Json<ConfirmRootCauseResponse>, AppError> {
    let instruction = prompt::plan_instruction(&body.log_path, &body.chosen_root_cause);
    let result_text = run_phase(&app, Phase::Plan, instruction).await?;
    Ok(Json(ConfirmRootCauseResponse { result_text }))
}

/// POST /api/confirm-fix-plan: apply the plan, commit, push and report.
pub async fn confirm_fix_plan(
    State(app): State<AppState>,
    Json(body): Json<ConfirmFixPlanRequest>,
) -> Result<Json<ConfirmFixPlanResponse>, AppError> {
    let report_path = app.config.report_path.clone();
    let instruction = prompt::fix_instruction(
        &body.log_path,
        &body.fix_plan,
        &app.config.branch,
        &report_path,
    );
    let result_text = run_phase(&app, Phase::Fix, instruction).await?;
    Ok(Json(ConfirmFixPlanResponse {
        result_text,
        report_path,
    }))
}
