use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;

use crate::analysis::{run_smart_analysis, AnalyzeRequest, AnalyzeResponse};
use crate::config::MAX_UPLOAD_BYTES;
use crate::errors::AppError;
use crate::session::handlers::bearer_token;
use crate::state::AppState;
use crate::upstream::types::{ScoreReport, ScoreRequest};

#[derive(Serialize)]
pub struct ExtractTextResponse {
    pub text: String,
}

/// POST /api/v1/extract
///
/// Forwards the uploaded resume file to the upstream extraction service and
/// returns the text, normalized (extraction artifacts and bullet glyphs
/// stripped per line).
pub async fn handle_extract(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractTextResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .unwrap_or("resume")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::PayloadTooLarge(format!(
                "file exceeds {} bytes",
                MAX_UPLOAD_BYTES
            )));
        }

        let raw = state.upstream.extract_text(file_name, data).await?;
        let text = state.parser.normalize_extracted(&raw);
        return Ok(Json(ExtractTextResponse { text }));
    }

    Err(AppError::Validation("missing 'file' field".to_string()))
}

/// POST /api/v1/score
pub async fn handle_score(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<ScoreReport>, AppError> {
    if req.resume_text.trim().is_empty() || req.job_text.trim().is_empty() {
        return Err(AppError::Validation(
            "resume_text and job_text must not be empty".to_string(),
        ));
    }
    let report = state
        .upstream
        .score(&ScoreRequest {
            resume_text: req.resume_text,
            job_text: req.job_text,
            job_title: req.job_title,
        })
        .await?;
    Ok(Json(report))
}

/// POST /api/v1/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let token = bearer_token(&headers);
    let response = run_smart_analysis(
        state.upstream.as_ref(),
        &state.sessions,
        &state.parser,
        token.as_deref(),
        &req,
    )
    .await?;
    Ok(Json(response))
}
