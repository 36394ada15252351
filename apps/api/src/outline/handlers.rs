use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::outline::edits::{apply_suggestion, edit_item_text, Suggestion};
use crate::outline::render::{render, ExportFormat};
use crate::outline::ResumeOutline;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ParseRequest {
    pub text: String,
}

/// POST /api/v1/outline
pub async fn handle_parse(
    State(state): State<AppState>,
    Json(req): Json<ParseRequest>,
) -> Json<ResumeOutline> {
    Json(state.parser.parse(&req.text))
}

#[derive(Deserialize)]
pub struct ApplyRequest {
    pub outline: ResumeOutline,
    pub suggestion: Suggestion,
}

#[derive(Serialize)]
pub struct ApplyResponse {
    pub outline: ResumeOutline,
    pub applied: bool,
}

/// POST /api/v1/outline/apply
pub async fn handle_apply(
    Json(mut req): Json<ApplyRequest>,
) -> Result<Json<ApplyResponse>, AppError> {
    let applied = apply_suggestion(&mut req.outline, &req.suggestion);
    Ok(Json(ApplyResponse {
        outline: req.outline,
        applied,
    }))
}

#[derive(Deserialize)]
pub struct EditItemRequest {
    pub outline: ResumeOutline,
    pub item_id: String,
    pub text: String,
}

/// POST /api/v1/outline/edit
pub async fn handle_edit_item(
    Json(mut req): Json<EditItemRequest>,
) -> Result<Json<ApplyResponse>, AppError> {
    let applied = edit_item_text(&mut req.outline, &req.item_id, &req.text);
    if !applied {
        return Err(AppError::NotFound(format!("item {}", req.item_id)));
    }
    Ok(Json(ApplyResponse {
        outline: req.outline,
        applied,
    }))
}

#[derive(Deserialize)]
pub struct ExportRequest {
    pub outline: ResumeOutline,
    #[serde(default)]
    pub format: ExportFormat,
}

#[derive(Serialize)]
pub struct ExportResponse {
    pub format: ExportFormat,
    pub content: String,
}

/// POST /api/v1/outline/export
pub async fn handle_export(Json(req): Json<ExportRequest>) -> Json<ExportResponse> {
    Json(ExportResponse {
        content: render(&req.outline, req.format),
        format: req.format,
    })
}
