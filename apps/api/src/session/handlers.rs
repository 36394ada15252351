use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::session::retry::{poll_until, PollOutcome};
use crate::state::AppState;
use crate::upstream::types::{CheckoutRequest, CheckoutSession, Profile};

/// Pulls the bearer token out of the Authorization header, if present.
/// Requests without one are forwarded unauthenticated and the upstream
/// decides what that means.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

/// GET /api/v1/me
///
/// Revalidates the session cache against the upstream and returns the
/// profile, or null for an unauthenticated session. The store caches one
/// session per deployment; it is not keyed by bearer token.
pub async fn handle_me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Option<Profile>>, AppError> {
    let token = bearer_token(&headers);
    let profile = state.sessions.revalidate(token.as_deref()).await?;
    Ok(Json(profile))
}

/// POST /api/v1/profile
///
/// Forwards a partial profile update upstream and pushes the result into the
/// session cache so subscribers see it immediately.
pub async fn handle_update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(fields): Json<serde_json::Value>,
) -> Result<Json<Profile>, AppError> {
    let token = bearer_token(&headers);
    let profile = state
        .upstream
        .update_profile(token.as_deref(), &fields)
        .await?;
    state.sessions.apply(profile.clone());
    Ok(Json(profile))
}

/// POST /api/v1/payments/checkout
pub async fn handle_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<CheckoutSession>, AppError> {
    let token = bearer_token(&headers);
    let session = state
        .upstream
        .create_checkout(token.as_deref(), &req)
        .await?;
    Ok(Json(session))
}

#[derive(Debug, Deserialize, Default)]
pub struct ConfirmRequest {
    /// Credit balance before checkout. Defaults to the cached balance so a
    /// plain POST after redirect still does the right thing.
    #[serde(default)]
    pub baseline_credits: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    /// False means the webhook never landed within the polling budget; the
    /// caller may proceed anyway and the balance will catch up later.
    pub confirmed: bool,
    pub attempts: u32,
    pub profile: Option<Profile>,
}

/// POST /api/v1/payments/confirm
///
/// Billing webhooks are eventually consistent: after checkout the credits
/// may take a few seconds to appear. Poll the profile until the balance
/// rises above the pre-checkout baseline, bounded by the configured attempt
/// budget.
pub async fn handle_confirm(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<ConfirmResponse>, AppError> {
    let token = bearer_token(&headers);
    let baseline = req
        .baseline_credits
        .or_else(|| state.sessions.current().map(|p| p.credits))
        .unwrap_or(0);

    let outcome = poll_until(
        state.config.confirm_poll(),
        || state.upstream.fetch_profile(token.as_deref()),
        |profile: &Profile| profile.credits > baseline,
    )
    .await;

    let (confirmed, attempts, profile) = match outcome {
        PollOutcome::Confirmed { value, attempts } => (true, attempts, Some(value)),
        PollOutcome::GaveUp { last_seen, attempts } => (false, attempts, last_seen),
    };

    if let Some(profile) = &profile {
        state.sessions.apply(profile.clone());
    }

    Ok(Json(ConfirmResponse {
        confirmed,
        attempts,
        profile,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc123"),
        );
        assert_eq!(bearer_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn test_bearer_token_missing_or_malformed() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Basic abc123"),
        );
        assert_eq!(bearer_token(&headers), None);
    }
}
