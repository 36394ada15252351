//! Smart analysis flow — the credit-charged path that turns a resume and a
//! job description into a fit score, an outline, and AI suggestions.

pub mod handlers;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::credits::{CreditTransaction, SMART_ANALYSIS_COST};
use crate::errors::AppError;
use crate::outline::edits::Suggestion;
use crate::outline::parser::OutlineParser;
use crate::outline::ResumeOutline;
use crate::session::SessionStore;
use crate::upstream::types::{Profile, SmartAnalysis, SmartAnalyzeRequest};
use crate::upstream::{UpstreamClient, UpstreamError};

/// The analysis endpoints the flow depends on. `UpstreamClient` in
/// production; tests install fakes, same seam style as `ProfileSource`.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn smart_analyze(
        &self,
        token: Option<&str>,
        req: &SmartAnalyzeRequest,
    ) -> Result<SmartAnalysis, UpstreamError>;

    async fn suggest(
        &self,
        token: Option<&str>,
        outline: &ResumeOutline,
        job_text: &str,
    ) -> Result<Vec<Suggestion>, UpstreamError>;
}

#[async_trait]
impl AnalysisBackend for UpstreamClient {
    async fn smart_analyze(
        &self,
        token: Option<&str>,
        req: &SmartAnalyzeRequest,
    ) -> Result<SmartAnalysis, UpstreamError> {
        UpstreamClient::smart_analyze(self, token, req).await
    }

    async fn suggest(
        &self,
        token: Option<&str>,
        outline: &ResumeOutline,
        job_text: &str,
    ) -> Result<Vec<Suggestion>, UpstreamError> {
        UpstreamClient::suggest(self, token, outline, job_text).await
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub resume_text: String,
    pub job_text: String,
    #[serde(default)]
    pub job_title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub outline: ResumeOutline,
    pub suggestions: Vec<Suggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub profile: Option<Profile>,
}

/// Runs the full smart-analysis flow:
///
/// 1. optimistically deduct one credit (the upstream does the real charge);
/// 2. call the analysis service, rolling the deduction back on failure;
/// 3. reconcile the balance against a fresh profile;
/// 4. build the outline from the resume text;
/// 5. fall back to the suggest endpoint when the analysis carried no
///    suggestions.
pub async fn run_smart_analysis(
    backend: &dyn AnalysisBackend,
    sessions: &Arc<SessionStore>,
    parser: &OutlineParser,
    token: Option<&str>,
    req: &AnalyzeRequest,
) -> Result<AnalyzeResponse, AppError> {
    if req.resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume_text must not be empty".to_string()));
    }

    // Make sure a session is cached before charging against it.
    if sessions.current().is_none() {
        sessions.revalidate(token).await?;
    }
    let tx = CreditTransaction::begin(sessions, SMART_ANALYSIS_COST)?;

    let upstream_req = SmartAnalyzeRequest {
        resume_text: req.resume_text.clone(),
        job_text: req.job_text.clone(),
        job_title: req.job_title.clone(),
    };
    let analysis = match backend.smart_analyze(token, &upstream_req).await {
        Ok(analysis) => analysis,
        Err(e) => {
            tx.rollback();
            return Err(e.into());
        }
    };

    // Best-effort reconciliation; a failed refresh keeps the optimistic
    // balance rather than failing an analysis that already succeeded.
    let profile = match sessions.revalidate(token).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!("profile refresh after analysis failed: {e}");
            sessions.current()
        }
    };
    tx.commit(profile.clone());

    let outline = parser.parse(&req.resume_text);

    let suggestions = if analysis.suggestions.is_empty() {
        match backend.suggest(token, &outline, &req.job_text).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!("suggestion fallback failed: {e}");
                Vec::new()
            }
        }
    } else {
        analysis.suggestions
    };

    Ok(AnalyzeResponse {
        outline,
        suggestions,
        score: analysis.score,
        summary: analysis.summary,
        profile,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ProfileSource;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    const RESUME: &str =
        "Jane Doe\ngithub.com/jane\nCincinnati, OH\nEXPERIENCE\nDid a thing";

    fn profile(credits: i64) -> Profile {
        Profile {
            user_id: Uuid::new_v4(),
            email: "jane@example.com".to_string(),
            full_name: None,
            avatar_url: None,
            credits,
            created_at: None,
        }
    }

    fn suggestion(id: &str) -> Suggestion {
        Suggestion::AddBullet {
            id: id.to_string(),
            title: "Add bullet".to_string(),
            suggested_text: "Did more things".to_string(),
            target_section_id: "experience".to_string(),
        }
    }

    fn request() -> AnalyzeRequest {
        AnalyzeRequest {
            resume_text: RESUME.to_string(),
            job_text: "Rust engineer".to_string(),
            job_title: None,
        }
    }

    /// Profile source with a fixed answer, for seeding the session store.
    struct FixedSource(Option<Profile>);

    #[async_trait]
    impl ProfileSource for FixedSource {
        async fn fetch_profile(
            &self,
            _token: Option<&str>,
        ) -> Result<Option<Profile>, UpstreamError> {
            Ok(self.0.clone())
        }
    }

    /// Profile source whose fetches always fail.
    struct BrokenSource;

    #[async_trait]
    impl ProfileSource for BrokenSource {
        async fn fetch_profile(
            &self,
            _token: Option<&str>,
        ) -> Result<Option<Profile>, UpstreamError> {
            Err(UpstreamError::Api {
                status: 503,
                message: "profile service down".to_string(),
            })
        }
    }

    struct FakeBackend {
        fail_analyze: bool,
        analysis_suggestions: Vec<Suggestion>,
        fail_suggest: bool,
        fallback_suggestions: Vec<Suggestion>,
        suggest_calls: AtomicU32,
    }

    impl FakeBackend {
        fn returning(analysis_suggestions: Vec<Suggestion>) -> Self {
            Self {
                fail_analyze: false,
                analysis_suggestions,
                fail_suggest: false,
                fallback_suggestions: Vec::new(),
                suggest_calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl AnalysisBackend for FakeBackend {
        async fn smart_analyze(
            &self,
            _token: Option<&str>,
            _req: &SmartAnalyzeRequest,
        ) -> Result<SmartAnalysis, UpstreamError> {
            if self.fail_analyze {
                return Err(UpstreamError::Api {
                    status: 500,
                    message: "analysis exploded".to_string(),
                });
            }
            Ok(SmartAnalysis {
                suggestions: self.analysis_suggestions.clone(),
                score: Some(70),
                summary: None,
            })
        }

        async fn suggest(
            &self,
            _token: Option<&str>,
            _outline: &ResumeOutline,
            _job_text: &str,
        ) -> Result<Vec<Suggestion>, UpstreamError> {
            self.suggest_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_suggest {
                return Err(UpstreamError::Api {
                    status: 502,
                    message: "suggest down".to_string(),
                });
            }
            Ok(self.fallback_suggestions.clone())
        }
    }

    /// Session store seeded with a cached balance and a source that reports
    /// the post-charge server truth.
    fn seeded_store(cached: i64, server: Option<Profile>) -> Arc<SessionStore> {
        let store = Arc::new(SessionStore::new(Arc::new(FixedSource(server))));
        store.apply(profile(cached));
        store
    }

    #[tokio::test]
    async fn test_analysis_failure_rolls_credit_back() {
        let store = seeded_store(3, Some(profile(3)));
        let backend = FakeBackend {
            fail_analyze: true,
            ..FakeBackend::returning(Vec::new())
        };
        let parser = OutlineParser::new();

        let err = run_smart_analysis(&backend, &store, &parser, None, &request())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
        // Pre-image restored, not the optimistic decrement.
        assert_eq!(store.current().unwrap().credits, 3);
        assert_eq!(backend.suggest_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_reconciles_against_server_balance() {
        let store = seeded_store(3, Some(profile(2)));
        let backend = FakeBackend::returning(vec![suggestion("sg-1")]);
        let parser = OutlineParser::new();

        let response = run_smart_analysis(&backend, &store, &parser, None, &request())
            .await
            .unwrap();
        assert_eq!(response.suggestions.len(), 1);
        assert_eq!(response.score, Some(70));
        assert_eq!(response.outline.sections[0].title, "EXPERIENCE");
        // Server profile wins over the optimistic guess.
        assert_eq!(store.current().unwrap().credits, 2);
        assert_eq!(response.profile.unwrap().credits, 2);
        // Analysis carried suggestions, so no fallback call.
        assert_eq!(backend.suggest_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_suggestions_trigger_fallback() {
        let store = seeded_store(3, Some(profile(2)));
        let backend = FakeBackend {
            fallback_suggestions: vec![suggestion("fb-1"), suggestion("fb-2")],
            ..FakeBackend::returning(Vec::new())
        };
        let parser = OutlineParser::new();

        let response = run_smart_analysis(&backend, &store, &parser, None, &request())
            .await
            .unwrap();
        assert_eq!(backend.suggest_calls.load(Ordering::SeqCst), 1);
        assert_eq!(response.suggestions.len(), 2);
    }

    #[tokio::test]
    async fn test_fallback_failure_is_nonfatal() {
        let store = seeded_store(3, Some(profile(2)));
        let backend = FakeBackend {
            fail_suggest: true,
            ..FakeBackend::returning(Vec::new())
        };
        let parser = OutlineParser::new();

        let response = run_smart_analysis(&backend, &store, &parser, None, &request())
            .await
            .unwrap();
        assert!(response.suggestions.is_empty());
        assert_eq!(response.score, Some(70));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_optimistic_balance() {
        let store = Arc::new(SessionStore::new(Arc::new(BrokenSource)));
        store.apply(profile(3));
        let backend = FakeBackend::returning(vec![suggestion("sg-1")]);
        let parser = OutlineParser::new();

        let response = run_smart_analysis(&backend, &store, &parser, None, &request())
            .await
            .unwrap();
        // Refresh failed after a successful charge: the optimistic balance
        // stands instead of failing the whole analysis.
        assert_eq!(store.current().unwrap().credits, 2);
        assert_eq!(response.profile.unwrap().credits, 2);
    }

    #[tokio::test]
    async fn test_empty_resume_text_is_rejected_before_charging() {
        let store = seeded_store(3, Some(profile(3)));
        let backend = FakeBackend::returning(Vec::new());
        let parser = OutlineParser::new();
        let req = AnalyzeRequest {
            resume_text: "   ".to_string(),
            job_text: "Rust engineer".to_string(),
            job_title: None,
        };

        let err = run_smart_analysis(&backend, &store, &parser, None, &req)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.current().unwrap().credits, 3);
    }
}
