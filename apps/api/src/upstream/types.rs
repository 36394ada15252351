//! Wire types for the upstream analysis API.
//!
//! The upstream wraps payloads in one of a small set of envelope keys and
//! historically returned scores in two shapes. Both are modeled as explicit
//! discriminated enums that fail deserialization on anything unrecognized,
//! instead of probing optional fields at runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::outline::edits::Suggestion;

/// The authenticated user's profile as the upstream reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub credits: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Response envelope. The upstream nests its payload under one of `data`,
/// `result`, or `analysis` depending on the endpoint; any other shape is a
/// deserialization error surfaced as `UpstreamError::Shape`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Data { data: T },
    Result { result: T },
    Analysis { analysis: T },
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            Envelope::Data { data } => data,
            Envelope::Result { result } => result,
            Envelope::Analysis { analysis } => analysis,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExtractResponse {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub resume_text: String,
    pub job_text: String,
    pub job_title: Option<String>,
}

/// The two score shapes the upstream emits: a ready 0-100 `score`, or a raw
/// 0.0-1.0 `similarity` that still needs rounding.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ScoreWire {
    Scored {
        score: u32,
        #[serde(default)]
        matches: Vec<String>,
        #[serde(default)]
        missing_keywords: Vec<String>,
        #[serde(default)]
        denominator: Option<u32>,
    },
    Similarity {
        similarity: f64,
        #[serde(default)]
        matches: Vec<String>,
        #[serde(default)]
        missing_keywords: Vec<String>,
        #[serde(default)]
        denominator: Option<u32>,
    },
}

/// Normalized fit score handed to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    pub score: u32,
    pub matches: Vec<String>,
    pub missing_keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denominator: Option<u32>,
}

impl From<ScoreWire> for ScoreReport {
    fn from(wire: ScoreWire) -> Self {
        match wire {
            ScoreWire::Scored {
                score,
                matches,
                missing_keywords,
                denominator,
            } => ScoreReport {
                score,
                matches,
                missing_keywords,
                denominator,
            },
            ScoreWire::Similarity {
                similarity,
                matches,
                missing_keywords,
                denominator,
            } => ScoreReport {
                score: (similarity * 100.0).round() as u32,
                matches,
                missing_keywords,
                denominator,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SmartAnalyzeRequest {
    pub resume_text: String,
    pub job_text: String,
    pub job_title: Option<String>,
}

/// Smart analysis payload. The suggestion list has gone by two names
/// upstream; both map onto `suggestions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SmartAnalysis {
    #[serde(default, alias = "lego_suggestions")]
    pub suggestions: Vec<Suggestion>,
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub pack_id: Option<String>,
    #[serde(default)]
    pub credits: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub url: String,
}
