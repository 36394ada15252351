use std::sync::Arc;

use crate::config::Config;
use crate::outline::parser::OutlineParser;
use crate::session::SessionStore;
use crate::upstream::UpstreamClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Single point of entry for the external analysis API.
    pub upstream: Arc<UpstreamClient>,
    /// Single-owner profile cache with single-flight revalidation.
    pub sessions: Arc<SessionStore>,
    /// Outline parser with its regexes compiled once.
    pub parser: Arc<OutlineParser>,
}
