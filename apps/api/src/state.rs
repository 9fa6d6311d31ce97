use std::sync::Arc;

use crate::api_client::ApiClient;
use crate::config::Config;
use crate::matching::SchoolDirectory;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Remote API client; owns the admin session.
    pub api: ApiClient,
    /// Data source for the matcher. Production: the same `ApiClient`.
    pub directory: Arc<dyn SchoolDirectory>,
    pub config: Config,
}
