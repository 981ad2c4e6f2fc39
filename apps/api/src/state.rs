use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::nlp_client::NlpService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// The scoring collaborator. `Arc<dyn NlpService>` so tests can swap in
    /// a mock without touching handler code.
    pub nlp: Arc<dyn NlpService>,
    pub config: Config,
}
