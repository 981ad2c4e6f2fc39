pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::analysis::handlers as analysis_handlers;
use crate::analytics::handlers as analytics_handlers;
use crate::auth::handlers as auth_handlers;
use crate::jobs::handlers as job_handlers;
use crate::resume::handlers as resume_handlers;
use crate::resume::upload::MAX_UPLOAD_BYTES;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth API
        .route("/api/v1/auth/register", post(auth_handlers::handle_register))
        .route("/api/v1/auth/login", post(auth_handlers::handle_login))
        .route("/api/v1/auth/profile", get(auth_handlers::handle_get_profile))
        .route(
            "/api/v1/auth/profile",
            put(auth_handlers::handle_update_profile),
        )
        .route(
            "/api/v1/auth/password",
            put(auth_handlers::handle_change_password),
        )
        // Resume API. The default axum body limit is well under the file
        // cap; the extra headroom covers multipart framing.
        .route(
            "/api/v1/resumes/upload",
            post(resume_handlers::handle_upload)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024)),
        )
        .route(
            "/api/v1/resumes/analyze",
            post(analysis_handlers::handle_analyze),
        )
        .route("/api/v1/resumes", get(resume_handlers::handle_list_resumes))
        .route(
            "/api/v1/resumes/history",
            get(resume_handlers::handle_history),
        )
        .route("/api/v1/resumes/:id", get(resume_handlers::handle_get_resume))
        .route(
            "/api/v1/resumes/:id",
            delete(resume_handlers::handle_delete_resume),
        )
        .route(
            "/api/v1/resumes/:id/history-check",
            get(resume_handlers::handle_history_check),
        )
        .route(
            "/api/v1/analyses/:id",
            get(resume_handlers::handle_get_analysis),
        )
        // Job API
        .route("/api/v1/jobs", post(job_handlers::handle_create_job))
        .route("/api/v1/jobs", get(job_handlers::handle_list_jobs))
        .route("/api/v1/jobs/:id", get(job_handlers::handle_get_job))
        .route("/api/v1/jobs/:id", put(job_handlers::handle_update_job))
        .route("/api/v1/jobs/:id", delete(job_handlers::handle_delete_job))
        // Analytics API
        .route(
            "/api/v1/analytics/dashboard",
            get(analytics_handlers::handle_dashboard),
        )
        .route(
            "/api/v1/analytics/top-skills",
            get(analytics_handlers::handle_top_skills),
        )
        .route(
            "/api/v1/analytics/trends",
            get(analytics_handlers::handle_trends),
        )
        .route(
            "/api/v1/analytics/distribution",
            get(analytics_handlers::handle_distribution),
        )
        .route(
            "/api/v1/analytics/top-jobs",
            get(analytics_handlers::handle_top_jobs),
        )
        .route(
            "/api/v1/analytics/user-growth",
            get(analytics_handlers::handle_user_growth),
        )
        .route(
            "/api/v1/analytics/full",
            get(analytics_handlers::handle_full),
        )
        .with_state(state)
}
