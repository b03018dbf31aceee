use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

/// Authenticated Router Module
///
/// Every route here runs after `require_session`, and every handler also
/// compares the session identity with the owner of the data it touches:
/// the job's `hr_email` or the application's `applicant_email`.
///
/// Paths shared with the public router (`/jobs`, `/jobs/{id}`) are merged
/// per method, so `GET` stays public while writes are guarded.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Jobs (owner only) ---
        // POST /jobs/new
        // The owner is the session identity.
        .route("/jobs/new", post(handlers::create_job))
        // PUT/DELETE /jobs/{id}
        .route(
            "/jobs/{id}",
            put(handlers::replace_job).delete(handlers::delete_job),
        )
        // PATCH /jobs?id=
        // One-way transition to "Expired".
        .route("/jobs", patch(handlers::expire_job))
        // --- Applications ---
        // GET /appliedJobs?email=
        // 401 when `email` is not the session identity.
        .route("/appliedJobs", get(handlers::list_applied_jobs))
        // PUT /appliedJob
        // Upsert on the five-field application identity.
        .route("/appliedJob", put(handlers::upsert_application))
        // DELETE /appliedJob/{id}
        .route("/appliedJob/{id}", delete(handlers::delete_application))
}
