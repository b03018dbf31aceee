use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Reads over jobs, categories, users and posting applicants, plus the
/// session endpoints themselves.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Liveness text for monitors and load balancers.
        .route("/", get(handlers::root))
        // GET /jobCategories
        .route("/jobCategories", get(handlers::list_categories))
        // GET /hotJob/{category}
        // Jobs of one category, for the home page tabs.
        .route("/hotJob/{category}", get(handlers::list_hot_jobs))
        // GET /jobs?sort=&searchText=&minSalary=&maxSalary=
        .route("/jobs", get(handlers::list_jobs))
        // GET /jobs/{id}
        .route("/jobs/{id}", get(handlers::get_job))
        // GET /jobs/postByHr/{email}
        .route("/jobs/postByHr/{email}", get(handlers::list_jobs_by_hr))
        // POST /users, GET /users/{email}
        .route("/users", post(handlers::create_user))
        .route("/users/{email}", get(handlers::get_user))
        // POST /jwt
        // Issues the HTTP-only session cookie.
        .route("/jwt", post(handlers::issue_session))
        // POST /logout
        // Overwrites the session cookie with an expired one.
        .route("/logout", post(handlers::logout))
        // GET /appliedJobsCount?company_name=&job_title=
        .route("/appliedJobsCount", get(handlers::list_posting_applicants))
}
