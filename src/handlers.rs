use crate::{
    AppState,
    auth::{AuthUser, cleared_session_cookie, session_cookie},
    error::{AppError, AppResult},
    extract::{QueryParams, RecordId, ValidatedJson, parse_id},
    models::{
        Application, AppliedJob, Category, Job, JobFields, JobFilter, LoginRequest, NewUser,
        PostingKey, SalarySort, SessionResponse, User, WriteAck,
    },
};
use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use uuid::Uuid;

// --- Query Structs ---

/// JobListQuery
///
/// Query parameters of `GET /jobs`. Values arrive as raw strings so that an
/// empty parameter (`?minSalary=`) means "not supplied" rather than a parse error.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct JobListQuery {
    /// `asc` or `desc` on `salaryRange.min`.
    pub sort: Option<String>,
    /// Case-insensitive substring of the job location.
    #[serde(rename = "searchText")]
    pub search_text: Option<String>,
    /// Only applied together with `maxSalary`.
    #[serde(rename = "minSalary")]
    pub min_salary: Option<String>,
    /// Only applied together with `minSalary`.
    #[serde(rename = "maxSalary")]
    pub max_salary: Option<String>,
}

impl JobListQuery {
    pub fn into_filter(self) -> AppResult<(JobFilter, Option<SalarySort>)> {
        let sort = match self.sort.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "asc" => Some(SalarySort::Ascending),
                "desc" | "dsc" => Some(SalarySort::Descending),
                _ => {
                    return Err(AppError::BadRequest(format!(
                        "sort must be `asc` or `desc`, got `{raw}`"
                    )));
                }
            },
        };

        let filter = JobFilter {
            location_substring: self
                .search_text
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            min_salary: parse_salary("minSalary", self.min_salary)?,
            max_salary: parse_salary("maxSalary", self.max_salary)?,
        };

        Ok((filter, sort))
    }
}

fn parse_salary(name: &str, raw: Option<String>) -> AppResult<Option<i64>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("{name} must be a whole number"))),
    }
}

/// `PATCH /jobs?id=`
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExpireJobQuery {
    pub id: String,
}

/// `GET /appliedJobs?email=`
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ApplicantQuery {
    pub email: String,
}

/// `GET /appliedJobsCount?company_name=&job_title=`
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostingQuery {
    pub company_name: String,
    pub job_title: String,
}

// --- Handlers ---

/// root
///
/// [Public Route] Liveness text.
#[utoipa::path(get, path = "/", responses((status = 200, description = "Server is up", body = String)))]
pub async fn root() -> &'static str {
    "Job portal server is running..."
}

/// list_categories
///
/// [Public Route] All job categories.
#[utoipa::path(
    get,
    path = "/jobCategories",
    responses((status = 200, description = "Categories", body = [Category]))
)]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(state.repo.list_categories().await?))
}

/// list_hot_jobs
///
/// [Public Route] Jobs in one category.
#[utoipa::path(
    get,
    path = "/hotJob/{category}",
    params(("category" = String, Path, description = "Category name")),
    responses((status = 200, description = "Jobs in category", body = [Job]))
)]
pub async fn list_hot_jobs(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> AppResult<Json<Vec<Job>>> {
    Ok(Json(state.repo.list_jobs_by_category(&category).await?))
}

/// list_jobs
///
/// [Public Route] Job listing with an optional location search, salary band
/// (both bounds required) and salary sort.
#[utoipa::path(
    get,
    path = "/jobs",
    params(JobListQuery),
    responses(
        (status = 200, description = "Filtered jobs", body = [Job]),
        (status = 400, description = "Malformed sort or salary")
    )
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<JobListQuery>,
) -> AppResult<Json<Vec<Job>>> {
    let (filter, sort) = query.into_filter()?;
    Ok(Json(state.repo.list_jobs(&filter, sort).await?))
}

/// get_job
///
/// [Public Route] One job. A miss answers 200 with `null`.
#[utoipa::path(
    get,
    path = "/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "The job, or null", body = Job),
        (status = 400, description = "Malformed id")
    )
)]
pub async fn get_job(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> AppResult<Json<Option<Job>>> {
    Ok(Json(state.repo.get_job(id).await?))
}

/// list_jobs_by_hr
///
/// [Public Route] Jobs posted by one HR account.
#[utoipa::path(
    get,
    path = "/jobs/postByHr/{email}",
    params(("email" = String, Path, description = "Owner email")),
    responses((status = 200, description = "Jobs owned by the account", body = [Job]))
)]
pub async fn list_jobs_by_hr(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> AppResult<Json<Vec<Job>>> {
    Ok(Json(state.repo.list_jobs_by_owner(&email).await?))
}

/// create_job
///
/// [Authenticated Route] Posts a job. The owner is always the session
/// identity; an `hr_email` in the body is ignored.
#[utoipa::path(
    post,
    path = "/jobs/new",
    request_body = JobFields,
    responses(
        (status = 200, description = "Inserted", body = WriteAck),
        (status = 400, description = "Invalid body"),
        (status = 401, description = "No valid session")
    )
)]
pub async fn create_job(
    user: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(fields): ValidatedJson<JobFields>,
) -> AppResult<Json<WriteAck>> {
    let ack = state.repo.create_job(&user.email, fields).await?;
    tracing::info!(hr_email = %user.email, job_id = ?ack.inserted_id, "job posted");
    Ok(Json(ack))
}

/// Owner check for job mutations. A missing job passes through so the store
/// answers with a zero-effect acknowledgment.
async fn authorize_job(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<()> {
    match state.repo.get_job(id).await? {
        Some(job) => user.ensure_owns(&job.hr_email),
        None => Ok(()),
    }
}

/// replace_job
///
/// [Authenticated Route] Overwrites the editable fields of the caller's own job.
#[utoipa::path(
    put,
    path = "/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    request_body = JobFields,
    responses(
        (status = 200, description = "Update acknowledgment", body = WriteAck),
        (status = 401, description = "No valid session, or not the owner")
    )
)]
pub async fn replace_job(
    user: AuthUser,
    State(state): State<AppState>,
    RecordId(id): RecordId,
    ValidatedJson(fields): ValidatedJson<JobFields>,
) -> AppResult<Json<WriteAck>> {
    authorize_job(&state, &user, id).await?;
    Ok(Json(state.repo.replace_job(id, fields).await?))
}

/// expire_job
///
/// [Authenticated Route] Forces the caller's job to `Expired`. Idempotent.
#[utoipa::path(
    patch,
    path = "/jobs",
    params(ExpireJobQuery),
    responses(
        (status = 200, description = "Update acknowledgment", body = WriteAck),
        (status = 400, description = "Missing or malformed id"),
        (status = 401, description = "No valid session, or not the owner")
    )
)]
pub async fn expire_job(
    user: AuthUser,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ExpireJobQuery>,
) -> AppResult<Json<WriteAck>> {
    let id = parse_id(&query.id)?;
    authorize_job(&state, &user, id).await?;
    Ok(Json(state.repo.expire_job(id).await?))
}

/// delete_job
///
/// [Authenticated Route] Deletes the caller's job. Unknown ids yield
/// `deletedCount: 0`.
#[utoipa::path(
    delete,
    path = "/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Delete acknowledgment", body = WriteAck),
        (status = 401, description = "No valid session, or not the owner")
    )
)]
pub async fn delete_job(
    user: AuthUser,
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> AppResult<Json<WriteAck>> {
    authorize_job(&state, &user, id).await?;
    let ack = state.repo.delete_job(id).await?;
    if ack.is_noop() {
        tracing::debug!(job_id = %id, "delete matched no job");
    }
    Ok(Json(ack))
}

/// create_user
///
/// [Public Route] Stores a profile at signup. Every call inserts.
#[utoipa::path(
    post,
    path = "/users",
    request_body = NewUser,
    responses(
        (status = 200, description = "Inserted", body = WriteAck),
        (status = 400, description = "Invalid body")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(user): ValidatedJson<NewUser>,
) -> AppResult<Json<WriteAck>> {
    Ok(Json(state.repo.create_user(user).await?))
}

/// get_user
///
/// [Public Route] A profile by email, or `null`.
#[utoipa::path(
    get,
    path = "/users/{email}",
    params(("email" = String, Path, description = "User email")),
    responses((status = 200, description = "The user, or null", body = User))
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> AppResult<Json<Option<User>>> {
    Ok(Json(state.repo.get_user_by_email(&email).await?))
}

/// issue_session
///
/// [Public Route] Signs a 24-hour session token for the submitted email and
/// sets it as the HTTP-only `token` cookie.
#[utoipa::path(
    post,
    path = "/jwt",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Cookie set", body = SessionResponse),
        (status = 400, description = "Invalid body")
    )
)]
pub async fn issue_session(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(login): ValidatedJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<SessionResponse>)> {
    let token = state.tokens.issue(&login.email)?;
    tracing::info!(email = %login.email, "session issued");

    Ok((
        jar.add(session_cookie(token, state.config.env)),
        Json(SessionResponse { success: true }),
    ))
}

/// logout
///
/// [Public Route] Overwrites the session cookie with an expired empty value.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 200, description = "Cookie cleared", body = SessionResponse))
)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<SessionResponse>) {
    (
        jar.add(cleared_session_cookie(state.config.env)),
        Json(SessionResponse { success: true }),
    )
}

/// list_applied_jobs
///
/// [Authenticated Route] The caller's own applications.
///
/// *Authorization*: the `email` parameter must equal the session identity,
/// and the query runs against the session identity, not the parameter.
#[utoipa::path(
    get,
    path = "/appliedJobs",
    params(ApplicantQuery),
    responses(
        (status = 200, description = "Applications", body = [AppliedJob]),
        (status = 401, description = "No valid session, or another user's email")
    )
)]
pub async fn list_applied_jobs(
    user: AuthUser,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ApplicantQuery>,
) -> AppResult<Json<Vec<AppliedJob>>> {
    user.ensure_owns(&query.email)?;
    Ok(Json(
        state.repo.list_applications_by_applicant(&user.email).await?,
    ))
}

/// list_posting_applicants
///
/// [Public Route] Applications for one posting. Despite the path name this
/// returns the records; clients count them.
#[utoipa::path(
    get,
    path = "/appliedJobsCount",
    params(PostingQuery),
    responses(
        (status = 200, description = "Applications for the posting", body = [AppliedJob]),
        (status = 400, description = "Missing company_name or job_title")
    )
)]
pub async fn list_posting_applicants(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<PostingQuery>,
) -> AppResult<Json<Vec<AppliedJob>>> {
    let key = PostingKey {
        company_name: query.company_name,
        job_title: query.job_title,
    };
    Ok(Json(state.repo.list_applications_for_posting(&key).await?))
}

/// upsert_application
///
/// [Authenticated Route] Applies to a posting. Re-submitting the same
/// application overwrites the existing record instead of duplicating it.
#[utoipa::path(
    put,
    path = "/appliedJob",
    request_body = Application,
    responses(
        (status = 200, description = "Upsert acknowledgment", body = WriteAck),
        (status = 400, description = "Invalid body"),
        (status = 401, description = "No valid session, or applying as someone else")
    )
)]
pub async fn upsert_application(
    user: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(application): ValidatedJson<Application>,
) -> AppResult<Json<WriteAck>> {
    user.ensure_owns(&application.applicant_email)?;
    Ok(Json(state.repo.upsert_application(application).await?))
}

/// delete_application
///
/// [Authenticated Route] Withdraws one of the caller's applications.
#[utoipa::path(
    delete,
    path = "/appliedJob/{id}",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Delete acknowledgment", body = WriteAck),
        (status = 401, description = "No valid session, or not the applicant")
    )
)]
pub async fn delete_application(
    user: AuthUser,
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> AppResult<Json<WriteAck>> {
    if let Some(applied) = state.repo.get_application(id).await? {
        user.ensure_owns(&applied.application.applicant_email)?;
    }
    Ok(Json(state.repo.delete_application(id).await?))
}
