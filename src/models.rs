use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- Stored Records ---
//
// Every record exposes its identifier as `_id` on the wire; the web client
// was written against a document store and keys everything on that name.

/// Category
///
/// Static reference data for the "browse by category" tabs. Seeded outside the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
}

/// JobStatus
///
/// A posting starts `Active` and can only ever move to `Expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
pub enum JobStatus {
    #[default]
    Active,
    Expired,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Active => "Active",
            JobStatus::Expired => "Expired",
        }
    }

    /// Anything that is not literally "Expired" is still open.
    pub fn from_db(raw: &str) -> Self {
        match raw {
            "Expired" => JobStatus::Expired,
            _ => JobStatus::Active,
        }
    }
}

/// SalaryRange
///
/// Inclusive yearly salary band. Filters compare `min` and `max` independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_salary_range"))]
pub struct SalaryRange {
    #[validate(range(min = 0, message = "salary cannot be negative"))]
    pub min: i64,
    #[validate(range(min = 0, message = "salary cannot be negative"))]
    pub max: i64,
}

fn validate_salary_range(range: &SalaryRange) -> Result<(), ValidationError> {
    if range.min > range.max {
        let mut err = ValidationError::new("salary_range");
        err.message = Some("salaryRange.min cannot exceed salaryRange.max".into());
        return Err(err);
    }
    Ok(())
}

/// JobFields
///
/// The client-editable part of a posting. Used as the body of both
/// `POST /jobs/new` and `PUT /jobs/{id}`; owner, status and timestamps are
/// never taken from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
pub struct JobFields {
    pub hr_name: Option<String>,
    #[validate(length(min = 1, message = "job_title is required"))]
    pub job_title: String,
    #[validate(length(min = 1, message = "company_name is required"))]
    pub company_name: String,
    pub company_logo: Option<String>,
    #[validate(length(min = 1, message = "company_location is required"))]
    pub company_location: String,
    #[validate(length(min = 1, message = "category is required"))]
    pub category: String,
    #[serde(rename = "jobType")]
    #[validate(length(min = 1, message = "jobType is required"))]
    pub job_type: String,
    #[serde(rename = "salaryRange")]
    #[validate(nested)]
    pub salary_range: SalaryRange,
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
    #[serde(rename = "applicationDeadline")]
    pub application_deadline: NaiveDate,
    pub description: Option<String>,
}

/// Job
///
/// A posting owned by the HR account `hr_email`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Job {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub hr_email: String,
    #[serde(flatten)]
    pub fields: JobFields,
    pub status: JobStatus,
    #[serde(rename = "postedAt")]
    pub posted_at: DateTime<Utc>,
}

/// User
///
/// Profile stored at signup. `email` is the lookup key but is not unique in
/// storage: every `POST /users` inserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, FromRow)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub role: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// NewUser
///
/// Input payload for `POST /users`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct NewUser {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    pub name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub role: Option<String>,
}

/// Application
///
/// One applicant's application to one posting. A posting is identified by
/// `(company_name, company_location, job_title, jobType)`, so together with
/// `applicant_email` these five fields are the dedup key. `job_id` is stored
/// for reference only and takes no part in the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
pub struct Application {
    #[validate(email(message = "applicant_email must be a valid address"))]
    pub applicant_email: String,
    pub applicant_name: Option<String>,
    pub job_id: Option<Uuid>,
    #[validate(length(min = 1, message = "company_name is required"))]
    pub company_name: String,
    #[validate(length(min = 1, message = "company_location is required"))]
    pub company_location: String,
    #[validate(length(min = 1, message = "job_title is required"))]
    pub job_title: String,
    #[serde(rename = "jobType")]
    #[validate(length(min = 1, message = "jobType is required"))]
    pub job_type: String,
    pub resume_link: Option<String>,
}

impl Application {
    /// True when both records describe the same applicant and posting.
    pub fn same_identity(&self, other: &Application) -> bool {
        self.applicant_email == other.applicant_email
            && self.company_name == other.company_name
            && self.company_location == other.company_location
            && self.job_title == other.job_title
            && self.job_type == other.job_type
    }
}

/// AppliedJob
///
/// A stored `Application`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AppliedJob {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(flatten)]
    pub application: Application,
    #[serde(rename = "appliedAt")]
    pub applied_at: DateTime<Utc>,
}

// --- Queries ---

/// JobFilter
///
/// Listing filter for `GET /jobs`. The salary bounds only apply as a pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub location_substring: Option<String>,
    pub min_salary: Option<i64>,
    pub max_salary: Option<i64>,
}

impl JobFilter {
    /// `(min, max)` when both bounds were supplied.
    pub fn salary_bounds(&self) -> Option<(i64, i64)> {
        self.min_salary.zip(self.max_salary)
    }

    pub fn matches(&self, job: &Job) -> bool {
        if let Some(needle) = &self.location_substring {
            if !job
                .fields
                .location
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        match self.salary_bounds() {
            Some((min, max)) => {
                job.fields.salary_range.min >= min && job.fields.salary_range.max <= max
            }
            None => true,
        }
    }
}

/// Ordering on `salaryRange.min`. Ties keep insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalarySort {
    Ascending,
    Descending,
}

/// PostingKey
///
/// The posting half of the application identity used by `GET /appliedJobsCount`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingKey {
    pub company_name: String,
    pub job_title: String,
}

// --- Responses ---

/// WriteAck
///
/// Acknowledgment returned by every write endpoint, mirroring the counters a
/// document store reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WriteAck {
    pub acknowledged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inserted_id: Option<Uuid>,
    pub inserted_count: u64,
    pub matched_count: u64,
    pub modified_count: u64,
    pub deleted_count: u64,
}

impl WriteAck {
    const EMPTY: WriteAck = WriteAck {
        acknowledged: true,
        inserted_id: None,
        inserted_count: 0,
        matched_count: 0,
        modified_count: 0,
        deleted_count: 0,
    };

    pub fn inserted(id: Uuid) -> Self {
        Self {
            inserted_id: Some(id),
            inserted_count: 1,
            ..Self::EMPTY
        }
    }

    pub fn updated(matched: u64, modified: u64) -> Self {
        Self {
            matched_count: matched,
            modified_count: modified,
            ..Self::EMPTY
        }
    }

    pub fn deleted(count: u64) -> Self {
        Self {
            deleted_count: count,
            ..Self::EMPTY
        }
    }

    /// True when the write touched nothing.
    pub fn is_noop(&self) -> bool {
        self.inserted_count == 0
            && self.matched_count == 0
            && self.modified_count == 0
            && self.deleted_count == 0
    }
}

/// LoginRequest
///
/// Body of `POST /jwt`. The identity provider has already authenticated the
/// user on the client; only the email is signed into the session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
}

/// SessionResponse
///
/// Body of `POST /jwt` and `POST /logout`; the token itself only travels in the cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub success: bool,
}
