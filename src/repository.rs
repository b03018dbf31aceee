use crate::error::StoreError;
use crate::models::{
    Application, AppliedJob, Category, Job, JobFields, JobFilter, JobStatus, NewUser, PostingKey,
    SalaryRange, SalarySort, User, WriteAck,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, postgres::PgPoolOptions, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Repository Trait
///
/// The persistence contract for the four collections the API serves. Handlers
/// only ever see `Arc<dyn Repository>`, so the Postgres store and the
/// in-memory store used by tests are interchangeable.
///
/// Single-record lookups return `Ok(None)` on a miss. Writes return a
/// `WriteAck`; a write that matches nothing is a zero-effect acknowledgment,
/// never an error.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Categories ---
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;

    // --- Jobs ---
    async fn list_jobs_by_category(&self, category: &str) -> StoreResult<Vec<Job>>;
    // Filtered listing. Without a sort, rows come back in insertion order.
    async fn list_jobs(&self, filter: &JobFilter, sort: Option<SalarySort>)
    -> StoreResult<Vec<Job>>;
    async fn get_job(&self, id: Uuid) -> StoreResult<Option<Job>>;
    async fn list_jobs_by_owner(&self, hr_email: &str) -> StoreResult<Vec<Job>>;
    // New postings always start `Active`.
    async fn create_job(&self, hr_email: &str, fields: JobFields) -> StoreResult<WriteAck>;
    // Overwrites the client-editable fields. Owner and status are untouched.
    async fn replace_job(&self, id: Uuid, fields: JobFields) -> StoreResult<WriteAck>;
    // One-way transition to `Expired`; repeating it matches without modifying.
    async fn expire_job(&self, id: Uuid) -> StoreResult<WriteAck>;
    async fn delete_job(&self, id: Uuid) -> StoreResult<WriteAck>;

    // --- Users ---
    // Inserts unconditionally, even when the email already exists.
    async fn create_user(&self, user: NewUser) -> StoreResult<WriteAck>;
    // Earliest profile registered under `email`.
    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    // --- Applications ---
    async fn list_applications_by_applicant(&self, email: &str) -> StoreResult<Vec<AppliedJob>>;
    async fn list_applications_for_posting(&self, key: &PostingKey)
    -> StoreResult<Vec<AppliedJob>>;
    async fn get_application(&self, id: Uuid) -> StoreResult<Option<AppliedJob>>;
    /// Inserts unless a record with the same five-field identity exists, in
    /// which case the remaining fields are overwritten. Must be atomic.
    async fn upsert_application(&self, application: Application) -> StoreResult<WriteAck>;
    async fn delete_application(&self, id: Uuid) -> StoreResult<WriteAck>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const JOB_COLUMNS: &str = "id, hr_email, hr_name, job_title, company_name, company_logo, \
     company_location, category, job_type, salary_min, salary_max, location, status, \
     application_deadline, description, posted_at";

const APPLICATION_COLUMNS: &str = "id, applicant_email, applicant_name, job_id, company_name, \
     company_location, job_title, job_type, resume_link, applied_at";

/// Flat `jobs` row; the salary band and status are reshaped into `Job`.
#[derive(FromRow)]
struct JobRow {
    id: Uuid,
    hr_email: String,
    hr_name: Option<String>,
    job_title: String,
    company_name: String,
    company_logo: Option<String>,
    company_location: String,
    category: String,
    job_type: String,
    salary_min: i64,
    salary_max: i64,
    location: String,
    status: String,
    application_deadline: NaiveDate,
    description: Option<String>,
    posted_at: DateTime<Utc>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Job {
            id: row.id,
            hr_email: row.hr_email,
            fields: JobFields {
                hr_name: row.hr_name,
                job_title: row.job_title,
                company_name: row.company_name,
                company_logo: row.company_logo,
                company_location: row.company_location,
                category: row.category,
                job_type: row.job_type,
                salary_range: SalaryRange {
                    min: row.salary_min,
                    max: row.salary_max,
                },
                location: row.location,
                application_deadline: row.application_deadline,
                description: row.description,
            },
            status: JobStatus::from_db(&row.status),
            posted_at: row.posted_at,
        }
    }
}

#[derive(FromRow)]
struct ApplicationRow {
    id: Uuid,
    applicant_email: String,
    applicant_name: Option<String>,
    job_id: Option<Uuid>,
    company_name: String,
    company_location: String,
    job_title: String,
    job_type: String,
    resume_link: Option<String>,
    applied_at: DateTime<Utc>,
}

impl From<ApplicationRow> for AppliedJob {
    fn from(row: ApplicationRow) -> Self {
        AppliedJob {
            id: row.id,
            application: Application {
                applicant_email: row.applicant_email,
                applicant_name: row.applicant_name,
                job_id: row.job_id,
                company_name: row.company_name,
                company_location: row.company_location,
                job_title: row.job_title,
                job_type: row.job_type,
                resume_link: row.resume_link,
            },
            applied_at: row.applied_at,
        }
    }
}

/// Turns user text into an `ILIKE` pattern that matches it literally anywhere.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// PostgresRepository
///
/// The `Repository` backed by PostgreSQL. Owns the connection pool: open it
/// with `connect`, apply `migrate`, and `close` it on shutdown.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Wraps an already-initialized pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool of at most `max_connections` connections to `db_url`.
    pub async fn connect(db_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations under `migrations/`.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Waits for checked-out connections to return, then closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn fetch_jobs(&self, sql: &str, bind: &str) -> StoreResult<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(sql)
            .bind(bind)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Job::from).collect())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM job_categories ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    async fn list_jobs_by_category(&self, category: &str) -> StoreResult<Vec<Job>> {
        self.fetch_jobs(
            &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE category = $1 ORDER BY seq"),
            category,
        )
        .await
    }

    /// list_jobs
    ///
    /// Builds the listing query with `QueryBuilder` so every user-supplied value
    /// is a bound parameter. The location match is a literal, case-insensitive
    /// substring: `%` and `_` typed by the user are escaped.
    async fn list_jobs(
        &self,
        filter: &JobFilter,
        sort: Option<SalarySort>,
    ) -> StoreResult<Vec<Job>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {JOB_COLUMNS} FROM jobs WHERE TRUE"));

        if let Some(needle) = &filter.location_substring {
            builder.push(" AND location ILIKE ");
            builder.push_bind(like_pattern(needle));
        }

        if let Some((min, max)) = filter.salary_bounds() {
            builder.push(" AND salary_min >= ");
            builder.push_bind(min);
            builder.push(" AND salary_max <= ");
            builder.push_bind(max);
        }

        // `seq` breaks ties so equal salaries keep insertion order.
        builder.push(match sort {
            Some(SalarySort::Ascending) => " ORDER BY salary_min ASC, seq ASC",
            Some(SalarySort::Descending) => " ORDER BY salary_min DESC, seq ASC",
            None => " ORDER BY seq ASC",
        });

        let rows = builder
            .build_query_as::<JobRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Job::from).collect())
    }

    async fn get_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Job::from))
    }

    async fn list_jobs_by_owner(&self, hr_email: &str) -> StoreResult<Vec<Job>> {
        self.fetch_jobs(
            &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE hr_email = $1 ORDER BY seq"),
            hr_email,
        )
        .await
    }

    async fn create_job(&self, hr_email: &str, fields: JobFields) -> StoreResult<WriteAck> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, hr_email, hr_name, job_title, company_name, company_logo,
                company_location, category, job_type, salary_min, salary_max,
                location, status, application_deadline, description
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(id)
        .bind(hr_email)
        .bind(fields.hr_name)
        .bind(fields.job_title)
        .bind(fields.company_name)
        .bind(fields.company_logo)
        .bind(fields.company_location)
        .bind(fields.category)
        .bind(fields.job_type)
        .bind(fields.salary_range.min)
        .bind(fields.salary_range.max)
        .bind(fields.location)
        .bind(JobStatus::Active.as_str())
        .bind(fields.application_deadline)
        .bind(fields.description)
        .execute(&self.pool)
        .await?;

        Ok(WriteAck::inserted(id))
    }

    /// replace_job
    ///
    /// Reports `matched` and `modified` separately: the update only fires when
    /// at least one column actually differs.
    async fn replace_job(&self, id: Uuid, fields: JobFields) -> StoreResult<WriteAck> {
        let (matched, modified) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            WITH matched AS (
                SELECT id FROM jobs WHERE id = $1
            ),
            updated AS (
                UPDATE jobs
                SET hr_name = $2, job_title = $3, company_name = $4, company_logo = $5,
                    company_location = $6, category = $7, job_type = $8,
                    salary_min = $9, salary_max = $10, location = $11,
                    application_deadline = $12, description = $13
                WHERE id = $1
                  AND (hr_name, job_title, company_name, company_logo, company_location,
                       category, job_type, salary_min, salary_max, location,
                       application_deadline, description)
                      IS DISTINCT FROM
                      ($2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                RETURNING id
            )
            SELECT (SELECT COUNT(*) FROM matched), (SELECT COUNT(*) FROM updated)
            "#,
        )
        .bind(id)
        .bind(fields.hr_name)
        .bind(fields.job_title)
        .bind(fields.company_name)
        .bind(fields.company_logo)
        .bind(fields.company_location)
        .bind(fields.category)
        .bind(fields.job_type)
        .bind(fields.salary_range.min)
        .bind(fields.salary_range.max)
        .bind(fields.location)
        .bind(fields.application_deadline)
        .bind(fields.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(WriteAck::updated(matched as u64, modified as u64))
    }

    async fn expire_job(&self, id: Uuid) -> StoreResult<WriteAck> {
        let (matched, modified) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            WITH matched AS (
                SELECT id FROM jobs WHERE id = $1
            ),
            updated AS (
                UPDATE jobs SET status = $2
                WHERE id = $1 AND status <> $2
                RETURNING id
            )
            SELECT (SELECT COUNT(*) FROM matched), (SELECT COUNT(*) FROM updated)
            "#,
        )
        .bind(id)
        .bind(JobStatus::Expired.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(WriteAck::updated(matched as u64, modified as u64))
    }

    async fn delete_job(&self, id: Uuid) -> StoreResult<WriteAck> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(WriteAck::deleted(result.rows_affected()))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<WriteAck> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (id, email, name, photo_url, role) VALUES ($1, $2, $3, $4, $5)")
            .bind(id)
            .bind(user.email)
            .bind(user.name)
            .bind(user.photo_url)
            .bind(user.role)
            .execute(&self.pool)
            .await?;
        Ok(WriteAck::inserted(id))
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, photo_url, role, created_at FROM users \
             WHERE email = $1 ORDER BY created_at ASC LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_applications_by_applicant(&self, email: &str) -> StoreResult<Vec<AppliedJob>> {
        let rows = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applied_jobs WHERE applicant_email = $1 ORDER BY seq"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(AppliedJob::from).collect())
    }

    async fn list_applications_for_posting(
        &self,
        key: &PostingKey,
    ) -> StoreResult<Vec<AppliedJob>> {
        let rows = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applied_jobs \
             WHERE company_name = $1 AND job_title = $2 ORDER BY seq"
        ))
        .bind(&key.company_name)
        .bind(&key.job_title)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(AppliedJob::from).collect())
    }

    async fn get_application(&self, id: Uuid) -> StoreResult<Option<AppliedJob>> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applied_jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(AppliedJob::from))
    }

    /// upsert_application
    ///
    /// A single `INSERT .. ON CONFLICT` against the unique index on the
    /// five-field identity, so two concurrent identical submissions leave one
    /// row (last writer wins).
    ///
    /// The returned row tells the three outcomes apart:
    /// - row with `xmax = 0`: freshly inserted;
    /// - row otherwise: an existing record was overwritten;
    /// - no row: an existing record already held identical values.
    async fn upsert_application(&self, application: Application) -> StoreResult<WriteAck> {
        let outcome = sqlx::query_as::<_, (Uuid, bool)>(
            r#"
            INSERT INTO applied_jobs (
                id, applicant_email, applicant_name, job_id, company_name,
                company_location, job_title, job_type, resume_link
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (applicant_email, company_name, company_location, job_title, job_type)
            DO UPDATE SET
                applicant_name = EXCLUDED.applicant_name,
                job_id = EXCLUDED.job_id,
                resume_link = EXCLUDED.resume_link
            WHERE (applied_jobs.applicant_name, applied_jobs.job_id, applied_jobs.resume_link)
                IS DISTINCT FROM
                (EXCLUDED.applicant_name, EXCLUDED.job_id, EXCLUDED.resume_link)
            RETURNING id, (xmax = 0) AS inserted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(application.applicant_email)
        .bind(application.applicant_name)
        .bind(application.job_id)
        .bind(application.company_name)
        .bind(application.company_location)
        .bind(application.job_title)
        .bind(application.job_type)
        .bind(application.resume_link)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match outcome {
            Some((id, true)) => WriteAck::inserted(id),
            Some((_, false)) => WriteAck::updated(1, 1),
            None => WriteAck::updated(1, 0),
        })
    }

    async fn delete_application(&self, id: Uuid) -> StoreResult<WriteAck> {
        let result = sqlx::query("DELETE FROM applied_jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(WriteAck::deleted(result.rows_affected()))
    }
}
