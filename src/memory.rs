use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    Application, AppliedJob, Category, Job, JobFields, JobFilter, JobStatus, NewUser, PostingKey,
    SalarySort, User, WriteAck,
};
use crate::repository::{Repository, StoreResult};

/// MemoryRepository
///
/// A `Repository` held entirely in process memory. Used by the integration
/// tests to drive the full router without a database. Vectors keep insertion
/// order, which doubles as the natural listing order.
///
/// Each collection sits behind its own lock, and every write takes that
/// lock once, so the application upsert is atomic here as well.
#[derive(Default)]
pub struct MemoryRepository {
    categories: RwLock<Vec<Category>>,
    jobs: RwLock<Vec<Job>>,
    users: RwLock<Vec<User>>,
    applications: RwLock<Vec<AppliedJob>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Categories are never written through the API; tests seed them here.
    pub fn with_categories<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let categories = names
            .into_iter()
            .map(|name| Category {
                id: Uuid::new_v4(),
                name: name.into(),
            })
            .collect();

        Self {
            categories: RwLock::new(categories),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut categories = self.categories.read().await.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn list_jobs_by_category(&self, category: &str) -> StoreResult<Vec<Job>> {
        let jobs = self.jobs.read().await;
        Ok(jobs
            .iter()
            .filter(|job| job.fields.category == category)
            .cloned()
            .collect())
    }

    async fn list_jobs(
        &self,
        filter: &JobFilter,
        sort: Option<SalarySort>,
    ) -> StoreResult<Vec<Job>> {
        let mut jobs: Vec<Job> = self
            .jobs
            .read()
            .await
            .iter()
            .filter(|job| filter.matches(job))
            .cloned()
            .collect();

        // `sort_by` is stable: equal salaries stay in insertion order.
        match sort {
            Some(SalarySort::Ascending) => jobs.sort_by(|a, b| {
                a.fields.salary_range.min.cmp(&b.fields.salary_range.min)
            }),
            Some(SalarySort::Descending) => jobs.sort_by(|a, b| {
                b.fields.salary_range.min.cmp(&a.fields.salary_range.min)
            }),
            None => {}
        }
        Ok(jobs)
    }

    async fn get_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        let jobs = self.jobs.read().await;
        Ok(jobs.iter().find(|job| job.id == id).cloned())
    }

    async fn list_jobs_by_owner(&self, hr_email: &str) -> StoreResult<Vec<Job>> {
        let jobs = self.jobs.read().await;
        Ok(jobs
            .iter()
            .filter(|job| job.hr_email == hr_email)
            .cloned()
            .collect())
    }

    async fn create_job(&self, hr_email: &str, fields: JobFields) -> StoreResult<WriteAck> {
        let id = Uuid::new_v4();
        self.jobs.write().await.push(Job {
            id,
            hr_email: hr_email.to_string(),
            fields,
            status: JobStatus::Active,
            posted_at: Utc::now(),
        });
        Ok(WriteAck::inserted(id))
    }

    async fn replace_job(&self, id: Uuid, fields: JobFields) -> StoreResult<WriteAck> {
        let mut jobs = self.jobs.write().await;
        Ok(match jobs.iter_mut().find(|job| job.id == id) {
            Some(job) if job.fields == fields => WriteAck::updated(1, 0),
            Some(job) => {
                job.fields = fields;
                WriteAck::updated(1, 1)
            }
            None => WriteAck::updated(0, 0),
        })
    }

    async fn expire_job(&self, id: Uuid) -> StoreResult<WriteAck> {
        let mut jobs = self.jobs.write().await;
        Ok(match jobs.iter_mut().find(|job| job.id == id) {
            Some(job) if job.status == JobStatus::Expired => WriteAck::updated(1, 0),
            Some(job) => {
                job.status = JobStatus::Expired;
                WriteAck::updated(1, 1)
            }
            None => WriteAck::updated(0, 0),
        })
    }

    async fn delete_job(&self, id: Uuid) -> StoreResult<WriteAck> {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|job| job.id != id);
        Ok(WriteAck::deleted((before - jobs.len()) as u64))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<WriteAck> {
        let id = Uuid::new_v4();
        self.users.write().await.push(User {
            id,
            email: user.email,
            name: user.name,
            photo_url: user.photo_url,
            role: user.role,
            created_at: Utc::now(),
        });
        Ok(WriteAck::inserted(id))
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|user| user.email == email).cloned())
    }

    async fn list_applications_by_applicant(&self, email: &str) -> StoreResult<Vec<AppliedJob>> {
        let applications = self.applications.read().await;
        Ok(applications
            .iter()
            .filter(|applied| applied.application.applicant_email == email)
            .cloned()
            .collect())
    }

    async fn list_applications_for_posting(
        &self,
        key: &PostingKey,
    ) -> StoreResult<Vec<AppliedJob>> {
        let applications = self.applications.read().await;
        Ok(applications
            .iter()
            .filter(|applied| {
                applied.application.company_name == key.company_name
                    && applied.application.job_title == key.job_title
            })
            .cloned()
            .collect())
    }

    async fn get_application(&self, id: Uuid) -> StoreResult<Option<AppliedJob>> {
        let applications = self.applications.read().await;
        Ok(applications.iter().find(|applied| applied.id == id).cloned())
    }

    async fn upsert_application(&self, application: Application) -> StoreResult<WriteAck> {
        let mut applications = self.applications.write().await;

        if let Some(existing) = applications
            .iter_mut()
            .find(|applied| applied.application.same_identity(&application))
        {
            if existing.application == application {
                return Ok(WriteAck::updated(1, 0));
            }
            existing.application = application;
            return Ok(WriteAck::updated(1, 1));
        }

        let id = Uuid::new_v4();
        applications.push(AppliedJob {
            id,
            application,
            applied_at: Utc::now(),
        });
        Ok(WriteAck::inserted(id))
    }

    async fn delete_application(&self, id: Uuid) -> StoreResult<WriteAck> {
        let mut applications = self.applications.write().await;
        let before = applications.len();
        applications.retain(|applied| applied.id != id);
        Ok(WriteAck::deleted((before - applications.len()) as u64))
    }
}
