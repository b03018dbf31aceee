#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use job_portal::{AppConfig, AppState, MemoryRepository, create_router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::util::ServiceExt;

pub const HR_EMAIL: &str = "hr@acme.com";
pub const APPLICANT_EMAIL: &str = "applicant@mail.com";
pub const OTHER_EMAIL: &str = "intruder@mail.com";

/// A router wired to a fresh in-memory store.
pub struct TestApp {
    pub router: Router,
    pub repo: Arc<MemoryRepository>,
    pub state: AppState,
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(MemoryRepository::with_categories([
        "Web Development",
        "Digital Marketing",
        "Graphics Design",
    ]))
}

pub fn spawn_app_with(repo: MemoryRepository) -> TestApp {
    let repo = Arc::new(repo);
    let state = AppState::new(repo.clone(), AppConfig::default());
    TestApp {
        router: create_router(state.clone()),
        repo,
        state,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    /// `Cookie` header value carrying a valid session for `email`.
    pub fn session_for(&self, email: &str) -> String {
        let token = self.state.tokens.issue(email).unwrap();
        format!("token={token}")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, cookie, None).await
    }

    /// Posts a job as `hr_email` and returns its id.
    pub async fn post_job(&self, hr_email: &str, body: Value) -> String {
        let cookie = self.session_for(hr_email);
        let response = self
            .request(Method::POST, "/jobs/new", Some(&cookie), Some(body))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.body["insertedId"].as_str().unwrap().to_string()
    }
}

pub fn job_body(title: &str, location: &str, min: i64, max: i64) -> Value {
    json!({
        "hr_name": "Jane HR",
        "job_title": title,
        "company_name": "Acme",
        "company_location": "Dhaka",
        "category": "Web Development",
        "jobType": "Remote",
        "salaryRange": { "min": min, "max": max },
        "location": location,
        "applicationDeadline": "2030-12-31",
        "description": "Build things."
    })
}

pub fn application_body(applicant: &str, title: &str) -> Value {
    json!({
        "applicant_email": applicant,
        "applicant_name": "Sam Applicant",
        "company_name": "Acme",
        "company_location": "Dhaka",
        "job_title": title,
        "jobType": "Remote",
        "resume_link": "https://cv.example.com/sam.pdf"
    })
}

/// The `name=value` pair of the first `Set-Cookie` header.
pub fn set_cookie_pair(headers: &HeaderMap) -> String {
    headers
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .unwrap()
        .trim()
        .to_string()
}
