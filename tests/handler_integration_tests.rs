mod common;

use axum::http::{Method, StatusCode, header};
use common::{
    APPLICANT_EMAIL, HR_EMAIL, OTHER_EMAIL, application_body, job_body, set_cookie_pair, spawn_app,
};
use serde_json::{Value, json};
use tokio::test;
use uuid::Uuid;

fn titles(body: &Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|job| job["job_title"].as_str().unwrap().to_string())
        .collect()
}

// --- Public reads ---

#[test]
async fn root_reports_liveness() {
    let app = spawn_app();
    let response = app.get("/", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!("Job portal server is running..."));
}

#[test]
async fn job_categories_are_listed_with_document_ids() {
    let app = spawn_app();
    let response = app.get("/jobCategories", None).await;

    assert_eq!(response.status, StatusCode::OK);
    let categories = response.body.as_array().unwrap();
    assert_eq!(categories.len(), 3);
    assert!(categories.iter().all(|c| c["_id"].is_string()));
    assert!(
        categories
            .iter()
            .any(|c| c["name"] == json!("Web Development"))
    );
}

#[test]
async fn hot_jobs_filters_by_exact_category() {
    let app = spawn_app();
    app.post_job(HR_EMAIL, job_body("Frontend Dev", "Dhaka", 100, 200))
        .await;
    let mut marketing = job_body("SEO Lead", "Dhaka", 100, 200);
    marketing["category"] = json!("Digital Marketing");
    app.post_job(HR_EMAIL, marketing).await;

    let response = app.get("/hotJob/Digital%20Marketing", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(titles(&response.body), vec!["SEO Lead"]);
}

#[test]
async fn get_job_returns_null_for_unknown_id() {
    let app = spawn_app();
    let response = app.get(&format!("/jobs/{}", Uuid::new_v4()), None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Value::Null);
}

#[test]
async fn get_job_rejects_malformed_id() {
    let app = spawn_app();
    let response = app.get("/jobs/not-an-id", None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["message"].is_string());
}

#[test]
async fn posted_job_is_readable_with_server_owned_fields() {
    let app = spawn_app();
    let id = app
        .post_job(HR_EMAIL, job_body("Backend Dev", "Chittagong", 300, 500))
        .await;

    let response = app.get(&format!("/jobs/{id}"), None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["_id"], json!(id));
    assert_eq!(response.body["hr_email"], json!(HR_EMAIL));
    assert_eq!(response.body["status"], json!("Active"));
    assert_eq!(response.body["salaryRange"], json!({ "min": 300, "max": 500 }));
    assert!(response.body["postedAt"].is_string());
}

#[test]
async fn jobs_by_hr_lists_only_that_owner() {
    let app = spawn_app();
    app.post_job(HR_EMAIL, job_body("Mine", "Dhaka", 1, 2)).await;
    app.post_job(OTHER_EMAIL, job_body("Theirs", "Dhaka", 1, 2))
        .await;

    let response = app.get(&format!("/jobs/postByHr/{HR_EMAIL}"), None).await;

    assert_eq!(titles(&response.body), vec!["Mine"]);
}

// --- Job listing filters ---

#[test]
async fn salary_band_requires_both_bounds() {
    let app = spawn_app();
    app.post_job(HR_EMAIL, job_body("Low", "Dhaka", 100, 200)).await;
    app.post_job(HR_EMAIL, job_body("High", "Dhaka", 800, 900)).await;

    let banded = app.get("/jobs?minSalary=50&maxSalary=300", None).await;
    assert_eq!(titles(&banded.body), vec!["Low"]);

    let only_min = app.get("/jobs?minSalary=500", None).await;
    assert_eq!(titles(&only_min.body), vec!["Low", "High"]);

    let empty_values = app.get("/jobs?minSalary=&maxSalary=", None).await;
    assert_eq!(empty_values.status, StatusCode::OK);
    assert_eq!(titles(&empty_values.body), vec!["Low", "High"]);
}

#[test]
async fn salary_band_excludes_jobs_straddling_a_bound() {
    let app = spawn_app();
    app.post_job(HR_EMAIL, job_body("Inside", "Dhaka", 100, 300)).await;
    app.post_job(HR_EMAIL, job_body("Straddles", "Dhaka", 100, 301))
        .await;

    let response = app.get("/jobs?minSalary=100&maxSalary=300", None).await;

    assert_eq!(titles(&response.body), vec!["Inside"]);
}

#[test]
async fn search_text_matches_location_case_insensitively() {
    let app = spawn_app();
    app.post_job(HR_EMAIL, job_body("A", "Remote - Dhaka", 1, 2)).await;
    app.post_job(HR_EMAIL, job_body("B", "Sylhet", 1, 2)).await;

    let response = app.get("/jobs?searchText=dHaKa", None).await;

    assert_eq!(titles(&response.body), vec!["A"]);
}

#[test]
async fn sort_orders_by_minimum_salary_and_keeps_ties_stable() {
    let app = spawn_app();
    app.post_job(HR_EMAIL, job_body("Mid-1", "Dhaka", 500, 600)).await;
    app.post_job(HR_EMAIL, job_body("Low", "Dhaka", 100, 600)).await;
    app.post_job(HR_EMAIL, job_body("Mid-2", "Dhaka", 500, 700)).await;

    let asc = app.get("/jobs?sort=asc", None).await;
    assert_eq!(titles(&asc.body), vec!["Low", "Mid-1", "Mid-2"]);

    let desc = app.get("/jobs?sort=desc", None).await;
    assert_eq!(titles(&desc.body), vec!["Mid-1", "Mid-2", "Low"]);
}

#[test]
async fn unknown_sort_or_non_numeric_salary_is_rejected() {
    let app = spawn_app();

    let bad_sort = app.get("/jobs?sort=sideways", None).await;
    assert_eq!(bad_sort.status, StatusCode::BAD_REQUEST);

    let bad_salary = app.get("/jobs?minSalary=lots&maxSalary=10", None).await;
    assert_eq!(bad_salary.status, StatusCode::BAD_REQUEST);
}

// --- Job writes ---

#[test]
async fn posting_requires_a_session() {
    let app = spawn_app();
    let response = app
        .request(
            Method::POST,
            "/jobs/new",
            None,
            Some(job_body("X", "Dhaka", 1, 2)),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(app.get("/jobs", None).await.body.as_array().unwrap().is_empty());
}

#[test]
async fn forged_session_is_refused_with_401() {
    let app = spawn_app();
    let response = app
        .request(
            Method::POST,
            "/jobs/new",
            Some("token=not.a.jwt"),
            Some(job_body("X", "Dhaka", 1, 2)),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[test]
async fn posting_takes_owner_from_session_not_body() {
    let app = spawn_app();
    let mut body = job_body("Spoofed", "Dhaka", 1, 2);
    body["hr_email"] = json!(OTHER_EMAIL);

    let id = app.post_job(HR_EMAIL, body).await;
    let job = app.get(&format!("/jobs/{id}"), None).await;

    assert_eq!(job.body["hr_email"], json!(HR_EMAIL));
}

#[test]
async fn posting_rejects_inverted_salary_range() {
    let app = spawn_app();
    let cookie = app.session_for(HR_EMAIL);
    let response = app
        .request(
            Method::POST,
            "/jobs/new",
            Some(&cookie),
            Some(job_body("Bad", "Dhaka", 900, 100)),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[test]
async fn replace_job_by_owner_reports_modification() {
    let app = spawn_app();
    let id = app.post_job(HR_EMAIL, job_body("Old", "Dhaka", 1, 2)).await;
    let cookie = app.session_for(HR_EMAIL);

    let response = app
        .request(
            Method::PUT,
            &format!("/jobs/{id}"),
            Some(&cookie),
            Some(job_body("New", "Dhaka", 1, 2)),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["matchedCount"], json!(1));
    assert_eq!(response.body["modifiedCount"], json!(1));
    let job = app.get(&format!("/jobs/{id}"), None).await;
    assert_eq!(job.body["job_title"], json!("New"));
}

#[test]
async fn replace_job_by_another_account_is_unauthorized() {
    let app = spawn_app();
    let id = app.post_job(HR_EMAIL, job_body("Mine", "Dhaka", 1, 2)).await;
    let cookie = app.session_for(OTHER_EMAIL);

    let response = app
        .request(
            Method::PUT,
            &format!("/jobs/{id}"),
            Some(&cookie),
            Some(job_body("Hijacked", "Dhaka", 1, 2)),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    let job = app.get(&format!("/jobs/{id}"), None).await;
    assert_eq!(job.body["job_title"], json!("Mine"));
}

#[test]
async fn expiring_a_job_is_idempotent() {
    let app = spawn_app();
    let id = app.post_job(HR_EMAIL, job_body("Closing", "Dhaka", 1, 2)).await;
    let cookie = app.session_for(HR_EMAIL);
    let uri = format!("/jobs?id={id}");

    let first = app.request(Method::PATCH, &uri, Some(&cookie), None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["modifiedCount"], json!(1));

    let second = app.request(Method::PATCH, &uri, Some(&cookie), None).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["matchedCount"], json!(1));
    assert_eq!(second.body["modifiedCount"], json!(0));

    let job = app.get(&format!("/jobs/{id}"), None).await;
    assert_eq!(job.body["status"], json!("Expired"));
}

#[test]
async fn expire_without_id_is_bad_request() {
    let app = spawn_app();
    let cookie = app.session_for(HR_EMAIL);

    let response = app.request(Method::PATCH, "/jobs", Some(&cookie), None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[test]
async fn deleting_unknown_job_acknowledges_zero() {
    let app = spawn_app();
    let cookie = app.session_for(HR_EMAIL);

    let response = app
        .request(
            Method::DELETE,
            &format!("/jobs/{}", Uuid::new_v4()),
            Some(&cookie),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["acknowledged"], json!(true));
    assert_eq!(response.body["deletedCount"], json!(0));
}

#[test]
async fn owner_can_delete_job() {
    let app = spawn_app();
    let id = app.post_job(HR_EMAIL, job_body("Gone", "Dhaka", 1, 2)).await;
    let cookie = app.session_for(HR_EMAIL);

    let response = app
        .request(Method::DELETE, &format!("/jobs/{id}"), Some(&cookie), None)
        .await;

    assert_eq!(response.body["deletedCount"], json!(1));
    assert_eq!(app.get(&format!("/jobs/{id}"), None).await.body, Value::Null);
}

// --- Users ---

#[test]
async fn users_are_stored_and_looked_up_by_email() {
    let app = spawn_app();
    let body = json!({
        "email": APPLICANT_EMAIL,
        "name": "Sam",
        "photoURL": "https://img.example.com/sam.png",
        "role": "applicant"
    });

    let created = app.request(Method::POST, "/users", None, Some(body)).await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.body["insertedCount"], json!(1));

    let fetched = app.get(&format!("/users/{APPLICANT_EMAIL}"), None).await;
    assert_eq!(fetched.body["name"], json!("Sam"));
    assert_eq!(fetched.body["photoURL"], json!("https://img.example.com/sam.png"));

    let missing = app.get("/users/nobody@mail.com", None).await;
    assert_eq!(missing.status, StatusCode::OK);
    assert_eq!(missing.body, Value::Null);
}

#[test]
async fn user_signup_rejects_invalid_email() {
    let app = spawn_app();
    let response = app
        .request(Method::POST, "/users", None, Some(json!({ "email": "nope" })))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

// --- Session lifecycle ---

#[test]
async fn jwt_sets_http_only_cookie_for_the_submitted_email() {
    let app = spawn_app();
    let response = app
        .request(
            Method::POST,
            "/jwt",
            None,
            Some(json!({ "email": APPLICANT_EMAIL })),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "success": true }));

    let raw = response.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(raw.contains("HttpOnly"));
    assert!(raw.contains("Path=/"));

    let pair = set_cookie_pair(&response.headers);
    let token = pair.strip_prefix("token=").unwrap();
    let claims = app.state.tokens.verify(token).unwrap();
    assert_eq!(claims.email, APPLICANT_EMAIL);
    assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
}

#[test]
async fn login_cookie_grants_access_and_logout_revokes_it() {
    let app = spawn_app();
    let login = app
        .request(
            Method::POST,
            "/jwt",
            None,
            Some(json!({ "email": APPLICANT_EMAIL })),
        )
        .await;
    let session = set_cookie_pair(&login.headers);
    let uri = format!("/appliedJobs?email={APPLICANT_EMAIL}");

    let allowed = app.get(&uri, Some(&session)).await;
    assert_eq!(allowed.status, StatusCode::OK);

    let logout = app
        .request(Method::POST, "/logout", Some(&session), None)
        .await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.body, json!({ "success": true }));
    let cleared = set_cookie_pair(&logout.headers);
    assert_eq!(cleared, "token=");
    let raw = logout.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(raw.contains("Max-Age=0"));

    let denied = app.get(&uri, Some(&cleared)).await;
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);
}

// --- Applications ---

#[test]
async fn applied_jobs_requires_matching_session_email() {
    let app = spawn_app();
    let cookie = app.session_for(APPLICANT_EMAIL);

    let own = app
        .get(&format!("/appliedJobs?email={APPLICANT_EMAIL}"), Some(&cookie))
        .await;
    assert_eq!(own.status, StatusCode::OK);

    let other = app
        .get(&format!("/appliedJobs?email={OTHER_EMAIL}"), Some(&cookie))
        .await;
    assert_eq!(other.status, StatusCode::UNAUTHORIZED);
    assert!(other.body["message"].is_string());

    let anonymous = app
        .get(&format!("/appliedJobs?email={APPLICANT_EMAIL}"), None)
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[test]
async fn reapplying_overwrites_instead_of_duplicating() {
    let app = spawn_app();
    let cookie = app.session_for(APPLICANT_EMAIL);
    let body = application_body(APPLICANT_EMAIL, "Frontend Dev");

    let first = app
        .request(Method::PUT, "/appliedJob", Some(&cookie), Some(body.clone()))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["insertedCount"], json!(1));

    let repeat = app
        .request(Method::PUT, "/appliedJob", Some(&cookie), Some(body.clone()))
        .await;
    assert_eq!(repeat.body["matchedCount"], json!(1));
    assert_eq!(repeat.body["modifiedCount"], json!(0));

    let mut new_resume = body;
    new_resume["resume_link"] = json!("https://cv.example.com/sam-v2.pdf");
    let changed = app
        .request(Method::PUT, "/appliedJob", Some(&cookie), Some(new_resume))
        .await;
    assert_eq!(changed.body["modifiedCount"], json!(1));

    let listed = app
        .get(&format!("/appliedJobs?email={APPLICANT_EMAIL}"), Some(&cookie))
        .await;
    let applications = listed.body.as_array().unwrap();
    assert_eq!(applications.len(), 1);
    assert_eq!(
        applications[0]["resume_link"],
        json!("https://cv.example.com/sam-v2.pdf")
    );
}

#[test]
async fn applying_on_behalf_of_someone_else_is_unauthorized() {
    let app = spawn_app();
    let cookie = app.session_for(OTHER_EMAIL);

    let response = app
        .request(
            Method::PUT,
            "/appliedJob",
            Some(&cookie),
            Some(application_body(APPLICANT_EMAIL, "Frontend Dev")),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[test]
async fn posting_applicants_are_listed_publicly() {
    let app = spawn_app();
    for applicant in [APPLICANT_EMAIL, OTHER_EMAIL] {
        let cookie = app.session_for(applicant);
        app.request(
            Method::PUT,
            "/appliedJob",
            Some(&cookie),
            Some(application_body(applicant, "Frontend Dev")),
        )
        .await;
    }
    let cookie = app.session_for(APPLICANT_EMAIL);
    app.request(
        Method::PUT,
        "/appliedJob",
        Some(&cookie),
        Some(application_body(APPLICANT_EMAIL, "Designer")),
    )
    .await;

    let response = app
        .get(
            "/appliedJobsCount?company_name=Acme&job_title=Frontend%20Dev",
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_array().unwrap().len(), 2);

    let missing_param = app.get("/appliedJobsCount?company_name=Acme", None).await;
    assert_eq!(missing_param.status, StatusCode::BAD_REQUEST);
}

#[test]
async fn withdrawing_an_application_checks_the_applicant() {
    let app = spawn_app();
    let cookie = app.session_for(APPLICANT_EMAIL);
    let created = app
        .request(
            Method::PUT,
            "/appliedJob",
            Some(&cookie),
            Some(application_body(APPLICANT_EMAIL, "Frontend Dev")),
        )
        .await;
    let id = created.body["insertedId"].as_str().unwrap().to_string();
    let uri = format!("/appliedJob/{id}");

    let intruder = app.session_for(OTHER_EMAIL);
    let refused = app.request(Method::DELETE, &uri, Some(&intruder), None).await;
    assert_eq!(refused.status, StatusCode::UNAUTHORIZED);

    let withdrawn = app.request(Method::DELETE, &uri, Some(&cookie), None).await;
    assert_eq!(withdrawn.body["deletedCount"], json!(1));

    let again = app.request(Method::DELETE, &uri, Some(&cookie), None).await;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(again.body["deletedCount"], json!(0));
}

// --- Cross-cutting ---

#[test]
async fn responses_carry_a_request_id() {
    let app = spawn_app();
    let response = app.get("/", None).await;

    assert!(response.headers.contains_key("x-request-id"));
}

#[test]
async fn openapi_document_is_served() {
    let app = spawn_app();
    let response = app.get("/api-docs/openapi.json", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["paths"]["/jobs"].is_object());
}
