use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

const TEST_API_KEY: &str = "flow-test-key";

fn build_app(state: talent_pool_backend::AppState) -> Router {
    let base_routes = Router::new().route(
        "/health",
        get(talent_pool_backend::routes::health::health),
    );

    let candidate_api = Router::new()
        .route(
            "/candidates",
            get(talent_pool_backend::routes::candidate_routes::list_candidates),
        )
        .route(
            "/candidates/:id",
            get(talent_pool_backend::routes::candidate_routes::get_candidate)
                .patch(talent_pool_backend::routes::candidate_routes::update_candidate),
        )
        .route(
            "/candidates/:id/related",
            get(talent_pool_backend::routes::candidate_routes::related_candidates),
        )
        .layer(axum::middleware::from_fn(
            talent_pool_backend::middleware::auth::require_api_key,
        ));

    base_routes.merge(candidate_api).with_state(state)
}

#[allow(clippy::too_many_arguments)]
async fn insert_candidate(
    pool: &PgPool,
    full_name: &str,
    headline: &str,
    location: &str,
    years: i32,
    skills: &[&str],
    availability: &str,
    status: &str,
    score: i32,
) -> Uuid {
    let skills: Vec<String> = skills.iter().map(|s| s.to_string()).collect();
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO candidates \
         (full_name, headline, location, years_of_experience, skills, availability, status, score) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id",
    )
    .bind(full_name)
    .bind(headline)
    .bind(location)
    .bind(years)
    .bind(skills)
    .bind(availability)
    .bind(status)
    .bind(score)
    .fetch_one(pool)
    .await
    .expect("insert candidate")
}

async fn get_json(resp: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn list(app: &Router, query: &str) -> JsonValue {
    let uri = if query.is_empty() {
        "/candidates".to_string()
    } else {
        format!("/candidates?{}", query)
    };
    let req = Request::builder()
        .uri(uri)
        .header("x-api-key", TEST_API_KEY)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    get_json(resp).await
}

async fn patch(app: &Router, id: Uuid, body: JsonValue) -> (StatusCode, JsonValue) {
    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/candidates/{}", id))
        .header("content-type", "application/json")
        .header("x-api-key", TEST_API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    (status, get_json(resp).await)
}

#[tokio::test]
async fn candidate_flow_end_to_end() {
    dotenvy::dotenv().ok();
    if env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set, skipping candidate flow test");
        return;
    }
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("API_KEY", TEST_API_KEY);
    env::set_var("API_RPS", "1000");

    talent_pool_backend::config::init_config().expect("init config");
    let pool = talent_pool_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    sqlx::query("DELETE FROM audit_events")
        .execute(&pool)
        .await
        .expect("clear audit_events");
    sqlx::query("DELETE FROM candidates")
        .execute(&pool)
        .await
        .expect("clear candidates");

    let maya = insert_candidate(
        &pool,
        "Maya Torres",
        "Senior Frontend Engineer",
        "San Francisco, CA",
        8,
        &["JavaScript", "React", "Node.js"],
        "2 weeks",
        "screening",
        86,
    )
    .await;
    let daniel = insert_candidate(
        &pool,
        "Daniel Okafor",
        "Full-Stack Developer",
        "San Francisco, CA",
        7,
        &["JavaScript", "React", "TypeScript"],
        "immediate",
        "new",
        78,
    )
    .await;
    let ingrid = insert_candidate(
        &pool,
        "Ingrid Svensson",
        "Backend Engineer",
        "Stockholm",
        11,
        &["Rust", "PostgreSQL", "Kubernetes"],
        "1 month",
        "interviewing",
        91,
    )
    .await;
    let _rachel = insert_candidate(
        &pool,
        "Rachel Adeyemi",
        "Frontend Engineer",
        "London",
        3,
        &["JavaScript", "Vue.js", "CSS"],
        "immediate",
        "screening",
        76,
    )
    .await;

    let app = build_app(talent_pool_backend::AppState::new(pool.clone()));

    // Unfiltered page with defaults.
    let body = list(&app, "").await;
    assert_eq!(body["meta"]["total"], 4);
    assert_eq!(body["meta"]["page"], 1);
    assert_eq!(body["meta"]["pageSize"], 12);
    assert_eq!(body["meta"]["totalPages"], 1);
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
    assert!(body["data"][0]["fullName"].is_string());
    assert!(body["data"][0]["yearsOfExperience"].is_number());

    // Free-text search covers name, headline, and skills, case-insensitively.
    assert_eq!(list(&app, "q=react").await["meta"]["total"], 2);
    assert_eq!(list(&app, "q=REACT").await["meta"]["total"], 2);
    assert_eq!(list(&app, "q=svensson").await["meta"]["total"], 1);

    // Skill membership is exact and case-sensitive.
    assert_eq!(list(&app, "skill=JavaScript").await["meta"]["total"], 3);
    assert_eq!(list(&app, "skill=javascript").await["meta"]["total"], 0);

    // Substring filters.
    let body = list(&app, "location=stockholm").await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["fullName"], "Ingrid Svensson");
    assert_eq!(list(&app, "availability=immediate").await["meta"]["total"], 2);
    assert_eq!(list(&app, "status=screen").await["meta"]["total"], 2);

    // Inclusive experience bounds, combined with AND.
    assert_eq!(list(&app, "minExp=7&maxExp=11").await["meta"]["total"], 3);
    assert_eq!(
        list(&app, "skill=JavaScript&minExp=5").await["meta"]["total"],
        2
    );

    // Sorting and pagination.
    let page_one = list(&app, "sort=yearsOfExperience&order=desc&pageSize=2").await;
    assert_eq!(page_one["meta"]["totalPages"], 2);
    assert_eq!(page_one["data"][0]["fullName"], "Ingrid Svensson");
    assert_eq!(page_one["data"][1]["fullName"], "Maya Torres");
    let page_two = list(&app, "sort=yearsOfExperience&order=desc&pageSize=2&page=2").await;
    assert_eq!(page_two["data"][0]["fullName"], "Daniel Okafor");
    assert_eq!(page_two["data"][1]["fullName"], "Rachel Adeyemi");

    let by_name = list(&app, "sort=fullName&order=asc").await;
    assert_eq!(by_name["data"][0]["fullName"], "Daniel Okafor");

    let by_score = list(&app, "sort=score&order=desc").await;
    assert_eq!(by_score["data"][0]["fullName"], "Ingrid Svensson");

    // Identical queries return identical pages; the first one warms the cache.
    let first = list(&app, "status=interview").await;
    assert_eq!(first["meta"]["total"], 1);
    let second = list(&app, "status=interview").await;
    assert_eq!(first, second);

    // Update stages exactly one audit event for the changed field.
    let (status, detail) = patch(&app, maya, json!({ "status": "interviewing" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["status"], "interviewing");
    let audit = detail["auditLog"].as_array().unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0]["action"], "status_updated");
    assert_eq!(audit[0]["from"], "screening");
    assert_eq!(audit[0]["to"], "interviewing");
    assert_eq!(audit[0]["candidateId"], maya.to_string());
    let updated_at: DateTime<Utc> =
        serde_json::from_value(detail["updatedAt"].clone()).unwrap();

    // The write invalidated the cached page.
    let third = list(&app, "status=interview").await;
    assert_eq!(third["meta"]["total"], 2);

    // Re-applying the same value adds no audit entry but still bumps updatedAt.
    let (status, detail) = patch(&app, maya, json!({ "status": "interviewing" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["auditLog"].as_array().unwrap().len(), 1);
    let bumped_at: DateTime<Utc> =
        serde_json::from_value(detail["updatedAt"].clone()).unwrap();
    assert!(bumped_at > updated_at);

    // Boolean diffs stringify their values; newest event comes first.
    let (status, detail) = patch(&app, maya, json!({ "shortlisted": true, "rejected": false })).await;
    assert_eq!(status, StatusCode::OK);
    let audit = detail["auditLog"].as_array().unwrap();
    assert_eq!(audit.len(), 2);
    assert_eq!(audit[0]["action"], "shortlisted_updated");
    assert_eq!(audit[0]["from"], "false");
    assert_eq!(audit[0]["to"], "true");
    assert_eq!(audit[1]["action"], "status_updated");

    // Detail read returns the candidate with its trail.
    let req = Request::builder()
        .uri(format!("/candidates/{}", maya))
        .header("x-api-key", TEST_API_KEY)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let detail = get_json(resp).await;
    assert_eq!(detail["fullName"], "Maya Torres");
    assert_eq!(detail["shortlisted"], true);
    assert_eq!(detail["auditLog"].as_array().unwrap().len(), 2);

    // Related ranking: same-location overlapping-skills peer wins.
    let req = Request::builder()
        .uri(format!("/candidates/{}/related?limit=2", maya))
        .header("x-api-key", TEST_API_KEY)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let related = get_json(resp).await;
    let data = related["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["fullName"], "Daniel Okafor");

    // Default limit covers the remaining three; target is never included.
    let req = Request::builder()
        .uri(format!("/candidates/{}/related", maya))
        .header("x-api-key", TEST_API_KEY)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let related = get_json(resp).await;
    let data = related["data"].as_array().unwrap();
    assert_eq!(data.len(), 3);
    assert!(data
        .iter()
        .all(|c| c["id"].as_str() != Some(maya.to_string().as_str())));

    // Unknown ids are 404 on every candidate endpoint.
    let missing = Uuid::new_v4();
    for uri in [
        format!("/candidates/{}", missing),
        format!("/candidates/{}/related", missing),
    ] {
        let req = Request::builder()
            .uri(uri)
            .header("x-api-key", TEST_API_KEY)
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
    let (status, _) = patch(&app, missing, json!({ "status": "hired" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A candidate that was never updated has an empty trail.
    let req = Request::builder()
        .uri(format!("/candidates/{}", daniel))
        .header("x-api-key", TEST_API_KEY)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let detail = get_json(resp).await;
    assert_eq!(detail["auditLog"].as_array().unwrap().len(), 0);

    // Related lookup for a far-away profile still returns the others.
    let req = Request::builder()
        .uri(format!("/candidates/{}/related?limit=1", ingrid))
        .header("x-api-key", TEST_API_KEY)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let related = get_json(resp).await;
    assert_eq!(related["data"].as_array().unwrap().len(), 1);
}
