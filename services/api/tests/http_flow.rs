use std::sync::Arc;

use api_lib::config::Config;
use api_lib::web::{build_router, AppState};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    router: Router,
    data_file: std::path::PathBuf,
    _temp_dir: TempDir,
}

async fn create_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let data_file = temp_dir.path().join("paid_questionnaire_new_data.csv");
    let config = Arc::new(Config::local(&data_file));
    let state = AppState::from_config(config).await.unwrap();
    TestApp {
        router: build_router(Arc::new(state)),
        data_file,
        _temp_dir: temp_dir,
    }
}

impl TestApp {
    async fn send(&self, req: Request<Body>) -> Response {
        self.router.clone().oneshot(req).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send(request(Method::GET, uri, cookie, None)).await
    }

    async fn post(&self, uri: &str, cookie: Option<&str>, body: Value) -> Response {
        self.send(request(Method::POST, uri, cookie, Some(body))).await
    }

    async fn put(&self, uri: &str, cookie: Option<&str>, body: Value) -> Response {
        self.send(request(Method::PUT, uri, cookie, Some(body))).await
    }

    /// Logs in and returns the `session=...` cookie pair.
    async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .post(
                "/auth/login",
                None,
                json!({ "username": username, "password": password }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }
}

fn request(method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn complete_form(responses: &[u8]) -> Value {
    json!({
        "patient_id": "DH-0042",
        "name": "Shirin Sultana",
        "age": 47,
        "gender": "Female",
        "occupation": "Govt Sector",
        "income_pct": 25,
        "follow_ups": 3,
        "retinopathy": "No",
        "responses": responses,
    })
}

const THIRTY_TWO: [u8; 20] = [4, 4, 4, 4, 4, 3, 3, 3, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0];

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app().await;
    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_resolves_roles() {
    let app = create_test_app().await;

    let response = app
        .post(
            "/auth/login",
            None,
            json!({ "username": "enum07", "password": "pass07" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("session="));
    assert!(set_cookie.contains("HttpOnly"));
    let body = body_json(response).await;
    assert_eq!(body["role"], "enumerator");

    let response = app
        .post(
            "/auth/login",
            None,
            json!({ "username": "admin", "password": "admin123" }),
        )
        .await;
    assert_eq!(body_json(response).await["role"], "admin");
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = create_test_app().await;
    for (username, password) in [("enum07", "wrong"), ("nobody", "pass01"), ("ADMIN", "admin123")] {
        let response = app
            .post(
                "/auth/login",
                None,
                json!({ "username": username, "password": password }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(body_bytes(response).await, b"Invalid credentials.");
    }
}

#[tokio::test]
async fn test_protected_routes_require_a_session() {
    let app = create_test_app().await;
    assert_eq!(
        app.get("/questionnaire", None).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.get("/admin/records", Some("session=not-a-session"))
            .await
            .status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_roles_are_routed_to_their_screens() {
    let app = create_test_app().await;
    let admin = app.login("admin", "admin123").await;
    let enumerator = app.login("enum03", "pass03").await;

    assert_eq!(
        app.get("/questionnaire", Some(&admin)).await.status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        app.get("/admin/records", Some(&enumerator)).await.status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        app.get("/admin/records/export", Some(&enumerator))
            .await
            .status(),
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_form_definition_lists_the_questionnaire() {
    let app = create_test_app().await;
    let cookie = app.login("enum01", "pass01").await;

    let response = app.get("/questionnaire", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["enumerator"], "enum01");
    assert_eq!(body["questions"].as_array().unwrap().len(), 20);
    assert_eq!(body["questions"][19]["number"], 20);
    assert_eq!(body["response_options"][4]["label"], "Serious problem (4)");
    assert_eq!(body["occupations"].as_array().unwrap().len(), 5);
    assert_eq!(body["limits"]["patient_id_max_chars"], 20);
}

#[tokio::test]
async fn test_validate_then_submit_stores_the_record() {
    let app = create_test_app().await;
    let cookie = app.login("enum07", "pass07").await;
    let form = complete_form(&THIRTY_TWO);

    // Submit stays closed until the form is validated.
    let response = app
        .post("/questionnaire/submit", Some(&cookie), form.clone())
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .post("/questionnaire/validate", Some(&cookie), form.clone())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["validated"], true);

    let response = app
        .post("/questionnaire/submit", Some(&cookie), form.clone())
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["raw_score"], 32);
    assert_eq!(body["paid_score"], 40.0);
    assert_eq!(body["distress_level"], "Moderate Distress");
    assert_eq!(body["headline"], "Your PAID Score is 40.00 / 100");
    assert_eq!(body["summary"][0]["label"], "Raw Score");
    assert_eq!(body["summary"][1]["value"], 40.0);

    let text = std::fs::read_to_string(&app.data_file).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Timestamp,Enumerator,Patient_ID"));
    assert!(lines[1].contains(",enum07,DH-0042,Shirin Sultana,47,Female,Govt Sector,25,3,No,"));
    assert!(lines[1].ends_with(",32,40.00,Moderate Distress"));

    // The gate closes after a successful submission.
    let me = body_json(app.get("/auth/me", Some(&cookie)).await).await;
    assert_eq!(me["form_state"], "unvalidated");
    let response = app
        .post("/questionnaire/submit", Some(&cookie), form)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_missing_fields_block_submission() {
    let app = create_test_app().await;
    let cookie = app.login("enum02", "pass02").await;

    let mut form = complete_form(&[0; 20]);
    form["patient_id"] = json!("");
    form["name"] = json!("   ");
    form["gender"] = Value::Null;

    let response = app
        .post("/questionnaire/validate", Some(&cookie), form.clone())
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["validated"], false);
    assert_eq!(
        body["missing_fields"],
        json!(["Patient ID", "Full Name", "Gender"])
    );

    let response = app
        .post("/questionnaire/submit", Some(&cookie), form)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(!app.data_file.exists());
}

#[tokio::test]
async fn test_edit_after_validation_requires_revalidation() {
    let app = create_test_app().await;
    let cookie = app.login("enum05", "pass05").await;
    let form = complete_form(&[0; 20]);

    app.post("/questionnaire/validate", Some(&cookie), form.clone())
        .await;

    let mut edited = form.clone();
    edited["name"] = json!("Shirin S.");
    let response = app
        .put("/questionnaire/draft", Some(&cookie), edited.clone())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["form_state"], "stale");

    let response = app
        .post("/questionnaire/submit", Some(&cookie), edited.clone())
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    app.post("/questionnaire/validate", Some(&cookie), edited.clone())
        .await;
    let response = app
        .post("/questionnaire/submit", Some(&cookie), edited)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["paid_score"], 0.0);
    assert_eq!(body["distress_level"], "Low Distress");
}

#[tokio::test]
async fn test_submitting_an_unvalidated_variant_is_rejected() {
    let app = create_test_app().await;
    let cookie = app.login("enum06", "pass06").await;
    let form = complete_form(&[0; 20]);
    app.post("/questionnaire/validate", Some(&cookie), form)
        .await;

    let response = app
        .post("/questionnaire/submit", Some(&cookie), complete_form(&[4; 20]))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(!app.data_file.exists());
}

#[tokio::test]
async fn test_malformed_responses_are_rejected() {
    let app = create_test_app().await;
    let cookie = app.login("enum08", "pass08").await;

    let response = app
        .post("/questionnaire/validate", Some(&cookie), complete_form(&[1; 19]))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let mut values = [1u8; 20];
    values[3] = 5;
    let response = app
        .post("/questionnaire/validate", Some(&cookie), complete_form(&values))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["validated"], false);
}

#[tokio::test]
async fn test_sessions_do_not_share_validation() {
    let app = create_test_app().await;
    let first = app.login("enum10", "pass10").await;
    let second = app.login("enum11", "pass11").await;
    let form = complete_form(&[2; 20]);

    app.post("/questionnaire/validate", Some(&first), form.clone())
        .await;
    let response = app
        .post("/questionnaire/submit", Some(&second), form)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_admin_views_and_exports_records() {
    let app = create_test_app().await;
    let admin = app.login("admin", "admin123").await;

    let body = body_json(app.get("/admin/records", Some(&admin)).await).await;
    assert_eq!(body["message"], "No data available yet.");
    assert_eq!(body["total"], 0);
    assert_eq!(
        app.get("/admin/records/export", Some(&admin)).await.status(),
        StatusCode::NOT_FOUND
    );

    let enumerator = app.login("enum04", "pass04").await;
    for responses in [[0u8; 20], [4u8; 20]] {
        let form = complete_form(&responses);
        app.post("/questionnaire/validate", Some(&enumerator), form.clone())
            .await;
        let response = app
            .post("/questionnaire/submit", Some(&enumerator), form)
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let body = body_json(app.get("/admin/records", Some(&admin)).await).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["message"], Value::Null);
    let columns = body["columns"].as_array().unwrap();
    assert_eq!(columns.len(), 33);
    let raw_index = columns.iter().position(|c| c == "Raw_Score").unwrap();
    assert_eq!(body["rows"][0][raw_index], "0");
    assert_eq!(body["rows"][1][raw_index], "80");
    assert_eq!(body["rows"][1][raw_index + 1], "100.00");
    assert_eq!(body["rows"][1][raw_index + 2], "High Distress");

    let response = app.get("/admin/records/export", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"paid_data.csv\""
    );
    let exported = body_bytes(response).await;
    assert_eq!(exported, std::fs::read(&app.data_file).unwrap());
}

#[tokio::test]
async fn test_logout_ends_the_session() {
    let app = create_test_app().await;
    let cookie = app.login("enum09", "pass09").await;
    app.post("/questionnaire/validate", Some(&cookie), complete_form(&[1; 20]))
        .await;

    let response = app.post("/auth/logout", Some(&cookie), json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));
    assert_eq!(
        body_json(response).await["message"],
        "You have been logged out."
    );

    assert_eq!(
        app.get("/auth/me", Some(&cookie)).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.post("/auth/logout", Some(&cookie), json!({}))
            .await
            .status(),
        StatusCode::UNAUTHORIZED
    );

    // A fresh login starts with a closed gate.
    let cookie = app.login("enum09", "pass09").await;
    let me = body_json(app.get("/auth/me", Some(&cookie)).await).await;
    assert_eq!(me["form_state"], "unvalidated");
}

#[tokio::test]
async fn test_simultaneous_submits_store_one_record() {
    let app = create_test_app().await;
    let cookie = app.login("enum12", "pass12").await;
    let form = complete_form(&THIRTY_TWO);
    app.post("/questionnaire/validate", Some(&cookie), form.clone())
        .await;

    let (first, second) = tokio::join!(
        app.post("/questionnaire/submit", Some(&cookie), form.clone()),
        app.post("/questionnaire/submit", Some(&cookie), form),
    );
    let mut statuses = [first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);

    let text = std::fs::read_to_string(&app.data_file).unwrap();
    assert_eq!(text.lines().count(), 2);
}

#[tokio::test]
async fn test_failed_write_keeps_the_form_validated() {
    let app = create_test_app().await;
    let cookie = app.login("enum13", "pass13").await;
    let form = complete_form(&[2; 20]);
    app.post("/questionnaire/validate", Some(&cookie), form.clone())
        .await;

    // A directory in place of the data file makes the append fail.
    std::fs::create_dir(&app.data_file).unwrap();
    let response = app
        .post("/questionnaire/submit", Some(&cookie), form.clone())
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let me = body_json(app.get("/auth/me", Some(&cookie)).await).await;
    assert_eq!(me["form_state"], "validated");

    std::fs::remove_dir(&app.data_file).unwrap();
    let response = app
        .post("/questionnaire/submit", Some(&cookie), form)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}
