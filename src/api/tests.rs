use super::*;
use crate::request::{HttpMethod, MockHttpClient};
use crate::session::MemoryStore;
use glycowatch_shared::RiskLevel;
use serde_json::json;
use std::cell::Cell;

const BASE: &str = "http://api.test";

// =========================================================
// 辅助函数
// =========================================================

type TestApi = GlycoApi<Rc<MockHttpClient>, Rc<MemoryStore>>;

fn create_api() -> (Rc<MockHttpClient>, Rc<MemoryStore>, TestApi) {
    let client = Rc::new(MockHttpClient::new());
    let store = Rc::new(MemoryStore::new());
    let session = Rc::new(SessionStore::new(store.clone()));
    let api = GlycoApi::new(&format!("{}/", BASE), client.clone(), session);
    (client, store, api)
}

fn url(path: &str) -> String {
    format!("{}{}", BASE, path)
}

fn alice_auth() -> serde_json::Value {
    json!({
        "access_token": "abc",
        "token_type": "bearer",
        "user": {"id": "1", "username": "alice", "height": 1.7, "weight": 65.0, "age": 30}
    })
}

fn prediction_body(pregnancies: u32) -> serde_json::Value {
    json!({
        "prediction": 0,
        "probability": 0.12,
        "risk_level": "Low Risk",
        "features_used": {
            "Pregnancies": pregnancies,
            "Glucose": 110.0,
            "BloodPressure": 70.0,
            "SkinThickness": 20.0,
            "Insulin": 80.0,
            "BMI": 22.5,
            "DiabetesPedigreeFunction": 0.35,
            "Age": 30
        }
    })
}

// =========================================================
// auth 测试
// =========================================================

#[tokio::test]
async fn test_login_stores_session() {
    let (client, _store, api) = create_api();
    client.mock_response(&url("/api/auth/login"), 200, alice_auth());

    let resp = api.login("alice", "pw").await.unwrap();

    assert_eq!(resp.access_token, "abc");
    assert_eq!(resp.user.username, "alice");
    assert_eq!(resp.user.height, 1.7);
    assert_eq!(api.session().get_token().as_deref(), Some("abc"));
    assert_eq!(api.session().get_user(), Some(resp.user));

    let req = client.last_request(&url("/api/auth/login")).unwrap();
    assert_eq!(req.method, HttpMethod::Post);
    assert!(!req.headers.contains_key(HEADER_AUTHORIZATION));
    let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
    assert_eq!(body, json!({"username": "alice", "password": "pw"}));
}

#[tokio::test]
async fn test_login_rejected_is_auth_error_without_redirect() {
    let (client, _store, api) = create_api();
    let fired = Rc::new(Cell::new(0));
    let counter = fired.clone();
    api.on_session_expired(move || counter.set(counter.get() + 1));
    client.mock_response(
        &url("/api/auth/login"),
        401,
        json!({"detail": "Incorrect username or password"}),
    );

    let err = api.login("alice", "wrong").await.unwrap_err();

    assert_eq!(err.kind, ClientErrorKind::Auth);
    assert_eq!(err.message(), "Incorrect username or password");
    assert_eq!(fired.get(), 0);
    assert!(!api.session().is_authenticated());
}

#[tokio::test]
async fn test_signup_rejection_is_validation_error() {
    let (client, _store, api) = create_api();
    client.mock_response(
        &url("/api/auth/signup"),
        400,
        json!({"detail": "Username already registered"}),
    );

    let req = SignupRequest {
        username: "alice".to_string(),
        password: "secret1".to_string(),
        pregnancies: 0,
        weight_kg: 65.0,
        height_m: 1.7,
        age: 30,
    };
    let err = api.signup(&req).await.unwrap_err();

    assert_eq!(err.kind, ClientErrorKind::Validation);
    assert_eq!(err.message(), "Username already registered");
    assert_eq!(err.status, Some(400));
}

#[tokio::test]
async fn test_signup_success_sends_profile() {
    let (client, _store, api) = create_api();
    client.mock_response(&url("/api/auth/signup"), 201, alice_auth());

    let req = SignupRequest {
        username: "alice".to_string(),
        password: "secret1".to_string(),
        pregnancies: 1,
        weight_kg: 65.0,
        height_m: 1.7,
        age: 30,
    };
    api.signup(&req).await.unwrap();

    assert!(api.session().is_authenticated());
    let sent = client.last_request(&url("/api/auth/signup")).unwrap();
    let body: serde_json::Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
    assert_eq!(body["weight_kg"], json!(65.0));
    assert_eq!(body["height_m"], json!(1.7));
    assert_eq!(body["pregnancies"], json!(1));
}

#[tokio::test]
async fn test_current_user_profile() {
    let (client, _store, api) = create_api();
    api.session().set_token("abc");
    client.mock_response(
        &url("/api/auth/me"),
        200,
        json!({
            "id": "1", "username": "alice", "pregnancies": 2, "weight_kg": 65.0,
            "height_m": 1.7, "age": 30, "bmi": 22.49, "created_at": "2024-01-01T00:00:00"
        }),
    );

    let profile = api.current_user().await.unwrap();
    assert_eq!(profile.pregnancies, 2);
    assert_eq!(profile.bmi, 22.49);
}

// =========================================================
// token 注入测试
// =========================================================

#[tokio::test]
async fn test_token_is_read_at_call_time() {
    let (client, _store, api) = create_api();
    let latest = url("/api/thingspeak/latest");
    client.mock_response(&latest, 200, json!({"Glucose": 100.0, "timestamp": "t"}));

    api.latest_sensor_reading().await.unwrap();
    let first = client.last_request(&latest).unwrap();
    assert!(!first.headers.contains_key(HEADER_AUTHORIZATION));

    api.session().set_token("t1");
    api.latest_sensor_reading().await.unwrap();
    assert_eq!(
        client.last_request(&latest).unwrap().headers[HEADER_AUTHORIZATION],
        "Bearer t1"
    );

    api.session().set_token("t2");
    api.latest_sensor_reading().await.unwrap();
    assert_eq!(
        client.last_request(&latest).unwrap().headers[HEADER_AUTHORIZATION],
        "Bearer t2"
    );
}

#[tokio::test]
async fn test_every_call_is_json() {
    let (client, _store, api) = create_api();
    let _ = api.history().await;
    let req = client.last_request(&url("/api/predictions/history")).unwrap();
    assert_eq!(req.headers[HEADER_CONTENT_TYPE], CONTENT_TYPE_JSON);
    assert_eq!(req.method, HttpMethod::Get);
    assert!(req.body.is_none());
}

// =========================================================
// 401 处理测试
// =========================================================

#[tokio::test]
async fn test_unauthorized_clears_session_and_fires_hook_once() {
    let (client, _store, api) = create_api();
    let fired = Rc::new(Cell::new(0));
    let counter = fired.clone();
    api.on_session_expired(move || counter.set(counter.get() + 1));
    api.session().set_token("stale");

    client.mock_response(&url("/api/predictions/history"), 401, json!({"detail": "expired"}));

    let err = api.history().await.unwrap_err();

    assert!(err.is_session_expired());
    assert_eq!(fired.get(), 1);
    assert!(!api.session().is_authenticated());
    assert_eq!(client.count(&url("/api/predictions/history")), 1);
}

#[tokio::test]
async fn test_end_to_end_login_predict_expire() {
    let (client, _store, api) = create_api();
    client.mock_response(&url("/api/auth/login"), 200, alice_auth());
    client.mock_response(&url("/api/predict"), 200, prediction_body(2));

    let auth = api.login("alice", "pw").await.unwrap();
    assert_eq!(auth.access_token, "abc");
    assert_eq!(auth.user.id, "1");
    assert_eq!(auth.user.weight, 65.0);
    assert_eq!(auth.user.age, 30);

    let result = api.predict(2).await.unwrap();
    assert_eq!(result.features_used.pregnancies, 2);
    assert_eq!(result.risk_level, RiskLevel::Low);

    let sent = client.last_request(&url("/api/predict")).unwrap();
    assert_eq!(sent.headers[HEADER_AUTHORIZATION], "Bearer abc");
    assert_eq!(sent.body.as_deref(), Some(r#"{"pregnancies":2}"#));

    client.mock_response(&url("/api/thingspeak/latest"), 401, json!({}));
    let err = api.latest_sensor_reading().await.unwrap_err();
    assert!(err.is_session_expired());
    assert!(!api.session().is_authenticated());
}

// =========================================================
// 错误映射测试
// =========================================================

#[tokio::test]
async fn test_prediction_error_carries_detail() {
    let (client, _store, api) = create_api();
    api.session().set_token("abc");
    client.mock_response(&url("/api/predict"), 500, json!({"detail": "Test samples not found"}));

    let err = api.predict(0).await.unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::Prediction);
    assert_eq!(err.message(), "Test samples not found");
}

#[tokio::test]
async fn test_prediction_error_without_detail_uses_fallback() {
    let (client, _store, api) = create_api();
    client.mock_response(&url("/api/predict"), 502, json!("bad gateway"));

    let err = api.predict(0).await.unwrap_err();
    assert_eq!(err.message(), PREDICTION_FAILED);
}

#[tokio::test]
async fn test_unreachable_sensor_is_upstream_error() {
    let (client, _store, api) = create_api();
    client.mock_transport_failure(&url("/api/thingspeak/latest"), "connection refused");

    let err = api.latest_sensor_reading().await.unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::Upstream);
    assert_eq!(err.message(), SENSOR_UNAVAILABLE);
    assert!(std::error::Error::source(&err).is_some());
}

#[tokio::test]
async fn test_malformed_body_uses_operation_fallback() {
    let (client, _store, api) = create_api();
    client.mock_response(&url("/api/predictions/history"), 200, json!({"not": "a list"}));

    let err = api.history().await.unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::Upstream);
    assert_eq!(err.message(), HISTORY_UNAVAILABLE);
    assert_eq!(err.spans()[0].operation, "/api/predictions/history");
    assert!(std::error::Error::source(&err).is_some());
}

#[tokio::test]
async fn test_predict_without_response_is_prediction_error() {
    let (client, _store, api) = create_api();
    api.session().set_token("abc");
    client.mock_transport_failure(&url("/api/predict"), "connection reset");

    let err = api.predict(1).await.unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::Prediction);
    assert_eq!(err.message(), PREDICTION_FAILED);
    assert!(std::error::Error::source(&err).is_some());
}

#[tokio::test]
async fn test_predict_undecodable_body_is_prediction_error() {
    let (client, _store, api) = create_api();
    api.session().set_token("abc");
    client.mock_response(&url("/api/predict"), 200, json!({"probability": 0.5}));

    let err = api.predict(1).await.unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::Prediction);
    assert_eq!(err.message(), PREDICTION_FAILED);
    assert_eq!(err.status, Some(200));
}

#[tokio::test]
async fn test_login_undecodable_body_keeps_session_empty() {
    let (client, _store, api) = create_api();
    client.mock_response(&url("/api/auth/login"), 200, json!({"access_token": "abc"}));

    let err = api.login("alice", "pw").await.unwrap_err();
    assert_eq!(err.kind, ClientErrorKind::Auth);
    assert_eq!(err.message(), LOGIN_FAILED);
    assert!(!api.session().is_authenticated());
}

#[tokio::test]
async fn test_history_keeps_server_order() {
    let (client, _store, api) = create_api();
    client.mock_response(
        &url("/api/predictions/history"),
        200,
        json!([
            {"id": "b", "timestamp": "2024-05-01T09:00:00", "prediction": 1, "probability": 0.9, "risk_level": "High Risk"},
            {"id": "a", "timestamp": "2024-05-02T09:00:00", "prediction": 0, "probability": 0.1, "risk_level": "Low Risk"}
        ]),
    );

    let history = api.history().await.unwrap();
    let ids: Vec<_> = history.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["b", "a"]);
    assert!(history[0].features_used.is_none());
}

#[tokio::test]
async fn test_sensor_status_is_free_form() {
    let (client, _store, api) = create_api();
    client.mock_response(
        &url("/api/thingspeak/status"),
        200,
        json!({"field1": {"name": "Glucose", "active": true}}),
    );

    let status = api.sensor_status().await.unwrap();
    assert_eq!(status["field1"]["name"], json!("Glucose"));
}

#[tokio::test]
async fn test_logout_clears_session() {
    let (_client, _store, api) = create_api();
    api.session().set_token("abc");
    api.logout();
    assert!(!api.session().is_authenticated());
}
