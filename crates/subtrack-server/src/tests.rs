//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use subtrack_core::{FixedClock, SubscriptionInput};
use tower::ServiceExt;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn setup_test_app_with_db(db: Database) -> Router {
    let config = ServerConfig {
        allowed_origins: vec![],
        ..Default::default()
    };
    create_router_with_clock(db, None, config, Arc::new(FixedClock(today())))
}

fn setup_test_app() -> Router {
    setup_test_app_with_db(Database::in_memory().unwrap())
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn netflix_body() -> serde_json::Value {
    serde_json::json!({
        "name": "Netflix",
        "monthly_price": "10.00",
        "yearly_price": "100.00",
        "billing_cycle": "monthly",
        "start_date": "2024-01-01",
        "category": "Entertainment"
    })
}

/// Create a subscription directly in the store and return its id
fn seed_subscription(db: &Database, name: &str, start: NaiveDate) -> i64 {
    let input = SubscriptionInput {
        name: name.to_string(),
        monthly_price: Some("9.99".parse().unwrap()),
        yearly_price: None,
        billing_cycle: subtrack_core::BillingCycle::Monthly,
        start_date: start,
        category: None,
    };
    db.create_subscription(&input, today()).unwrap().id
}

// ========== Subscription API Tests ==========

#[tokio::test]
async fn test_list_subscriptions_empty() {
    let app = setup_test_app();

    let response = app.oneshot(get_request("/api/subscriptions")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_subscription() {
    let app = setup_test_app();

    let response = app
        .oneshot(json_request("POST", "/api/subscriptions", netflix_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let json = get_body_json(response).await;
    assert_eq!(json["name"], "Netflix");
    assert_eq!(json["cost"], "10.00");
    assert_eq!(json["renewal_date"], "2024-07-01");
    assert_eq!(json["days_until_renewal"], 16);
    assert_eq!(json["is_active"], true);
    assert_eq!(json["monthly_equivalent"]["basis"], "exact");
    assert_eq!(json["savings_opportunity"]["savings_percentage"], "16.67");
    assert_eq!(json["savings_opportunity"]["recommendation"], "yearly");
}

#[tokio::test]
async fn test_create_subscription_validation_error() {
    let app = setup_test_app();

    let body = serde_json::json!({
        "name": "Office",
        "yearly_price": "99.99",
        "billing_cycle": "monthly",
        "start_date": "2024-01-01"
    });
    let response = app
        .oneshot(json_request("POST", "/api/subscriptions", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Monthly price is required"));
}

#[tokio::test]
async fn test_create_subscription_requires_a_price() {
    let app = setup_test_app();

    let body = serde_json::json!({
        "name": "Free",
        "billing_cycle": "monthly",
        "start_date": "2024-01-01"
    });
    let response = app
        .oneshot(json_request("POST", "/api/subscriptions", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_subscription_rejects_oversized_price() {
    let app = setup_test_app();

    let body = serde_json::json!({
        "name": "Huge",
        "monthly_price": "10000000000000000000000000000",
        "billing_cycle": "monthly",
        "start_date": "2024-01-01"
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/subscriptions", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Monthly price must be less than"));

    let response = app.oneshot(get_request("/api/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_list_requests_refresh_safely() {
    let db = Database::in_memory().unwrap();
    for i in 0..30 {
        seed_subscription(&db, &format!("Sub {}", i), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }
    // By September every stored renewal date (2024-07-01) is stale
    let later = NaiveDate::from_ymd_opt(2024, 9, 15).unwrap();
    let app = create_router_with_clock(db, None, ServerConfig::default(), Arc::new(FixedClock(later)));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { app.oneshot(get_request("/api/subscriptions")).await.unwrap() })
        })
        .collect();

    for handle in handles {
        let response = handle.await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = get_body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 30);
        assert_eq!(json[0]["renewal_date"], "2024-10-01");
    }
}

#[tokio::test]
async fn test_get_subscription() {
    let db = Database::in_memory().unwrap();
    let id = seed_subscription(&db, "Spotify", NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    let app = setup_test_app_with_db(db);

    let response = app
        .oneshot(get_request(&format!("/api/subscriptions/{}", id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["name"], "Spotify");
    assert_eq!(json["renewal_date"], "2024-07-15");
    assert_eq!(json["days_until_renewal"], 30);
    assert!(json["savings_opportunity"].is_null());
    assert_eq!(json["yearly_equivalent"]["basis"], "exact");
    assert_eq!(json["yearly_equivalent"]["amount"], "119.88");
}

#[tokio::test]
async fn test_get_subscription_not_found() {
    let app = setup_test_app();

    let response = app
        .oneshot(get_request("/api/subscriptions/999"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Subscription 999 not found");
}

#[tokio::test]
async fn test_update_subscription() {
    let db = Database::in_memory().unwrap();
    let id = seed_subscription(&db, "Netflix", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    let app = setup_test_app_with_db(db);

    let mut body = netflix_body();
    body["billing_cycle"] = serde_json::json!("yearly");

    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/api/subscriptions/{}", id),
            body,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["cost"], "100.00");
    assert_eq!(json["renewal_date"], "2025-01-01");
    assert_eq!(json["category"], "Entertainment");
}

#[tokio::test]
async fn test_update_subscription_not_found() {
    let app = setup_test_app();

    let response = app
        .oneshot(json_request("PUT", "/api/subscriptions/42", netflix_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_subscription_is_soft() {
    let db = Database::in_memory().unwrap();
    let id = seed_subscription(&db, "Hulu", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    let app = setup_test_app_with_db(db.clone());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/subscriptions/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Row remains but is inactive
    let stored = db.get_subscription(id).unwrap().unwrap();
    assert!(!stored.is_active);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/subscriptions/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(get_request("/api/subscriptions?include_inactive=true"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_subscriptions_filters() {
    let app = setup_test_app();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/subscriptions", netflix_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = serde_json::json!({
        "name": "Dropbox",
        "yearly_price": "99.99",
        "billing_cycle": "yearly",
        "start_date": "2024-02-01",
        "category": "Storage"
    });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/subscriptions", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get_request("/api/subscriptions"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Netflix", "Dropbox"]);

    let response = app
        .clone()
        .oneshot(get_request("/api/subscriptions?category=Storage"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["name"], "Dropbox");

    let response = app
        .clone()
        .oneshot(get_request("/api/subscriptions?billing_cycle=monthly"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["name"], "Netflix");

    let response = app
        .oneshot(get_request("/api/subscriptions/categories"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json, serde_json::json!(["Entertainment", "Storage"]));
}

#[tokio::test]
async fn test_list_subscriptions_invalid_cycle_filter() {
    let app = setup_test_app();

    let response = app
        .oneshot(get_request("/api/subscriptions?billing_cycle=weekly"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_subscription_costs() {
    let db = Database::in_memory().unwrap();
    let input = SubscriptionInput {
        name: "Office".to_string(),
        monthly_price: None,
        yearly_price: Some("120".parse().unwrap()),
        billing_cycle: subtrack_core::BillingCycle::Yearly,
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        category: None,
    };
    let id = db.create_subscription(&input, today()).unwrap().id;
    let app = setup_test_app_with_db(db);

    let response = app
        .oneshot(get_request(&format!("/api/subscriptions/{}/costs", id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["monthly_equivalent"]["basis"], "exact");
    assert_eq!(json["monthly_equivalent"]["amount"], "10");
    assert_eq!(json["yearly_equivalent"]["amount"], "120");
    assert_eq!(json["available_options"].as_array().unwrap().len(), 1);
    assert_eq!(json["available_options"][0]["is_current"], true);
    assert!(json["savings_opportunity"].is_null());
}

#[tokio::test]
async fn test_manual_renewal_date() {
    let db = Database::in_memory().unwrap();
    let id = seed_subscription(&db, "Gym", NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
    let app = setup_test_app_with_db(db);

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/subscriptions/{}/renewal-date", id),
            serde_json::json!({"renewal_date": "2024-08-03"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["renewal_date"], "2024-08-03");
    assert_eq!(json["renewal_overridden"], true);

    // Recompute discards the override
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/subscriptions/{}/recompute-renewal", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["renewal_date"], "2024-07-10");
    assert_eq!(json["renewal_overridden"], false);
}

#[tokio::test]
async fn test_manual_renewal_date_accepts_today() {
    let db = Database::in_memory().unwrap();
    let id = seed_subscription(&db, "Gym", NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
    let app = setup_test_app_with_db(db);

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/api/subscriptions/{}/renewal-date", id),
            serde_json::json!({"renewal_date": "2024-06-15"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["days_until_renewal"], 0);
}

#[tokio::test]
async fn test_manual_renewal_date_rejections() {
    let db = Database::in_memory().unwrap();
    let id = seed_subscription(&db, "Gym", NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
    let app = setup_test_app_with_db(db);
    let uri = format!("/api/subscriptions/{}/renewal-date", id);

    let cases = [
        (serde_json::json!({}), "renewal_date is required"),
        (
            serde_json::json!({"renewal_date": "06/20/2024"}),
            "Invalid date format",
        ),
        (
            serde_json::json!({"renewal_date": "2024-06-14"}),
            "Renewal date cannot be in the past",
        ),
    ];

    for (body, expected) in cases {
        let response = app
            .clone()
            .oneshot(json_request("PATCH", &uri, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = get_body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains(expected));
    }
}

#[tokio::test]
async fn test_manual_renewal_date_not_found() {
    let app = setup_test_app();

    let response = app
        .oneshot(json_request(
            "PATCH",
            "/api/subscriptions/5/renewal-date",
            serde_json::json!({"renewal_date": "2024-07-01"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Stats API Tests ==========

#[tokio::test]
async fn test_stats_empty() {
    let app = setup_test_app();

    let response = app.oneshot(get_request("/api/stats")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["total_monthly_cost"], "0");
    assert_eq!(json["total_active_subscriptions"], 0);
    assert!(json["upcoming_renewals"].as_array().unwrap().is_empty());
    assert!(json["time_since_first_subscription"].is_null());
}

#[tokio::test]
async fn test_stats_with_subscriptions() {
    let db = Database::in_memory().unwrap();
    let gym = seed_subscription(&db, "Gym", NaiveDate::from_ymd_opt(2024, 1, 19).unwrap());
    seed_subscription(&db, "Music", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    let app = setup_test_app_with_db(db);

    let response = app.oneshot(get_request("/api/stats")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["total_active_subscriptions"], 2);
    assert_eq!(json["total_monthly_cost"], "19.98");
    assert_eq!(json["category_breakdown"]["Uncategorized"], "19.98");

    let upcoming = json["upcoming_renewals"].as_array().unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0]["id"], gym);
    assert_eq!(upcoming[0]["days_until_renewal"], 4);
}

#[tokio::test]
async fn test_stats_upcoming_window_is_configurable() {
    let db = Database::in_memory().unwrap();
    seed_subscription(&db, "Music", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    let config = ServerConfig {
        upcoming_window_days: 30,
        ..Default::default()
    };
    let app = create_router_with_clock(db, None, config, Arc::new(FixedClock(today())));

    let response = app.oneshot(get_request("/api/stats")).await.unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["upcoming_renewals"].as_array().unwrap().len(), 1);
}

// ========== Middleware Tests ==========

#[tokio::test]
async fn test_security_headers() {
    let app = setup_test_app();

    let response = app.oneshot(get_request("/api/stats")).await.unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
}

#[test]
fn test_parse_allowed_origins() {
    assert_eq!(
        parse_allowed_origins("http://localhost:5173, https://app.example.com,,"),
        vec![
            "http://localhost:5173".to_string(),
            "https://app.example.com".to_string()
        ]
    );
    assert!(parse_allowed_origins("").is_empty());
}
