//! API integration tests
//!
//! The router runs in process on top of the in-memory store.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use staybook_server::{
    api,
    config::AppConfig,
    models::user::{Role, UserClaims},
    repository::Repository,
    services::{notifications::LogNotifier, Services},
    AppState,
};

fn app() -> Router {
    let config = AppConfig::default();
    let services = Services::new(
        Repository::in_memory(),
        config.auth.clone(),
        &config.booking,
        Arc::new(LogNotifier),
    );
    api::create_router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(format!("/api/v1{}", uri));
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Register then log in; returns (token, user id)
async fn account(app: &Router, email: &str, role: &str) -> (String, String) {
    let tax_number = (role == "agent").then_some("TIN-100");
    let (status, user) = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "name": email,
            "email": email,
            "password": "secret123",
            "role": role,
            "tax_number": tax_number,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{user}");
    assert!(user.get("password").is_none());

    let (status, login) = send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{login}");
    assert_eq!(login["token_type"], "Bearer");

    (
        login["token"].as_str().unwrap().to_string(),
        user["id"].as_str().unwrap().to_string(),
    )
}

/// Administrators cannot self-register; sign a token directly.
fn admin_token() -> String {
    let now = chrono::Utc::now().timestamp();
    UserClaims {
        sub: "admin@example.com".to_string(),
        user_id: uuid::Uuid::new_v4(),
        role: Role::Admin,
        exp: now + 3600,
        iat: now,
    }
    .create_token(&AppConfig::default().auth.jwt_secret)
    .unwrap()
}

async fn listing(app: &Router, agent_token: &str) -> String {
    let (status, property) = send(
        app,
        Method::POST,
        "/properties",
        Some(agent_token),
        Some(json!({
            "name": "Lakeside cabin",
            "description": "Cabin on the Kaptai lake",
            "amenities": ["wifi", "kayak"],
            "price_per_night": "80.00",
            "location": "Rangamati",
            "state": "Chattogram",
            "property_type": "Cabin",
            "guests": 4
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{property}");
    property["id"].as_str().unwrap().to_string()
}

fn booking_body(property_id: &str, start: &str, end: &str) -> Value {
    json!({
        "property_id": property_id,
        "start_date": start,
        "end_date": end,
        "price": "400.00",
        "total_guests": 2
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let app = app();
    account(&app, "guest@example.com", "user").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "guest@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "NotAuthorized");
}

#[tokio::test]
async fn test_duplicate_email_is_reported_as_duplicate() {
    let app = app();
    account(&app, "guest@example.com", "user").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "name": "Again",
            "email": "guest@example.com",
            "password": "secret123"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 6);
    assert_eq!(body["error"], "Duplicate");
}

#[tokio::test]
async fn test_unauthenticated_requests_are_rejected() {
    let app = app();
    let (status, _) = send(&app, Method::GET, "/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/auth/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_only_agents_publish_listings() {
    let app = app();
    let (guest_token, _) = account(&app, "guest@example.com", "user").await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/properties",
        Some(&guest_token),
        Some(json!({
            "name": "Flat",
            "description": "Flat",
            "price_per_night": "10.00",
            "location": "Dhaka",
            "state": "Dhaka",
            "property_type": "Flat",
            "guests": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
}

#[tokio::test]
async fn test_booking_overlap_is_rejected() {
    let app = app();
    let (agent_token, _) = account(&app, "agent@example.com", "agent").await;
    let (guest_token, _) = account(&app, "guest@example.com", "user").await;
    let property_id = listing(&app, &agent_token).await;

    let (status, first) = send(
        &app,
        Method::POST,
        "/bookings",
        Some(&guest_token),
        Some(booking_body(&property_id, "2024-06-01", "2024-06-05")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{first}");
    assert_eq!(first["status"], "pending");

    let (status, body) = send(
        &app,
        Method::POST,
        "/bookings",
        Some(&guest_token),
        Some(booking_body(&property_id, "2024-06-05", "2024-06-10")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 7);
    assert_eq!(body["error"], "DatesUnavailable");

    let (status, _) = send(
        &app,
        Method::POST,
        "/bookings",
        Some(&guest_token),
        Some(booking_body(&property_id, "2024-06-06", "2024-06-10")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/properties/{}/availability?start_date=2024-06-03&end_date=2024-06-04", property_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], false);

    let (status, property) = send(&app, Method::GET, &format!("/properties/{}", property_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(property["booked_dates"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_booking_lifecycle_through_confirmation() {
    let app = app();
    let (agent_token, agent_id) = account(&app, "agent@example.com", "agent").await;
    let (guest_token, guest_id) = account(&app, "guest@example.com", "user").await;
    let property_id = listing(&app, &agent_token).await;

    let (_, booking) = send(
        &app,
        Method::POST,
        "/bookings",
        Some(&guest_token),
        Some(booking_body(&property_id, "2024-06-01", "2024-06-05")),
    )
    .await;
    let booking_id = booking["id"].as_str().unwrap().to_string();
    assert_eq!(booking["owner_id"], agent_id.as_str());

    // Guards fire before anything is paid.
    let transition = |action: &str| json!({ "action": action });
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/bookings/{}/transition", booking_id),
        Some(&agent_token),
        Some(transition("confirm")),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/bookings/{}/payment-details", booking_id),
        Some(&guest_token),
        Some(json!({ "payment_email": "pay@agent.example" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/bookings/{}/payment-details", booking_id),
        Some(&agent_token),
        Some(json!({ "payment_email": "pay@agent.example", "payment_instruction": "Use booking id as memo" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/bookings/{}/payment-details", booking_id),
        Some(&agent_token),
        Some(json!({ "payment_email": "other@agent.example" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "AlreadySet");

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/bookings/{}/transaction-id", booking_id),
        Some(&guest_token),
        Some(json!({ "transaction_id": "PAYPAL-7781" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The guest cannot confirm their own booking.
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/bookings/{}/transition", booking_id),
        Some(&guest_token),
        Some(transition("confirm")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, confirmed) = send(
        &app,
        Method::POST,
        &format!("/bookings/{}/transition", booking_id),
        Some(&agent_token),
        Some(transition("confirm")),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{confirmed}");
    assert_eq!(confirmed["status"], "confirmed");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/bookings/{}/transition", booking_id),
        Some(&agent_token),
        Some(transition("confirm")),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].as_str().unwrap().contains("already confirmed"));

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/bookings/{}/transition", booking_id),
        Some(&guest_token),
        Some(transition("cancel")),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/bookings/{}/transition", booking_id),
        Some(&agent_token),
        Some(transition("approve")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidAction");

    let (status, transactions) = send(
        &app,
        Method::GET,
        &format!("/transactions/{}", guest_id),
        Some(&guest_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let transactions = transactions.as_array().unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["transaction_id"], "PAYPAL-7781");
    assert_eq!(transactions[0]["payment_method"], "paypal");

    let (status, received) = send(
        &app,
        Method::GET,
        &format!("/transactions/{}", agent_id),
        Some(&agent_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(received.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::GET, "/transactions", Some(&agent_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, details) = send(
        &app,
        Method::GET,
        &format!("/bookings/{}", booking_id),
        Some(&guest_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["nights"], 5);
    assert_eq!(details["property"]["name"], "Lakeside cabin");
    assert_eq!(details["transaction_id"], "PAYPAL-7781");
}

#[tokio::test]
async fn test_cancel_frees_dates() {
    let app = app();
    let (agent_token, _) = account(&app, "agent@example.com", "agent").await;
    let (guest_token, guest_id) = account(&app, "guest@example.com", "user").await;
    let property_id = listing(&app, &agent_token).await;

    let (_, booking) = send(
        &app,
        Method::POST,
        "/bookings",
        Some(&guest_token),
        Some(booking_body(&property_id, "2024-08-10", "2024-08-12")),
    )
    .await;
    let booking_id = booking["id"].as_str().unwrap();

    for _ in 0..2 {
        let (status, cancelled) = send(
            &app,
            Method::POST,
            &format!("/bookings/{}/transition", booking_id),
            Some(&guest_token),
            Some(json!({ "action": "cancel" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cancelled["status"], "cancelled");
    }

    let (status, listed) = send(
        &app,
        Method::GET,
        &format!("/bookings?guest_id={}", guest_id),
        Some(&guest_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["status"], "cancelled");

    let (status, _) = send(
        &app,
        Method::POST,
        "/bookings",
        Some(&guest_token),
        Some(booking_body(&property_id, "2024-08-10", "2024-08-12")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_list_bookings_requires_one_filter() {
    let app = app();
    let (guest_token, guest_id) = account(&app, "guest@example.com", "user").await;

    let (status, _) = send(&app, Method::GET, "/bookings", Some(&guest_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/bookings?guest_id={}&owner_id={}", guest_id, guest_id),
        Some(&guest_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_property_bookings_are_visible_to_owner_only() {
    let app = app();
    let (agent_token, _) = account(&app, "agent@example.com", "agent").await;
    let (guest_token, _) = account(&app, "guest@example.com", "user").await;
    let (stranger_token, _) = account(&app, "stranger@example.com", "user").await;
    let property_id = listing(&app, &agent_token).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/bookings",
        Some(&guest_token),
        Some(booking_body(&property_id, "2024-09-01", "2024-09-03")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/bookings?property_id={}", property_id);
    for token in [&stranger_token, &guest_token] {
        let (status, body) = send(&app, Method::GET, &uri, Some(token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
    }

    let (status, listed) = send(&app, Method::GET, &uri, Some(&agent_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, listed) = send(&app, Method::GET, &uri, Some(&admin_token()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_admin_toggles_guest_favorites() {
    let app = app();
    let (agent_token, agent_id) = account(&app, "agent@example.com", "agent").await;
    let (guest_token, guest_id) = account(&app, "guest@example.com", "user").await;
    let property_id = listing(&app, &agent_token).await;
    let admin = admin_token();

    let (status, toggled) = send(
        &app,
        Method::POST,
        &format!("/favorites/{}", guest_id),
        Some(&admin),
        Some(json!({ "property_id": property_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{toggled}");
    assert_eq!(toggled["favorite"], true);

    let (_, favorites) = send(
        &app,
        Method::GET,
        &format!("/favorites/{}", guest_id),
        Some(&guest_token),
        None,
    )
    .await;
    assert_eq!(favorites[0]["id"], property_id.as_str());

    // Agents keep no favorites, whoever asks.
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/favorites/{}", agent_id),
        Some(&admin),
        Some(json!({ "property_id": property_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_favorites() {
    let app = app();
    let (agent_token, _) = account(&app, "agent@example.com", "agent").await;
    let (guest_token, guest_id) = account(&app, "guest@example.com", "user").await;
    let property_id = listing(&app, &agent_token).await;

    let (status, toggled) = send(
        &app,
        Method::POST,
        &format!("/favorites/{}", guest_id),
        Some(&guest_token),
        Some(json!({ "property_id": property_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["favorite"], true);

    let (status, favorites) = send(
        &app,
        Method::GET,
        &format!("/favorites/{}", guest_id),
        Some(&guest_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(favorites[0]["id"], property_id.as_str());
    assert!(favorites[0].get("booked_dates").is_none());

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/favorites/{}", guest_id),
        Some(&agent_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, agent_listings) = send(&app, Method::GET, "/agents/agent@example.com/properties", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(agent_listings.as_array().unwrap().len(), 1);
}
