mod common;

use std::str::FromStr;

use anyhow::Result;
use axum::http::{header, Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use common::{Marketplace, TestApp, PASSWORD};

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

#[tokio::test]
async fn test_health_endpoints() -> Result<()> {
    let app = TestApp::new()?;

    let health = app.get("/health", None).await?;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "healthy");

    let ready = app.get("/health/ready", None).await?;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.body["status"], "healthy");

    // No recorder installed in tests
    let metrics = app.get("/metrics", None).await?;
    assert_eq!(metrics.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() -> Result<()> {
    let app = TestApp::new()?;
    let response = app.get("/health", None).await?;
    assert!(response.headers.contains_key("x-request-id"));
    assert_eq!(response.headers["x-content-type-options"], "nosniff");
    assert_eq!(response.headers["x-frame-options"], "DENY");
    Ok(())
}

#[tokio::test]
async fn test_anonymous_booking_is_rejected_without_side_effects() -> Result<()> {
    let market = Marketplace::new().await?;
    let response = market
        .app
        .post("/api/bookings", None, market.booking_body())
        .await?;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.error_code().is_some());

    let provider_view = market
        .app
        .get("/api/bookings/provider", Some(&market.provider_cookie))
        .await?;
    assert_eq!(provider_view.status, StatusCode::OK);
    assert_eq!(provider_view.body.as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn test_session_cookie_lifecycle() -> Result<()> {
    let app = TestApp::new()?;
    let cookie = app.register("amina@servicehub.test", "client").await?;

    let me = app.get("/api/auth/user", Some(&cookie)).await?;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["email"], "amina@servicehub.test");
    assert_eq!(me.body["role"], "client");
    assert!(me.body.get("passwordHash").is_none());

    let logout = app
        .request(Method::POST, "/api/auth/logout", Some(&cookie), None)
        .await?;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);

    let after = app.get("/api/auth/user", Some(&cookie)).await?;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);

    let login = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "amina@servicehub.test", "password": PASSWORD }),
        )
        .await?;
    assert_eq!(login.status, StatusCode::OK);
    let fresh = login.session_cookie().unwrap();
    let me = app.get("/api/auth/user", Some(&fresh)).await?;
    assert_eq!(me.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_tampered_cookie_is_anonymous() -> Result<()> {
    let app = TestApp::new()?;
    let cookie = app.register("tamper@servicehub.test", "client").await?;
    let forged = format!("{}0", cookie);
    let me = app.get("/api/auth/user", Some(&forged)).await?;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_registration_rules() -> Result<()> {
    let app = TestApp::new()?;
    app.register("dup@servicehub.test", "client").await?;

    let duplicate = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "dup@servicehub.test", "password": PASSWORD }),
        )
        .await?;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let admin = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "root@servicehub.test", "password": PASSWORD, "role": "admin" }),
        )
        .await?;
    assert_eq!(admin.status, StatusCode::FORBIDDEN);

    let wrong = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "dup@servicehub.test", "password": "not-the-password" }),
        )
        .await?;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let short = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "short@servicehub.test", "password": "abc" }),
        )
        .await?;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);
    assert_eq!(short.body["error"]["code"], "VAL_3008");
    assert_eq!(short.body["error"]["field"], "password");

    let bad_email = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "not-an-email", "password": PASSWORD }),
        )
        .await?;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_email.body["error"]["code"], "VAL_3006");
    Ok(())
}

#[tokio::test]
async fn test_login_redirect() -> Result<()> {
    let app = TestApp::new()?;
    let response = app.get("/api/login", None).await?;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.headers[header::LOCATION], "/login");
    Ok(())
}

#[tokio::test]
async fn test_booking_lifecycle_settles_price() -> Result<()> {
    let market = Marketplace::new().await?;
    let id = market.completed_booking().await?;

    let booking = market
        .app
        .get(&format!("/api/bookings/{}", id), Some(&market.client_cookie))
        .await?;
    assert_eq!(booking.status, StatusCode::OK);
    assert_eq!(booking.body["status"], "completed");
    assert_eq!(decimal(&booking.body["finalPrice"]), Decimal::from(20000));
    assert_eq!(decimal(&booking.body["commission"]), Decimal::from(2000));
    assert!(booking.body["completedAt"].is_string());

    let dashboard = market
        .app
        .get("/api/dashboard/provider", Some(&market.provider_cookie))
        .await?;
    assert_eq!(dashboard.status, StatusCode::OK);
    let stats = &dashboard.body["stats"];
    assert_eq!(decimal(&stats["totalEarnings"]), Decimal::from(20000));
    assert_eq!(decimal(&stats["netEarnings"]), Decimal::from(18000));
    assert_eq!(stats["completedJobs"], 1);
    Ok(())
}

#[tokio::test]
async fn test_backward_transition_is_conflict() -> Result<()> {
    let market = Marketplace::new().await?;
    let id = market.book().await?;
    assert_eq!(market.set_status(&id, "confirmed").await?.status, StatusCode::OK);

    let back = market.set_status(&id, "pending").await?;
    assert_eq!(back.status, StatusCode::CONFLICT);

    let skip = market.set_status(&id, "completed").await?;
    assert_eq!(skip.status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn test_outsider_cannot_see_booking() -> Result<()> {
    let market = Marketplace::new().await?;
    let id = market.book().await?;
    let stranger = market.app.register("stranger@servicehub.test", "client").await?;

    let response = market
        .app
        .get(&format!("/api/bookings/{}", id), Some(&stranger))
        .await?;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn test_scheduled_booking_without_date_is_accepted() -> Result<()> {
    let market = Marketplace::new().await?;
    let mut body = market.booking_body();
    body["type"] = json!("scheduled");
    body["scheduledTime"] = json!("09:30");

    let response = market
        .app
        .post("/api/bookings", Some(&market.client_cookie), body)
        .await?;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    assert_eq!(response.body["status"], "pending");
    assert!(response.body["scheduledDate"].is_null());
    Ok(())
}

#[tokio::test]
async fn test_double_booking_same_slot_is_conflict() -> Result<()> {
    let market = Marketplace::new().await?;
    let mut body = market.booking_body();
    body["type"] = json!("scheduled");
    body["scheduledDate"] = json!("2026-03-14T00:00:00Z");
    body["scheduledTime"] = json!("09:30");

    let first = market
        .app
        .post("/api/bookings", Some(&market.client_cookie), body.clone())
        .await?;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = market
        .app
        .post("/api/bookings", Some(&market.client_cookie), body)
        .await?;
    assert_eq!(second.status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn test_scheduled_bookings_without_time_do_not_hold_a_slot() -> Result<()> {
    let market = Marketplace::new().await?;
    let mut body = market.booking_body();
    body["type"] = json!("scheduled");
    body["scheduledDate"] = json!("2026-03-14T00:00:00Z");

    for _ in 0..2 {
        let response = market
            .app
            .post("/api/bookings", Some(&market.client_cookie), body.clone())
            .await?;
        assert_eq!(response.status, StatusCode::CREATED);
    }
    Ok(())
}

#[tokio::test]
async fn test_provider_cannot_book_own_service() -> Result<()> {
    let market = Marketplace::new().await?;
    let response = market
        .app
        .post("/api/bookings", Some(&market.provider_cookie), market.booking_body())
        .await?;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_provider_update_rejects_server_managed_fields() -> Result<()> {
    let market = Marketplace::new().await?;
    let uri = format!("/api/providers/{}", market.provider_id);

    let rating = market
        .app
        .put(&uri, Some(&market.provider_cookie), json!({ "rating": "5.00" }))
        .await?;
    assert_eq!(rating.status, StatusCode::BAD_REQUEST);

    let other = market
        .app
        .put(&uri, Some(&market.client_cookie), json!({ "bio": "hijacked" }))
        .await?;
    assert_eq!(other.status, StatusCode::FORBIDDEN);

    let own = market
        .app
        .put(&uri, Some(&market.provider_cookie), json!({ "bio": "Licensed plumber" }))
        .await?;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["bio"], "Licensed plumber");
    Ok(())
}

#[tokio::test]
async fn test_review_rules_and_dashboard_can_rate() -> Result<()> {
    let market = Marketplace::new().await?;
    let open = market.book().await?;
    let done = market.completed_booking().await?;

    let too_early = market
        .app
        .post(
            "/api/reviews",
            Some(&market.client_cookie),
            json!({ "bookingId": open, "rating": 5 }),
        )
        .await?;
    assert_eq!(too_early.status, StatusCode::UNPROCESSABLE_ENTITY);

    let by_provider = market
        .app
        .post(
            "/api/reviews",
            Some(&market.provider_cookie),
            json!({ "bookingId": done, "rating": 5 }),
        )
        .await?;
    assert_eq!(by_provider.status, StatusCode::FORBIDDEN);

    let dashboard = market
        .app
        .get("/api/dashboard/client", Some(&market.client_cookie))
        .await?;
    assert_eq!(dashboard.body["completed"][0]["canRate"], true);
    assert_eq!(dashboard.body["active"][0]["canRate"], false);

    let review = market
        .app
        .post(
            "/api/reviews",
            Some(&market.client_cookie),
            json!({ "bookingId": done, "rating": 4, "comment": "  Quick and tidy  " }),
        )
        .await?;
    assert_eq!(review.status, StatusCode::CREATED, "{}", review.body);
    assert_eq!(review.body["comment"], "Quick and tidy");

    let again = market
        .app
        .post(
            "/api/reviews",
            Some(&market.client_cookie),
            json!({ "bookingId": done, "rating": 1 }),
        )
        .await?;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let dashboard = market
        .app
        .get("/api/dashboard/client", Some(&market.client_cookie))
        .await?;
    assert_eq!(dashboard.body["completed"][0]["canRate"], false);

    let provider = market
        .app
        .get(&format!("/api/providers/{}", market.provider_id), None)
        .await?;
    assert_eq!(provider.body["reviewCount"], 1);
    assert_eq!(decimal(&provider.body["rating"]), Decimal::from(4));

    let listed = market
        .app
        .get(&format!("/api/reviews/provider/{}", market.provider_id), None)
        .await?;
    assert_eq!(listed.body.as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn test_booking_messages() -> Result<()> {
    let market = Marketplace::new().await?;
    let id = market.book().await?;
    let uri = format!("/api/bookings/{}/messages", id);

    let sent = market
        .app
        .post(&uri, Some(&market.client_cookie), json!({ "content": "Is 10am ok?" }))
        .await?;
    assert_eq!(sent.status, StatusCode::CREATED, "{}", sent.body);
    assert_eq!(sent.body["isRead"], false);
    let message_id = sent.body["id"].as_str().unwrap().to_string();

    let listed = market.app.get(&uri, Some(&market.provider_cookie)).await?;
    assert_eq!(listed.body.as_array().map(Vec::len), Some(1));

    let read_uri = format!("/api/messages/{}/read", message_id);
    let by_sender = market
        .app
        .request(Method::PUT, &read_uri, Some(&market.client_cookie), None)
        .await?;
    assert_eq!(by_sender.status, StatusCode::FORBIDDEN);

    let by_receiver = market
        .app
        .request(Method::PUT, &read_uri, Some(&market.provider_cookie), None)
        .await?;
    assert_eq!(by_receiver.status, StatusCode::OK);
    assert_eq!(by_receiver.body["isRead"], true);

    let stranger = market.app.register("nosy@servicehub.test", "client").await?;
    let denied = market.app.get(&uri, Some(&stranger)).await?;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn test_availability_slots() -> Result<()> {
    let market = Marketplace::new().await?;
    let uri = format!("/api/providers/{}/availability", market.provider_id);

    let inverted = market
        .app
        .post(
            &uri,
            Some(&market.provider_cookie),
            json!({ "dayOfWeek": 1, "startTime": "17:00", "endTime": "09:00" }),
        )
        .await?;
    assert_eq!(inverted.status, StatusCode::BAD_REQUEST);

    let not_owner = market
        .app
        .post(
            &uri,
            Some(&market.client_cookie),
            json!({ "dayOfWeek": 1, "startTime": "09:00", "endTime": "17:00" }),
        )
        .await?;
    assert_eq!(not_owner.status, StatusCode::FORBIDDEN);

    let slot = market
        .app
        .post(
            &uri,
            Some(&market.provider_cookie),
            json!({ "dayOfWeek": 1, "startTime": "09:00", "endTime": "17:00" }),
        )
        .await?;
    assert_eq!(slot.status, StatusCode::CREATED, "{}", slot.body);
    assert_eq!(slot.body["isAvailable"], true);
    let slot_id = slot.body["id"].as_str().unwrap().to_string();

    let listed = market.app.get(&uri, None).await?;
    assert_eq!(listed.body.as_array().map(Vec::len), Some(1));

    let delete_uri = format!("/api/availability/{}", slot_id);
    let denied = market
        .app
        .request(Method::DELETE, &delete_uri, Some(&market.client_cookie), None)
        .await?;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let deleted = market
        .app
        .request(Method::DELETE, &delete_uri, Some(&market.provider_cookie), None)
        .await?;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn test_public_catalog_filters() -> Result<()> {
    let market = Marketplace::new().await?;

    let home = market
        .app
        .get("/api/services?category=home_services", None)
        .await?;
    assert_eq!(home.body.as_array().map(Vec::len), Some(1));

    let transport = market.app.get("/api/services?category=transport", None).await?;
    assert_eq!(transport.body.as_array().map(Vec::len), Some(0));

    let providers = market
        .app
        .get("/api/providers?category=home_services&location=kampala", None)
        .await?;
    assert_eq!(providers.status, StatusCode::OK);
    assert_eq!(providers.body.as_array().map(Vec::len), Some(1));
    assert_eq!(providers.body[0]["services"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn test_service_with_bookings_cannot_be_deleted() -> Result<()> {
    let market = Marketplace::new().await?;
    market.book().await?;
    let response = market
        .app
        .request(
            Method::DELETE,
            &format!("/api/services/{}", market.service_id),
            Some(&market.provider_cookie),
            None,
        )
        .await?;
    assert_eq!(response.status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn test_admin_verification() -> Result<()> {
    let market = Marketplace::new().await?;
    let uri = format!("/api/admin/providers/{}/verification", market.provider_id);
    let body = json!({ "verificationStatus": "verified", "tier": "pro" });

    let denied = market
        .app
        .put(&uri, Some(&market.client_cookie), body.clone())
        .await?;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let admin = market.app.admin().await?;
    let approved = market.app.put(&uri, Some(&admin), body).await?;
    assert_eq!(approved.status, StatusCode::OK, "{}", approved.body);
    assert_eq!(approved.body["verificationStatus"], "verified");

    let verified = market.app.get("/api/providers?verified=true", None).await?;
    assert_eq!(verified.body.as_array().map(Vec::len), Some(1));
    Ok(())
}
