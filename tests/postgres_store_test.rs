//! Runs the booking flow against a real database.
//!
//! `TEST_DATABASE_URL=postgres://... cargo test --test postgres_store_test -- --ignored`

mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{Marketplace, TestApp};
use servicehub::database::{self, PgStore};

async fn pg_app() -> Result<TestApp> {
    let url = std::env::var("TEST_DATABASE_URL")?;
    let pool = database::setup_database(&url, 5).await?;
    database::run_migrations(&pool).await?;
    TestApp::with_store(Arc::new(PgStore::new(pool)))
}

#[tokio::test]
#[ignore = "needs TEST_DATABASE_URL"]
async fn test_postgres_booking_flow() -> Result<()> {
    let domain = format!("{}.servicehub.test", Uuid::new_v4().simple());
    let market = Marketplace::on(pg_app().await?, &domain).await?;

    let mut body = market.booking_body();
    body["type"] = json!("scheduled");
    body["scheduledDate"] = json!("2026-03-14T00:00:00Z");
    body["scheduledTime"] = json!("09:30");
    let first = market
        .app
        .post("/api/bookings", Some(&market.client_cookie), body.clone())
        .await?;
    assert_eq!(first.status, StatusCode::CREATED, "{}", first.body);
    let second = market
        .app
        .post("/api/bookings", Some(&market.client_cookie), body)
        .await?;
    assert_eq!(second.status, StatusCode::CONFLICT);

    let done = market.completed_booking().await?;
    let review = market
        .app
        .post(
            "/api/reviews",
            Some(&market.client_cookie),
            json!({ "bookingId": done, "rating": 5 }),
        )
        .await?;
    assert_eq!(review.status, StatusCode::CREATED, "{}", review.body);

    let provider = market
        .app
        .get(&format!("/api/providers/{}", market.provider_id), None)
        .await?;
    assert_eq!(provider.body["reviewCount"], 1);
    assert_eq!(provider.body["completedJobs"], 1);
    Ok(())
}

#[tokio::test]
#[ignore = "needs TEST_DATABASE_URL"]
async fn test_postgres_readiness() -> Result<()> {
    let app = pg_app().await?;
    let ready = app.get("/health/ready", None).await?;
    assert_eq!(ready.status, StatusCode::OK);
    Ok(())
}
