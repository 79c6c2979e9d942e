mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use common::{rate_table, single_account_export, stock_rows, Row, StaticRateSource};
use ibkr_report::api::{routes::create_router, AppState};
use ibkr_report::services::shared::env::Settings;
use ibkr_report::services::storage::{
    rates_filename, BucketStorage, RateCache, RateStore, StorageBackend, StorageType,
};
use object_store::memory::InMemory;
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "X-IBKR-REPORT-BOUNDARY";

fn app(
    settings: Settings,
    backend: StorageBackend,
    source: StaticRateSource,
) -> (Router, AppState) {
    let state = AppState {
        settings: Arc::new(settings),
        store: Arc::new(RateStore::new(backend, Arc::new(RateCache::new(10)))),
        source: Arc::new(source),
    };
    (create_router(state.clone()), state)
}

fn default_app() -> Router {
    app(
        Settings::default(),
        StorageBackend::Disabled,
        StaticRateSource::new(rate_table()),
    )
    .0
}

fn post_result(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "text/csv")
        .body(body.into())
        .unwrap()
}

fn post_form(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (name, contents) in fields {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n{}\r\n",
            BOUNDARY, name, name, contents
        ));
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_result() {
    let response = default_app()
        .oneshot(post_result(
            "/result?currency=EUR",
            single_account_export(&stock_rows()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["report_currency"], "EUR");
    assert_eq!(json["prices"].as_f64(), Some(450.0));
    assert_eq!(json["gains"].as_f64(), Some(39.0));
    assert_eq!(json["losses"].as_f64(), Some(33.0));
    assert_eq!(json["details"].as_array().unwrap().len(), 3);
    assert_eq!(json["details"][0]["symbol"], "ABC");
    assert_eq!(json["details"][0]["buy_date"], "2020-01-04");
}

#[tokio::test]
async fn test_result_options() {
    let response = default_app()
        .oneshot(post_result(
            "/result?currency=usd&deemed=false",
            single_account_export(&stock_rows()[..2]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["report_currency"], "USD");
    assert_eq!(json["use_deemed_acquisition_cost"], false);
    assert_eq!(json["prices"].as_f64(), Some(500.0));
    assert_eq!(json["gains"].as_f64(), Some(198.0));
}

#[tokio::test]
async fn test_result_rejects_invalid_exports() {
    let closed_lot_first = single_account_export(&[Row::closed_lot(
        "USD", "ABC", "2020-01-04", "10", "30",
    )]);
    let oversized = single_account_export(&[
        Row::trade("EUR", "BIG", "2021-03-15", "-40000000000000000000000000000", "3", "3", "0"),
        Row::closed_lot("EUR", "BIG", "2020-01-02", "40000000000000000000000000000", "1"),
    ]);
    let cases: Vec<(Body, &str)> = vec![
        (Body::from(closed_lot_first), "closed_lot_without_trade"),
        (Body::from(vec![0xff, 0xfe, 0xfd]), "invalid_encoding"),
        (Body::from(oversized), "invalid_number"),
    ];

    for (body, expected) in cases {
        let response = default_app()
            .oneshot(post_result("/result", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["status"], 400);
        assert_eq!(json["error"], expected);
    }
}

#[tokio::test]
async fn test_result_from_form_upload() {
    let export = single_account_export(&stock_rows());
    let response = default_app()
        .oneshot(post_form(
            "/result",
            &[("comment", "first upload"), ("file", &export)],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["prices"].as_f64(), Some(450.0));
    assert_eq!(json["gains"].as_f64(), Some(39.0));
    assert_eq!(json["details"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_form_without_file() {
    let export = single_account_export(&stock_rows());
    let response = default_app()
        .oneshot(post_form("/result", &[("upload", &export)]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "missing_file");
}

#[tokio::test]
async fn test_result_without_rates() {
    let (router, _) = app(
        Settings::default(),
        StorageBackend::Disabled,
        StaticRateSource::failing(),
    );
    let response = router
        .oneshot(post_result("/result", single_account_export(&stock_rows())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["error"], "rates_unavailable");
    assert_eq!(
        json["message"],
        "Maximum number of retries exceeded. Could not retrieve currency exchange rates."
    );
}

#[tokio::test]
async fn test_cron_requires_header() {
    let response = default_app()
        .oneshot(Request::builder().uri("/cron").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cron_requires_bucket() {
    let response = default_app()
        .oneshot(
            Request::builder()
                .uri("/cron")
                .header("X-Appengine-Cron", "true")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "BUCKET_ID missing!");
}

#[tokio::test]
async fn test_cron_saves_todays_rates() {
    let settings = Settings {
        storage_type: StorageType::GoogleCloud,
        bucket_id: Some("test-bucket".to_string()),
        ..Settings::default()
    };
    let bucket = BucketStorage::with_store("test-bucket", Arc::new(InMemory::new()));
    let (router, state) = app(
        settings,
        StorageBackend::GoogleCloud(bucket),
        StaticRateSource::new(rate_table()),
    );

    let response = router
        .oneshot(
            Request::builder()
                .uri("/cron")
                .header("X-Appengine-Cron", "true")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Done!");

    let saved = state
        .store
        .backend()
        .load(&rates_filename(Utc::now().date_naive()))
        .await
        .unwrap();
    assert_eq!(saved, Some(rate_table()));
}
