use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use etf_basket_analyzer::config::Config;
use etf_basket_analyzer::prices::read_price_table;
use etf_basket_analyzer::server::{build_router, AppState};

const BOUNDARY: &str = "etf-test-boundary";
const PRICES: &str = "DATE,AAA,BBB\n2024-01-01,10,20\n2024-01-02,11,19\n2024-01-03,12,18\n";

fn app_with_limit(max_upload_bytes: Option<&str>) -> Router {
    let table = read_price_table(PRICES.as_bytes()).unwrap();
    let limit = max_upload_bytes.map(str::to_string);
    let cfg = Config::from_lookup(|key| match key {
        "MAX_UPLOAD_BYTES" => limit.clone(),
        _ => None,
    })
    .unwrap();
    build_router(AppState::new(Arc::new(table)), &cfg).unwrap()
}

fn app() -> Router {
    app_with_limit(None)
}

fn multipart_request(field: &str, contents: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"etf.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {contents}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn analyze_returns_history_and_holdings() {
    let response = app()
        .oneshot(multipart_request("file", "name,weight\nAAA,1\nBBB,1\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["latest_date"], "2024-01-03");
    assert_eq!(body["history"].as_array().unwrap().len(), 3);
    assert_eq!(body["holdings"][0]["ticker"], "BBB");
    assert_eq!(body["holdings"][0]["value"], 9.0);
    assert_eq!(body["top5"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn client_faults_are_bad_requests() {
    let cases = [
        ("name,amount\nAAA,1\n", "schema_error"),
        ("name,weight\nAAA,abc\n", "format_error"),
        ("name,weight\nAAA,1\nBBB,-1\n", "invalid_weights"),
        ("name,weight\nZZZ,1\n", "no_match"),
    ];
    for (csv, code) in cases {
        let response = app().oneshot(multipart_request("file", csv)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{code}");
        let body = json_body(response).await;
        assert_eq!(body["code"], code);
        assert!(body["detail"].as_str().is_some_and(|d| !d.is_empty()));
    }
}

#[tokio::test]
async fn missing_file_field_is_rejected() {
    let response = app()
        .oneshot(multipart_request("attachment", "name,weight\nAAA,1\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().contains("'file'"));
}

#[tokio::test]
async fn oversized_upload_is_refused() {
    let big = format!("name,weight\n{}", "AAA,1\n".repeat(100));
    let response = app_with_limit(Some("64"))
        .oneshot(multipart_request("file", &big))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn health_reports_price_table() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tickers"], 2);
    assert_eq!(body["dates"], 3);
    assert_eq!(body["latest_date"], "2024-01-03");
}
