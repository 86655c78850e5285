mod common;

use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use finsight_client::ApiError;
use finsight_core::{Dashboard, DashboardSource, Direction};

use common::{api, serve, session_with};

const BODY: &str = r#"[
  {"transaction_id":"a1","source":"brubank","account":"main","date":"2025-01-03","amount":1500.0,
   "currency":"ARS","description":"SUELDO","direction":"credit","merchant":null,"category":"income",
   "subcategory":null,"balance":null,"is_transfer":false,"is_fee":false,"is_tax":false,"neutralized":false},
  {"transaction_id":"a2","source":"brubank","account":"main","date":"2025-01-09","amount":-300.0,
   "currency":"ARS","description":"ALQUILER","direction":"debit","merchant":null,"category":"Housing",
   "subcategory":null,"balance":null,"is_transfer":false,"is_fee":false,"is_tax":false,"neutralized":false}
]"#;

async fn transactions(headers: HeaderMap) -> axum::response::Response {
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some("Bearer abc") => (StatusCode::OK, BODY).into_response(),
        Some("Bearer empty") => (StatusCode::OK, "null").into_response(),
        _ => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
    }
}

#[tokio::test]
async fn test_fetch_and_compose_dashboard() {
    let url = serve(Router::new().route("/api/transactions", get(transactions))).await;
    let txns = api(&url).transactions(&session_with(Some("abc"))).await.unwrap();

    assert_eq!(txns.len(), 2);
    assert_eq!(txns[0].direction, Direction::Credit);

    let dash = Dashboard::compose(DashboardSource::Transactions(&txns));
    assert_eq!(dash.flow.len(), 1);
    assert_eq!(dash.flow[0].month, "Jan");
    assert_eq!(dash.summary.net_savings, 1200.0);
    assert_eq!(dash.categories[0].name, "Housing");
}

#[tokio::test]
async fn test_null_body_is_empty_list() {
    let url = serve(Router::new().route("/api/transactions", get(transactions))).await;
    let txns = api(&url).transactions(&session_with(Some("empty"))).await.unwrap();
    assert!(txns.is_empty());
}

#[tokio::test]
async fn test_unauthorized() {
    let url = serve(Router::new().route("/api/transactions", get(transactions))).await;
    let err = api(&url).transactions(&session_with(None)).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}
