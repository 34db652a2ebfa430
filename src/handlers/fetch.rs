//! Credential-row fetch handler

use actix_web::body::BoxBody;
use actix_web::{web, HttpResponse, Responder};
use log::{debug, error};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

use super::models::FetchResponse;
use crate::config::ServerConfig;
use crate::db;
use crate::error::FetchError;

/// Fetch the first row of the configured table and wrap it in the JSON
/// envelope.
///
/// The request itself is never inspected; any method and any payload are
/// accepted. Success is 200 with `{"ok": true, "data": {...}}`; any
/// connection, query, or serialization failure is 500 with
/// `{"ok": false, "error": "..."}`. No partial success exists.
pub async fn fetch_creds_handler(config: web::Data<Arc<ServerConfig>>) -> impl Responder<Body = BoxBody> {
    let start_time = Instant::now();

    let result = db::fetch_first_row(&config.database).await;

    let took = start_time.elapsed().as_secs_f64() * 1000.0;
    match &result {
        Ok(data) => debug!(
            "Fetched {} column(s) from '{}' | took={:.3}ms",
            data.len(),
            config.database.table,
            took
        ),
        Err(e) => error!("Fetch failed ({}): {} | took={:.3}ms", e.kind(), e, took),
    }

    envelope_response(result)
}

/// Map the fetch outcome onto the two terminal responses.
pub(crate) fn envelope_response(result: Result<Map<String, Value>, FetchError>) -> HttpResponse {
    match result {
        Ok(data) => HttpResponse::Ok().json(FetchResponse::success(data)),
        Err(e) => HttpResponse::InternalServerError().json(FetchResponse::error(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::http::header::CONTENT_TYPE;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::json;

    async fn body_json(resp: HttpResponse) -> Value {
        let body = to_bytes(resp.into_body()).await.expect("read body");
        serde_json::from_slice(&body).expect("parse body")
    }

    #[actix_web::test]
    async fn test_success_envelope() {
        let mut data = Map::new();
        data.insert("id".to_string(), json!(1));
        data.insert("name".to_string(), json!("acme"));

        let resp = envelope_response(Ok(data));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = body_json(resp).await;
        assert_eq!(body, json!({"ok": true, "data": {"id": 1, "name": "acme"}}));
    }

    #[actix_web::test]
    async fn test_empty_table_is_success() {
        let resp = envelope_response(Ok(Map::new()));
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body, json!({"ok": true, "data": {}}));
    }

    #[actix_web::test]
    async fn test_failure_envelope() {
        let resp = envelope_response(Err(FetchError::Serialization(
            "column 'blob' has unsupported type bit".to_string(),
        )));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            resp.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = body_json(resp).await;
        assert_eq!(body["ok"], json!(false));
        assert!(body.get("data").is_none());
        assert!(!body["error"].as_str().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_unreachable_database_returns_error_envelope() {
        let mut config = ServerConfig::default();
        config.database.host = "127.0.0.1".to_string();
        config.database.port = 1;

        let req = test::TestRequest::default().to_http_request();
        let resp = fetch_creds_handler(web::Data::new(Arc::new(config)))
            .await
            .respond_to(&req);

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_eq!(body["ok"], json!(false));
        assert!(!body["error"].as_str().unwrap().is_empty());
    }
}
