//! Liveness probe handler

use actix_web::body::BoxBody;
use actix_web::{HttpResponse, Responder};

use super::models::HealthResponse;

/// GET /healthz - liveness probe
///
/// Returns 200 OK whenever the server is running; it never touches the
/// database. No authentication required - designed for load balancer health
/// checks.
pub async fn healthz_handler() -> impl Responder<Body = BoxBody> {
    HttpResponse::Ok().json(HealthResponse::ok_with_version(env!("CARGO_PKG_VERSION")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::Value;

    #[actix_web::test]
    async fn test_healthz_is_ok() {
        let req = test::TestRequest::get().to_http_request();
        let resp = healthz_handler().await.respond_to(&req);

        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body()).await.expect("read body");
        let body: Value = serde_json::from_slice(&body).expect("parse body");
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
