//! API routes configuration
//!
//! All API endpoints use the /v1 version prefix:
//! - /v1/api/creds - Fetch the credential row (any method; the request is
//!   never inspected)
//! - GET /healthz - Liveness probe

use actix_web::web;

use crate::handlers;

/// Configure API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v1").service(
            web::scope("/api")
                .service(web::resource("/creds").to(handlers::fetch_creds_handler)),
        ),
    )
    .route("/healthz", web::get().to(handlers::healthz_handler));
}
