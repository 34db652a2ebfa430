// credfetch server
//
// Single-purpose HTTP service: fetch the first row of the configured
// credentials table and return it as a JSON envelope.

mod config;
mod db;
mod error;
mod handlers;
mod logging;
mod routes;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Result;
use log::info;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> Result<()> {
    // Load configuration (file, then environment overrides)
    let config = config::ServerConfig::load("config.toml")?;

    // Initialize logging
    logging::init_logging(
        &config.logging.level,
        &config.logging.format,
        config.logging.log_to_console,
    )?;

    info!("Starting credfetch v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded: host={}, port={}",
        config.server.host, config.server.port
    );
    // Never log the password
    info!(
        "Database target: {}@{}:{}/{} (table '{}')",
        config.database.user,
        config.database.host,
        config.database.port,
        config.database.dbname,
        config.database.table
    );

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let workers = if config.server.workers == 0 {
        num_cpus::get()
    } else {
        config.server.workers
    };
    info!("Starting HTTP server on {}", bind_addr);
    info!("Endpoints: /v1/api/creds, GET /healthz");

    let shared_config = Arc::new(config);

    // Start HTTP server
    HttpServer::new(move || {
        // Configure CORS for web browser clients
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(shared_config.clone()))
            .configure(routes::configure_routes)
    })
    .bind(&bind_addr)?
    .workers(workers)
    .run()
    .await?;

    info!("Server shutdown complete");
    Ok(())
}
