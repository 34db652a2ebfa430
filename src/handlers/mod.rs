//! HTTP request handlers

pub mod models;

mod fetch;
mod health;

pub use fetch::fetch_creds_handler;
pub use health::healthz_handler;
