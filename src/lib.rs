//! EMR Server Library
//!
//! Medical-records backend: auth, patients, records (prontuários) and
//! scheduling over a shared PostgreSQL schema. This module exports the core
//! types and the router for testing and reuse.

pub mod audit;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod identity;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod security;

pub use config::Config;
pub use error::{AppError, Result};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::routing::{get, post, put};
use axum::Router;

use audit::AuditLog;
use rate_limit::RateLimiter;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub config: Config,
    pub rate_limiter: Arc<RateLimiter>,
    pub audit: Arc<AuditLog>,
    /// Consumed idempotency keys and when they were claimed
    pub idempotency_keys: Arc<Mutex<HashMap<String, i64>>>,
}

impl AppState {
    /// Create a new AppState with the given pool and configuration
    pub fn new(pool: sqlx::PgPool, config: Config) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit_rpm));
        let audit = Arc::new(AuditLog::new(config.audit_log_path.clone()));
        Self {
            pool,
            config,
            rate_limiter,
            audit,
            idempotency_keys: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Build the application router with all routes attached
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .route("/auth/login", post(routes::login))
        .route("/auth/refresh", post(routes::refresh))
        .route(
            "/patients",
            get(routes::list_patients).post(routes::create_patient),
        )
        .route(
            "/patients/:id",
            get(routes::get_patient)
                .put(routes::update_patient)
                .delete(routes::delete_patient),
        )
        .route(
            "/records",
            get(routes::list_records).post(routes::create_record),
        )
        .route(
            "/records/:id",
            get(routes::get_record)
                .put(routes::update_record)
                .patch(routes::patch_record)
                .delete(routes::delete_record),
        )
        .route(
            "/appointments",
            get(routes::list_appointments).post(routes::create_appointment),
        )
        .route(
            "/appointments/:id",
            get(routes::get_appointment)
                .put(routes::update_appointment)
                .delete(routes::delete_appointment),
        )
        .route("/appointments/:id/cancel", put(routes::cancel_appointment))
        .route("/patient/:id/summary", get(routes::patient_summary))
        .with_state(state)
}
