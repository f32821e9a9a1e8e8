#![deny(missing_docs)]
//! Qlarity server executable.
//!
//! Accepts coverage report uploads and serves the computed dashboard.

mod config;
mod db;
mod models;
mod openapi;
mod routes;
mod schema;
mod store;

#[cfg(not(test))]
use actix_cors::Cors;
#[cfg(not(test))]
use actix_web::{App, HttpServer, http::header, web};
#[cfg(not(test))]
use dotenvy::dotenv;
#[cfg(not(test))]
use std::sync::Arc;

#[cfg(not(test))]
use crate::config::ServerConfig;
#[cfg(not(test))]
use crate::db::init_pool;
#[cfg(not(test))]
use crate::routes::{AppState, coverage_reports, dashboard, openapi_json, upload_coverage};
#[cfg(not(test))]
use crate::store::{MemoryReportStore, PgReportStore, ReportStore};

#[cfg(not(test))]
fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = ServerConfig::from_env()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err))?;

    let store: Arc<dyn ReportStore> = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = init_pool(database_url)
                .map_err(|err| std::io::Error::other(err))?;
            log::info!("using PostgreSQL report store");
            Arc::new(PgReportStore::new(pool))
        }
        None => {
            log::warn!("DATABASE_URL is not set; uploads are kept in memory only");
            Arc::new(MemoryReportStore::new())
        }
    };
    let state = web::Data::new(AppState { store });

    let ServerConfig {
        host,
        port,
        allowed_origins,
        ..
    } = config;
    log::info!("listening on {host}:{port}");

    actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            let mut cors = Cors::default()
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::CONTENT_TYPE])
                .max_age(3600);
            for origin in &allowed_origins {
                cors = cors.allowed_origin(origin);
            }
            App::new()
                .wrap(actix_web::middleware::Logger::default())
                .wrap(cors)
                .app_data(state.clone())
                .service(upload_coverage)
                .service(coverage_reports)
                .service(dashboard)
                .service(openapi_json)
        })
        .bind((host, port))?
        .run()
        .await
    })
}

#[cfg(test)]
fn main() {}
