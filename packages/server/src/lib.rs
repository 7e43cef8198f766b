#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the hotspot map.
//!
//! Loads every generated region pack into a [`HotspotStore`] at startup,
//! answers viewport and proximity queries against its spatial index, and
//! serves the raw pack files under `/packs` for offline clients.

mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpResponse, HttpServer, error, middleware, web};
use hotspot_map_database::{HotspotStore, load_packs, paths};
use hotspot_map_server_models::ApiError;

/// Shared application state.
pub struct AppState {
    /// Hotspot table and spatial index.
    pub store: Arc<HotspotStore>,
}

/// Rejects unparsable query strings with the same JSON body as
/// validation errors.
fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ApiError::new(&err));
        error::InternalError::from_response(err, response).into()
    })
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(query_config())
            .route("/health", web::get().to(handlers::health))
            .route(
                "/hotspots/within-bounds",
                web::get().to(handlers::within_bounds),
            )
            .route(
                "/hotspots/nearby/{coords}",
                web::get().to(handlers::nearby),
            ),
    );
}

/// Starts the hotspot map API server.
///
/// Reads `BIND_ADDR`, `PORT` and `PACKS_DIR` from the environment, loads
/// the packs listed in the index, and runs the Actix-Web HTTP server. The
/// caller is responsible for providing the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the packs cannot be loaded or the
/// HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let packs_dir = std::env::var("PACKS_DIR")
        .map_or_else(|_| paths::packs_dir(), PathBuf::from);

    log::info!("Loading packs from {}...", packs_dir.display());
    let store = load_packs(&packs_dir).map_err(std::io::Error::other)?;
    log::info!("Loaded {} hotspots", store.len());

    let state = web::Data::new(AppState {
        store: Arc::new(store),
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
            // Serve generated region packs
            .service(Files::new("/packs", packs_dir.clone()))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
