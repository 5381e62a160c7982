use actix_web::{web, App, HttpServer};
use dotenvy::dotenv;
use log::{error, info, warn};
use moka::future::Cache;
mod api;
mod config;
mod db;
mod env_setup;
mod errors;
mod formatters;
mod models;
mod pocket;
mod service;
mod summary;
use api::SummaryCache;
use config::PortalConfig;
use db::AppStore;
use pocket::HttpPocketClient;
use service::ApplicationService;

/// This is where the app starts.
///
/// It sets up everything: .env, logger, database, the network client,
/// the summary cache, and finally, the web server.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Create a default .env file if needed, then load it.
    env_setup::setup_env()?;
    dotenv().ok();
    env_logger::init();

    let config = PortalConfig::from_env();

    // Set up the database. The app won't start if this fails.
    if let Err(e) = db::initialize_database(&config.database_path) {
        error!("Failed to start database: {}", e);
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "Database initialization failed",
        ));
    }
    info!("[Main] Database is ready.");

    if config.free_tier_passphrase.is_empty() {
        warn!("[Main] FREE_TIER_PASSPHRASE is not set; free tier endpoints will reject.");
    }

    // Client for the Pocket network service, with the configured timeout.
    let network = match HttpPocketClient::new(&config.pocket_api_url, config.request_timeout_secs) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build network client: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "Network client initialization failed",
            ));
        }
    };
    info!("[Main] Network client ready for {}.", config.pocket_api_url);

    let store = AppStore::new(&config.database_path);
    let service = web::Data::new(ApplicationService::new(store, network, &config));

    // Set up the summary cache. TTL is configurable via .env.
    let cache: SummaryCache = Cache::builder()
        .time_to_live(std::time::Duration::from_secs(config.cache_ttl_secs))
        .build();
    let cache = web::Data::new(cache);

    // Start the HTTP server and share the service with all threads.
    info!("Starting server on http://0.0.0.0:{}", config.server_port);
    let port = config.server_port;
    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .app_data(cache.clone())
            .configure(api::configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
