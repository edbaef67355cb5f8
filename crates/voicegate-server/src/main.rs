use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;

use voicegate_server::{
    config::ServerConfig, db::Database, init_tracing, metrics::register_metrics, routes,
    state::AppState,
};

#[tokio::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    let port = config.port;
    let allowed_origins = config.allowed_origins.clone();
    let rate_limit_rpm = config.rate_limit_rpm;

    tracing::info!("Starting voicegate-server on port {}", port);
    tracing::info!("Free plan token cap: {}", config.free_plan_max_tokens);
    tracing::info!("TTS provider: {}", config.tts_api_url);
    tracing::info!(
        "Webhook signatures: {}",
        if config.webhook_secret.is_some() {
            "verified"
        } else {
            "not verified (dev mode)"
        }
    );

    let db = Database::new(&config.db_path)
        .map_err(|e| io::Error::other(format!("failed to open database: {e}")))?;
    tracing::info!("Database initialized at: {}", config.db_path);

    register_metrics();

    let state = AppState::new(config, db)
        .map_err(|e| io::Error::other(format!("failed to build TTS client: {e}")))?;
    let state_data = web::Data::new(state);

    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(rate_limit_rpm as u64)
        .finish()
        .ok_or_else(|| io::Error::other("invalid rate limiter config"))?;

    HttpServer::new(move || {
        let cors = voicegate_server::cors::build_cors(&allowed_origins);

        App::new()
            .app_data(state_data.clone())
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(Governor::new(&governor_conf))
            .configure(routes::configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
