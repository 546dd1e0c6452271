use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tiny_trtc_agent::config::AppConfig;
use tiny_trtc_agent::handlers;
use tiny_trtc_agent::trtc::{ConversationApi, TrtcClient};
use tiny_trtc_agent::utils;

/// Loads the env file named by the first argument (default `.env`), builds
/// the configuration once and serves the API until shutdown.
#[actix_web::main]
async fn main() -> io::Result<()> {
    let env_file = utils::ensure_dotenv_loaded();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("📦 Loading environment from {env_file}");
    let config = AppConfig::load()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    info!(
        agent = %config.agent_card.name,
        capabilities = ?config.agent_card.capabilities,
        sdk_app_id = config.trtc.sdk_app_id,
        region = %config.api.region,
        endpoint = %config.api.endpoint,
        "agent configured"
    );

    let api: Arc<dyn ConversationApi> = Arc::new(TrtcClient::new(&config.api));
    let api = web::Data::from(api);

    let static_dir = config.server.static_dir.clone();
    let serve_static = static_dir.is_dir();
    if !serve_static {
        warn!(dir = %static_dir.display(), "static directory not found, not serving files");
    }

    let bind = (config.server.host.clone(), config.server.port);
    info!("🚀 Server running at http://{}:{}/", bind.0, bind.1);

    let config = web::Data::new(config);

    HttpServer::new(move || {
        let app = App::new()
            .wrap(Cors::permissive())
            .wrap(Logger::new("%r %s %b - %D ms"))
            .app_data(config.clone())
            .app_data(api.clone())
            .configure(handlers::configure);

        if serve_static {
            return app.service(handlers::static_files(static_dir.clone()));
        }

        app
    })
    .bind(bind)?
    .run()
    .await
}
