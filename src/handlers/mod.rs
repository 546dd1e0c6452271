//! HTTP handlers for the conversation and credential endpoints.

pub mod conversation;
pub mod credentials;

use std::path::PathBuf;

use actix_files::Files;
use actix_web::dev::HttpServiceFactory;
use actix_web::http::header::CACHE_CONTROL;
use actix_web::middleware::DefaultHeaders;
use actix_web::web;

pub use conversation::{start_conversation, stop_conversation};
pub use credentials::issue_credentials;

/// Registers the API routes. Expects `web::Data<AppConfig>` and
/// `web::Data<dyn ConversationApi>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/conversations")
            .route(web::post().to(start_conversation))
            .route(web::delete().to(stop_conversation)),
    )
    .route("/credentials", web::post().to(issue_credentials));
}

/// Serves the browser client from `dir`, with `index.html` at `/`.
/// Mount it after [`configure`] so the API routes win.
pub fn static_files(dir: PathBuf) -> impl HttpServiceFactory {
    web::scope("")
        .wrap(DefaultHeaders::new().add((CACHE_CONTROL, "public, max-age=60")))
        .service(Files::new("/", dir).use_etag(true).index_file("index.html"))
}
