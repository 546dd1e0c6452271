use actix_web::{web, HttpResponse};
use serde::Serialize;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::utils::random_six_digits;

/// A user, its AI counterpart and their shared room.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub sdk_app_id: u64,
    pub user_sig: String,
    pub robot_sig: String,
    pub user_id: String,
    pub robot_id: String,
    pub room_id: u32,
}

/// Mints signatures for a fresh `user_N` / `ai_N` pair in room `N`.
pub fn generate_credentials(config: &AppConfig) -> Result<Credentials, ApiError> {
    let generator = config.user_sig_generator()?;
    let n = random_six_digits();
    let user_id = format!("user_{n}");
    let robot_id = format!("ai_{n}");

    let user_sig = generator.sign(&user_id, config.trtc.expire_time)?;
    let robot_sig = generator.sign(&robot_id, config.trtc.expire_time)?;

    Ok(Credentials {
        sdk_app_id: generator.sdk_app_id(),
        user_sig,
        robot_sig,
        user_id,
        robot_id,
        room_id: n,
    })
}

/// `POST /credentials`
pub async fn issue_credentials(config: web::Data<AppConfig>) -> Result<HttpResponse, ApiError> {
    let credentials = generate_credentials(&config).map_err(|e| {
        error!(error = %e, "Failed to generate user information");
        e
    })?;
    info!(user_id = %credentials.user_id, room_id = credentials.room_id, "issued credentials");
    Ok(HttpResponse::Ok().json(credentials))
}
