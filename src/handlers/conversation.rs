use actix_web::error::JsonPayloadError;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::{Number, Value};
use tracing::{error, info};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::trtc::client::{AgentParams, ConversationApi, StartAiConversationParams};

const REQUIRED_USER_INFO: [&str; 5] = ["sdkAppId", "roomId", "robotId", "robotSig", "userId"];

/// Body of `POST /conversations`.
#[derive(Debug, Default, Deserialize)]
pub struct StartConversationBody {
    #[serde(rename = "userInfo", default)]
    pub user_info: Option<UserInfo>,
}

/// Room and identities as sent by the browser client.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub sdk_app_id: Option<Scalar>,
    pub room_id: Option<Scalar>,
    pub robot_id: Option<Scalar>,
    pub robot_sig: Option<Scalar>,
    pub user_id: Option<Scalar>,
    pub voice_id: Option<Scalar>,
}

/// Any JSON value a client may send for an id; numbers and strings are
/// the common cases.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(Number),
    Text(String),
    Other(Value),
}

impl Scalar {
    /// JSON falsiness: `0`, `""`, `false` and `null` count as absent.
    fn is_blank(&self) -> bool {
        match self {
            Scalar::Number(n) => n.as_f64() == Some(0.0),
            Scalar::Text(s) => s.is_empty(),
            Scalar::Other(v) => matches!(v, Value::Null | Value::Bool(false)),
        }
    }

    fn as_u64(&self) -> Option<u64> {
        match self {
            Scalar::Number(n) => n.as_u64(),
            Scalar::Text(s) => s.trim().parse().ok(),
            Scalar::Other(_) => None,
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
            Scalar::Other(v) => write!(f, "{v}"),
        }
    }
}

/// Unwraps a JSON body extraction. A request without a JSON body reads as
/// the empty object; a body that is present but unreadable is a 400.
fn json_or_default<T: Default>(body: Result<web::Json<T>, actix_web::Error>) -> Result<T, ApiError> {
    let err = match body {
        Ok(body) => return Ok(body.into_inner()),
        Err(err) => err,
    };
    match err.as_error::<JsonPayloadError>() {
        Some(JsonPayloadError::ContentType) => Ok(T::default()),
        Some(JsonPayloadError::Deserialize(e)) if e.is_eof() => Ok(T::default()),
        _ => Err(ApiError::validation(format!("Invalid JSON body: {err}"))),
    }
}

/// A validated start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRequest {
    pub sdk_app_id: u64,
    pub room_id: String,
    pub robot_id: String,
    pub robot_sig: String,
    pub user_id: String,
    pub voice_id: Option<String>,
}

impl UserInfo {
    /// Checks every required field and reports all missing ones at once.
    pub fn validate(self) -> Result<ConversationRequest, ApiError> {
        let present = |s: &Option<Scalar>| s.as_ref().is_some_and(|s| !s.is_blank());

        let checks = [
            present(&self.sdk_app_id),
            present(&self.room_id),
            present(&self.robot_id),
            present(&self.robot_sig),
            present(&self.user_id),
        ];
        let missing: Vec<&'static str> = REQUIRED_USER_INFO
            .iter()
            .zip(checks)
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(missing_user_info(missing));
        }

        match (
            self.sdk_app_id,
            self.room_id,
            self.robot_id,
            self.robot_sig,
            self.user_id,
        ) {
            (Some(sdk_app_id), Some(room_id), Some(robot_id), Some(robot_sig), Some(user_id)) => {
                let sdk_app_id = sdk_app_id.as_u64().ok_or_else(|| {
                    ApiError::validation(format!("sdkAppId must be an integer, got {sdk_app_id}"))
                })?;
                Ok(ConversationRequest {
                    sdk_app_id,
                    room_id: room_id.to_string(),
                    robot_id: robot_id.to_string(),
                    robot_sig: robot_sig.to_string(),
                    user_id: user_id.to_string(),
                    voice_id: self
                        .voice_id
                        .filter(|v| !v.is_blank())
                        .map(|v| v.to_string()),
                })
            }
            _ => Err(missing_user_info(REQUIRED_USER_INFO.to_vec())),
        }
    }
}

fn missing_user_info(missing: Vec<&'static str>) -> ApiError {
    ApiError::Validation {
        message: "Missing required fields in userInfo".to_string(),
        required: REQUIRED_USER_INFO.to_vec(),
        missing,
    }
}

/// Assembles provider parameters from a request and the static settings.
pub fn build_start_params(
    request: ConversationRequest,
    config: &AppConfig,
) -> Result<StartAiConversationParams, ApiError> {
    let tts = config.tts.with_voice(request.voice_id.as_deref());

    Ok(StartAiConversationParams {
        sdk_app_id: request.sdk_app_id,
        room_id: request.room_id,
        agent_config: AgentParams {
            user_id: request.robot_id,
            user_sig: request.robot_sig,
            target_user_id: request.user_id,
            behavior: config.agent.clone(),
        },
        stt_config: config.stt.clone(),
        llm_config: serde_json::to_string(&config.llm)?,
        tts_config: serde_json::to_string(&tts)?,
    })
}

/// `POST /conversations`: starts an AI conversation in the caller's room.
///
/// A request without a body is treated like `{}` and fails validation.
pub async fn start_conversation(
    body: Result<web::Json<StartConversationBody>, actix_web::Error>,
    config: web::Data<AppConfig>,
    api: web::Data<dyn ConversationApi>,
) -> Result<HttpResponse, ApiError> {
    let user_info = json_or_default(body)?.user_info.unwrap_or_default();
    let request = user_info.validate()?;
    let params = build_start_params(request, &config)?;

    info!(room_id = %params.room_id, robot = %params.agent_config.user_id, "starting AI conversation");
    let data = api.start_ai_conversation(&params).await.map_err(|e| {
        error!(code = %e.code, error = %e, "Failed to start AI conversation");
        e
    })?;
    Ok(HttpResponse::Ok().json(data))
}

/// Body of `DELETE /conversations`.
#[derive(Debug, Default, Deserialize)]
pub struct StopConversationBody {
    #[serde(rename = "TaskId", default)]
    pub task_id: Option<Scalar>,
}

/// `DELETE /conversations`: stops the conversation identified by `TaskId`.
pub async fn stop_conversation(
    body: Result<web::Json<StopConversationBody>, actix_web::Error>,
    api: web::Data<dyn ConversationApi>,
) -> Result<HttpResponse, ApiError> {
    let task_id = json_or_default(body)?
        .task_id
        .filter(|id| !id.is_blank())
        .map(|id| id.to_string())
        .ok_or_else(|| ApiError::validation("Missing required TaskId field"))?;

    info!(task_id = %task_id, "stopping AI conversation");
    let data = api.stop_ai_conversation(&task_id).await.map_err(|e| {
        error!(code = %e.code, error = %e, "Failed to stop AI conversation");
        e
    })?;
    Ok(HttpResponse::Ok().json(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_info(value: serde_json::Value) -> UserInfo {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn numeric_ids_are_coerced() {
        let request = user_info(json!({
            "sdkAppId": 1400000000u64,
            "roomId": 123456,
            "robotId": "ai_123456",
            "robotSig": "sig",
            "userId": "user_123456",
        }))
        .validate()
        .unwrap();

        assert_eq!(request.sdk_app_id, 1_400_000_000);
        assert_eq!(request.room_id, "123456");
        assert_eq!(request.voice_id, None);
    }

    #[test]
    fn string_app_id_is_accepted() {
        let request = user_info(json!({
            "sdkAppId": "1400000000",
            "roomId": "room-a",
            "robotId": "ai_1",
            "robotSig": "sig",
            "userId": "user_1",
            "voiceId": "v-1",
        }))
        .validate()
        .unwrap();

        assert_eq!(request.sdk_app_id, 1_400_000_000);
        assert_eq!(request.room_id, "room-a");
        assert_eq!(request.voice_id.as_deref(), Some("v-1"));
    }

    #[test]
    fn falsy_values_count_as_missing() {
        let err = user_info(json!({
            "sdkAppId": 0,
            "roomId": "",
            "robotId": "ai_1",
            "robotSig": null,
            "userId": "user_1",
        }))
        .validate()
        .unwrap_err();

        match err {
            ApiError::Validation { missing, required, .. } => {
                assert_eq!(missing, vec!["sdkAppId", "roomId", "robotSig"]);
                assert_eq!(required.len(), 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_numeric_app_id_is_rejected() {
        let err = user_info(json!({
            "sdkAppId": "abc",
            "roomId": 1,
            "robotId": "ai_1",
            "robotSig": "sig",
            "userId": "user_1",
        }))
        .validate()
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
        assert!(err.to_string().contains("sdkAppId"));
    }

    #[test]
    fn non_string_identities_are_stringified() {
        let request = user_info(json!({
            "sdkAppId": 1400000000u64,
            "roomId": 1,
            "robotId": 42,
            "robotSig": "sig",
            "userId": true,
            "voiceId": false,
        }))
        .validate()
        .unwrap();

        assert_eq!(request.robot_id, "42");
        assert_eq!(request.user_id, "true");
        assert_eq!(request.voice_id, None);
    }
}
