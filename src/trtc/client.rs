//! Client for the TRTC conversational-AI API.

use chrono::Utc;
use futures::future::BoxFuture;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::{AgentBehavior, ApiConfig, SttConfig};
use crate::trtc::tc3::{Tc3Signer, CONTENT_TYPE_JSON};

pub const API_VERSION: &str = "2019-07-22";
pub const SERVICE: &str = "trtc";
pub const START_AI_CONVERSATION: &str = "StartAIConversation";
pub const STOP_AI_CONVERSATION: &str = "StopAIConversation";

/// Failure of a provider call, with the provider's code and message when
/// it sent an error envelope.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RemoteError {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

impl RemoteError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            request_id: None,
        }
    }

    fn network(err: reqwest::Error) -> Self {
        Self::new("ClientNetworkError", err.to_string())
    }
}

/// Parameters of `StartAIConversation`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartAiConversationParams {
    pub sdk_app_id: u64,
    pub room_id: String,
    pub agent_config: AgentParams,
    #[serde(rename = "STTConfig")]
    pub stt_config: SttConfig,
    /// JSON-encoded `LlmConfig`.
    #[serde(rename = "LLMConfig")]
    pub llm_config: String,
    /// JSON-encoded `TtsConfig`.
    #[serde(rename = "TTSConfig")]
    pub tts_config: String,
}

/// The robot's identity in the room, the user it talks to, and its behaviour.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentParams {
    pub user_id: String,
    pub user_sig: String,
    pub target_user_id: String,
    #[serde(flatten)]
    pub behavior: AgentBehavior,
}

#[derive(Serialize)]
struct StopAiConversationParams<'a> {
    #[serde(rename = "TaskId")]
    task_id: &'a str,
}

#[derive(Deserialize)]
struct ResponseEnvelope {
    #[serde(rename = "Response")]
    response: Value,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message")]
    message: String,
}

/// The two provider operations the handlers need.
///
/// Both resolve to the provider's `Response` object on success.
pub trait ConversationApi: Send + Sync {
    fn start_ai_conversation<'a>(
        &'a self,
        params: &'a StartAiConversationParams,
    ) -> BoxFuture<'a, Result<Value, RemoteError>>;

    fn stop_ai_conversation<'a>(&'a self, task_id: &'a str)
        -> BoxFuture<'a, Result<Value, RemoteError>>;
}

/// Stateless TRTC API client holding only account credentials and endpoint.
#[derive(Clone)]
pub struct TrtcClient {
    http: ReqwestClient,
    signer: Tc3Signer,
    region: String,
    url: String,
    host: String,
}

impl TrtcClient {
    /// `config.endpoint` is a bare host (`trtc.tencentcloudapi.com`) or a
    /// full base URL with scheme.
    pub fn new(config: &ApiConfig) -> Self {
        let endpoint = config.endpoint.trim_end_matches('/');
        let (url, host) = match endpoint
            .strip_prefix("https://")
            .or_else(|| endpoint.strip_prefix("http://"))
        {
            Some(host) => (format!("{endpoint}/"), host.to_string()),
            None => (format!("https://{endpoint}/"), endpoint.to_string()),
        };

        Self {
            http: ReqwestClient::new(),
            signer: Tc3Signer::new(&config.secret_id, &config.secret_key, SERVICE),
            region: config.region.clone(),
            url,
            host,
        }
    }

    async fn call<P: Serialize + Sync>(&self, action: &str, params: &P) -> Result<Value, RemoteError> {
        let payload = serde_json::to_string(params)
            .map_err(|e| RemoteError::new("ClientError", e.to_string()))?;
        let now = Utc::now();
        let authorization = self
            .signer
            .authorization(&self.host, action, &payload, now)
            .map_err(|e| RemoteError::new("ClientError", e.to_string()))?;

        debug!(action, url = %self.url, "calling TRTC API");
        let response = self
            .http
            .post(&self.url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .header("X-TC-Action", action)
            .header("X-TC-Timestamp", now.timestamp().to_string())
            .header("X-TC-Version", API_VERSION)
            .header("X-TC-Region", &self.region)
            .body(payload)
            .send()
            .await
            .map_err(RemoteError::network)?;

        let status = response.status();
        let body = response.text().await.map_err(RemoteError::network)?;

        let envelope = match serde_json::from_str::<ResponseEnvelope>(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(RemoteError::new(format!("HTTP{}", status.as_u16()), body));
            }
            Err(e) => {
                return Err(RemoteError::new(
                    "ClientParseError",
                    format!("unexpected response from TRTC: {e}"),
                ));
            }
        };

        let request_id = envelope
            .response
            .get("RequestId")
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Some(err) = envelope.response.get("Error") {
            let err = match serde_json::from_value::<ErrorBody>(err.clone()) {
                Ok(body) => RemoteError {
                    code: body.code,
                    message: body.message,
                    request_id,
                },
                Err(_) => RemoteError {
                    code: "UnknownError".to_string(),
                    message: err.to_string(),
                    request_id,
                },
            };
            error!(action, code = %err.code, request_id = ?err.request_id, "TRTC API returned an error");
            return Err(err);
        }

        if !status.is_success() {
            return Err(RemoteError {
                code: format!("HTTP{}", status.as_u16()),
                message: format!("TRTC API responded with status {status}"),
                request_id,
            });
        }

        Ok(envelope.response)
    }
}

impl ConversationApi for TrtcClient {
    fn start_ai_conversation<'a>(
        &'a self,
        params: &'a StartAiConversationParams,
    ) -> BoxFuture<'a, Result<Value, RemoteError>> {
        Box::pin(self.call(START_AI_CONVERSATION, params))
    }

    fn stop_ai_conversation<'a>(
        &'a self,
        task_id: &'a str,
    ) -> BoxFuture<'a, Result<Value, RemoteError>> {
        Box::pin(async move {
            self.call(STOP_AI_CONVERSATION, &StopAiConversationParams { task_id })
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_config(endpoint: &str) -> ApiConfig {
        ApiConfig {
            secret_id: "AKIDexample".to_string(),
            secret_key: "exampleSecretKey".to_string(),
            region: "ap-beijing".to_string(),
            endpoint: endpoint.to_string(),
        }
    }

    #[test]
    fn bare_endpoint_uses_https() {
        let client = TrtcClient::new(&api_config("trtc.tencentcloudapi.com"));
        assert_eq!(client.url, "https://trtc.tencentcloudapi.com/");
        assert_eq!(client.host, "trtc.tencentcloudapi.com");
    }

    #[test]
    fn explicit_scheme_is_kept() {
        let client = TrtcClient::new(&api_config("http://127.0.0.1:9000/"));
        assert_eq!(client.url, "http://127.0.0.1:9000/");
        assert_eq!(client.host, "127.0.0.1:9000");
    }

    #[test]
    fn start_params_use_provider_field_names() {
        let params = StartAiConversationParams {
            sdk_app_id: 1_400_000_000,
            room_id: "123456".to_string(),
            agent_config: AgentParams {
                user_id: "ai_123456".to_string(),
                user_sig: "robot-sig".to_string(),
                target_user_id: "user_123456".to_string(),
                behavior: AgentBehavior::default(),
            },
            stt_config: SttConfig::default(),
            llm_config: "{}".to_string(),
            tts_config: "{}".to_string(),
        };

        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["SdkAppId"], 1_400_000_000u64);
        assert_eq!(json["RoomId"], "123456");
        assert_eq!(json["AgentConfig"]["UserId"], "ai_123456");
        assert_eq!(json["AgentConfig"]["UserSig"], "robot-sig");
        assert_eq!(json["AgentConfig"]["TargetUserId"], "user_123456");
        assert_eq!(json["AgentConfig"]["InterruptMode"], 2);
        assert_eq!(json["AgentConfig"]["TurnDetectionMode"], 3);
        assert_eq!(json["STTConfig"]["VadSilenceTime"], 600);
        assert_eq!(json["LLMConfig"], "{}");
        assert_eq!(json["TTSConfig"], "{}");
    }
}
