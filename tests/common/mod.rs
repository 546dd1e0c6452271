#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use actix_web::{test, web, App};
use futures::future::BoxFuture;
use serde_json::{json, Value};

use tiny_trtc_agent::{
    config::AppConfig,
    handlers,
    trtc::{ConversationApi, RemoteError, StartAiConversationParams},
};

pub const SDK_APP_ID: u64 = 1_400_000_000;
pub const TRTC_SECRET: &str = "test-trtc-secret";

pub fn test_config(extra: &[(&str, &str)]) -> AppConfig {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("TRTC_SDK_APP_ID".to_string(), SDK_APP_ID.to_string()),
        ("TRTC_SECRET_KEY".to_string(), TRTC_SECRET.to_string()),
        ("TENCENT_SECRET_ID".to_string(), "AKIDtest".to_string()),
        ("TENCENT_SECRET_KEY".to_string(), "tencent-secret".to_string()),
        ("TTS_VOICE_ID".to_string(), "default-voice".to_string()),
        ("LLM_MODEL".to_string(), "test-model".to_string()),
    ]);
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    AppConfig::from_lookup(|key| vars.get(key).cloned()).expect("Failed to build test config")
}

/// Records every call and answers with a canned result.
#[derive(Default)]
pub struct RecordingApi {
    pub starts: Mutex<Vec<StartAiConversationParams>>,
    pub stops: Mutex<Vec<String>>,
    pub failure: Option<RemoteError>,
}

impl RecordingApi {
    pub fn failing(code: &str, message: &str) -> Self {
        Self {
            failure: Some(RemoteError::new(code, message)),
            ..Default::default()
        }
    }

    pub fn start_calls(&self) -> Vec<StartAiConversationParams> {
        self.starts.lock().unwrap().clone()
    }

    pub fn stop_calls(&self) -> Vec<String> {
        self.stops.lock().unwrap().clone()
    }
}

impl ConversationApi for RecordingApi {
    fn start_ai_conversation<'a>(
        &'a self,
        params: &'a StartAiConversationParams,
    ) -> BoxFuture<'a, Result<Value, RemoteError>> {
        self.starts.lock().unwrap().push(params.clone());
        let result = match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(json!({ "TaskId": "task-123", "RequestId": "req-1" })),
        };
        Box::pin(async move { result })
    }

    fn stop_ai_conversation<'a>(
        &'a self,
        task_id: &'a str,
    ) -> BoxFuture<'a, Result<Value, RemoteError>> {
        self.stops.lock().unwrap().push(task_id.to_string());
        let result = match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(json!({ "RequestId": "req-2" })),
        };
        Box::pin(async move { result })
    }
}

pub async fn setup_test_app(
    config: AppConfig,
    api: Arc<RecordingApi>,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = actix_web::dev::ServiceResponse,
    Error = actix_web::Error,
> {
    let api: Arc<dyn ConversationApi> = api;
    test::init_service(
        App::new()
            .app_data(web::Data::new(config))
            .app_data(web::Data::from(api))
            .configure(handlers::configure),
    )
    .await
}
