use std::env;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::trtc::usersig::{SigningError, UserSigGenerator};

/// Ten hours, the lifetime of credentials minted by `/credentials`.
pub const DEFAULT_USER_SIG_EXPIRY: i64 = 10 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {0} env var")]
    Missing(&'static str),
    #[error("Invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Process-wide settings, read once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub trtc: TrtcConfig,
    pub agent_card: AgentCard,
    pub agent: AgentBehavior,
    pub stt: SttConfig,
    pub llm: LlmConfig,
    pub tts: TtsConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

/// Tencent Cloud account credentials used to sign API calls.
#[derive(Clone)]
pub struct ApiConfig {
    pub secret_id: String,
    pub secret_key: String,
    pub region: String,
    pub endpoint: String,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("secret_id", &self.secret_id)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// TRTC application used for user signatures.
#[derive(Clone)]
pub struct TrtcConfig {
    pub sdk_app_id: u64,
    pub secret_key: String,
    pub expire_time: i64,
}

impl std::fmt::Debug for TrtcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrtcConfig")
            .field("sdk_app_id", &self.sdk_app_id)
            .field("expire_time", &self.expire_time)
            .finish_non_exhaustive()
    }
}

/// Public description of the agent persona.
#[derive(Debug, Clone, Serialize)]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
    pub voice_type: String,
    pub personality: String,
}

impl Default for AgentCard {
    fn default() -> Self {
        Self {
            name: "智慧小助手".to_string(),
            description: "我是你的AI助手，可以回答日常问题、聊天解闷、提供百科知识。随时随地为你提供帮助！"
                .to_string(),
            capabilities: ["日常问答", "知识百科", "生活建议", "轻松聊天", "实时互动"]
                .into_iter()
                .map(String::from)
                .collect(),
            voice_type: "温柔女声".to_string(),
            personality: "友好、知识丰富、温暖、有耐心".to_string(),
        }
    }
}

/// Conversation behaviour merged into the `AgentConfig` block of
/// `StartAIConversation`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentBehavior {
    pub welcome_message: String,
    pub interrupt_mode: u8,
    pub turn_detection_mode: u8,
    pub interrupt_speech_duration: u32,
    pub welcome_message_priority: u8,
}

impl Default for AgentBehavior {
    fn default() -> Self {
        Self {
            welcome_message: "你好，我是你的智慧小助手，有什么我可以帮你的吗？".to_string(),
            interrupt_mode: 2,
            turn_detection_mode: 3,
            interrupt_speech_duration: 200,
            welcome_message_priority: 1,
        }
    }
}

/// Speech recognition settings, sent as a structured object.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SttConfig {
    pub language: String,
    pub vad_silence_time: u32,
    pub hot_word_list: String,
    pub vad_level: u8,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            language: "zh".to_string(),
            vad_silence_time: 600,
            hot_word_list: "小助手|11,解闷|11".to_string(),
            vad_level: 2,
        }
    }
}

/// Language model settings, sent as a JSON-encoded string.
#[derive(Debug, Clone, Serialize)]
pub struct LlmConfig {
    #[serde(rename = "LLMType")]
    pub llm_type: String,
    #[serde(rename = "Model", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(rename = "APIUrl", skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(rename = "APIKey", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(rename = "History")]
    pub history: u32,
    #[serde(rename = "Timeout")]
    pub timeout: u32,
    #[serde(rename = "Streaming")]
    pub streaming: bool,
    #[serde(rename = "SystemPrompt")]
    pub system_prompt: String,
}

const DEFAULT_SYSTEM_PROMPT: &str = "
# 基础人设
- 名称：智慧小助手
- 性格：友好、温暖、知识渊博
- 风格：亲切自然，语气温和，耐心解答

# 能力范围
- 日常问答：回答用户的日常生活问题
- 百科知识：提供各领域的知识和信息
- 生活建议：给出实用的生活小窍门和建议
- 陪伴聊天：陪伴用户轻松聊天，解答疑惑

# 聊天规则
1. 回答方式
- 回答要简明扼要，不过于冗长
- 语气亲切友好，如同朋友般交流
- 专业知识要通俗易懂，避免晦涩难懂的术语

2. 互动方式
- 耐心倾听用户问题
- 在不确定的情况下，坦诚告知并尝试提供相关信息
- 适当表达关心，但保持适度的专业性
";

/// Text-to-speech settings, sent as a JSON-encoded string.
#[derive(Debug, Clone, Serialize)]
pub struct TtsConfig {
    #[serde(rename = "TTSType")]
    pub tts_type: String,
    #[serde(rename = "APIKey", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(rename = "APIUrl", skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(rename = "SampleRate")]
    pub sample_rate: u32,
    #[serde(rename = "VoiceId", skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
}

impl TtsConfig {
    /// Copy of these settings with the voice replaced when `voice_id` is set.
    pub fn with_voice(&self, voice_id: Option<&str>) -> Self {
        let mut tts = self.clone();
        if let Some(voice) = voice_id {
            tts.voice_id = Some(voice.to_string());
        }
        tts
    }
}

impl AppConfig {
    /// Loads configuration from the process environment (after the env file).
    pub fn load() -> Result<Self, ConfigError> {
        crate::utils::ensure_dotenv_loaded();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset.
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        // --- Server ---
        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value: raw })?,
            None => 3000,
        };
        let server = ServerConfig {
            host: or_default("HOST", "127.0.0.1"),
            port,
            static_dir: PathBuf::from(or_default("STATIC_DIR", "static")),
        };

        // --- Tencent Cloud API ---
        let api = ApiConfig {
            secret_id: or_default("TENCENT_SECRET_ID", ""),
            secret_key: or_default("TENCENT_SECRET_KEY", ""),
            region: or_default("TENCENT_REGION", "ap-beijing"),
            endpoint: or_default("TENCENT_ENDPOINT", "trtc.tencentcloudapi.com"),
        };
        if api.secret_id.is_empty() || api.secret_key.is_empty() {
            warn!("TENCENT_SECRET_ID/TENCENT_SECRET_KEY not set, provider calls will be rejected");
        }

        // --- TRTC application ---
        let raw_app_id = get("TRTC_SDK_APP_ID").ok_or(ConfigError::Missing("TRTC_SDK_APP_ID"))?;
        let sdk_app_id = raw_app_id
            .parse::<u64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or(ConfigError::Invalid {
                key: "TRTC_SDK_APP_ID",
                value: raw_app_id,
            })?;
        let expire_time = match get("USER_SIG_EXPIRY") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::Invalid {
                    key: "USER_SIG_EXPIRY",
                    value: raw,
                })?,
            None => DEFAULT_USER_SIG_EXPIRY,
        };
        let trtc = TrtcConfig {
            sdk_app_id,
            secret_key: or_default("TRTC_SECRET_KEY", ""),
            expire_time,
        };
        if trtc.secret_key.is_empty() {
            warn!("TRTC_SECRET_KEY not set, /credentials will fail");
        }

        // --- Model pipeline ---
        let llm = LlmConfig {
            llm_type: "openai".to_string(),
            model: get("LLM_MODEL"),
            api_url: get("LLM_API_URL"),
            api_key: get("LLM_API_KEY"),
            history: 5,
            timeout: 3,
            streaming: true,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        };
        let tts = TtsConfig {
            tts_type: or_default("TTS_TYPE", "new"),
            api_key: get("TTS_API_KEY"),
            api_url: get("TTS_API_URL"),
            sample_rate: get("TTS_SAMPLE_RATE")
                .and_then(|raw| raw.parse::<u32>().ok())
                .filter(|rate| *rate > 0)
                .unwrap_or(24_000),
            voice_id: get("TTS_VOICE_ID"),
        };

        Ok(AppConfig {
            server,
            api,
            trtc,
            agent_card: AgentCard::default(),
            agent: AgentBehavior::default(),
            stt: SttConfig::default(),
            llm,
            tts,
        })
    }

    /// Signature generator for the configured TRTC application.
    pub fn user_sig_generator(&self) -> Result<UserSigGenerator, SigningError> {
        UserSigGenerator::new(self.trtc.sdk_app_id, self.trtc.secret_key.clone())
    }
}
