use serde::de::DeserializeOwned;

use crate::error::Error;

/// Concurrent-agent quota exceeded for the project.
pub const ERROR_RESOURCE_LIMIT_EXCEEDED: i64 = 1412;
/// Avatar quota exceeded for the project.
pub const ERROR_AVATAR_LIMIT_EXCEEDED: i64 = 1700;

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct AsrConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct LlmConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_history: Option<u32>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct TtsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct VadConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupt_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_padding_ms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub silence_duration_ms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct AvatarConfig {
    pub enable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<String>,
    /// Transport uid the avatar participant joins with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtc_uid: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct AdvancedFeatures {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_aivad: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_bhvs: Option<bool>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct StartAgentRequest {
    pub app_id: String,
    pub channel_name: String,
    pub agent_rtc_uid: String,
    pub remote_rtc_uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asr: Option<AsrConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_llm: Option<LlmConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts: Option<TtsConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vad: Option<VadConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<AvatarConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced_features: Option<AdvancedFeatures>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct StartAgentData {
    pub agent_id: String,
    #[serde(default)]
    pub agent_url: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StopAgentRequest {
    pub app_id: String,
    pub channel_name: String,
    pub agent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset_name: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PingRequest {
    pub app_id: String,
    pub channel_name: String,
    pub preset_name: String,
}

#[derive(Debug, serde::Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Option<T>,
}

pub(crate) fn parse_response<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    let envelope: Envelope<T> = serde_json::from_slice(bytes)?;
    if envelope.code != 0 {
        return Err(Error::Api {
            code: envelope.code,
            message: envelope.msg,
        });
    }
    envelope.data.ok_or(Error::MissingData)
}

pub(crate) fn parse_ack(bytes: &[u8]) -> Result<(), Error> {
    let envelope: Envelope<serde_json::Value> = serde_json::from_slice(bytes)?;
    if envelope.code != 0 {
        return Err(Error::Api {
            code: envelope.code,
            message: envelope.msg,
        });
    }
    Ok(())
}
