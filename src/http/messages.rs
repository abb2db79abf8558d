use serde::{Deserialize, Serialize};

/// Reply to `POST /listenUser`
#[derive(Debug, Serialize, Deserialize)]
pub struct ListenResponse {
    pub recognized_text: String,
    pub chatgpt_response: String,
    pub wav_base64: Option<String>,
}

/// Reply to `GET /ttsBytes`
#[derive(Debug, Serialize, Deserialize)]
pub struct TtsResponse {
    pub wav_base64: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error body; partial results are included when a later stage failed
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub recognized_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub chatgpt_response: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            recognized_text: None,
            chatgpt_response: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TtsQuery {
    pub prompt: Option<String>,
}
