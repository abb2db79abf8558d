use anyhow::{bail, Context, Result};
use base64::Engine;
use reqwest::multipart;
use std::time::Duration;
use tracing::{debug, info};

use super::messages::{ListenResponse, TtsResponse};
use crate::services::{DialogueService, TurnReply};

const LISTEN_TIMEOUT: Duration = Duration::from_secs(60);
const TTS_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for a remote dialogue relay
pub struct RelayClient {
    client: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: &str) -> Self {
        info!("Using dialogue relay at {}", base_url);

        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn decode_wav(encoded: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .context("Relay returned invalid base64 audio")
}

#[async_trait::async_trait]
impl DialogueService for RelayClient {
    async fn listen(&self, wav: Vec<u8>, instruction: &str) -> Result<TurnReply> {
        let file = multipart::Part::bytes(wav)
            .file_name("user.wav")
            .mime_str("audio/wav")
            .context("Invalid upload mime type")?;

        let form = multipart::Form::new()
            .text("current_instruction", instruction.to_string())
            .part("file", file);

        let response = self
            .client
            .post(self.url("/listenUser"))
            .multipart(form)
            .timeout(LISTEN_TIMEOUT)
            .send()
            .await
            .context("listenUser request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("listenUser returned {}: {}", status, body);
        }

        let body: ListenResponse = response
            .json()
            .await
            .context("Invalid listenUser response")?;

        let audio = match body.wav_base64.as_deref() {
            Some(encoded) if !encoded.is_empty() => Some(decode_wav(encoded)?),
            _ => None,
        };

        debug!(
            recognized = %body.recognized_text,
            has_audio = audio.is_some(),
            "Relay turn completed"
        );

        Ok(TurnReply {
            recognized_text: body.recognized_text,
            reply: body.chatgpt_response,
            audio,
        })
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.url("/ttsBytes"))
            .query(&[("prompt", text)])
            .timeout(TTS_TIMEOUT)
            .send()
            .await
            .context("ttsBytes request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("ttsBytes returned {}: {}", status, body);
        }

        let body: TtsResponse = response.json().await.context("Invalid ttsBytes response")?;
        decode_wav(&body.wav_base64)
    }

    async fn reset(&self) -> Result<()> {
        let response = self
            .client
            .get(self.url("/startScenario"))
            .timeout(TTS_TIMEOUT)
            .send()
            .await
            .context("startScenario request failed")?;

        if !response.status().is_success() {
            bail!("startScenario returned {}", response.status());
        }
        Ok(())
    }
}
