use anyhow::{bail, Context, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use super::{SpeechToText, TextToSpeech};
use crate::config::ServicesConfig;

const SPEECH_URL: &str = "https://speech.googleapis.com/v1/speech:recognize";
const TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// Google Cloud Speech-to-Text and Text-to-Speech over REST
pub struct GoogleSpeech {
    client: reqwest::Client,
    api_key: String,
    language_code: String,
    voice_name: String,
    pitch: f64,
    speaking_rate: f64,
    sample_rate: u32,
}

impl GoogleSpeech {
    pub fn new(config: &ServicesConfig, sample_rate: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.google_api_key.clone(),
            language_code: config.language_code.clone(),
            voice_name: config.voice_name.clone(),
            pitch: config.pitch,
            speaking_rate: config.speaking_rate,
            sample_rate,
        }
    }

    fn recognize_body(&self, wav: &[u8]) -> serde_json::Value {
        json!({
            "config": {
                "encoding": "LINEAR16",
                "sampleRateHertz": self.sample_rate,
                "languageCode": self.language_code,
            },
            "audio": {
                "content": base64::engine::general_purpose::STANDARD.encode(wav),
            },
        })
    }

    fn synthesize_body(&self, text: &str) -> serde_json::Value {
        json!({
            "input": { "text": text },
            "voice": {
                "languageCode": self.language_code,
                "name": self.voice_name,
                "ssmlGender": "NEUTRAL",
            },
            "audioConfig": {
                "audioEncoding": "LINEAR16",
                "pitch": self.pitch,
                "speakingRate": self.speaking_rate,
            },
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<RecognitionAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognitionAlternative {
    #[serde(default)]
    transcript: String,
}

impl RecognizeResponse {
    /// First alternative of the first result
    fn best_transcript(self) -> String {
        self.results
            .into_iter()
            .next()
            .and_then(|r| r.alternatives.into_iter().next())
            .map(|a| a.transcript)
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

#[async_trait::async_trait]
impl SpeechToText for GoogleSpeech {
    async fn transcribe(&self, wav: &[u8]) -> Result<String> {
        if wav.is_empty() {
            bail!("Empty WAV data");
        }

        debug!(bytes = wav.len(), "Sending audio to Google Speech-to-Text");

        let response = self
            .client
            .post(SPEECH_URL)
            .query(&[("key", &self.api_key)])
            .json(&self.recognize_body(wav))
            .send()
            .await
            .context("Speech-to-Text request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Speech-to-Text returned {}: {}", status, body);
        }

        let parsed: RecognizeResponse = response
            .json()
            .await
            .context("Invalid Speech-to-Text response")?;
        let transcript = parsed.best_transcript();

        info!(chars = transcript.len(), "Speech-to-Text completed");
        Ok(transcript)
    }
}

#[async_trait::async_trait]
impl TextToSpeech for GoogleSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            bail!("Refusing to synthesize blank text");
        }

        let response = self
            .client
            .post(TTS_URL)
            .query(&[("key", &self.api_key)])
            .json(&self.synthesize_body(text))
            .send()
            .await
            .context("Text-to-Speech request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Text-to-Speech returned {}: {}", status, body);
        }

        let parsed: SynthesizeResponse = response
            .json()
            .await
            .context("Invalid Text-to-Speech response")?;
        let audio = base64::engine::general_purpose::STANDARD
            .decode(parsed.audio_content)
            .context("Text-to-Speech audio is not valid base64")?;

        debug!(bytes = audio.len(), "Text-to-Speech completed");
        Ok(audio)
    }
}
