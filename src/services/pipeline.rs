use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::{
    ConversationHistory, DialogueService, GoogleSpeech, OpenAiChat, ResponseGenerator,
    SpeechToText, TextToSpeech, TurnReply,
};
use crate::config::Config;

/// Why a user turn produced no spoken reply
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("nothing was recognized in the recording")]
    NothingRecognized,

    #[error("speech synthesis failed: {message}")]
    Synthesis {
        recognized_text: String,
        reply: String,
        message: String,
    },
}

/// Result of a successful user turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub recognized_text: String,
    pub reply: String,
    pub audio: Vec<u8>,
}

/// Transcribe → generate → synthesize, keeping the conversation history
pub struct Pipeline {
    stt: Arc<dyn SpeechToText>,
    llm: Arc<dyn ResponseGenerator>,
    tts: Arc<dyn TextToSpeech>,
    history: RwLock<ConversationHistory>,
    fallback_reply: String,
}

impl Pipeline {
    pub fn new(
        stt: Arc<dyn SpeechToText>,
        llm: Arc<dyn ResponseGenerator>,
        tts: Arc<dyn TextToSpeech>,
        fallback_reply: impl Into<String>,
    ) -> Self {
        Self {
            stt,
            llm,
            tts,
            history: RwLock::new(ConversationHistory::new()),
            fallback_reply: fallback_reply.into(),
        }
    }

    /// Google speech on both ends, OpenAI in the middle
    pub fn from_config(config: &Config) -> Self {
        let speech = Arc::new(GoogleSpeech::new(&config.services, config.robot.sample_rate));
        Self::new(
            speech.clone(),
            Arc::new(OpenAiChat::new(&config.services)),
            speech,
            config.services.fallback_reply.clone(),
        )
    }

    /// Prompt sent to the response generator for one user utterance
    pub fn prompt_for(instruction: &str, recognized_text: &str) -> String {
        format!("{}\nKullanıcı: {}", instruction, recognized_text)
    }

    pub async fn handle_turn(
        &self,
        wav: &[u8],
        instruction: &str,
    ) -> Result<TurnOutcome, TurnError> {
        let recognized_text = match self.stt.transcribe(wav).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("Speech-to-text failed: {:#}", e);
                String::new()
            }
        };

        if recognized_text.is_empty() {
            return Err(TurnError::NothingRecognized);
        }

        info!("User said: {}", recognized_text);

        let prompt = Self::prompt_for(instruction, &recognized_text);
        let reply = {
            let history = self.history.read().await;
            self.llm.respond(history.messages(), &prompt).await
        };
        // A failed generation leaves the history untouched
        let reply = match reply {
            Ok(reply) => {
                self.history.write().await.push_exchange(prompt, reply.clone());
                reply
            }
            Err(e) => {
                error!("Response generation failed: {:#}", e);
                self.fallback_reply.clone()
            }
        };

        match self.tts.synthesize(&reply).await {
            Ok(audio) => Ok(TurnOutcome {
                recognized_text,
                reply,
                audio,
            }),
            Err(e) => Err(TurnError::Synthesis {
                recognized_text,
                reply,
                message: format!("{:#}", e),
            }),
        }
    }

    pub async fn speak(&self, text: &str) -> Result<Vec<u8>> {
        self.tts.synthesize(text).await
    }

    pub async fn reset(&self) {
        self.history.write().await.clear();
        info!("Conversation history cleared");
    }

    pub async fn history(&self) -> ConversationHistory {
        self.history.read().await.clone()
    }
}

#[async_trait::async_trait]
impl DialogueService for Pipeline {
    async fn listen(&self, wav: Vec<u8>, instruction: &str) -> Result<TurnReply> {
        let outcome = self.handle_turn(&wav, instruction).await?;
        Ok(TurnReply {
            recognized_text: outcome.recognized_text,
            reply: outcome.reply,
            audio: Some(outcome.audio),
        })
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        self.speak(text).await
    }

    async fn reset(&self) -> Result<()> {
        Pipeline::reset(self).await;
        Ok(())
    }
}
