//! Speech and language services behind the dialogue
//!
//! - `SpeechToText` / `TextToSpeech`: Google Cloud REST adapters
//! - `ResponseGenerator`: OpenAI chat completions
//! - `Pipeline`: transcribe → generate → synthesize with a running history
//! - `DialogueService`: what the scenario controller talks to, served either
//!   in-process by `Pipeline` or over HTTP by `crate::http::RelayClient`

mod google;
mod history;
mod openai;
mod pipeline;

pub use google::GoogleSpeech;
pub use history::{ChatMessage, ConversationHistory, Role};
pub use openai::OpenAiChat;
pub use pipeline::{Pipeline, TurnError, TurnOutcome};

use anyhow::Result;

pub const DEFAULT_SYSTEM_PROMPT: &str = "Sen Deniz adlı bir NAO insansı robotsun. Katılımcılarla tamamen Türkçe olarak etkileşim kuruyor ve onlara belirtilen bir gündelik nesnenin yaratıcı alternatif kullanımları için fikirler üretmelerine yardımcı oluyorsun. Tanışma faslını bitirdik ve merhabalaştınız. Katılımcıya görevi açıkladık ve nesne için toplamda 3 dakika konuşacağınızı belirttik. Görevin, katılımcıya rehberlik ederek sorular sormak, fikirlerini geliştirmelerine destek olmak ve yaratıcı öneriler sunmaktır. Cevaplarını doğal bir diyalog sürdürebilmek için olabildiğince kısa tut ve doğal bir dil kullan. Öneri vermeye kullanıcı başlayacak, daha sonra sen başka bir öneri sun, sonrasında kullanıcıya başka nasıl kullanılabileceğini sor, böylece bir sen bir kullanıcı bir kullanım önersin. Süre doldu promptu gelene kadar aynı nesne üzerinde duracağız, bu nedenle kullanıcı takılırsa da yapıcı bir şekilde yardımcı ol, böylece belli bir cevaba erişmesini sağla. Farklı bir nesne üzerine düşünmeyi önerme.";

#[async_trait::async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe 16-bit mono WAV bytes. An empty string means nothing was recognized.
    async fn transcribe(&self, wav: &[u8]) -> Result<String>;
}

#[async_trait::async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesize `text` into WAV bytes
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

#[async_trait::async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn respond(&self, history: &[ChatMessage], prompt: &str) -> Result<String>;
}

/// The robot's answer to one user turn
#[derive(Debug, Clone, Default)]
pub struct TurnReply {
    pub recognized_text: String,
    pub reply: String,
    /// Synthesized reply, WAV encoded
    pub audio: Option<Vec<u8>>,
}

/// Dialogue backend as seen from the scenario controller
#[async_trait::async_trait]
pub trait DialogueService: Send + Sync {
    /// Run one user turn: recorded speech plus the current task instruction
    async fn listen(&self, wav: Vec<u8>, instruction: &str) -> Result<TurnReply>;

    /// Synthesize a scripted line
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;

    /// Forget the conversation so far
    async fn reset(&self) -> Result<()>;
}
