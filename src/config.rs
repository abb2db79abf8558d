use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub robot: RobotConfig,
    pub timing: TimingConfig,
    pub scenario: ScenarioConfig,
    pub behaviors: BehaviorConfig,
    pub services: ServicesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "robot-scenario".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Name the robot introduces itself with
    pub name: String,
    /// Local scratch directory for WAV files
    pub temp_dir: PathBuf,
    /// Directory on the device that receives pushed files
    pub device_dir: PathBuf,
    /// Capture rate for the microphone array
    pub sample_rate: u32,
    /// Number of microphones captured per recording
    pub microphones: u16,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            name: "Deniz".to_string(),
            temp_dir: std::env::temp_dir().join("robot-scenario"),
            device_dir: std::env::temp_dir().join("robot-scenario-device"),
            sample_rate: 16000,
            microphones: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub object_budget_secs: u64,
    pub idle_after_secs: u64,
    pub filler_after_secs: u64,
    pub record_secs: u64,
    pub gesture_secs: u64,
    pub greeting_pause_secs: u64,
    pub failure_pause_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            object_budget_secs: 180, // 3 minutes per object
            idle_after_secs: 15,
            filler_after_secs: 5,
            record_secs: 3,
            gesture_secs: 8,
            greeting_pause_secs: 2,
            failure_pause_ms: 500,
        }
    }
}

impl TimingConfig {
    pub fn object_budget(&self) -> Duration {
        Duration::from_secs(self.object_budget_secs)
    }

    pub fn idle_after(&self) -> Duration {
        Duration::from_secs(self.idle_after_secs)
    }

    pub fn filler_after(&self) -> Duration {
        Duration::from_secs(self.filler_after_secs)
    }

    pub fn record_window(&self) -> Duration {
        Duration::from_secs(self.record_secs)
    }

    pub fn gesture_len(&self) -> Duration {
        Duration::from_secs(self.gesture_secs)
    }

    pub fn greeting_pause(&self) -> Duration {
        Duration::from_secs(self.greeting_pause_secs)
    }

    pub fn failure_pause(&self) -> Duration {
        Duration::from_millis(self.failure_pause_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Objects discussed, in order
    pub objects: Vec<String>,
    pub greeting: Vec<String>,
    pub confirmation: String,
    pub farewell: String,
    /// `{object}` and `{minutes}` are substituted
    pub instruction_template: String,
    /// `{object}` is substituted
    pub closing_template: String,
    pub idle_messages: Vec<String>,
    pub filler_phrases: Vec<String>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            objects: vec!["kalem".to_string(), "plastik şişe".to_string()],
            greeting: vec![
                "Merhaba!".to_string(),
                "Benim adım Deniz. Bugün yaratıcı fikirler üretmeye çalışacağız. Hazır mısın?"
                    .to_string(),
            ],
            confirmation: "Süper! O zaman başlayalım!".to_string(),
            farewell: "Teşekkür ederim! Görevi tamamladık. Çok yaratıcı fikirler bulduk!"
                .to_string(),
            instruction_template: "Şimdi {object} nesnesi. {minutes} dakikan var. Ne yapabiliriz?"
                .to_string(),
            closing_template: "Zaman doldu. {object} için yeterince fikir ürettik!".to_string(),
            idle_messages: vec![
                "Sen düşün, ben beklerim.".to_string(),
                "İstersen biraz daha düşünebiliriz.".to_string(),
                "Merak etme bekliyorum.".to_string(),
            ],
            filler_phrases: vec!["Düşüneyim".to_string(), "Bir saniye".to_string()],
        }
    }
}

impl ScenarioConfig {
    pub fn instruction_for(&self, object: &str, budget: Duration) -> String {
        let minutes = (budget.as_secs() / 60).max(1);
        self.instruction_template
            .replace("{object}", object)
            .replace("{minutes}", &minutes.to_string())
    }

    pub fn closing_for(&self, object: &str) -> String {
        self.closing_template.replace("{object}", object)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    pub greeting: String,
    pub confirmation: String,
    pub listening: String,
    pub closing: String,
    pub farewell: String,
    /// Played while a slow reply is outstanding
    pub thinking: Vec<String>,
    /// Looped while the robot speaks a reply
    pub speaking: Vec<String>,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            greeting: "animations/Stand/BodyTalk/Speaking/BodyTalk_4".to_string(),
            confirmation: "animations/Stand/Gestures/Yes_1".to_string(),
            listening: "animations/Stand/BodyTalk/Listening/Listening_2".to_string(),
            closing: "animations/Stand/Gestures/Enthusiastic_2".to_string(),
            farewell: "animations/Stand/Gestures/Hey_1".to_string(),
            thinking: vec![
                "animations/Stand/Waiting/ScratchHead_1".to_string(),
                "animations/Stand/Gestures/Thinking_5".to_string(),
                "animations/Stand/Gestures/Thinking_6".to_string(),
            ],
            speaking: vec![
                "animations/Stand/BodyTalk/Speaking/BodyTalk_8".to_string(),
                "animations/Stand/BodyTalk/Speaking/BodyTalk_10".to_string(),
                "animations/Stand/BodyTalk/Speaking/BodyTalk_1".to_string(),
                "animations/Stand/BodyTalk/Speaking/BodyTalk_14".to_string(),
                "animations/Stand/BodyTalk/Speaking/BodyTalk_20".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Base URL of a remote dialogue relay
    pub relay_url: String,
    pub language_code: String,
    pub voice_name: String,
    pub pitch: f64,
    pub speaking_rate: f64,
    pub google_api_key: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub model: String,
    pub temperature: f32,
    pub system_prompt: String,
    /// Spoken when the response generator fails
    pub fallback_reply: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            relay_url: "http://127.0.0.1:5000".to_string(),
            language_code: "tr-TR".to_string(),
            voice_name: "tr-TR-Standard-D".to_string(),
            pitch: -4.0,
            speaking_rate: 1.0,
            google_api_key: String::new(),
            openai_api_key: String::new(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            system_prompt: crate::services::DEFAULT_SYSTEM_PROMPT.to_string(),
            fallback_reply: "Bir hata oluştu.".to_string(),
        }
    }
}

impl Config {
    /// Layer built-in defaults, an optional config file, and
    /// `ROBOT_SCENARIO__SECTION__KEY` environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("ROBOT_SCENARIO").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
