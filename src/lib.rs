pub mod audio;
pub mod config;
pub mod http;
pub mod robot;
pub mod scenario;
pub mod services;

pub use audio::{downmix_to_mono, mix_file_to_mono, wav_duration, AudioFile};
pub use config::Config;
pub use http::{create_router, AppState, RelayClient};
pub use robot::{BehaviorRunner, FileChannel, SimulatedRobot, SpeechDevice};
pub use scenario::{DialogueController, ObjectBudget, ObjectOutcome, ScenarioRobot};
pub use services::{DialogueService, Pipeline, TurnReply};
