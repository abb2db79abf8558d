use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::budget::ObjectBudget;
use super::gestures::run_speaking_gestures;
use super::pick_random;
use crate::audio::{mix_file_to_mono, wav_duration};
use crate::config::{BehaviorConfig, Config, ScenarioConfig, TimingConfig};
use crate::robot::{halt_behavior, launch_behavior, BehaviorRunner, FileChannel, SpeechDevice};
use crate::services::{DialogueService, TurnReply};

/// The robot-side collaborators the controller drives
#[derive(Clone)]
pub struct ScenarioRobot {
    pub device: Arc<dyn SpeechDevice>,
    pub behaviors: Arc<dyn BehaviorRunner>,
    pub files: Arc<dyn FileChannel>,
}

impl ScenarioRobot {
    /// Use one object for every robot interface
    pub fn from_shared<R>(robot: Arc<R>) -> Self
    where
        R: SpeechDevice + BehaviorRunner + FileChannel + 'static,
    {
        Self {
            device: robot.clone(),
            behaviors: robot.clone(),
            files: robot,
        }
    }
}

/// Summary of one object's dialogue block
#[derive(Debug, Clone)]
pub struct ObjectOutcome {
    pub object: String,
    pub started_at: DateTime<Utc>,
    /// User recordings sent to the dialogue service
    pub turns: usize,
    pub idle_prompts: usize,
    pub fillers: usize,
    pub responses_played: usize,
    pub elapsed: Duration,
}

impl ObjectOutcome {
    fn new(object: &str) -> Self {
        Self {
            object: object.to_string(),
            started_at: Utc::now(),
            turns: 0,
            idle_prompts: 0,
            fillers: 0,
            responses_played: 0,
            elapsed: Duration::ZERO,
        }
    }
}

/// Turn-taking controller for the creative-use scenario
pub struct DialogueController {
    robot: ScenarioRobot,
    dialogue: Arc<dyn DialogueService>,
    timing: TimingConfig,
    scenario: ScenarioConfig,
    behaviors: BehaviorConfig,
    temp_dir: PathBuf,
}

impl DialogueController {
    pub fn new(
        config: &Config,
        robot: ScenarioRobot,
        dialogue: Arc<dyn DialogueService>,
    ) -> Result<Self> {
        std::fs::create_dir_all(&config.robot.temp_dir).with_context(|| {
            format!(
                "Failed to create temp directory: {}",
                config.robot.temp_dir.display()
            )
        })?;

        Ok(Self {
            robot,
            dialogue,
            timing: config.timing.clone(),
            scenario: config.scenario.clone(),
            behaviors: config.behaviors.clone(),
            temp_dir: config.robot.temp_dir.clone(),
        })
    }

    /// Run the whole scenario: greeting, one block per object, farewell
    pub async fn run(&self) -> Vec<ObjectOutcome> {
        info!("Starting scenario");

        if let Err(e) = self.dialogue.reset().await {
            warn!("Failed to reset conversation history: {:#}", e);
        }

        self.greet().await;

        let mut outcomes = Vec::with_capacity(self.scenario.objects.len());
        for (index, object) in self.scenario.objects.iter().enumerate() {
            let outcome = self.run_object(index, object).await;
            info!(
                object = %outcome.object,
                started_at = %outcome.started_at,
                turns = outcome.turns,
                idle_prompts = outcome.idle_prompts,
                fillers = outcome.fillers,
                responses = outcome.responses_played,
                "Object block finished in {:.1}s",
                outcome.elapsed.as_secs_f64()
            );
            outcomes.push(outcome);
        }

        self.speak_with_behavior(
            &self.scenario.farewell,
            "final.wav",
            &self.behaviors.farewell,
        )
        .await;

        info!("Scenario complete");
        outcomes
    }

    async fn greet(&self) {
        let mut lines = self.scenario.greeting.iter().enumerate();

        if let Some((index, first)) = lines.next() {
            self.speak(first, &format!("greeting_{index}.wav")).await;
        }

        let runner = self.runner();
        launch_behavior(runner, &self.behaviors.greeting).await;
        for (index, line) in lines {
            self.speak(line, &format!("greeting_{index}.wav")).await;
        }
        halt_behavior(runner, &self.behaviors.greeting).await;

        sleep(self.timing.greeting_pause()).await;

        self.speak_with_behavior(
            &self.scenario.confirmation,
            "confirmation.wav",
            &self.behaviors.confirmation,
        )
        .await;
    }

    /// Timed dialogue block for one object
    pub async fn run_object(&self, index: usize, object: &str) -> ObjectOutcome {
        info!("--- Starting object #{}: {} ---", index + 1, object);

        let instruction = self
            .scenario
            .instruction_for(object, self.timing.object_budget());
        self.speak_with_behavior(
            &instruction,
            &format!("intro_{index}.wav"),
            &self.behaviors.listening,
        )
        .await;

        let mut outcome = ObjectOutcome::new(object);
        let mut budget = ObjectBudget::new(
            Instant::now(),
            self.timing.object_budget(),
            self.timing.idle_after(),
        );

        loop {
            let now = Instant::now();
            if budget.expired(now) {
                let closing = self.scenario.closing_for(object);
                self.speak_with_behavior(
                    &closing,
                    &format!("end_{index}.wav"),
                    &self.behaviors.closing,
                )
                .await;
                break;
            }

            if budget.idle_due(now) {
                if let Some(text) = pick_random(&self.scenario.idle_messages).cloned() {
                    if self.speak(&text, &format!("idle_{index}.wav")).await {
                        info!("Played idle message: '{}'", text);
                        budget.mark_speech(Instant::now());
                        outcome.idle_prompts += 1;
                    } else {
                        warn!("Failed to generate or play idle audio");
                    }
                }
            }

            let wav = match self.capture_user_audio(&format!("user_{index}.wav")).await {
                Ok(wav) => wav,
                Err(e) => {
                    warn!("Recording failed, skipping turn: {:#}", e);
                    sleep(self.timing.failure_pause()).await;
                    continue;
                }
            };
            outcome.turns += 1;

            let (reply, filled) = self.request_turn(wav, &instruction, index).await;
            if filled {
                outcome.fillers += 1;
            }

            let reply = match reply {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("Dialogue request failed, skipping turn: {:#}", e);
                    sleep(self.timing.failure_pause()).await;
                    continue;
                }
            };

            if !reply.recognized_text.trim().is_empty() {
                info!("User said: {}", reply.recognized_text);
                budget.mark_speech(Instant::now());
            }

            if let Some(audio) = reply.audio {
                if self.play_reply(index, audio).await {
                    outcome.responses_played += 1;
                }
                budget.mark_speech(Instant::now());
            }
        }

        outcome.elapsed = budget.elapsed(Instant::now());
        outcome
    }

    /// Send one recording to the dialogue service.
    ///
    /// If the request is still outstanding after `filler_after`, a thinking
    /// behavior and a filler phrase run while it completes. A request that
    /// finishes exactly at the threshold gets no filler. The flag reports
    /// whether the filler ran.
    async fn request_turn(
        &self,
        wav: Vec<u8>,
        instruction: &str,
        index: usize,
    ) -> (Result<TurnReply>, bool) {
        let started = Instant::now();
        let request = self.dialogue.listen(wav, instruction);
        tokio::pin!(request);

        let outcome = tokio::select! {
            biased;
            result = &mut request => (result, false),
            _ = sleep(self.timing.filler_after()) => {
                let (result, ()) = tokio::join!(&mut request, self.play_filler(index));
                (result, true)
            }
        };

        debug!(
            "Dialogue round trip took {:.2}s",
            started.elapsed().as_secs_f64()
        );
        outcome
    }

    async fn play_filler(&self, index: usize) {
        let behavior = pick_random(&self.behaviors.thinking).cloned();
        let runner = self.runner();

        if let Some(name) = &behavior {
            match runner.start(name).await {
                Ok(()) => info!("Running filler behavior: {}", name),
                Err(e) => warn!("Failed to run filler behavior {}: {}", name, e),
            }
        }

        if let Some(text) = pick_random(&self.scenario.filler_phrases).cloned() {
            self.speak(&text, &format!("filler_{index}.wav")).await;
        }

        if let Some(name) = behavior {
            if let Err(e) = runner.stop(&name).await {
                warn!("Failed to stop filler behavior {}: {}", name, e);
            }
        }
    }

    /// Play a synthesized reply while looping speaking gestures over its length
    async fn play_reply(&self, index: usize, audio: Vec<u8>) -> bool {
        let file_name = format!("response_{index}.wav");
        let local = self.temp_dir.join(&file_name);

        if let Err(e) = tokio::fs::write(&local, &audio).await {
            warn!("Failed to write reply audio: {}", e);
            return false;
        }

        let duration = wav_duration(&local);
        info!("Reply audio duration: {:.2} seconds", duration);

        let remote = match self.robot.files.push(&local, &file_name).await {
            Ok(remote) => remote,
            Err(e) => {
                warn!("Failed to push reply audio: {:#}", e);
                return false;
            }
        };

        let gestures = run_speaking_gestures(
            self.runner(),
            &self.behaviors.speaking,
            Duration::from_secs_f64(duration),
            self.timing.gesture_len(),
        );
        let (played, _) = tokio::join!(self.robot.device.play(&remote), gestures);

        for gesture in &self.behaviors.speaking {
            halt_behavior(self.runner(), gesture).await;
        }

        match played {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to play reply: {:#}", e);
                false
            }
        }
    }

    /// Record the user, fetch the capture, and mix it down to mono WAV bytes
    pub async fn capture_user_audio(&self, file_name: &str) -> Result<Vec<u8>> {
        let remote = self
            .robot
            .device
            .record(self.timing.record_window())
            .await
            .context("Microphone recording failed")?;

        let local = self.temp_dir.join(file_name);
        self.robot
            .files
            .pull(&remote, &local)
            .await
            .context("Failed to fetch recording")?;

        mix_file_to_mono(&local, &local)?;

        tokio::fs::read(&local)
            .await
            .with_context(|| format!("Failed to read {}", local.display()))
    }

    /// Synthesize `text`, push it to the robot, and play it.
    ///
    /// Returns whether the line was played; failures are logged.
    pub async fn speak(&self, text: &str, file_name: &str) -> bool {
        let audio = match self.dialogue.synthesize(text).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!("Failed to synthesize {:?}: {:#}", text, e);
                return false;
            }
        };

        let local = self.temp_dir.join(file_name);
        if let Err(e) = tokio::fs::write(&local, &audio).await {
            warn!("Failed to write {}: {}", local.display(), e);
            return false;
        }

        self.play_local(&local, file_name).await
    }

    /// Speak a line while a named behavior runs
    pub async fn speak_with_behavior(&self, text: &str, file_name: &str, behavior: &str) -> bool {
        launch_behavior(self.runner(), behavior).await;
        let spoken = self.speak(text, file_name).await;
        halt_behavior(self.runner(), behavior).await;
        spoken
    }

    async fn play_local(&self, local: &Path, remote_name: &str) -> bool {
        let remote = match self.robot.files.push(local, remote_name).await {
            Ok(remote) => remote,
            Err(e) => {
                warn!("Failed to push {}: {:#}", local.display(), e);
                return false;
            }
        };

        match self.robot.device.play(&remote).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to play {}: {:#}", remote, e);
                false
            }
        }
    }

    fn runner(&self) -> &dyn BehaviorRunner {
        self.robot.behaviors.as_ref()
    }
}
