// Integration tests for the turn-taking controller
//
// Time is paused, so every robot action and dialogue delay advances the
// tokio clock deterministically.

use anyhow::Result;
use robot_scenario::audio::{encode_wav, AudioFile};
use robot_scenario::robot::{RobotAction, SimulatedRobot, SpeechDevice};
use robot_scenario::services::{DialogueService, TurnReply};
use robot_scenario::{Config, DialogueController, ScenarioRobot};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::{sleep, Instant};

const RATE: u32 = 16000;

fn silence(seconds: f64) -> Vec<u8> {
    let samples = vec![0i16; (RATE as f64 * seconds) as usize];
    encode_wav(&samples, RATE, 1).unwrap()
}

/// Dialogue backend with fixed latency and canned replies
struct FakeDialogue {
    listen_delay: Duration,
    recognized: String,
    reply_secs: Option<f64>,
    fail_listen: bool,
    spoken: Mutex<Vec<(Instant, String)>>,
    listens: AtomicUsize,
    resets: AtomicUsize,
}

impl FakeDialogue {
    fn new(listen_delay: Duration) -> Self {
        Self {
            listen_delay,
            recognized: "kalemle resim çizerim".to_string(),
            reply_secs: Some(2.0),
            fail_listen: false,
            spoken: Mutex::new(Vec::new()),
            listens: AtomicUsize::new(0),
            resets: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            fail_listen: true,
            ..Self::new(Duration::ZERO)
        }
    }

    fn spoken(&self) -> Vec<(Instant, String)> {
        self.spoken.lock().unwrap().clone()
    }

    fn spoken_texts(&self) -> Vec<String> {
        self.spoken().into_iter().map(|(_, text)| text).collect()
    }
}

#[async_trait::async_trait]
impl DialogueService for FakeDialogue {
    async fn listen(&self, _wav: Vec<u8>, _instruction: &str) -> Result<TurnReply> {
        sleep(self.listen_delay).await;
        self.listens.fetch_add(1, Ordering::SeqCst);

        if self.fail_listen {
            anyhow::bail!("listenUser returned 500: STT failed");
        }

        Ok(TurnReply {
            recognized_text: self.recognized.clone(),
            reply: "Harika! Başka ne yapılabilir?".to_string(),
            audio: self.reply_secs.map(silence),
        })
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        self.spoken
            .lock()
            .unwrap()
            .push((Instant::now(), text.to_string()));
        Ok(silence(1.0))
    }

    async fn reset(&self) -> Result<()> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn test_config(dir: &Path, budget_secs: u64) -> Config {
    let mut cfg = Config::default();
    cfg.robot.temp_dir = dir.join("local");
    cfg.robot.device_dir = dir.join("device");
    cfg.timing.object_budget_secs = budget_secs;
    cfg.scenario.objects = vec!["kalem".to_string()];
    cfg
}

fn setup(
    budget_secs: u64,
    dialogue: Arc<FakeDialogue>,
) -> Result<(TempDir, Arc<SimulatedRobot>, DialogueController)> {
    let dir = TempDir::new()?;
    let cfg = test_config(dir.path(), budget_secs);
    let robot = Arc::new(SimulatedRobot::new(
        &cfg.robot.device_dir,
        cfg.robot.sample_rate,
        cfg.robot.microphones,
    )?);
    let controller =
        DialogueController::new(&cfg, ScenarioRobot::from_shared(robot.clone()), dialogue)?;
    Ok((dir, robot, controller))
}

#[tokio::test(start_paused = true)]
async fn test_object_block_ends_after_budget_with_closing_line() -> Result<()> {
    let dialogue = Arc::new(FakeDialogue::new(Duration::from_secs(1)));
    let (_dir, _robot, controller) = setup(20, dialogue.clone())?;

    let outcome = controller.run_object(0, "kalem").await;

    assert!(outcome.elapsed >= Duration::from_secs(20));
    // One turn is record (3s) + reply (1s) + playback (2s)
    assert!(outcome.elapsed < Duration::from_secs(27));
    assert!(outcome.turns >= 3);
    assert_eq!(outcome.responses_played, outcome.turns);
    assert_eq!(outcome.idle_prompts, 0, "Regular replies keep the user engaged");

    let texts = dialogue.spoken_texts();
    assert_eq!(
        texts.first().map(String::as_str),
        Some("Şimdi kalem nesnesi. 1 dakikan var. Ne yapabiliriz?")
    );
    assert_eq!(
        texts.last().map(String::as_str),
        Some("Zaman doldu. kalem için yeterince fikir ürettik!")
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_idle_prompt_only_after_silence() -> Result<()> {
    let dialogue = Arc::new(FakeDialogue::failing());
    let (_dir, _robot, controller) = setup(40, dialogue.clone())?;
    let idle_messages = Config::default().scenario.idle_messages;

    let outcome = controller.run_object(0, "kalem").await;
    assert!(outcome.idle_prompts >= 1);
    assert_eq!(outcome.responses_played, 0);

    let spoken = dialogue.spoken();
    let (intro_at, _) = spoken[0].clone();
    // The budget starts once the one-second instruction has played
    let budget_start = intro_at + Duration::from_secs(1);

    let idle_times: Vec<Instant> = spoken
        .iter()
        .filter(|(_, text)| idle_messages.contains(text))
        .map(|(at, _)| *at)
        .collect();
    assert_eq!(idle_times.len(), outcome.idle_prompts);

    assert!(idle_times[0] - budget_start >= Duration::from_secs(15));
    for pair in idle_times.windows(2) {
        // Each nudge plays for one second before silence restarts
        assert!(pair[1] - pair[0] >= Duration::from_secs(16));
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_filler_when_reply_is_slow() -> Result<()> {
    let dialogue = Arc::new(FakeDialogue::new(Duration::from_secs(6)));
    let (_dir, robot, controller) = setup(10, dialogue.clone())?;
    let cfg = Config::default();

    let outcome = controller.run_object(0, "kalem").await;
    assert!(outcome.turns >= 1);
    assert_eq!(outcome.fillers, outcome.turns);

    let fillers = dialogue
        .spoken_texts()
        .into_iter()
        .filter(|text| cfg.scenario.filler_phrases.contains(text))
        .count();
    assert_eq!(fillers, outcome.fillers);

    let thinking_started = robot
        .events()
        .iter()
        .filter(|e| match &e.action {
            RobotAction::BehaviorStarted(name) => cfg.behaviors.thinking.contains(name),
            _ => false,
        })
        .count();
    assert_eq!(thinking_started, outcome.fillers);
    assert!(robot.running_behaviors().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_no_filler_when_reply_is_fast() -> Result<()> {
    let dialogue = Arc::new(FakeDialogue::new(Duration::from_secs(4)));
    let (_dir, _robot, controller) = setup(10, dialogue.clone())?;

    let outcome = controller.run_object(0, "kalem").await;
    assert!(outcome.turns >= 1);
    assert_eq!(outcome.fillers, 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_no_filler_at_exact_threshold() -> Result<()> {
    let dialogue = Arc::new(FakeDialogue::new(Duration::from_secs(5)));
    let (_dir, _robot, controller) = setup(10, dialogue.clone())?;

    let outcome = controller.run_object(0, "kalem").await;
    assert!(outcome.turns >= 1);
    assert_eq!(outcome.fillers, 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_capture_mixes_recording_to_mono() -> Result<()> {
    let dialogue = Arc::new(FakeDialogue::new(Duration::ZERO));
    let (_dir, robot, controller) = setup(10, dialogue)?;
    robot.set_capture_frame(vec![100, 200, 300, 400]);

    let wav = controller.capture_user_audio("user_0.wav").await?;
    let audio = AudioFile::from_wav_bytes(&wav)?;

    assert_eq!(audio.channels, 1);
    assert_eq!(audio.sample_rate, RATE);
    assert_eq!(audio.frame_count(), 3 * RATE as usize);
    assert!(audio.samples.iter().all(|&s| s == 250));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_reply_gestures_stay_within_reply() -> Result<()> {
    let dialogue = Arc::new(FakeDialogue {
        reply_secs: Some(17.0),
        ..FakeDialogue::new(Duration::from_secs(1))
    });
    let (_dir, robot, controller) = setup(10, dialogue)?;
    let speaking = Config::default().behaviors.speaking;
    let gesture_len = Duration::from_secs(8);

    controller.run_object(0, "kalem").await;

    let events = robot.events();
    let (play_start, play_end) = events
        .iter()
        .find_map(|e| match &e.action {
            RobotAction::Played { path, duration } if path.contains("response_0") => {
                Some((e.at - *duration, e.at))
            }
            _ => None,
        })
        .expect("reply was played");

    let starts: Vec<Duration> = events
        .iter()
        .filter(|e| match &e.action {
            RobotAction::BehaviorStarted(name) => speaking.contains(name),
            _ => false,
        })
        .map(|e| e.at)
        .collect();

    // 17s reply fits two 8s gestures
    assert_eq!(starts.len(), 2);
    for at in starts {
        assert!(at >= play_start);
        assert!(at + gesture_len <= play_end, "gesture at {:?} overruns reply", at);
    }
    assert!(robot.running_behaviors().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_full_run_speaks_script_in_order() -> Result<()> {
    let dialogue = Arc::new(FakeDialogue::new(Duration::from_secs(1)));
    let (_dir, robot, controller) = setup(5, dialogue.clone())?;
    let scenario = Config::default().scenario;

    let before = chrono::Utc::now();
    let outcomes = controller.run().await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].object, "kalem");
    assert!(outcomes[0].started_at >= before);
    assert!(outcomes[0].started_at <= chrono::Utc::now());
    assert_eq!(dialogue.resets.load(Ordering::SeqCst), 1);
    assert!(dialogue.listens.load(Ordering::SeqCst) >= 1);

    let texts = dialogue.spoken_texts();
    assert_eq!(texts[0], scenario.greeting[0]);
    assert_eq!(texts[1], scenario.greeting[1]);
    assert_eq!(texts[2], scenario.confirmation);
    assert_eq!(texts[3], "Şimdi kalem nesnesi. 1 dakikan var. Ne yapabiliriz?");
    assert_eq!(texts[texts.len() - 2], scenario.closing_for("kalem"));
    assert_eq!(texts[texts.len() - 1], scenario.farewell);

    assert!(robot.running_behaviors().is_empty(), "No behavior left running");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_missing_behaviors_do_not_stop_the_scenario() -> Result<()> {
    let dir = TempDir::new()?;
    let cfg = test_config(dir.path(), 5);
    let robot = Arc::new(
        SimulatedRobot::new(&cfg.robot.device_dir, RATE, 4)?.with_installed(Vec::<String>::new()),
    );
    let dialogue = Arc::new(FakeDialogue::new(Duration::from_secs(1)));
    let controller = DialogueController::new(
        &cfg,
        ScenarioRobot::from_shared(robot.clone()),
        dialogue.clone(),
    )?;

    let outcomes = controller.run().await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(
        dialogue.spoken_texts().last(),
        Some(&cfg.scenario.farewell)
    );
    assert!(!robot
        .events()
        .iter()
        .any(|e| matches!(e.action, RobotAction::BehaviorStarted(_))));
    Ok(())
}

/// Speaker works, microphone never does
struct DeafDevice {
    speaker: Arc<SimulatedRobot>,
    attempts: Mutex<Vec<Instant>>,
}

#[async_trait::async_trait]
impl SpeechDevice for DeafDevice {
    async fn record(&self, _duration: Duration) -> Result<String> {
        self.attempts.lock().unwrap().push(Instant::now());
        anyhow::bail!("audio recorder unavailable")
    }

    async fn play(&self, remote_path: &str) -> Result<()> {
        self.speaker.play(remote_path).await
    }
}

#[tokio::test(start_paused = true)]
async fn test_failed_recordings_are_paced_until_budget_ends() -> Result<()> {
    let dir = TempDir::new()?;
    let cfg = test_config(dir.path(), 5);
    let robot = Arc::new(SimulatedRobot::new(&cfg.robot.device_dir, RATE, 4)?);
    let device = Arc::new(DeafDevice {
        speaker: robot.clone(),
        attempts: Mutex::new(Vec::new()),
    });
    let dialogue = Arc::new(FakeDialogue::new(Duration::from_secs(1)));

    let mut scenario_robot = ScenarioRobot::from_shared(robot);
    scenario_robot.device = device.clone() as Arc<dyn SpeechDevice>;
    let controller = DialogueController::new(&cfg, scenario_robot, dialogue.clone())?;

    let outcome = controller.run_object(0, "kalem").await;

    assert_eq!(outcome.turns, 0);
    assert_eq!(outcome.responses_played, 0);
    assert_eq!(dialogue.listens.load(Ordering::SeqCst), 0);
    assert!(outcome.elapsed >= Duration::from_secs(5));
    assert!(outcome.elapsed < Duration::from_millis(5500));

    let attempts = device.attempts.lock().unwrap().clone();
    // One attempt per 500ms failure pause across the 5s budget
    assert_eq!(attempts.len(), 10);
    for pair in attempts.windows(2) {
        assert!(pair[1] - pair[0] >= cfg.timing.failure_pause());
    }

    assert_eq!(
        dialogue.spoken_texts().last(),
        Some(&cfg.scenario.closing_for("kalem"))
    );
    Ok(())
}
