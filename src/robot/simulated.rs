// In-process stand-in for the robot
//
// Recordings are silent multi-channel WAVs written after the capture window
// elapses, playback sleeps for the file's duration, and behaviors are tracked
// in memory. Every action lands in an event log so dry runs and tests can
// inspect what the scenario asked the robot to do.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use super::backend::{BehaviorRunner, FileChannel, SpeechDevice};
use crate::audio::{wav_duration, write_wav};

/// Something the simulated robot was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum RobotAction {
    Recorded { path: String },
    Played { path: String, duration: Duration },
    BehaviorStarted(String),
    BehaviorStopped(String),
    Pushed { path: String },
    Pulled { path: String },
}

#[derive(Debug, Clone)]
pub struct RobotEvent {
    /// Time since the robot was created
    pub at: Duration,
    pub action: RobotAction,
}

pub struct SimulatedRobot {
    device_dir: PathBuf,
    sample_rate: u32,
    microphones: u16,
    /// `None` means every behavior is installed
    installed: Option<HashSet<String>>,
    /// One frame (one sample per microphone) repeated through each recording
    capture_frame: Mutex<Vec<i16>>,
    running: Mutex<HashSet<String>>,
    events: Mutex<Vec<RobotEvent>>,
    created: Instant,
}

impl SimulatedRobot {
    pub fn new(device_dir: impl Into<PathBuf>, sample_rate: u32, microphones: u16) -> Result<Self> {
        let device_dir = device_dir.into();
        std::fs::create_dir_all(device_dir.join("recordings"))
            .context("Failed to create simulated device directory")?;

        info!(
            "Simulated robot ready: {} ({}Hz, {} microphones)",
            device_dir.display(),
            sample_rate,
            microphones
        );

        Ok(Self {
            device_dir,
            sample_rate,
            microphones,
            installed: None,
            capture_frame: Mutex::new(vec![0; microphones as usize]),
            running: Mutex::new(HashSet::new()),
            events: Mutex::new(Vec::new()),
            created: Instant::now(),
        })
    }

    /// Restrict the installed behaviors to `names`
    pub fn with_installed<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.installed = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Set the per-microphone sample level used for subsequent recordings
    pub fn set_capture_frame(&self, frame: Vec<i16>) {
        if let Ok(mut current) = self.capture_frame.lock() {
            *current = frame;
        }
    }

    pub fn events(&self) -> Vec<RobotEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn running_behaviors(&self) -> HashSet<String> {
        self.running.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn device_dir(&self) -> &Path {
        &self.device_dir
    }

    fn log(&self, action: RobotAction) {
        debug!("Robot action: {:?}", action);
        if let Ok(mut events) = self.events.lock() {
            events.push(RobotEvent {
                at: self.created.elapsed(),
                action,
            });
        }
    }
}

#[async_trait::async_trait]
impl SpeechDevice for SimulatedRobot {
    async fn record(&self, duration: Duration) -> Result<String> {
        sleep(duration).await;

        let frame = self
            .capture_frame
            .lock()
            .map(|f| f.clone())
            .unwrap_or_else(|_| vec![0; self.microphones as usize]);
        let frames = (self.sample_rate as f64 * duration.as_secs_f64()) as usize;
        let samples: Vec<i16> = frame.iter().copied().cycle().take(frames * frame.len()).collect();

        let path = self.device_dir.join("recordings").join("capture.wav");
        write_wav(&path, &samples, self.sample_rate, self.microphones)?;

        let path = path.display().to_string();
        self.log(RobotAction::Recorded { path: path.clone() });
        Ok(path)
    }

    async fn play(&self, remote_path: &str) -> Result<()> {
        let duration = Duration::from_secs_f64(wav_duration(remote_path));
        sleep(duration).await;

        self.log(RobotAction::Played {
            path: remote_path.to_string(),
            duration,
        });
        Ok(())
    }
}

#[async_trait::async_trait]
impl BehaviorRunner for SimulatedRobot {
    async fn is_installed(&self, name: &str) -> Result<bool> {
        Ok(self
            .installed
            .as_ref()
            .map_or(true, |installed| installed.contains(name)))
    }

    async fn is_running(&self, name: &str) -> Result<bool> {
        let running = self
            .running
            .lock()
            .map_err(|_| anyhow::anyhow!("behavior table poisoned"))?;
        Ok(running.contains(name))
    }

    async fn start(&self, name: &str) -> Result<()> {
        if !self.is_installed(name).await? {
            anyhow::bail!("Behavior not installed: {}", name);
        }

        self.running
            .lock()
            .map_err(|_| anyhow::anyhow!("behavior table poisoned"))?
            .insert(name.to_string());

        self.log(RobotAction::BehaviorStarted(name.to_string()));
        Ok(())
    }

    async fn stop(&self, name: &str) -> Result<()> {
        let removed = self
            .running
            .lock()
            .map_err(|_| anyhow::anyhow!("behavior table poisoned"))?
            .remove(name);

        if removed {
            self.log(RobotAction::BehaviorStopped(name.to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl FileChannel for SimulatedRobot {
    async fn push(&self, local: &Path, remote_name: &str) -> Result<String> {
        let remote = self.device_dir.join(remote_name);
        tokio::fs::copy(local, &remote)
            .await
            .with_context(|| format!("Failed to push {} to device", local.display()))?;

        let remote = remote.display().to_string();
        self.log(RobotAction::Pushed { path: remote.clone() });
        Ok(remote)
    }

    async fn pull(&self, remote: &str, local: &Path) -> Result<PathBuf> {
        tokio::fs::copy(remote, local)
            .await
            .with_context(|| format!("Failed to pull {} from device", remote))?;

        self.log(RobotAction::Pulled {
            path: remote.to_string(),
        });
        Ok(local.to_path_buf())
    }
}
