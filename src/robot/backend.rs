use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Microphone capture and loudspeaker playback on the robot
///
/// Implementations:
/// - Simulated: in-process device for dry runs and tests
/// - Vendor SDK bridges plug in here
#[async_trait::async_trait]
pub trait SpeechDevice: Send + Sync {
    /// Record every microphone for `duration`
    ///
    /// Any recording already in progress is stopped first. Returns the
    /// device-side path of the interleaved WAV.
    async fn record(&self, duration: Duration) -> Result<String>;

    /// Play a device-side file, returning once playback has finished
    async fn play(&self, remote_path: &str) -> Result<()>;
}

/// Named animation/behavior runner on the robot
#[async_trait::async_trait]
pub trait BehaviorRunner: Send + Sync {
    async fn is_installed(&self, name: &str) -> Result<bool>;

    async fn is_running(&self, name: &str) -> Result<bool>;

    /// Launch a behavior without waiting for it to finish
    async fn start(&self, name: &str) -> Result<()>;

    async fn stop(&self, name: &str) -> Result<()>;
}

/// File transfer between this host and the robot
#[async_trait::async_trait]
pub trait FileChannel: Send + Sync {
    /// Copy a local file to the device, returning its device-side path
    async fn push(&self, local: &Path, remote_name: &str) -> Result<String>;

    /// Copy a device-side file to a local path
    async fn pull(&self, remote: &str, local: &Path) -> Result<PathBuf>;
}

/// Launch a behavior if it is installed and not already running.
///
/// Failures are logged; the scenario carries on without the animation.
pub async fn launch_behavior(runner: &dyn BehaviorRunner, name: &str) {
    match runner.is_installed(name).await {
        Ok(true) => {}
        Ok(false) => {
            warn!("Behavior not found: {}", name);
            return;
        }
        Err(e) => {
            warn!("Failed to query behavior {}: {}", name, e);
            return;
        }
    }

    match runner.is_running(name).await {
        Ok(true) => info!("Behavior is already running: {}", name),
        Ok(false) => {
            if let Err(e) = runner.start(name).await {
                warn!("Failed to start behavior {}: {}", name, e);
            }
        }
        Err(e) => warn!("Failed to query behavior {}: {}", name, e),
    }
}

/// Stop a behavior if it is running
pub async fn halt_behavior(runner: &dyn BehaviorRunner, name: &str) {
    match runner.is_running(name).await {
        Ok(true) => {
            if let Err(e) = runner.stop(name).await {
                warn!("Failed to stop behavior {}: {}", name, e);
            }
        }
        Ok(false) => debug!("Behavior is already stopped: {}", name),
        Err(e) => warn!("Failed to query behavior {}: {}", name, e),
    }
}
