use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::pick_random;
use crate::robot::BehaviorRunner;

/// How many fixed-length gestures fit in a speaking window
pub fn gestures_that_fit(duration: Duration, gesture_len: Duration) -> usize {
    if gesture_len.is_zero() {
        return 0;
    }
    (duration.as_nanos() / gesture_len.as_nanos()) as usize
}

/// Loop random speaking gestures for `duration`.
///
/// A gesture is launched only while at least `gesture_len` of the window
/// remains; the previous gesture is stopped before each launch and the last
/// one is stopped on exit. Returns the number of gestures launched.
pub async fn run_speaking_gestures(
    runner: &dyn BehaviorRunner,
    gestures: &[String],
    duration: Duration,
    gesture_len: Duration,
) -> usize {
    if gestures.is_empty() || gesture_len.is_zero() {
        return 0;
    }

    let start = Instant::now();
    let mut current: Option<&str> = None;
    let mut launched = 0;

    while start.elapsed() < duration {
        let remaining = duration.saturating_sub(start.elapsed());
        if remaining < gesture_len {
            debug!("Not enough time for another gesture");
            break;
        }

        if let Some(previous) = current.take() {
            if let Err(e) = runner.stop(previous).await {
                warn!("Failed to stop gesture {}: {}", previous, e);
            }
        }

        let Some(next) = pick_random(gestures) else {
            break;
        };

        info!("Launching gesture: {}", next);
        match runner.start(next).await {
            Ok(()) => {
                current = Some(next.as_str());
                launched += 1;
            }
            Err(e) => warn!("Failed to launch gesture {}: {}", next, e),
        }

        sleep(gesture_len).await;
    }

    if let Some(last) = current {
        match runner.stop(last).await {
            Ok(()) => debug!("Stopped gesture: {}", last),
            Err(e) => warn!("Failed to stop final gesture {}: {}", last, e),
        }
    }

    launched
}
