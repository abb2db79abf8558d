//! Scenario control: the timed, turn-based dialogue the robot runs for each
//! object, with idle nudges, latency fillers, and speaking gestures.

mod budget;
mod controller;
mod gestures;

pub use budget::ObjectBudget;
pub use controller::{DialogueController, ObjectOutcome, ScenarioRobot};
pub use gestures::{gestures_that_fit, run_speaking_gestures};

use rand::seq::SliceRandom;

fn pick_random<T>(items: &[T]) -> Option<&T> {
    items.choose(&mut rand::thread_rng())
}
