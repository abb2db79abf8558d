//! Robot-side interfaces: microphones and speaker, named behaviors, and
//! file transfer to the device.

pub mod backend;
pub mod simulated;

pub use backend::{halt_behavior, launch_behavior, BehaviorRunner, FileChannel, SpeechDevice};
pub use simulated::{RobotAction, RobotEvent, SimulatedRobot};
