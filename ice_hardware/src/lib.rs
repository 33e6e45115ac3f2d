//! Simulated and (optionally) real collaborators for the engine controller.
//!
//! The simulated types share state through `Rc` handles: keep a clone to
//! drive inputs and inspect outputs while the engine owns another.

pub mod error;
pub mod plant;
pub mod sim;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;

pub use plant::{PlantParams, SimEngine};
pub use sim::{SimServos, SimVehicle};
