#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Internal-combustion engine run/stop controller (hardware-agnostic).
//!
//! All vehicle interactions go through the `ice_traits` collaborator traits;
//! time comes from an injected `Clock`.
//!
//! ## Architecture
//!
//! - **Sensor filters**: coolant temperature and fuel level (`filter` module)
//! - **State machine**: start switch, arming, RPM and timers (`controller` module)
//! - **Outputs**: ignition, starter and gear actuators (`output` module)
//! - **Overrides**: throttle and brake requests to the vehicle mixer (`overrides` module)
//! - **Commands**: start/stop and gear selection (`command` module)
//! - **Telemetry**: rate-limited status records (`telemetry` module)
//!
//! `IcEngine::update` runs one tick in that order and reports the resulting
//! state and any notices.

pub mod builder;
pub mod command;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod engine;
pub mod error;
pub mod filter;
pub mod hw_error;
pub mod mocks;
pub mod notice;
pub mod output;
pub mod overrides;
pub mod runner;
pub mod state;
pub mod telemetry;
pub mod util;

pub use builder::IcEngineBuilder;
pub use command::{EngineCommand, gear_pwm};
pub use config::{
    EngineOptions, FuelCfg, RpmCfg, StartCfg, TelemetryCfg, TemperatureCfg, ThrottleCfg,
};
pub use controller::{ControlInputs, Controller, HeightTrigger, RestartBudget, Timers};
pub use engine::{IcEngine, Tick};
pub use error::{BuildError, IceError, RejectReason};
pub use filter::{FilteredReading, FuelSensor, TemperatureFunction, TemperatureSensor};
pub use notice::Notice;
pub use output::{GearCommand, GearState, OutputMapper};
pub use state::{EngineState, SwitchPosition};
pub use telemetry::{StatusKind, StatusLink, StatusRecord, TelemetryReporter};
