#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_panics_doc
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Smart-glass control logic (hardware-agnostic).
//!
//! Two cooperating loops, each normally in its own process:
//!
//! - **Orchestrator** (`orchestrator`): polls both radars through
//!   `fusion::RadarFusion`, decides ON/OFF with a lockout between commands,
//!   and writes `on`/`off` lines to the actuator (`link`).
//! - **Actuator** (`actuator`): reads those lines through `command`, and
//!   drives the film with the ramped two-phase waveform in `ramp`.
//!
//! All hardware goes through `glass_traits::FrameSource` and
//! `glass_traits::OutputLines`; time goes through `glass_traits::clock::Clock`.

pub mod actuator;
pub mod command;
pub mod config;
pub mod conversions;
pub mod error;
pub mod fusion;
pub mod hw_error;
pub mod link;
pub mod mocks;
pub mod orchestrator;
pub mod ramp;
pub mod telemetry;
pub mod util;

pub use actuator::{ActuatorLoop, FileReload, LoopEvent, ReloadSource};
pub use command::{Command, Mailbox, Slot};
pub use config::{ActuatorCfg, FusionCfg, OrchestratorCfg, RampTable};
pub use error::{Fatal, GlassError, Report, Result};
pub use fusion::{FrameResult, RadarFusion, RadarSnapshot, RawReading};
pub use link::ChildActuator;
pub use orchestrator::{ActuatorExit, ActuatorLink, Orchestrator, Tick};
pub use ramp::{ActuatorRamp, GlassState, RampReport};
pub use telemetry::{CsvTelemetry, Decision, TelemetryRecord, TelemetrySink};
