//! Worker tasks that back the runtime orchestration.
//!
//! The simulation worker is the single owner of the combat state; everything
//! else talks to it over channels.

mod simulation;

pub use simulation::{AdvanceReport, Command, SimulationWorker};
