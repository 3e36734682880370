//! # rfscene_core - Scenario Spectrum, Power and Activity Allocation
//!
//! Turns the transmitters and receivers of a simulated wireless scene into
//! per-frame transmitter and receiver configurations for the downstream
//! waveform, RF-chain and channel stages.
//!
//! ## Features
//! - 100% deterministic (same seed, same entities, same configuration = same frames)
//! - Frequency plans inside each receiver's observable window, with overlap
//!   and separation constraints and a record of every degraded placement
//! - Scenario-fixed modulation and power, frame-varying activity
//!   (continuous, burst, slot-scheduled)
//! - JSON API for driving whole scenarios from other processes
//!
//! ```rust
//! use rfscene_core::{EnvironmentEntity, FactoryConfig, ScenarioConfig, ScenarioOrchestrator, Site};
//!
//! let entities = vec![
//!     EnvironmentEntity::transmitter("tx", Site::at(10.0, 0.0, 0.0)),
//!     EnvironmentEntity::receiver("rx", Site::at(0.0, 0.0, 0.0)).with_sample_rate(2e6),
//! ];
//! let mut orchestrator = ScenarioOrchestrator::new(ScenarioConfig::default()).unwrap();
//! let frame = orchestrator.step(1, &entities, &FactoryConfig::default()).unwrap();
//! assert_eq!(frame.tx_configs.len(), 1);
//! ```

// Pipeline stages take the whole scenario context explicitly.
#![allow(clippy::too_many_arguments)]
// Struct initialization pattern used intentionally
#![allow(clippy::field_reassign_with_default)]

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;

#[cfg(test)]
mod testing;

pub use api::{config_schema_json, run_scenario, run_scenario_json, ScenarioRequest, ScenarioResponse};
pub use config::{FactoryConfig, ScenarioConfig};
pub use engine::{AllocationHistory, ScenarioOrchestrator};
pub use error::{HistoryError, Result, ScenarioError};
pub use models::{EnvironmentEntity, FrameOutput, GlobalLayout, RxConfig, Site, TxConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
