//! Allocation pipeline: classification, receiver resolution, modulation,
//! frequency placement, power, temporal patterns, and the orchestrator that
//! ties them to frames.

pub mod classifier;
pub mod frequency;
pub mod history;
pub mod modulation;
pub mod orchestrator;
pub mod power;
pub mod receiver;
pub mod rng;
pub mod scheduler;

pub use classifier::{ClassifiedEntities, EntityClassifier};
pub use frequency::{FrequencyAllocator, FrequencyPlan, PlacementStrategy, TxAssignment};
pub use history::{AllocationHistory, RecordOutcome};
pub use modulation::ModulationSelector;
pub use orchestrator::ScenarioOrchestrator;
pub use power::{PowerContext, PowerController};
pub use receiver::ReceiverConfigurator;
pub use scheduler::TransmissionScheduler;
