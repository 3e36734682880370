//! Data model shared by every component.
//!
//! - `entity`: environment entities and the transmitter/receiver views
//! - `scheme`: modulation families and scheme ids
//! - `output`: per-frame `TxConfig` / `RxConfig` / `FrameOutput`
//! - `layout`: `GlobalLayout` and allocation issue records

pub mod entity;
pub mod layout;
pub mod output;
pub mod scheme;

pub use entity::{
    EntityType, EnvironmentEntity, ObservableRange, ReceiverDescriptor, ReceiverEntity, Site,
    TransmitterEntity,
};
pub use layout::{
    AllocationIssue, GlobalLayout, IssueKind, LayoutEntry, ReceiverPlan, OVERLAP_TOLERANCE_HZ,
};
pub use output::{
    FrameOutput, FrequencyAllocation, ModulationConfig, PatternParams, PowerConfig, RxConfig,
    TransmissionState, TxConfig,
};
pub use scheme::{BandwidthModel, ModulationFamily, SchemeId};
