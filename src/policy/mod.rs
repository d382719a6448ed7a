//! Smart-home energy policy: snapshot in, device decisions out.

pub mod engine;
pub mod error;
/// Night, price, temperature, quota and schedule rules.
pub mod rules;
pub mod types;

pub use engine::EnergyPolicy;
pub use error::PolicyError;
pub use rules::NightWindow;
pub use types::{
    ComfortBand, DecisionTable, DeviceRegistry, EvaluationResult, Priority, ScheduledActivation,
    Snapshot, ThermalDemand,
};
