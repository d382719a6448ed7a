//! Replay step records.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::policy::DecisionTable;

/// Complete record of one replayed evaluation cycle.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// Step index within the day.
    pub timestep: usize,
    /// Evaluation instant.
    pub time: NaiveDateTime,
    /// Price fed to the policy.
    pub price: f64,
    /// Temperature fed to the policy.
    pub temperature: f64,
    /// Usage carried into this cycle.
    pub usage_before: f64,
    /// Usage reported by the policy after shedding.
    pub usage_after_shedding: f64,
    /// Usage consumed by devices left on during this step.
    pub consumed: f64,
    /// Whether price saving mode was active.
    pub energy_saving_mode: bool,
    /// Whether heating or cooling ran.
    pub temperature_regulation_active: bool,
    /// Whether the night window governed device state.
    pub night_mode: bool,
    /// Final device decisions.
    pub device_status: DecisionTable,
}

impl StepRecord {
    pub fn devices_on(&self) -> usize {
        self.device_status.count_on()
    }

    /// Usage carried into the next cycle.
    pub fn usage_end(&self) -> f64 {
        self.usage_after_shedding + self.consumed
    }
}

impl fmt::Display for StepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>3} ({}) | price={:.3} temp={:>5.1} | usage {:>6.2} -> {:>6.2} | \
             on={}/{} saving={} regulation={} night={}",
            self.timestep,
            self.time.format("%H:%M"),
            self.price,
            self.temperature,
            self.usage_before,
            self.usage_end(),
            self.devices_on(),
            self.device_status.len(),
            self.energy_saving_mode,
            self.temperature_regulation_active,
            self.night_mode,
        )
    }
}
