//! Post-hoc summary of a replayed day.

use std::fmt;

use serde::Serialize;

use super::types::StepRecord;

/// Aggregate indicators derived from a complete replay.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayKpis {
    /// Number of evaluation cycles.
    pub steps: usize,
    /// Cycles with price saving mode active.
    pub saving_steps: usize,
    /// Cycles with heating or cooling running.
    pub regulation_steps: usize,
    /// Cycles governed by the night window.
    pub night_steps: usize,
    /// Cycles in which the quota rule shed at least one device.
    pub quota_steps: usize,
    /// Total units removed by quota shedding.
    pub units_shed: f64,
    /// Mean share of devices left on (0.0 to 1.0).
    pub mean_on_ratio: f64,
    /// Highest price seen.
    pub peak_price: f64,
    /// Usage at the end of the day.
    pub final_energy_used: f64,
}

impl ReplayKpis {
    /// Computes all KPIs from the complete step record vector.
    pub fn from_records(records: &[StepRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let mut kpis = Self {
            steps: records.len(),
            peak_price: f64::NEG_INFINITY,
            ..Self::default()
        };
        let mut on_ratio_sum = 0.0;

        for r in records {
            if r.energy_saving_mode {
                kpis.saving_steps += 1;
            }
            if r.temperature_regulation_active {
                kpis.regulation_steps += 1;
            }
            if r.night_mode {
                kpis.night_steps += 1;
            }
            let shed = r.usage_before - r.usage_after_shedding;
            if shed > 0.0 {
                kpis.quota_steps += 1;
                kpis.units_shed += shed;
            }
            if !r.device_status.is_empty() {
                on_ratio_sum += r.devices_on() as f64 / r.device_status.len() as f64;
            }
            kpis.peak_price = kpis.peak_price.max(r.price);
        }

        kpis.mean_on_ratio = on_ratio_sum / records.len() as f64;
        kpis.final_energy_used = records.last().map_or(0.0, StepRecord::usage_end);
        kpis
    }
}

impl fmt::Display for ReplayKpis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Replay KPIs ---")?;
        writeln!(f, "Cycles:               {}", self.steps)?;
        writeln!(f, "Saving mode cycles:   {}", self.saving_steps)?;
        writeln!(f, "Regulation cycles:    {}", self.regulation_steps)?;
        writeln!(f, "Night cycles:         {}", self.night_steps)?;
        writeln!(f, "Quota cycles:         {}", self.quota_steps)?;
        writeln!(f, "Units shed:           {:.2}", self.units_shed)?;
        writeln!(f, "Mean on ratio:        {:.1}%", self.mean_on_ratio * 100.0)?;
        writeln!(f, "Peak price:           {:.3}", self.peak_price)?;
        write!(f, "Final energy used:    {:.2}", self.final_energy_used)
    }
}
