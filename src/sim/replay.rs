//! Day replay: drives the stateless policy once per timestep.

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use tracing::{debug, info};

use super::clock::Clock;
use super::profile::DailyProfile;
use super::types::StepRecord;
use crate::config::{ConfigError, ReplayConfig, SnapshotConfig};
use crate::policy::{
    ComfortBand, DeviceRegistry, EnergyPolicy, ScheduledActivation, Snapshot,
};

/// Seed offset for the temperature profile to avoid correlation with price noise.
const TEMPERATURE_SEED_OFFSET: u64 = 17;

/// Replays one day of evaluation cycles against synthetic sensor feeds.
///
/// The replay plays the part of the external caller: it samples the price
/// and temperature profiles, hands the policy a fresh snapshot each step
/// and carries the usage total forward between cycles.
pub struct Replay {
    policy: EnergyPolicy,
    devices: DeviceRegistry,
    schedules: Vec<ScheduledActivation>,
    comfort_band: ComfortBand,
    price_threshold: f64,
    energy_usage_limit: f64,
    unit_per_device_step: f64,
    initial_energy_used: f64,
    start: NaiveDateTime,
    steps_per_day: usize,
    price: DailyProfile,
    temperature: DailyProfile,
}

impl Replay {
    /// Builds a replay from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the registry or comfort band is malformed.
    pub fn from_config(cfg: &SnapshotConfig) -> Result<Self, ConfigError> {
        let r: &ReplayConfig = &cfg.replay;
        if r.steps_per_day == 0 {
            return Err(ConfigError {
                field: "replay.steps_per_day".to_string(),
                message: "must be > 0".to_string(),
            });
        }
        Ok(Self {
            policy: cfg.energy_policy(),
            devices: cfg.registry()?,
            schedules: cfg.activations(),
            comfort_band: cfg.comfort_band()?,
            price_threshold: cfg.pricing.price_threshold,
            energy_usage_limit: cfg.quota.energy_usage_limit,
            unit_per_device_step: r.unit_per_device_step,
            initial_energy_used: r.initial_energy_used,
            start: r.date.and_time(NaiveTime::MIN),
            steps_per_day: r.steps_per_day,
            price: DailyProfile::new(
                r.price_base,
                r.price_amp,
                DailyProfile::EVENING_PEAK,
                r.price_noise_std,
                r.steps_per_day,
                r.seed,
            ),
            temperature: DailyProfile::new(
                r.temperature_base,
                r.temperature_amp,
                DailyProfile::AFTERNOON_PEAK,
                r.temperature_noise_std,
                r.steps_per_day,
                r.seed.wrapping_add(TEMPERATURE_SEED_OFFSET),
            ),
        })
    }

    /// Time between evaluation cycles.
    pub fn step(&self) -> TimeDelta {
        TimeDelta::seconds(86_400 / self.steps_per_day as i64)
    }

    pub fn policy(&self) -> &EnergyPolicy {
        &self.policy
    }

    /// Runs every cycle of the day and returns the per-step records.
    pub fn run(&mut self) -> Vec<StepRecord> {
        let mut clock = Clock::new(self.start, self.step(), self.steps_per_day);
        let mut records = Vec::with_capacity(self.steps_per_day);
        let mut used = self.initial_energy_used;

        clock.run(|t, now| {
            let price = self.price.value_at(t);
            let temperature = self.temperature.value_at(t);

            let snapshot = Snapshot {
                current_price: price,
                price_threshold: self.price_threshold,
                devices: self.devices.clone(),
                current_time: now,
                current_temperature: temperature,
                comfort_band: self.comfort_band,
                energy_usage_limit: self.energy_usage_limit,
                total_energy_used_today: used,
                schedules: self.schedules.clone(),
            };
            let result = self.policy.evaluate(&snapshot);

            let consumed = result.device_status.count_on() as f64 * self.unit_per_device_step;
            let record = StepRecord {
                timestep: t,
                time: now,
                price,
                temperature,
                usage_before: used,
                usage_after_shedding: result.total_energy_used,
                consumed,
                energy_saving_mode: result.energy_saving_mode,
                temperature_regulation_active: result.temperature_regulation_active,
                night_mode: result.night_mode,
                device_status: result.device_status,
            };
            used = record.usage_end();
            debug!(%record, "replay step");
            records.push(record);
        });

        info!(
            steps = records.len(),
            final_energy_used = used,
            "replay finished"
        );
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> SnapshotConfig {
        let mut cfg = SnapshotConfig::baseline();
        cfg.replay.price_noise_std = 0.0;
        cfg.replay.temperature_noise_std = 0.0;
        cfg
    }

    #[test]
    fn one_record_per_step() {
        let mut cfg = quiet_config();
        cfg.replay.steps_per_day = 48;
        let mut replay = Replay::from_config(&cfg).expect("valid config");
        assert_eq!(replay.step(), TimeDelta::minutes(30));
        let records = replay.run();
        assert_eq!(records.len(), 48);
        assert_eq!(records[1].time.format("%H:%M").to_string(), "00:30");
    }

    #[test]
    fn usage_is_carried_forward() {
        let mut replay = Replay::from_config(&quiet_config()).expect("valid config");
        let records = replay.run();
        for pair in records.windows(2) {
            assert_eq!(pair[1].usage_before, pair[0].usage_end());
        }
    }

    #[test]
    fn night_hours_are_flagged() {
        let mut replay = Replay::from_config(&quiet_config()).expect("valid config");
        let records = replay.run();
        let night: Vec<usize> = records
            .iter()
            .filter(|r| r.night_mode)
            .map(|r| r.timestep)
            .collect();
        assert_eq!(night, vec![0, 1, 2, 3, 4, 5, 23]);
    }

    #[test]
    fn scheduled_device_is_on_at_its_instant() {
        let mut cfg = quiet_config();
        cfg.pricing.price_threshold = 0.0;
        let mut replay = Replay::from_config(&cfg).expect("valid config");
        let records = replay.run();
        assert!(records[18].energy_saving_mode);
        assert_eq!(records[18].device_status.get("TV"), Some(true));
        assert_eq!(records[17].device_status.get("TV"), Some(false));
    }

    #[test]
    fn rejects_zero_steps() {
        let mut cfg = quiet_config();
        cfg.replay.steps_per_day = 0;
        assert!(Replay::from_config(&cfg).is_err());
    }
}
