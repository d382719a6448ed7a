//! TOML-based snapshot configuration and preset definitions.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::{
    ComfortBand, DeviceRegistry, EnergyPolicy, NightWindow, PolicyError, ScheduledActivation,
    Snapshot,
};

const SECONDS_PER_DAY: usize = 86_400;

/// Top-level configuration parsed from TOML (or JSON through the API).
///
/// Describes one evaluation snapshot plus the policy and replay settings.
/// All sections have defaults matching the baseline preset.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotConfig {
    /// Market price inputs.
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Indoor temperature reading and desired range.
    #[serde(default)]
    pub climate: ClimateConfig,
    /// Daily usage quota.
    #[serde(default)]
    pub quota: QuotaConfig,
    /// Evaluation instant.
    #[serde(default)]
    pub clock: ClockConfig,
    /// Policy tuning.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Day replay parameters.
    #[serde(default)]
    pub replay: ReplayConfig,
    /// Registered devices, in shedding order.
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
    /// Scheduled activations.
    #[serde(default)]
    pub schedules: Vec<ScheduleConfig>,
}

/// Market price inputs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PricingConfig {
    /// Current electricity price.
    pub current_price: f64,
    /// Saving mode engages strictly above this price.
    pub price_threshold: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            current_price: 0.15,
            price_threshold: 0.20,
        }
    }
}

/// Indoor temperature reading and desired range.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClimateConfig {
    /// Current indoor temperature.
    pub current_temperature: f64,
    /// Desired `[low, high]` range, both inclusive.
    pub desired_range: Vec<f64>,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            current_temperature: 22.0,
            desired_range: vec![20.0, 24.0],
        }
    }
}

/// Daily usage quota in abstract units.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuotaConfig {
    /// Shedding starts once usage reaches this value.
    pub energy_usage_limit: f64,
    /// Usage accumulated so far today.
    pub total_energy_used_today: f64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            energy_usage_limit: 40.0,
            total_energy_used_today: 10.0,
        }
    }
}

/// Evaluation instant.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClockConfig {
    /// Wall-clock time of the evaluation, e.g. `"2024-10-01T12:00:00"`.
    pub current_time: NaiveDateTime,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            current_time: timestamp(2024, 10, 1, 10, 0),
        }
    }
}

/// Policy tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// First hour of the night window (0-23).
    pub night_start_hour: u32,
    /// First hour after the night window (0-23).
    pub night_end_hour: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let night = NightWindow::default();
        Self {
            night_start_hour: night.start_hour,
            night_end_hour: night.end_hour,
        }
    }
}

/// Day replay parameters: synthetic price and temperature profiles.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplayConfig {
    /// Day being replayed; steps start at its midnight.
    pub date: NaiveDate,
    /// Evaluation cycles per day (must divide 86400).
    pub steps_per_day: usize,
    /// Random seed for profile noise.
    pub seed: u64,
    /// Mean price over the day.
    pub price_base: f64,
    /// Price swing; peaks in the early evening.
    pub price_amp: f64,
    /// Gaussian price noise standard deviation.
    pub price_noise_std: f64,
    /// Mean indoor temperature over the day.
    pub temperature_base: f64,
    /// Temperature swing; peaks mid-afternoon.
    pub temperature_amp: f64,
    /// Gaussian temperature noise standard deviation.
    pub temperature_noise_std: f64,
    /// Usage added per device left on, per step.
    pub unit_per_device_step: f64,
    /// Usage already accumulated at midnight.
    pub initial_energy_used: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            date: NaiveDate::from_ymd_opt(2024, 10, 1).unwrap_or_default(),
            steps_per_day: 24,
            seed: 42,
            price_base: 0.18,
            price_amp: 0.06,
            price_noise_std: 0.01,
            temperature_base: 21.0,
            temperature_amp: 4.0,
            temperature_noise_std: 0.3,
            unit_per_device_step: 0.5,
            initial_energy_used: 0.0,
        }
    }
}

/// One registered device.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Case-sensitive device name.
    pub name: String,
    /// Priority class; `1` is protected.
    pub priority: u32,
}

/// One scheduled activation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Device to switch on.
    pub device: String,
    /// Exact activation instant.
    pub at: NaiveDateTime,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"climate.desired_range"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Maps a snapshot field to its dotted config path.
fn section_path(field: &str) -> String {
    let section = match field {
        "current_price" | "price_threshold" => "pricing",
        "current_temperature" => "climate",
        "energy_usage_limit" | "total_energy_used_today" => "quota",
        _ => return field.to_string(),
    };
    format!("{section}.{field}")
}

impl From<PolicyError> for ConfigError {
    fn from(err: PolicyError) -> Self {
        let field = match &err {
            PolicyError::InvalidPriority { .. } => "devices".to_string(),
            PolicyError::InvalidComfortBand { .. } => "climate.desired_range".to_string(),
            PolicyError::NonFinite { field, .. } => section_path(field),
        };
        Self::new(field, err.to_string())
    }
}

fn timestamp(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .and_then(|date| date.and_hms_opt(h, mi, 0))
        .unwrap_or_default()
}

fn devices(pairs: &[(&str, u32)]) -> Vec<DeviceConfig> {
    pairs
        .iter()
        .map(|(name, priority)| DeviceConfig {
            name: (*name).to_string(),
            priority: *priority,
        })
        .collect()
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self::baseline()
    }
}

impl SnapshotConfig {
    /// Returns the baseline preset: ordinary daytime conditions, nothing triggers.
    pub fn baseline() -> Self {
        Self {
            pricing: PricingConfig::default(),
            climate: ClimateConfig::default(),
            quota: QuotaConfig::default(),
            clock: ClockConfig::default(),
            policy: PolicyConfig::default(),
            replay: ReplayConfig::default(),
            devices: devices(&[("Luzes", 2), ("Aquecimento", 1), ("TV", 3)]),
            schedules: vec![ScheduleConfig {
                device: "TV".to_string(),
                at: timestamp(2024, 10, 1, 18, 0),
            }],
        }
    }

    /// Returns the peak-price preset: saving mode with a due oven schedule.
    pub fn peak_price() -> Self {
        Self {
            pricing: PricingConfig {
                current_price: 0.25,
                ..PricingConfig::default()
            },
            quota: QuotaConfig {
                energy_usage_limit: 50.0,
                total_energy_used_today: 20.0,
            },
            clock: ClockConfig {
                current_time: timestamp(2024, 10, 1, 18, 0),
            },
            devices: devices(&[("Aquecimento", 1), ("Luzes", 2), ("Forno", 3)]),
            schedules: vec![ScheduleConfig {
                device: "Forno".to_string(),
                at: timestamp(2024, 10, 1, 18, 0),
            }],
            ..Self::baseline()
        }
    }

    /// Returns the night preset: only security and refrigeration stay on.
    pub fn night() -> Self {
        Self {
            pricing: PricingConfig {
                current_price: 0.10,
                ..PricingConfig::default()
            },
            quota: QuotaConfig {
                energy_usage_limit: 30.0,
                total_energy_used_today: 5.0,
            },
            clock: ClockConfig {
                current_time: timestamp(2024, 10, 1, 23, 30),
            },
            devices: devices(&[("Security", 1), ("Refrigerator", 1), ("Luzes", 2)]),
            schedules: Vec::new(),
            ..Self::baseline()
        }
    }

    /// Returns the over-quota preset: usage three units above the limit.
    pub fn over_quota() -> Self {
        Self {
            quota: QuotaConfig {
                energy_usage_limit: 30.0,
                total_energy_used_today: 33.0,
            },
            clock: ClockConfig {
                current_time: timestamp(2024, 10, 1, 12, 0),
            },
            devices: devices(&[
                ("Device1", 2),
                ("Device2", 3),
                ("Device3", 4),
                ("Priority1", 1),
            ]),
            schedules: Vec::new(),
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "peak_price", "night", "over_quota"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "peak_price" => Ok(Self::peak_price()),
            "night" => Ok(Self::night()),
            "over_quota" => Ok(Self::over_quota()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("snapshot", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// Sections left out keep their defaults; an absent `devices` list means
    /// an empty registry.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// The policy described by the `[policy]` section.
    pub fn energy_policy(&self) -> EnergyPolicy {
        EnergyPolicy::new(NightWindow {
            start_hour: self.policy.night_start_hour,
            end_hour: self.policy.night_end_hour,
        })
    }

    /// Builds the device registry in declaration order.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a priority class is `0`.
    pub fn registry(&self) -> Result<DeviceRegistry, ConfigError> {
        DeviceRegistry::from_classes(self.devices.iter().map(|d| (d.name.as_str(), d.priority)))
            .map_err(ConfigError::from)
    }

    /// Builds the comfort band from `climate.desired_range`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` unless the range has exactly two finite,
    /// ordered bounds.
    pub fn comfort_band(&self) -> Result<ComfortBand, ConfigError> {
        match self.climate.desired_range.as_slice() {
            [low, high] => ComfortBand::new(*low, *high).map_err(ConfigError::from),
            other => Err(ConfigError::new(
                "climate.desired_range",
                format!("must have exactly 2 elements, got {}", other.len()),
            )),
        }
    }

    /// Scheduled activations in declaration order.
    pub fn activations(&self) -> Vec<ScheduledActivation> {
        self.schedules
            .iter()
            .map(|s| ScheduledActivation::new(s.device.clone(), s.at))
            .collect()
    }

    /// Assembles the evaluation snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first malformed input as a `ConfigError`.
    pub fn build_snapshot(&self) -> Result<Snapshot, ConfigError> {
        let snapshot = Snapshot {
            current_price: self.pricing.current_price,
            price_threshold: self.pricing.price_threshold,
            devices: self.registry()?,
            current_time: self.clock.current_time,
            current_temperature: self.climate.current_temperature,
            comfort_band: self.comfort_band()?,
            energy_usage_limit: self.quota.energy_usage_limit,
            total_energy_used_today: self.quota.total_energy_used_today,
            schedules: self.activations(),
        };
        snapshot.check_finite()?;
        Ok(snapshot)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let finite = [
            ("pricing.current_price", self.pricing.current_price),
            ("pricing.price_threshold", self.pricing.price_threshold),
            ("climate.current_temperature", self.climate.current_temperature),
            ("quota.energy_usage_limit", self.quota.energy_usage_limit),
            ("quota.total_energy_used_today", self.quota.total_energy_used_today),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                errors.push(ConfigError::new(field, "must be a finite number"));
            }
        }

        if let Err(e) = self.comfort_band() {
            errors.push(e);
        }

        let mut seen = HashSet::new();
        for (i, d) in self.devices.iter().enumerate() {
            if d.name.is_empty() {
                errors.push(ConfigError::new(format!("devices[{i}].name"), "must not be empty"));
            }
            if d.priority == 0 {
                errors.push(ConfigError::new(
                    format!("devices[{i}].priority"),
                    "must be >= 1 (1 = protected)",
                ));
            }
            if !seen.insert(d.name.as_str()) {
                errors.push(ConfigError::new(
                    format!("devices[{i}].name"),
                    format!("duplicate device \"{}\"", d.name),
                ));
            }
        }

        for (i, s) in self.schedules.iter().enumerate() {
            if s.device.is_empty() {
                errors.push(ConfigError::new(
                    format!("schedules[{i}].device"),
                    "must not be empty",
                ));
            }
        }

        let p = &self.policy;
        if p.night_start_hour > 23 {
            errors.push(ConfigError::new("policy.night_start_hour", "must be in 0..=23"));
        }
        if p.night_end_hour > 23 {
            errors.push(ConfigError::new("policy.night_end_hour", "must be in 0..=23"));
        }

        let r = &self.replay;
        if r.steps_per_day == 0 || SECONDS_PER_DAY % r.steps_per_day != 0 {
            errors.push(ConfigError::new(
                "replay.steps_per_day",
                "must be > 0 and divide 86400",
            ));
        }
        let non_negative = [
            ("replay.price_noise_std", r.price_noise_std),
            ("replay.temperature_noise_std", r.temperature_noise_std),
            ("replay.unit_per_device_step", r.unit_per_device_step),
            ("replay.initial_energy_used", r.initial_energy_used),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                errors.push(ConfigError::new(field, "must be finite and >= 0"));
            }
        }
        let profile = [
            ("replay.price_base", r.price_base),
            ("replay.price_amp", r.price_amp),
            ("replay.temperature_base", r.temperature_base),
            ("replay.temperature_amp", r.temperature_amp),
        ];
        for (field, value) in profile {
            if !value.is_finite() {
                errors.push(ConfigError::new(field, "must be a finite number"));
            }
        }

        errors
    }
}
