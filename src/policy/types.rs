//! Core policy types: device registry, schedules, snapshot and decision records.

use std::fmt;

use chrono::NaiveDateTime;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::error::PolicyError;

/// Name of the heating regulation device.
pub const HEATING: &str = "Heating";
/// Name of the cooling regulation device.
pub const COOLING: &str = "Cooling";
/// Devices kept running through the night window.
pub const NIGHT_EXEMPT: [&str; 2] = ["Security", "Refrigerator"];

/// Returns `true` for the devices owned by temperature regulation.
pub fn is_regulation_device(name: &str) -> bool {
    name == HEATING || name == COOLING
}

/// Importance of a device when economic rules shed load.
///
/// Class `1` is protected; any higher class is sheddable. The rank of a
/// sheddable device is kept for reporting only and never orders shedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Never shed by the price or quota rules.
    Protected,
    /// May be shed; carries the original class (always >= 2).
    Sheddable(u32),
}

impl Priority {
    /// Maps a raw priority class to a `Priority`.
    ///
    /// Returns `None` for class `0`, which has no meaning.
    pub fn from_class(class: u32) -> Option<Self> {
        match class {
            0 => None,
            1 => Some(Self::Protected),
            n => Some(Self::Sheddable(n)),
        }
    }

    /// The raw priority class this value was built from.
    pub fn class(self) -> u32 {
        match self {
            Self::Protected => 1,
            Self::Sheddable(n) => n,
        }
    }

    pub fn is_protected(self) -> bool {
        matches!(self, Self::Protected)
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.class())
    }
}

/// Order-preserving mapping of device name to priority.
///
/// Insertion order is the shedding order used by the quota rule.
///
/// # Examples
///
/// ```
/// use home_energy_policy::policy::{DeviceRegistry, Priority};
///
/// let mut registry = DeviceRegistry::new();
/// registry.insert("Luzes", Priority::Sheddable(2));
/// registry.insert("Aquecimento", Priority::Protected);
///
/// let names: Vec<&str> = registry.sheddable().collect();
/// assert_eq!(names, vec!["Luzes"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceRegistry {
    entries: Vec<(String, Priority)>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from raw `(name, class)` pairs, rejecting class `0`.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::InvalidPriority` for the first pair with class `0`.
    pub fn from_classes<I, S>(pairs: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for (name, class) in pairs {
            let name = name.into();
            let priority = Priority::from_class(class).ok_or_else(|| {
                PolicyError::InvalidPriority {
                    device: name.clone(),
                    class,
                }
            })?;
            registry.insert(name, priority);
        }
        Ok(registry)
    }

    /// Adds a device, or replaces the priority of an existing one in place.
    pub fn insert(&mut self, name: impl Into<String>, priority: Priority) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = priority,
            None => self.entries.push((name, priority)),
        }
    }

    pub fn get(&self, name: &str) -> Option<Priority> {
        self.entries
            .iter()
            .find_map(|(n, p)| if n == name { Some(*p) } else { None })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, priority)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Priority)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), *p))
    }

    /// Names of sheddable devices in insertion order.
    pub fn sheddable(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, p)| !p.is_protected())
            .map(|(n, _)| n)
    }
}

/// A device the caller wants switched on at an exact instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledActivation {
    device: String,
    at: NaiveDateTime,
}

impl ScheduledActivation {
    pub fn new(device: impl Into<String>, at: NaiveDateTime) -> Self {
        Self {
            device: device.into(),
            at,
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn at(&self) -> NaiveDateTime {
        self.at
    }

    /// Returns `true` when the activation instant equals `now` exactly.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.at == now
    }
}

impl fmt::Display for ScheduledActivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ScheduledActivation(device_name='{}', scheduled_time='{}')",
            self.device, self.at
        )
    }
}

/// What the climate devices should do for a given temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermalDemand {
    Heat,
    Cool,
    Comfortable,
}

/// Desired indoor temperature range, both bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComfortBand {
    low: f64,
    high: f64,
}

impl ComfortBand {
    /// Creates a band from `[low, high]`.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::InvalidComfortBand` if a bound is not finite or
    /// `low > high`.
    pub fn new(low: f64, high: f64) -> Result<Self, PolicyError> {
        if !low.is_finite() || !high.is_finite() || low > high {
            return Err(PolicyError::InvalidComfortBand { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    /// Classifies a temperature reading against the band.
    pub fn demand(&self, temperature: f64) -> ThermalDemand {
        if temperature < self.low {
            ThermalDemand::Heat
        } else if temperature > self.high {
            ThermalDemand::Cool
        } else {
            ThermalDemand::Comfortable
        }
    }
}

/// Everything the engine needs for one evaluation cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Current electricity price.
    pub current_price: f64,
    /// Price above which saving mode engages.
    pub price_threshold: f64,
    /// Known devices with their priorities, in shedding order.
    pub devices: DeviceRegistry,
    /// Evaluation instant.
    pub current_time: NaiveDateTime,
    /// Indoor temperature reading.
    pub current_temperature: f64,
    /// Desired temperature range.
    pub comfort_band: ComfortBand,
    /// Daily usage quota (abstract units).
    pub energy_usage_limit: f64,
    /// Usage accumulated so far today (abstract units).
    pub total_energy_used_today: f64,
    /// Pending scheduled activations.
    pub schedules: Vec<ScheduledActivation>,
}

impl Snapshot {
    /// Checks that every numeric input is finite.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::NonFinite` naming the first offending field.
    pub fn check_finite(&self) -> Result<(), PolicyError> {
        let fields = [
            ("current_price", self.current_price),
            ("price_threshold", self.price_threshold),
            ("current_temperature", self.current_temperature),
            ("energy_usage_limit", self.energy_usage_limit),
            ("total_energy_used_today", self.total_energy_used_today),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(PolicyError::NonFinite { field, value });
            }
        }
        Ok(())
    }
}

/// Per-device on/off decisions, kept in first-write order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionTable {
    entries: Vec<(String, bool)>,
}

impl DecisionTable {
    /// Sets a device's status, adding it if unknown.
    pub fn set(&mut self, name: &str, on: bool) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = on,
            None => self.entries.push((name.to_string(), on)),
        }
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.entries
            .iter()
            .find_map(|(n, on)| if n == name { Some(*on) } else { None })
    }

    /// Returns `true` only for devices present and switched on.
    pub fn is_on(&self, name: &str) -> bool {
        self.get(name).unwrap_or(false)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_on(&self) -> usize {
        self.entries.iter().filter(|(_, on)| *on).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(n, on)| (n.as_str(), *on))
    }
}

impl Serialize for DecisionTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, on) in &self.entries {
            map.serialize_entry(name, on)?;
        }
        map.end()
    }
}

/// Outcome of one evaluation cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    /// Final on/off decision per device.
    pub device_status: DecisionTable,
    /// `true` when the price exceeded the threshold.
    pub energy_saving_mode: bool,
    /// `true` when heating or cooling was requested.
    pub temperature_regulation_active: bool,
    /// `true` when the night window governed device state.
    pub night_mode: bool,
    /// Usage after quota shedding (abstract units).
    pub total_energy_used: f64,
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "saving={} regulation={} night={} usage={:.2}",
            self.energy_saving_mode,
            self.temperature_regulation_active,
            self.night_mode,
            self.total_energy_used,
        )?;
        for (name, on) in self.device_status.iter() {
            writeln!(f, "  {name:<16} {}", if on { "on" } else { "off" })?;
        }
        Ok(())
    }
}
