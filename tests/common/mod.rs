//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};

use home_energy_policy::policy::{
    ComfortBand, DeviceRegistry, EnergyPolicy, EvaluationResult, ScheduledActivation, Snapshot,
};

/// Timestamp on the fixture day (2024-10-01).
pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 10, 1)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .expect("valid timestamp")
}

/// Registry from `(name, class)` pairs in the given order.
pub fn registry(pairs: &[(&str, u32)]) -> DeviceRegistry {
    DeviceRegistry::from_classes(pairs.iter().copied()).expect("valid registry")
}

/// Ordinary daytime snapshot: price 0.15/0.20, 22.0 in [20, 24],
/// usage 10 of 40, 10:00, no schedules.
pub fn daytime(pairs: &[(&str, u32)]) -> Snapshot {
    Snapshot {
        current_price: 0.15,
        price_threshold: 0.20,
        devices: registry(pairs),
        current_time: at(10, 0),
        current_temperature: 22.0,
        comfort_band: ComfortBand::new(20.0, 24.0).expect("valid band"),
        energy_usage_limit: 40.0,
        total_energy_used_today: 10.0,
        schedules: Vec::new(),
    }
}

pub fn schedule(device: &str, hour: u32, minute: u32) -> ScheduledActivation {
    ScheduledActivation::new(device, at(hour, minute))
}

/// Evaluates with the default policy.
pub fn evaluate(snapshot: &Snapshot) -> EvaluationResult {
    EnergyPolicy::default().evaluate(snapshot)
}
