//! Individual policy rules. Each one edits the shared decision table.

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;
use tracing::debug;

use super::types::{
    COOLING, ComfortBand, DecisionTable, DeviceRegistry, HEATING, NIGHT_EXEMPT,
    ScheduledActivation, ThermalDemand, is_regulation_device,
};

/// Hours during which only night-exempt devices stay on.
///
/// The window covers `[start_hour, end_hour)` and wraps midnight when
/// `start_hour > end_hour`.
///
/// # Examples
///
/// ```
/// use home_energy_policy::policy::NightWindow;
///
/// let night = NightWindow::default();
/// assert!(night.contains_hour(23));
/// assert!(night.contains_hour(5));
/// assert!(!night.contains_hour(6));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NightWindow {
    /// First hour inside the window.
    pub start_hour: u32,
    /// First hour after the window.
    pub end_hour: u32,
}

impl Default for NightWindow {
    fn default() -> Self {
        Self {
            start_hour: 23,
            end_hour: 6,
        }
    }
}

impl NightWindow {
    pub fn contains_hour(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.contains_hour(instant.hour())
    }
}

/// Switches every registry device on, and both regulation devices off.
pub fn initialize(devices: &DeviceRegistry) -> DecisionTable {
    let mut table = DecisionTable::default();
    for (name, _) in devices.iter() {
        table.set(name, true);
    }
    table.set(HEATING, false);
    table.set(COOLING, false);
    table
}

/// Drives heating/cooling from the comfort band. Returns whether either runs.
pub fn regulate_temperature(
    table: &mut DecisionTable,
    temperature: f64,
    band: &ComfortBand,
) -> bool {
    let demand = band.demand(temperature);
    debug!(temperature, low = band.low(), high = band.high(), ?demand, "temperature rule");
    match demand {
        ThermalDemand::Heat => {
            table.set(HEATING, true);
            true
        }
        ThermalDemand::Cool => {
            table.set(COOLING, true);
            true
        }
        ThermalDemand::Comfortable => {
            table.set(HEATING, false);
            table.set(COOLING, false);
            false
        }
    }
}

/// Leaves only night-exempt registry devices running.
pub fn apply_night_window(table: &mut DecisionTable, devices: &DeviceRegistry) {
    for (name, _) in devices.iter() {
        if is_regulation_device(name) {
            continue;
        }
        let on = NIGHT_EXEMPT.contains(&name);
        table.set(name, on);
    }
    debug!("night window applied");
}

/// Saving mode is active when the price is strictly above threshold.
pub fn saving_mode(price: f64, threshold: f64) -> bool {
    price > threshold
}

/// Turns sheddable devices off when the price is strictly above threshold.
/// Returns whether saving mode is active.
pub fn apply_price_saving(
    table: &mut DecisionTable,
    devices: &DeviceRegistry,
    price: f64,
    threshold: f64,
) -> bool {
    let saving = saving_mode(price, threshold);
    if saving {
        for name in devices.sheddable().filter(|n| !is_regulation_device(n)) {
            debug!(device = name, price, threshold, "shed by price");
            table.set(name, false);
        }
    }
    saving
}

/// Sheds sheddable devices in registry order, one unit each, until usage
/// drops below the limit. Returns the remaining usage.
///
/// The limit check runs before each candidate, so a device is never shed
/// once usage is already below the limit. A sheddable `Heating`/`Cooling`
/// entry still counts as a candidate and costs its unit, but its status
/// stays with the temperature rule.
pub fn apply_quota(
    table: &mut DecisionTable,
    devices: &DeviceRegistry,
    used_today: f64,
    limit: f64,
) -> f64 {
    let mut usage = used_today;
    if usage < limit {
        return usage;
    }
    for name in devices.sheddable() {
        if usage < limit {
            break;
        }
        if !is_regulation_device(name) {
            table.set(name, false);
        }
        usage -= 1.0;
        debug!(device = name, usage, limit, "shed by quota");
    }
    usage
}

/// Forces on every device whose activation is due at `now`.
pub fn apply_schedules(
    table: &mut DecisionTable,
    schedules: &[ScheduledActivation],
    now: NaiveDateTime,
) {
    for activation in schedules.iter().filter(|s| s.is_due(now)) {
        debug!(%activation, "scheduled activation");
        table.set(activation.device(), true);
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::policy::types::Priority;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 10, 1)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .expect("valid timestamp")
    }

    fn registry(pairs: &[(&str, u32)]) -> DeviceRegistry {
        DeviceRegistry::from_classes(pairs.iter().copied()).expect("valid registry")
    }

    #[test]
    fn night_window_boundaries() {
        let night = NightWindow::default();
        assert!(night.contains(at(23, 0)));
        assert!(night.contains(at(0, 0)));
        assert!(night.contains(at(5, 59)));
        assert!(!night.contains(at(6, 0)));
        assert!(!night.contains(at(22, 59)));
    }

    #[test]
    fn non_wrapping_window() {
        let window = NightWindow {
            start_hour: 1,
            end_hour: 4,
        };
        assert!(!window.contains_hour(0));
        assert!(window.contains_hour(1));
        assert!(window.contains_hour(3));
        assert!(!window.contains_hour(4));
    }

    #[test]
    fn initialize_adds_regulation_devices_off() {
        let devices = registry(&[("Luzes", 2)]);
        let table = initialize(&devices);
        assert_eq!(table.get("Luzes"), Some(true));
        assert_eq!(table.get(HEATING), Some(false));
        assert_eq!(table.get(COOLING), Some(false));
    }

    #[test]
    fn initialize_turns_registered_regulation_devices_off() {
        let devices = registry(&[("Heating", 1), ("Cooling", 1)]);
        let table = initialize(&devices);
        assert_eq!(table.get(HEATING), Some(false));
        assert_eq!(table.get(COOLING), Some(false));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn night_ignores_priority() {
        let devices = registry(&[("Security", 3), ("Luzes", 1), ("Refrigerator", 2)]);
        let mut table = initialize(&devices);
        apply_night_window(&mut table, &devices);
        assert!(table.is_on("Security"));
        assert!(table.is_on("Refrigerator"));
        assert!(!table.is_on("Luzes"));
    }

    #[test]
    fn price_equal_to_threshold_is_not_saving() {
        let devices = registry(&[("Luzes", 2)]);
        let mut table = initialize(&devices);
        assert!(!apply_price_saving(&mut table, &devices, 0.20, 0.20));
        assert!(table.is_on("Luzes"));
    }

    #[test]
    fn price_keeps_protected_devices() {
        let devices = registry(&[("Aquecimento", 1), ("Luzes", 2), ("TV", 9)]);
        let mut table = initialize(&devices);
        assert!(apply_price_saving(&mut table, &devices, 0.25, 0.20));
        assert!(table.is_on("Aquecimento"));
        assert!(!table.is_on("Luzes"));
        assert!(!table.is_on("TV"));
    }

    #[test]
    fn quota_below_limit_is_noop() {
        let devices = registry(&[("Luzes", 2)]);
        let mut table = initialize(&devices);
        let usage = apply_quota(&mut table, &devices, 29.0, 30.0);
        assert_eq!(usage, 29.0);
        assert!(table.is_on("Luzes"));
    }

    #[test]
    fn quota_at_limit_sheds_one() {
        let devices = registry(&[("Aquecimento", 1), ("Luzes", 2), ("TV", 3)]);
        let mut table = initialize(&devices);
        let usage = apply_quota(&mut table, &devices, 30.0, 30.0);
        assert_eq!(usage, 29.0);
        assert!(table.is_on("Aquecimento"));
        assert!(!table.is_on("Luzes"));
        assert!(table.is_on("TV"));
    }

    #[test]
    fn quota_runs_out_of_candidates() {
        let devices = registry(&[("A", 2), ("B", 1)]);
        let mut table = initialize(&devices);
        let usage = apply_quota(&mut table, &devices, 40.0, 30.0);
        assert_eq!(usage, 39.0);
        assert!(!table.is_on("A"));
        assert!(table.is_on("B"));
    }

    #[test]
    fn quota_counts_regulation_devices_without_switching_them() {
        let mut devices = DeviceRegistry::new();
        devices.insert("Heating", Priority::Sheddable(2));
        devices.insert("Luzes", Priority::Sheddable(2));
        let mut table = initialize(&devices);
        regulate_temperature(
            &mut table,
            10.0,
            &ComfortBand::new(20.0, 24.0).expect("valid band"),
        );
        let usage = apply_quota(&mut table, &devices, 30.0, 30.0);
        assert_eq!(usage, 29.0);
        assert!(table.is_on("Heating"));
        assert!(table.is_on("Luzes"));
    }

    #[test]
    fn quota_charges_devices_already_shed_by_price() {
        let devices = registry(&[("Aquecimento", 1), ("Luzes", 2), ("TV", 3)]);
        let mut table = initialize(&devices);
        assert!(apply_price_saving(&mut table, &devices, 0.30, 0.20));
        let usage = apply_quota(&mut table, &devices, 31.0, 30.0);
        assert_eq!(usage, 29.0);
        assert!(table.is_on("Aquecimento"));
        assert!(!table.is_on("Luzes"));
        assert!(!table.is_on("TV"));
    }

    #[test]
    fn saving_mode_is_strict() {
        assert!(saving_mode(0.21, 0.20));
        assert!(!saving_mode(0.20, 0.20));
    }

    #[test]
    fn schedules_need_exact_match() {
        let devices = registry(&[("Forno", 3)]);
        let mut table = initialize(&devices);
        table.set("Forno", false);
        let schedules = vec![
            ScheduledActivation::new("Forno", at(18, 1)),
            ScheduledActivation::new("Lava", at(18, 0)),
        ];
        apply_schedules(&mut table, &schedules, at(18, 0));
        assert!(!table.is_on("Forno"));
        assert!(table.is_on("Lava"));
    }
}
