//! Decision aggregator: runs the rules in their fixed order.

use serde::Serialize;
use tracing::{debug, trace};

use super::rules::{self, NightWindow};
use super::types::{EvaluationResult, Snapshot};

/// Stateless energy policy.
///
/// Every call to [`EnergyPolicy::evaluate`] rebuilds the decision table
/// from its snapshot; nothing is retained between calls.
///
/// Rule order per cycle:
/// 1. all registered devices on, `Heating`/`Cooling` off
/// 2. temperature regulation
/// 3. night window, or else price saving followed by quota shedding
///    (the saving flag is reported in both cases)
/// 4. scheduled activations
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use home_energy_policy::policy::{ComfortBand, DeviceRegistry, EnergyPolicy, Snapshot};
///
/// let snapshot = Snapshot {
///     current_price: 0.25,
///     price_threshold: 0.20,
///     devices: DeviceRegistry::from_classes([("Aquecimento", 1), ("Luzes", 2)]).unwrap(),
///     current_time: NaiveDate::from_ymd_opt(2024, 10, 1)
///         .unwrap()
///         .and_hms_opt(14, 0, 0)
///         .unwrap(),
///     current_temperature: 22.0,
///     comfort_band: ComfortBand::new(20.0, 24.0).unwrap(),
///     energy_usage_limit: 50.0,
///     total_energy_used_today: 20.0,
///     schedules: Vec::new(),
/// };
///
/// let result = EnergyPolicy::default().evaluate(&snapshot);
/// assert!(result.energy_saving_mode);
/// assert_eq!(result.device_status.get("Aquecimento"), Some(true));
/// assert_eq!(result.device_status.get("Luzes"), Some(false));
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnergyPolicy {
    /// Hours during which only night-exempt devices run.
    pub night_window: NightWindow,
}

impl EnergyPolicy {
    pub fn new(night_window: NightWindow) -> Self {
        Self { night_window }
    }

    /// Computes device decisions and mode flags for one snapshot.
    pub fn evaluate(&self, snapshot: &Snapshot) -> EvaluationResult {
        let mut table = rules::initialize(&snapshot.devices);
        trace!(devices = table.len(), "decision table initialized");

        let regulating = rules::regulate_temperature(
            &mut table,
            snapshot.current_temperature,
            &snapshot.comfort_band,
        );

        let night = self.night_window.contains(snapshot.current_time);
        let (saving, usage) = if night {
            rules::apply_night_window(&mut table, &snapshot.devices);
            (
                rules::saving_mode(snapshot.current_price, snapshot.price_threshold),
                snapshot.total_energy_used_today,
            )
        } else {
            let saving = rules::apply_price_saving(
                &mut table,
                &snapshot.devices,
                snapshot.current_price,
                snapshot.price_threshold,
            );
            let usage = rules::apply_quota(
                &mut table,
                &snapshot.devices,
                snapshot.total_energy_used_today,
                snapshot.energy_usage_limit,
            );
            (saving, usage)
        };

        rules::apply_schedules(&mut table, &snapshot.schedules, snapshot.current_time);

        debug!(
            time = %snapshot.current_time,
            night,
            saving,
            regulating,
            usage,
            on = table.count_on(),
            "evaluation complete"
        );

        EvaluationResult {
            device_status: table,
            energy_saving_mode: saving,
            temperature_regulation_active: regulating,
            night_mode: night,
            total_energy_used: usage,
        }
    }
}
