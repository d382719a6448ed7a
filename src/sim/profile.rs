use std::f64::consts::PI;

use rand::{Rng, SeedableRng, rngs::StdRng};

/// A sinusoidal daily signal with Gaussian noise.
///
/// Used by the replay to synthesize the price feed and the indoor
/// temperature sensor that a real deployment would read.
///
/// # Examples
///
/// ```
/// use home_energy_policy::sim::profile::DailyProfile;
///
/// // Flat, noiseless signal
/// let mut price = DailyProfile::new(0.2, 0.0, 0.0, 0.0, 24, 42);
/// assert_eq!(price.value_at(12), 0.2);
/// ```
#[derive(Debug, Clone)]
pub struct DailyProfile {
    /// Mean value over the day
    pub base: f64,

    /// Amplitude of the daily swing
    pub amp: f64,

    /// Phase offset in radians
    pub phase_rad: f64,

    /// Standard deviation of the Gaussian noise
    pub noise_std: f64,

    /// Number of steps per day
    pub steps_per_day: usize,

    rng: StdRng,
}

impl DailyProfile {
    /// Phase placing the price peak at 18:00.
    pub const EVENING_PEAK: f64 = -PI;
    /// Phase placing the temperature peak at 15:00.
    pub const AFTERNOON_PEAK: f64 = -0.75 * PI;

    pub fn new(
        base: f64,
        amp: f64,
        phase_rad: f64,
        noise_std: f64,
        steps_per_day: usize,
        seed: u64,
    ) -> Self {
        Self {
            base,
            amp,
            phase_rad,
            noise_std,
            steps_per_day: steps_per_day.max(1),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Signal value at `step`; consumes one noise draw per call.
    pub fn value_at(&mut self, step: usize) -> f64 {
        let day_pos = (step % self.steps_per_day) as f64 / self.steps_per_day as f64;
        let angle = 2.0 * PI * day_pos + self.phase_rad;
        let noise = gaussian_noise(&mut self.rng, self.noise_std);
        self.base + self.amp * angle.sin() + noise
    }
}

/// Gaussian noise via the Box-Muller transform.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    z0 * std_dev
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evening_peak_is_at_eighteen() {
        let mut profile = DailyProfile::new(0.2, 0.1, DailyProfile::EVENING_PEAK, 0.0, 24, 1);
        let values: Vec<f64> = (0..24).map(|t| profile.value_at(t)).collect();
        let peak = values
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(peak, Some(18));
    }

    #[test]
    fn same_seed_same_values() {
        let mut a = DailyProfile::new(21.0, 3.0, 0.0, 0.5, 24, 7);
        let mut b = DailyProfile::new(21.0, 3.0, 0.0, 0.5, 24, 7);
        for t in 0..24 {
            assert_eq!(a.value_at(t), b.value_at(t));
        }
    }

    #[test]
    fn zero_noise_is_zero() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(gaussian_noise(&mut rng, 0.0), 0.0);
    }
}
