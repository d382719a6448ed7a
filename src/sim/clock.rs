use chrono::{NaiveDateTime, TimeDelta};

/// A replay clock that yields evaluation instants at a fixed cadence.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, TimeDelta};
/// use home_energy_policy::sim::clock::Clock;
///
/// let start = NaiveDate::from_ymd_opt(2024, 10, 1)
///     .unwrap()
///     .and_hms_opt(0, 0, 0)
///     .unwrap();
/// let mut clock = Clock::new(start, TimeDelta::hours(1), 3);
/// let mut hours = Vec::new();
///
/// clock.run(|_, now| hours.push(now.format("%H").to_string()));
/// assert_eq!(hours, vec!["00", "01", "02"]);
/// ```
pub struct Clock {
    /// Instant of step 0
    start: NaiveDateTime,
    /// Time between consecutive steps
    step: TimeDelta,
    /// Next step to hand out
    current: usize,
    /// Total steps to run
    total: usize,
}

impl Clock {
    /// Creates a clock of `total` steps starting at `start`.
    pub fn new(start: NaiveDateTime, step: TimeDelta, total: usize) -> Self {
        Self {
            start,
            step,
            current: 0,
            total,
        }
    }

    /// Instant of the given step index.
    pub fn instant_at(&self, index: usize) -> NaiveDateTime {
        self.start + self.step * index as i32
    }

    /// Advances the clock by one step.
    ///
    /// # Returns
    ///
    /// * `Some((step, instant))` - The step index and its instant before advancing
    /// * `None` - If the clock has reached its total steps
    pub fn tick(&mut self) -> Option<(usize, NaiveDateTime)> {
        if self.current < self.total {
            let step = self.current;
            self.current += 1;
            Some((step, self.instant_at(step)))
        } else {
            None
        }
    }

    /// Runs a function for each remaining step.
    pub fn run(&mut self, mut f: impl FnMut(usize, NaiveDateTime)) {
        while let Some((step, now)) = self.tick() {
            f(step, now);
        }
    }
}
