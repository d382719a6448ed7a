/// Replay clock yielding evaluation instants.
pub mod clock;
pub mod kpi;
/// Synthetic daily price and temperature signals.
pub mod profile;
pub mod replay;
pub mod types;
