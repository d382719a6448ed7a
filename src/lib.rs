//! Stateless smart-home energy policy engine.

pub mod config;
pub mod io;
pub mod logging;
/// Device decision rules and their aggregator.
pub mod policy;
/// Day replay harness driving the policy.
pub mod sim;

#[cfg(feature = "api")]
pub mod api;
