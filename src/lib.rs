//! Switchboard - self-tuning task router
//!
//! Classifies incoming requests, routes each to the best-suited inference
//! worker, records every decision and its later outcome, and periodically
//! adjusts the routing policy from observed performance.

pub mod api;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod optimizer;
pub mod persistence;
pub mod registry;
pub mod routing;
pub mod telemetry;
