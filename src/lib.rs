//! Traffic Flow Simulation Library
//!
//! A deterministic road-network traffic simulator: a per-tick engine, the
//! statistics it records, and read-only exporters for those statistics.

pub mod export;
pub mod simulation;
