//! # ANTS Driver Library
//!
//! Command and telemetry driver for the ISIS dual-redundant antenna
//! deployment system.
//!
//! This library translates high-level intents (arm, deploy antenna N, report
//! status) into the device's opcode transactions and decodes its register
//! replies into typed values (deployment state, temperature in °C).

pub mod config;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod controller;
pub mod telemetry;
