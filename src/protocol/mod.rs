//! # Antenna System Protocol Module
//!
//! Command and reply definitions for the ISIS antenna deployment system
//! (manual ISIS.ANTS.DS.001).
//!
//! This module handles:
//! - Opcode table and command-to-opcode dispatch
//! - Deployment status register decoding
//! - Temperature sensor calibration (LM94022, GS=10)

pub mod opcodes;
pub mod status;
pub mod calibration;
