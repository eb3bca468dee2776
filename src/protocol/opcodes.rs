//! # Opcode Table and Command Dispatch
//!
//! Command codes from the antenna system manual (pp. 93) and the mapping from
//! logical commands to those codes. The byte values are fixed by the device
//! firmware and must never be renumbered.

use serde::Serialize;

use crate::error::{AntsError, Result};

/// Performs a reset of the microcontroller
pub const RESET: u8 = 0b1010_1010;

/// Arms the antenna system (required before any deployment)
pub const ARM: u8 = 0b1010_1101;

/// Disarms the antenna system, deactivating any active deployment system
/// and terminating an ongoing automated sequential deployment
pub const DISARM: u8 = 0b1010_1100;

/// Deploy antenna 1..4 through its deployment system
pub const DEPLOY_ANT_1: u8 = 0b1010_0001;
pub const DEPLOY_ANT_2: u8 = 0b1010_0010;
pub const DEPLOY_ANT_3: u8 = 0b1010_0011;
pub const DEPLOY_ANT_4: u8 = 0b1010_0100;

/// Start automated sequential antenna deployment
pub const AUTO_DEPLOY_ALL: u8 = 0b1010_0101;

/// Deploy antenna 1..4 with override (ignores the deployment switch)
pub const OVERRIDE_ANT_1: u8 = 0b1011_1010;
pub const OVERRIDE_ANT_2: u8 = 0b1011_1011;
pub const OVERRIDE_ANT_3: u8 = 0b1011_1100;
pub const OVERRIDE_ANT_4: u8 = 0b1011_1101;

/// Deactivate active deployment systems and terminate sequential deployment
pub const CANCEL_ACTIVATION: u8 = 0b1010_1001;

/// Measure antenna system temperature (two-byte reply)
pub const MEASURE_TEMPERATURE: u8 = 0b1100_0000;

/// Report deployment status (two-byte reply)
pub const REPORT_DEPLOY_STATUS: u8 = 0b1100_0011;

/// Report deployment count of antenna 1..4 (one-byte reply)
pub const REPORT_DEPLOY_CNT_ANT_1: u8 = 0b1011_0000;
pub const REPORT_DEPLOY_CNT_ANT_2: u8 = 0b1011_0001;
pub const REPORT_DEPLOY_CNT_ANT_3: u8 = 0b1011_0010;
pub const REPORT_DEPLOY_CNT_ANT_4: u8 = 0b1011_0011;

/// Report deployment system activation time of antenna 1..4 (two-byte reply)
pub const REPORT_DEPLOY_TIME_ANT_1: u8 = 0b1011_0100;
pub const REPORT_DEPLOY_TIME_ANT_2: u8 = 0b1011_0101;
pub const REPORT_DEPLOY_TIME_ANT_3: u8 = 0b1011_0110;
pub const REPORT_DEPLOY_TIME_ANT_4: u8 = 0b1011_0111;

/// I2C address of microcontroller 0 (see Antenna System Option Sheet)
pub const PRIMARY_ADDRESS: u8 = 0x31;

/// I2C address of microcontroller 1 (see Antenna System Option Sheet)
pub const SECONDARY_ADDRESS: u8 = 0x32;

/// Number of antennas on the deployment system
pub const ANTENNA_COUNT: u8 = 4;

/// One of the two redundant microcontrollers of the antenna system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Microcontroller {
    Primary,
    Secondary,
}

impl Microcontroller {
    /// The other microcontroller
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Primary => Self::Secondary,
            Self::Secondary => Self::Primary,
        }
    }

    /// Index as used in the manual (0 = primary, 1 = secondary)
    #[must_use]
    pub fn index(self) -> u8 {
        match self {
            Self::Primary => 0,
            Self::Secondary => 1,
        }
    }
}

impl TryFrom<u8> for Microcontroller {
    type Error = AntsError;

    fn try_from(index: u8) -> Result<Self> {
        match index {
            0 => Ok(Self::Primary),
            1 => Ok(Self::Secondary),
            other => Err(AntsError::InvalidSelector(other)),
        }
    }
}

/// Bus addresses of the two redundant microcontrollers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceAddresses {
    pub primary: u8,
    pub secondary: u8,
}

impl Default for DeviceAddresses {
    fn default() -> Self {
        Self {
            primary: PRIMARY_ADDRESS,
            secondary: SECONDARY_ADDRESS,
        }
    }
}

impl DeviceAddresses {
    /// Address owned by the given microcontroller
    #[must_use]
    pub fn address_of(&self, microcontroller: Microcontroller) -> u8 {
        match microcontroller {
            Microcontroller::Primary => self.primary,
            Microcontroller::Secondary => self.secondary,
        }
    }
}

/// Logical commands understood by the antenna system
///
/// Index-carrying variants address antennas 1 through 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentCommand {
    Reset,
    Arm,
    Disarm,
    DeployAntenna(u8),
    AutoDeployAll,
    OverrideAntenna(u8),
    CancelActivation,
    MeasureTemperature,
    ReportStatus,
    ReportDeployCount(u8),
    ReportDeployTime(u8),
}

/// Resolve a command to its device opcode
///
/// # Arguments
///
/// * `command` - Logical command to encode
///
/// # Returns
///
/// * `Result<u8>` - Opcode byte
///
/// # Errors
///
/// Returns `InvalidAntennaIndex` if an index-carrying command addresses an
/// antenna outside 1..=4. No opcode is produced for such commands, so the
/// caller never reaches the bus.
///
/// # Examples
///
/// ```
/// use ants_driver::protocol::opcodes::{opcode_for, DeploymentCommand, DEPLOY_ANT_2};
///
/// assert_eq!(opcode_for(DeploymentCommand::DeployAntenna(2)).unwrap(), DEPLOY_ANT_2);
/// assert!(opcode_for(DeploymentCommand::DeployAntenna(5)).is_err());
/// ```
pub fn opcode_for(command: DeploymentCommand) -> Result<u8> {
    use DeploymentCommand::*;

    let opcode = match command {
        Reset => RESET,
        Arm => ARM,
        Disarm => DISARM,
        DeployAntenna(index) => select(
            index,
            [DEPLOY_ANT_1, DEPLOY_ANT_2, DEPLOY_ANT_3, DEPLOY_ANT_4],
        )?,
        AutoDeployAll => AUTO_DEPLOY_ALL,
        OverrideAntenna(index) => select(
            index,
            [OVERRIDE_ANT_1, OVERRIDE_ANT_2, OVERRIDE_ANT_3, OVERRIDE_ANT_4],
        )?,
        CancelActivation => CANCEL_ACTIVATION,
        MeasureTemperature => MEASURE_TEMPERATURE,
        ReportStatus => REPORT_DEPLOY_STATUS,
        ReportDeployCount(index) => select(
            index,
            [
                REPORT_DEPLOY_CNT_ANT_1,
                REPORT_DEPLOY_CNT_ANT_2,
                REPORT_DEPLOY_CNT_ANT_3,
                REPORT_DEPLOY_CNT_ANT_4,
            ],
        )?,
        ReportDeployTime(index) => select(
            index,
            [
                REPORT_DEPLOY_TIME_ANT_1,
                REPORT_DEPLOY_TIME_ANT_2,
                REPORT_DEPLOY_TIME_ANT_3,
                REPORT_DEPLOY_TIME_ANT_4,
            ],
        )?,
    };

    Ok(opcode)
}

/// Check an antenna index against 1..=4
pub fn validate_antenna_index(index: u8) -> Result<u8> {
    if (1..=ANTENNA_COUNT).contains(&index) {
        Ok(index)
    } else {
        Err(AntsError::InvalidAntennaIndex(index))
    }
}

fn select(index: u8, table: [u8; ANTENNA_COUNT as usize]) -> Result<u8> {
    let index = validate_antenna_index(index)?;
    Ok(table[usize::from(index - 1)])
}
