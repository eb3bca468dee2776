//! # Deployment Status Decoder
//!
//! Decodes the 16-bit deployment status word returned by the
//! `REPORT_DEPLOY_STATUS` command.
//!
//! | bit          | meaning when set                                   |
//! |--------------|----------------------------------------------------|
//! | 0            | system armed                                       |
//! | 1, 5, 9, 13  | antenna 4, 3, 2, 1 deployment system active        |
//! | 2, 6, 10, 14 | antenna 4, 3, 2, 1 last activation hit time limit  |
//! | 3, 7, 11, 15 | antenna 4, 3, 2, 1 switch reports NOT deployed     |
//! | 8            | deployment switches are being ignored              |
//!
//! Bits 4 and 12 are not interpreted.

use serde::Serialize;
use std::fmt;

use super::opcodes::validate_antenna_index;
use crate::error::Result;

const ARMED_BIT: u8 = 0;
const IGNORING_SWITCHES_BIT: u8 = 8;

/// Lowest bit of each antenna's three-bit group, indexed by antenna - 1
const ANTENNA_BASE_BITS: [u8; 4] = [13, 9, 5, 1];

/// Status of a single antenna's deployment system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AntennaStatus {
    /// Deployment system is currently active
    pub deployment_active: bool,

    /// Latest activation stopped because the time limit was reached
    /// (otherwise it stopped for another reason)
    pub stopped_by_time_limit: bool,

    /// Deployment switch indicates the antenna is NOT deployed
    pub not_deployed: bool,
}

/// Decoded deployment status word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusReport {
    /// Antenna system is armed
    pub armed: bool,

    /// Antenna system is ignoring the deployment switches
    pub ignoring_switches: bool,

    /// Per-antenna status, antenna 1 first
    pub antennas: [AntennaStatus; 4],
}

impl StatusReport {
    /// Status of antenna `index` (1..=4)
    ///
    /// # Errors
    ///
    /// Returns `InvalidAntennaIndex` for an index outside 1..=4
    pub fn antenna(&self, index: u8) -> Result<AntennaStatus> {
        let index = validate_antenna_index(index)?;
        Ok(self.antennas[usize::from(index - 1)])
    }
}

#[inline]
fn bit(raw: u16, position: u8) -> bool {
    (raw >> position) & 1 == 1
}

/// Decode a raw status word
///
/// Every 16-bit value is a valid input.
///
/// # Examples
///
/// ```
/// use ants_driver::protocol::status::decode;
///
/// let report = decode(0x0001);
/// assert!(report.armed);
/// assert!(!report.antennas[0].not_deployed);
/// ```
#[must_use]
pub fn decode(raw: u16) -> StatusReport {
    let mut antennas = [AntennaStatus::default(); 4];
    for (status, &base) in antennas.iter_mut().zip(ANTENNA_BASE_BITS.iter()) {
        *status = AntennaStatus {
            deployment_active: bit(raw, base),
            stopped_by_time_limit: bit(raw, base + 1),
            not_deployed: bit(raw, base + 2),
        };
    }

    StatusReport {
        armed: bit(raw, ARMED_BIT),
        ignoring_switches: bit(raw, IGNORING_SWITCHES_BIT),
        antennas,
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let not = |flag: bool| if flag { "" } else { "NOT " };

        writeln!(f, "Status:")?;
        writeln!(f, "\tAntenna system is currently {}armed.", not(self.armed))?;
        writeln!(
            f,
            "\tAntenna system is currently {}ignoring the antenna deployment switches.",
            not(self.ignoring_switches)
        )?;

        for (i, antenna) in self.antennas.iter().enumerate() {
            let n = i + 1;
            writeln!(
                f,
                "\tAntenna {}'s deployment system is currently {}active.",
                n,
                not(antenna.deployment_active)
            )?;
            if antenna.stopped_by_time_limit {
                writeln!(f, "\tThe latest deployment system activation for Antenna {} was stopped because a time limit was reached.", n)?;
            } else {
                writeln!(f, "\tThe latest deployment system activation for Antenna {} was stopped for a reason other than exceeding the time limit.", n)?;
            }
            writeln!(
                f,
                "\tAntenna {}'s deployment switch indicates the antenna is {}deployed.",
                n,
                if antenna.not_deployed { "NOT " } else { "" }
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AntsError;

    #[test]
    fn test_decode_zero() {
        let report = decode(0x0000);
        assert_eq!(report, StatusReport::default());
        for antenna in &report.antennas {
            // Bit unset: deployed, stopped for another reason, inactive
            assert!(!antenna.not_deployed);
            assert!(!antenna.stopped_by_time_limit);
            assert!(!antenna.deployment_active);
        }
    }

    #[test]
    fn test_decode_armed_only() {
        let report = decode(0x0001);
        assert!(report.armed);
        assert!(!report.ignoring_switches);
        assert_eq!(report.antennas, [AntennaStatus::default(); 4]);
    }

    #[test]
    fn test_antenna_bit_groups() {
        // Antenna 1 occupies the top group (bits 13..=15)
        let report = decode(1 << 13);
        assert!(report.antennas[0].deployment_active);
        assert_eq!(report.antennas[1..], [AntennaStatus::default(); 3]);

        let report = decode(1 << 14);
        assert!(report.antennas[0].stopped_by_time_limit);

        let report = decode(1 << 15);
        assert!(report.antennas[0].not_deployed);

        // Antenna 4 occupies bits 1..=3
        let report = decode(0b1110);
        assert_eq!(
            report.antennas[3],
            AntennaStatus { deployment_active: true, stopped_by_time_limit: true, not_deployed: true }
        );
        assert!(!report.armed);

        // Antenna 2 not deployed, antenna 3 active
        let report = decode((1 << 11) | (1 << 5));
        assert!(report.antennas[1].not_deployed);
        assert!(report.antennas[2].deployment_active);
    }

    #[test]
    fn test_ignoring_switches_bit() {
        let report = decode(1 << 8);
        assert!(report.ignoring_switches);
        assert!(!report.armed);
    }

    #[test]
    fn test_unused_bits_ignored() {
        assert_eq!(decode(1 << 4), StatusReport::default());
        assert_eq!(decode(1 << 12), StatusReport::default());
        assert_eq!(decode(0xFFFF), decode(0xFFFF & !((1 << 4) | (1 << 12))));
    }

    #[test]
    fn test_all_bits_set() {
        let report = decode(0xFFFF);
        assert!(report.armed);
        assert!(report.ignoring_switches);
        for antenna in &report.antennas {
            assert!(antenna.deployment_active && antenna.stopped_by_time_limit && antenna.not_deployed);
        }
    }

    #[test]
    fn test_antenna_accessor() {
        let report = decode(1 << 9);
        assert!(report.antenna(2).unwrap().deployment_active);
        assert!(!report.antenna(1).unwrap().deployment_active);
        assert!(matches!(report.antenna(0), Err(AntsError::InvalidAntennaIndex(0))));
        assert!(matches!(report.antenna(5), Err(AntsError::InvalidAntennaIndex(5))));
    }

    #[test]
    fn test_display_lines() {
        let text = decode(0x0001 | (1 << 15)).to_string();
        assert!(text.contains("Antenna system is currently armed."));
        assert!(text.contains("Antenna 1's deployment switch indicates the antenna is NOT deployed."));
        assert!(text.contains("Antenna 2's deployment switch indicates the antenna is deployed."));
        assert!(text.contains("NOT ignoring"));
    }
}
