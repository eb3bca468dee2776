//! # Antenna Controller Module
//!
//! Stateful driver for the dual-redundant antenna deployment system.
//!
//! This module handles:
//! - Selecting and resetting one of the two redundant microcontrollers
//! - Arming, disarming and cancelling deployment
//! - Deploying antennas, with and without the switch override
//! - Reading temperature, deployment status, counts and activation times
//!
//! ## State
//!
//! The controller starts `Uninitialized`. The first operation addresses the
//! primary microcontroller and resets it. Every switch between
//! microcontrollers is followed by a reset of the newly selected one, and
//! each reset holds the caller for [`RESET_SETTLE_DELAY`] before the next
//! transaction.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::protocol::calibration::{self, TemperatureReading};
use crate::protocol::opcodes::{opcode_for, DeploymentCommand, DeviceAddresses, Microcontroller};
use crate::protocol::status::{self, StatusReport};
use crate::telemetry::TelemetryRecord;
use crate::transport::BusTransport;

/// Time the microcontroller needs after a reset before it answers reliably
pub const RESET_SETTLE_DELAY: Duration = Duration::from_millis(30);

/// Activation time counts per millisecond (one count = 50 µs)
pub const DEPLOY_TIME_COUNTS_PER_MS: f32 = 20.0;

/// Deploy time parameter asking the device to use its default limit
pub const DEFAULT_DEPLOY_TIME: u8 = 0;

/// Lifecycle of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No microcontroller has been addressed and reset yet
    Uninitialized,
    /// The given microcontroller is addressed and has been reset
    Active(Microcontroller),
}

/// Convert a raw activation time count to milliseconds
#[must_use]
pub fn deployment_time_ms(raw: u16) -> f32 {
    f32::from(raw) / DEPLOY_TIME_COUNTS_PER_MS
}

/// Convert a raw activation time count to a `Duration`
#[must_use]
pub fn deployment_time_from_raw(raw: u16) -> Duration {
    Duration::from_micros(u64::from(raw) * 50)
}

/// Driver for the antenna deployment system
pub struct AntennaController<T: BusTransport> {
    transport: T,
    addresses: DeviceAddresses,
    state: ControllerState,
}

impl<T: BusTransport> std::fmt::Debug for AntennaController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AntennaController")
            .field("addresses", &self.addresses)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<T: BusTransport> AntennaController<T> {
    /// Create an uninitialized controller
    ///
    /// No transaction is issued until the first operation.
    pub fn new(transport: T, addresses: DeviceAddresses) -> Self {
        Self {
            transport,
            addresses,
            state: ControllerState::Uninitialized,
        }
    }

    /// Create a controller and bring up the primary microcontroller
    ///
    /// # Errors
    ///
    /// Returns `Transport` error if addressing or the reset fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ants_driver::controller::AntennaController;
    /// use ants_driver::protocol::opcodes::{DeviceAddresses, PRIMARY_ADDRESS};
    /// use ants_driver::transport::EmbeddedHalBus;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let bus = EmbeddedHalBus::open("/dev/i2c-2", PRIMARY_ADDRESS)?;
    ///     let mut antennas = AntennaController::open(bus, DeviceAddresses::default()).await?;
    ///
    ///     antennas.arm_antennas().await?;
    ///     antennas.deploy_antenna(1, 0).await?;
    ///     println!("{}", antennas.get_status().await?);
    ///     Ok(())
    /// }
    /// ```
    pub async fn open(transport: T, addresses: DeviceAddresses) -> Result<Self> {
        let mut controller = Self::new(transport, addresses);
        controller.ensure_active().await?;
        Ok(controller)
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Currently selected microcontroller, if any
    pub fn active_microcontroller(&self) -> Option<Microcontroller> {
        match self.state {
            ControllerState::Active(mc) => Some(mc),
            ControllerState::Uninitialized => None,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Reset the active microcontroller
    pub async fn reset_controller(&mut self) -> Result<()> {
        if self.state == ControllerState::Uninitialized {
            // Activation already resets
            return self.ensure_active().await.map(|_| ());
        }
        self.issue_reset().await
    }

    /// Switch to `target` and reset it
    ///
    /// Selecting from the uninitialized state brings up `target` directly.
    /// If the switch fails the previous selection is kept.
    pub async fn select_microcontroller(&mut self, target: Microcontroller) -> Result<()> {
        self.switch_to(target).await
    }

    /// Switch by manual index (0 = primary, 1 = secondary)
    ///
    /// # Errors
    ///
    /// Returns `InvalidSelector` for any other index, without touching the bus
    pub async fn select_microcontroller_index(&mut self, index: u8) -> Result<()> {
        let target = Microcontroller::try_from(index).map_err(|e| {
            warn!("Please select a microcontroller (0 or 1), got {}", index);
            e
        })?;
        self.switch_to(target).await
    }

    /// Switch to the other microcontroller and reset it
    pub async fn toggle_microcontroller(&mut self) -> Result<()> {
        let current = self.ensure_active().await?;
        self.switch_to(current.other()).await
    }

    /// Arm the antenna system; deployment requires an armed system
    pub async fn arm_antennas(&mut self) -> Result<()> {
        self.command(DeploymentCommand::Arm, 0).await
    }

    /// Disarm the antenna system
    ///
    /// The device deactivates any active deployment system and terminates an
    /// ongoing sequential deployment before disarming.
    pub async fn disarm_antennas(&mut self) -> Result<()> {
        self.command(DeploymentCommand::Disarm, 0).await
    }

    /// Deploy antenna `index` (1..=4), respecting its deployment switch
    ///
    /// `deploy_time_s` limits the activation; 0 uses the device default.
    pub async fn deploy_antenna(&mut self, index: u8, deploy_time_s: u8) -> Result<()> {
        self.command(DeploymentCommand::DeployAntenna(index), deploy_time_s).await
    }

    /// Start automated sequential deployment of all antennas
    pub async fn auto_deploy_all(&mut self, deploy_time_s: u8) -> Result<()> {
        self.command(DeploymentCommand::AutoDeployAll, deploy_time_s).await
    }

    /// Deploy antenna `index` (1..=4) ignoring its deployment switch
    pub async fn override_antenna(&mut self, index: u8, deploy_time_s: u8) -> Result<()> {
        self.command(DeploymentCommand::OverrideAntenna(index), deploy_time_s).await
    }

    /// Deactivate active deployment systems and stop sequential deployment
    pub async fn cancel_activation(&mut self) -> Result<()> {
        self.command(DeploymentCommand::CancelActivation, 0).await
    }

    /// Measure the antenna system temperature
    pub async fn get_temperature(&mut self) -> Result<TemperatureReading> {
        let raw = self.query2(DeploymentCommand::MeasureTemperature).await?;
        let reading = calibration::resolve(raw);
        if reading.is_out_of_range() {
            warn!(
                "Temperature reading {} ({:.1} mV) outside calibrated range",
                raw,
                calibration::raw_to_millivolts(raw)
            );
        }
        Ok(reading)
    }

    /// Raw deployment status word
    pub async fn get_status_code(&mut self) -> Result<u16> {
        let code = self.query2(DeploymentCommand::ReportStatus).await?;
        debug!("Status code: 0x{:04X}", code);
        Ok(code)
    }

    /// Decoded deployment status
    pub async fn get_status(&mut self) -> Result<StatusReport> {
        let code = self.get_status_code().await?;
        Ok(status::decode(code))
    }

    /// Number of deployment attempts made on antenna `index`
    pub async fn get_deployment_count(&mut self, index: u8) -> Result<u8> {
        let opcode = opcode_for(DeploymentCommand::ReportDeployCount(index))?;
        self.ensure_active().await?;
        self.transport.read(opcode).await
    }

    /// Cumulative activation time of antenna `index`, in milliseconds
    pub async fn get_deployment_time(&mut self, index: u8) -> Result<f32> {
        let raw = self.query2(DeploymentCommand::ReportDeployTime(index)).await?;
        Ok(deployment_time_ms(raw))
    }

    /// Read status and temperature into one telemetry record
    pub async fn snapshot(&mut self) -> Result<TelemetryRecord> {
        let status_code = self.get_status_code().await?;
        let temperature = self.get_temperature().await?;
        let microcontroller = self.ensure_active().await?;
        Ok(TelemetryRecord::new(microcontroller, status_code, temperature))
    }

    /// Bring up the primary microcontroller if nothing is active yet
    async fn ensure_active(&mut self) -> Result<Microcontroller> {
        match self.state {
            ControllerState::Active(mc) => Ok(mc),
            ControllerState::Uninitialized => {
                self.switch_to(Microcontroller::Primary).await?;
                Ok(Microcontroller::Primary)
            }
        }
    }

    async fn switch_to(&mut self, target: Microcontroller) -> Result<()> {
        let address = self.addresses.address_of(target);
        self.transport.set_address(address).await?;

        if let Err(e) = self.issue_reset().await {
            // Point the bus back at the microcontroller we still consider active
            if let ControllerState::Active(previous) = self.state {
                let previous_address = self.addresses.address_of(previous);
                if let Err(restore) = self.transport.set_address(previous_address).await {
                    warn!("Failed to restore address 0x{:02X}: {}", previous_address, restore);
                }
            }
            return Err(e);
        }

        self.state = ControllerState::Active(target);
        info!("Microcontroller {:?} active at 0x{:02X}", target, address);
        Ok(())
    }

    async fn issue_reset(&mut self) -> Result<()> {
        let opcode = opcode_for(DeploymentCommand::Reset)?;
        self.transport.write(opcode, 0).await?;
        sleep(RESET_SETTLE_DELAY).await;
        info!("Microcontroller reset");
        Ok(())
    }

    /// Resolve, activate, then write
    async fn command(&mut self, command: DeploymentCommand, parameter: u8) -> Result<()> {
        let opcode = opcode_for(command)?;
        self.ensure_active().await?;
        debug!("{:?} -> 0x{:02X} (param {})", command, opcode, parameter);
        self.transport.write(opcode, parameter).await
    }

    /// Resolve, activate, then read two bytes
    async fn query2(&mut self, command: DeploymentCommand) -> Result<u16> {
        let opcode = opcode_for(command)?;
        self.ensure_active().await?;
        self.transport.read2(opcode).await
    }
}
