//! # Bus Transport Module
//!
//! Register transactions with the antenna system microcontrollers.
//!
//! This module handles:
//! - The transport trait the controller drives
//! - An adapter over blocking `embedded-hal` I2C buses
//! - Opening the Linux I2C character device

pub mod bus_trait;

pub use bus_trait::BusTransport;

use async_trait::async_trait;
use bytes::Buf;
use embedded_hal::blocking::i2c::{Write, WriteRead};
use linux_embedded_hal::I2cdev;
use std::fmt::Debug;
use tracing::{debug, info};

use crate::error::{AntsError, Result};

/// Largest 7-bit I2C address
pub const MAX_I2C_ADDRESS: u8 = 0x7F;

/// Transport over any blocking `embedded-hal` I2C bus
///
/// Writes are `[opcode, parameter]`; reads are a write of `[opcode]`
/// followed by a repeated-start read of the reply.
pub struct EmbeddedHalBus<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> std::fmt::Debug for EmbeddedHalBus<I2C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedHalBus")
            .field("address", &format_args!("0x{:02X}", self.address))
            .finish_non_exhaustive()
    }
}

impl<I2C> EmbeddedHalBus<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Address subsequent transactions are directed at
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Release the underlying bus
    pub fn into_inner(self) -> I2C {
        self.i2c
    }
}

impl EmbeddedHalBus<I2cdev> {
    /// Open a Linux I2C character device
    ///
    /// # Arguments
    ///
    /// * `path` - Device path (e.g., "/dev/i2c-2")
    /// * `address` - Initial device address
    ///
    /// # Errors
    ///
    /// Returns `Transport` error if the device cannot be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ants_driver::transport::EmbeddedHalBus;
    /// use ants_driver::protocol::opcodes::PRIMARY_ADDRESS;
    ///
    /// let bus = EmbeddedHalBus::open("/dev/i2c-2", PRIMARY_ADDRESS)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(path: &str, address: u8) -> Result<Self> {
        let i2c = I2cdev::new(path)
            .map_err(|e| AntsError::Transport(format!("Failed to open {}: {}", path, e)))?;
        info!("Opened I2C bus {}", path);
        Ok(Self::new(i2c, address))
    }
}

fn transport_error<E: Debug>(action: &str, opcode: u8, address: u8, e: E) -> AntsError {
    AntsError::Transport(format!(
        "{} 0x{:02X} at 0x{:02X} failed: {:?}",
        action, opcode, address, e
    ))
}

#[async_trait]
impl<I2C, E> BusTransport for EmbeddedHalBus<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E> + Send,
    E: Debug,
{
    async fn set_address(&mut self, address: u8) -> Result<()> {
        if address > MAX_I2C_ADDRESS {
            return Err(AntsError::Transport(format!(
                "Address 0x{:02X} is not a 7-bit I2C address",
                address
            )));
        }
        self.address = address;
        debug!("Bus address set to 0x{:02X}", address);
        Ok(())
    }

    async fn write(&mut self, opcode: u8, parameter: u8) -> Result<()> {
        self.i2c
            .write(self.address, &[opcode, parameter])
            .map_err(|e| transport_error("Write", opcode, self.address, e))?;
        debug!("Wrote 0x{:02X} (param 0x{:02X})", opcode, parameter);
        Ok(())
    }

    async fn read(&mut self, opcode: u8) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[opcode], &mut buf)
            .map_err(|e| transport_error("Read", opcode, self.address, e))?;
        debug!("Read 0x{:02X} -> 0x{:02X}", opcode, buf[0]);
        Ok(buf[0])
    }

    async fn read2(&mut self, opcode: u8) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[opcode], &mut buf)
            .map_err(|e| transport_error("Read", opcode, self.address, e))?;
        let value = (&buf[..]).get_u16();
        debug!("Read 0x{:02X} -> 0x{:04X}", opcode, value);
        Ok(value)
    }
}
