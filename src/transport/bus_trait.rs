//! Trait abstraction for register-style bus transactions to enable testing

use async_trait::async_trait;

use crate::error::Result;

/// Register-style bus transactions against the antenna system
///
/// Implementations own the electrical details (addressing, timing, retry).
/// Failures are reported as `AntsError::Transport` and passed through the
/// driver untouched.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BusTransport: Send {
    /// Direct subsequent transactions at `address` (7-bit)
    async fn set_address(&mut self, address: u8) -> Result<()>;

    /// Write a command opcode with its one-byte parameter
    async fn write(&mut self, opcode: u8, parameter: u8) -> Result<()>;

    /// Issue `opcode` and read a one-byte reply
    async fn read(&mut self, opcode: u8) -> Result<u8>;

    /// Issue `opcode` and read a two-byte reply, most significant byte first
    async fn read2(&mut self, opcode: u8) -> Result<u16>;
}
