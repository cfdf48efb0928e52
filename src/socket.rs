//! Abstraction over the platform's Bluetooth stack (namely BlueZ, or an
//! in-memory fake) to allow the printer session to transparently use any
//! supported backend

use crate::{DeviceRecord, Result};
use async_trait::async_trait;
use std::io;

#[cfg(feature = "bluetooth")]
pub mod bluetooth;
pub mod memory;

/// Service class UUID of the Serial Port Profile
pub const SPP_UUID: &str = "00001101-0000-1000-8000-00805F9B34FB";

/// An open byte stream to a printer
#[async_trait]
pub trait Socket: Send {
    /// Write the whole of `data` to the socket
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush anything buffered on our side of the socket
    async fn flush(&mut self) -> io::Result<()>;

    /// Close the output half of the stream
    async fn shutdown(&mut self) -> io::Result<()>;

    /// Close the connection itself, releasing the socket
    async fn close(self: Box<Self>) -> io::Result<()>;
}

/// Platform capabilities needed by a printer session: enumerate the
/// paired-device registry and open a serial channel to an address
#[async_trait]
pub trait Transport: Send + Sync {
    /// All devices paired with the host, in registry order
    async fn paired_devices(&self) -> Result<Vec<DeviceRecord>>;

    /// Open an SPP channel to the device at `address`, returning the
    /// connected socket along with the resolved device
    async fn connect(
        &self,
        address: &str,
    ) -> Result<(Box<dyn Socket>, DeviceRecord)>;
}
