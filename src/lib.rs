//! Talk to Bluetooth serial (SPP) receipt printers.
//!
//! A [`PrinterSession`] holds at most one connection to a printer and
//! offers four operations: list paired printers, connect, print text, and
//! disconnect. A [`MethodChannel`] exposes the same operations to a host
//! application as named calls with JSON arguments.
//!
//! The platform side is abstracted behind [`Transport`]; with the default
//! `bluetooth` feature [`Bluetooth`] provides it through BlueZ, and
//! [`MemoryTransport`] is an in-memory stand-in for tests.
//!
//! ```no_run
//! # async fn run() -> btprinter::Result<()> {
//! use btprinter::{Bluetooth, PrinterSession};
//!
//! let session = PrinterSession::new(Bluetooth::default());
//! let printers = session.list_printers().await?;
//! if let Some(printer) = printers.first() {
//!     session.connect(&printer.address).await?;
//!     session.print_text(Some("HELLO")).await?;
//!     session.disconnect().await?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

#[macro_use]
extern crate tracing;

pub mod channel;
mod config;
mod device;
mod error;
mod session;
pub mod socket;

pub use channel::{Method, MethodCall, MethodChannel, Response};
pub use config::BluezConfig;
pub use device::{looks_like_printer, DeviceRecord};
pub use error::{Error, ErrorCode, Result};
pub use session::{PrinterSession, LINE_FEED};
#[cfg(feature = "bluetooth")]
pub use socket::bluetooth::Bluetooth;
pub use socket::{memory::MemoryTransport, Socket, Transport, SPP_UUID};
