//! In-memory transport which records everything written to it. Useful for
//! exercising a session without a Bluetooth stack.

use super::{Socket, Transport};
use crate::{DeviceRecord, Error, Result};
use async_trait::async_trait;
use std::{
    io,
    sync::{Arc, Mutex, MutexGuard},
};

/// Something that happened on a [`MemorySocket`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Write(Vec<u8>),
    Flush,
    Shutdown,
    Close,
}

/// Failures to inject into the next matching operation
#[derive(Debug, Default)]
struct Faults {
    listing: Option<io::Error>,
    connect: Option<String>,
    write: Option<String>,
    close: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    adapter_missing: bool,
    paired: Vec<DeviceRecord>,
    /// Events per socket, indexed by connection order
    sockets: Vec<Vec<Event>>,
    faults: Faults,
}

/// A fake platform: a fixed paired-device list and sockets that log
/// every operation. Clones share state, so a test can keep a handle while
/// the session owns another.
#[derive(Clone, Debug, Default)]
pub struct MemoryTransport {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryTransport {
    /// A host with the given devices paired
    pub fn new(paired: Vec<DeviceRecord>) -> Self {
        let transport = Self::default();
        transport.lock().paired = paired;
        transport
    }

    /// A host with no Bluetooth adapter at all
    pub fn without_adapter() -> Self {
        let transport = Self::default();
        transport.lock().adapter_missing = true;
        transport
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // a panic while holding the lock leaves the log intact
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make the next paired-device read fail with `err`, as a registry
    /// timeout would
    pub fn fail_next_listing(&self, err: io::Error) {
        self.lock().faults.listing = Some(err);
    }

    /// Make the next connect attempt fail with `msg`
    pub fn fail_next_connect(&self, msg: impl Into<String>) {
        self.lock().faults.connect = Some(msg.into());
    }

    /// Make the next write fail with `msg`
    pub fn fail_next_write(&self, msg: impl Into<String>) {
        self.lock().faults.write = Some(msg.into());
    }

    /// Make the next shutdown or close fail with `msg`
    pub fn fail_next_close(&self, msg: impl Into<String>) {
        self.lock().faults.close = Some(msg.into());
    }

    /// Number of sockets opened so far
    pub fn connections(&self) -> usize {
        self.lock().sockets.len()
    }

    /// Events recorded on the `idx`th socket opened
    pub fn events(&self, idx: usize) -> Vec<Event> {
        self.lock().sockets.get(idx).cloned().unwrap_or_default()
    }

    /// Concatenation of every byte written to the `idx`th socket
    pub fn written(&self, idx: usize) -> Vec<u8> {
        self.events(idx)
            .into_iter()
            .filter_map(|evt| match evt {
                Event::Write(data) => Some(data),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn paired_devices(&self) -> Result<Vec<DeviceRecord>> {
        let mut inner = self.lock();
        if inner.adapter_missing {
            return Err(Error::AdapterUnavailable);
        }
        if let Some(err) = inner.faults.listing.take() {
            return Err(Error::Io(err));
        }
        Ok(inner.paired.clone())
    }

    async fn connect(
        &self,
        address: &str,
    ) -> Result<(Box<dyn Socket>, DeviceRecord)> {
        let mut inner = self.lock();
        if inner.adapter_missing {
            return Err(Error::AdapterUnavailable);
        }
        if let Some(msg) = inner.faults.connect.take() {
            return Err(Error::ConnectionFailed(msg));
        }
        let device = inner
            .paired
            .iter()
            .find(|dev| dev.address.eq_ignore_ascii_case(address))
            .cloned()
            .unwrap_or_else(|| DeviceRecord::new(None::<String>, address, 0));

        let idx = inner.sockets.len();
        inner.sockets.push(Vec::new());
        drop(inner);

        let socket = MemorySocket {
            transport: self.clone(),
            idx,
        };
        Ok((Box::new(socket), device))
    }
}

#[derive(Copy, Clone)]
enum Op {
    Write,
    Close,
}

/// Socket half of [`MemoryTransport`]
#[derive(Debug)]
pub struct MemorySocket {
    transport: MemoryTransport,
    idx: usize,
}

impl MemorySocket {
    fn record(&self, evt: Event) {
        self.transport.lock().sockets[self.idx].push(evt);
    }

    fn take_fault(&self, op: Op) -> io::Result<()> {
        let mut inner = self.transport.lock();
        let fault = match op {
            Op::Write => inner.faults.write.take(),
            Op::Close => inner.faults.close.take(),
        };
        match fault {
            Some(msg) => Err(io::Error::new(io::ErrorKind::BrokenPipe, msg)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Socket for MemorySocket {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.take_fault(Op::Write)?;
        self.record(Event::Write(data.to_vec()));
        Ok(())
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.record(Event::Flush);
        Ok(())
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        self.take_fault(Op::Close)?;
        self.record(Event::Shutdown);
        Ok(())
    }

    async fn close(self: Box<Self>) -> io::Result<()> {
        self.take_fault(Op::Close)?;
        self.record(Event::Close);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn records_per_socket() {
        let transport = MemoryTransport::new(vec![DeviceRecord::new(
            Some("BT-POS58"),
            "CC:DD",
            0,
        )]);
        let (mut sock, dev) = transport.connect("cc:dd").await.unwrap();
        assert_eq!(dev.name.as_deref(), Some("BT-POS58"));

        sock.write_all(b"hi").await.unwrap();
        sock.flush().await.unwrap();
        sock.close().await.unwrap();

        assert_eq!(transport.connections(), 1);
        assert_eq!(
            transport.events(0),
            [Event::Write(b"hi".to_vec()), Event::Flush, Event::Close]
        );
    }

    #[tokio::test]
    async fn unknown_address_resolves_to_nameless_device() {
        let transport = MemoryTransport::default();
        let (_sock, dev) = transport.connect("11:22").await.unwrap();
        assert_eq!(dev, DeviceRecord::new(None::<String>, "11:22", 0));
    }

    #[tokio::test]
    async fn injected_write_fault_fires_once() {
        let transport = MemoryTransport::default();
        let (mut sock, _) = transport.connect("11:22").await.unwrap();
        transport.fail_next_write("Broken pipe");
        let err = sock.write_all(b"x").await.unwrap_err();
        assert_eq!(err.to_string(), "Broken pipe");
        sock.write_all(b"y").await.unwrap();
        assert_eq!(transport.written(0), b"y");
    }
}
