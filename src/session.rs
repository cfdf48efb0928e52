//! A single at-a-time connection to a Bluetooth serial printer

use crate::{socket::Socket, DeviceRecord, Error, Result, Transport};
use tokio::sync::Mutex;

/// ESC/POS line feed, sent after every block of text
pub const LINE_FEED: u8 = 0x0A;

/// The open socket and the device it is connected to. Keeping both in one
/// value means a session can never hold one without the other.
struct Connection {
    socket: Box<dyn Socket>,
    device: DeviceRecord,
}

/// Owns at most one connection to a printer. All operations are
/// serialised, so a disconnect can never close the socket in the middle
/// of a print.
pub struct PrinterSession<T> {
    transport: T,
    conn: Mutex<Option<Connection>>,
}

impl<T: Transport> PrinterSession<T> {
    /// Create a disconnected session on top of `transport`
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            conn: Mutex::new(None),
        }
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Paired devices whose name looks like a printer, in the order the
    /// platform reports them. Only a missing adapter is an error; if the
    /// registry itself cannot be read the list is empty.
    pub async fn list_printers(&self) -> Result<Vec<DeviceRecord>> {
        let _guard = self.conn.lock().await;
        let paired = match self.transport.paired_devices().await {
            Ok(paired) => paired,
            Err(Error::AdapterUnavailable) => return Err(Error::AdapterUnavailable),
            Err(e) => {
                warn!("Could not read paired devices: {e}");
                Vec::new()
            }
        };
        let printers: Vec<_> = paired
            .into_iter()
            .filter(DeviceRecord::is_printer)
            .collect();
        debug!("{} paired printers", printers.len());
        Ok(printers)
    }

    /// Open an SPP connection to the printer at `address`.
    ///
    /// On failure the session is left exactly as it was. If a connection
    /// is already open it is closed once the new one is established.
    pub async fn connect(&self, address: &str) -> Result<()> {
        if address.is_empty() {
            return Err(Error::InvalidArgument("No address provided"));
        }

        let mut conn = self.conn.lock().await;
        let (socket, device) =
            self.transport.connect(address).await.map_err(|e| match e {
                Error::AdapterUnavailable | Error::ConnectionFailed(_) => e,
                e => Error::ConnectionFailed(e.to_string()),
            })?;
        info!("Connected to {}", device.address);

        if let Some(prev) = conn.replace(Connection { socket, device }) {
            warn!("Replacing connection to {}", prev.device.address);
            if let Err(e) = close(prev.socket).await {
                warn!("Failed to close previous connection: {e}");
            }
        }
        Ok(())
    }

    /// Send `text` as UTF-8 followed by a line feed. Absent text sends only
    /// the line feed. A write error leaves the connection open.
    pub async fn print_text(&self, text: Option<&str>) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let Some(conn) = conn.as_mut() else {
            return Err(Error::NotConnected);
        };

        let data = text.unwrap_or_default().as_bytes();
        debug!("Printing {} bytes to {}", data.len(), conn.device.address);
        let socket = &mut conn.socket;
        let res = async {
            socket.write_all(data).await?;
            socket.flush().await?;
            socket.write_all(&[LINE_FEED]).await
        }
        .await;

        res.map_err(|e| {
            warn!("Print failed: {e}");
            Error::WriteFailed(e.to_string())
        })
    }

    /// Close the connection, if any. Safe to call at any time; a call
    /// while disconnected does nothing. The socket is released even when
    /// closing it reports an error.
    pub async fn disconnect(&self) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let Some(Connection { socket, device }) = conn.take() else {
            return Ok(());
        };

        info!("Disconnecting from {}", device.address);
        close(socket).await.map_err(|e| {
            warn!("Disconnect failed: {e}");
            Error::DisconnectFailed(e.to_string())
        })
    }

    /// The device currently connected to, if any
    pub async fn active_device(&self) -> Option<DeviceRecord> {
        self.conn.lock().await.as_ref().map(|c| c.device.clone())
    }

    /// Whether a connection is currently held
    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }
}

/// Close the output stream and then the socket. Both are attempted; the
/// first error is returned.
async fn close(mut socket: Box<dyn Socket>) -> std::io::Result<()> {
    let shutdown = socket.shutdown().await;
    let close = socket.close().await;
    shutdown.and(close)
}
