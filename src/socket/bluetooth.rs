//! Bluetooth protocol support

use super::{Socket, Transport, SPP_UUID};
use crate::{BluezConfig, DeviceRecord, Error, Result};
use async_trait::async_trait;
use bluer::{
    rfcomm::{self, Profile, ProfileHandle, Role, SocketAddr},
    Adapter, Address, Device, Session, Uuid,
};
use futures::StreamExt;
use std::io;
use tokio::{
    io::AsyncWriteExt,
    sync::{Mutex, OnceCell},
};

/// Serial Port Profile service class
const SPP: Uuid = Uuid::from_u128(0x0000_1101_0000_1000_8000_0080_5F9B_34FB);

/// BlueZ backed transport. The adapter and the SPP client profile are
/// set up lazily on first use.
pub struct Bluetooth {
    config: BluezConfig,
    /// BlueZ session and the adapter resolved from it
    adapter: OnceCell<(Session, Adapter)>,
    /// Registered SPP client profile, shared by all connects
    profile: Mutex<Option<ProfileHandle>>,
}

impl Default for Bluetooth {
    fn default() -> Self {
        Self::new(BluezConfig::default())
    }
}

impl Bluetooth {
    /// Create a transport; nothing touches BlueZ until the first call
    pub fn new(config: BluezConfig) -> Self {
        Self {
            config,
            adapter: OnceCell::new(),
            profile: Mutex::new(None),
        }
    }

    /// Get a handle to the configured Bluetooth adapter, returning the
    /// cached one if present. Any failure to reach BlueZ or find an adapter
    /// is reported as [`Error::AdapterUnavailable`].
    async fn init_adapter(&self) -> Result<&(Session, Adapter)> {
        self.adapter
            .get_or_try_init(|| async {
                let session = Session::new().await?;
                let adapter = match &self.config.adapter {
                    Some(name) => session.adapter(name)?,
                    None => session.default_adapter().await?,
                };
                if self.config.power_on && !adapter.is_powered().await? {
                    info!("Powering on adapter {}", adapter.name());
                    adapter.set_powered(true).await?;
                }
                Ok::<_, Error>((session, adapter))
            })
            .await
            .map_err(|e| {
                warn!("No usable Bluetooth adapter: {e}");
                Error::AdapterUnavailable
            })
    }

    /// Snapshot of a device. The name and class are only for reporting,
    /// so a failed read leaves them unset rather than failing.
    async fn record(device: &Device) -> DeviceRecord {
        let addr = device.address();
        let name = device.name().await.unwrap_or_else(|e| {
            debug!("Could not read name of {addr}: {e}");
            None
        });
        let device_class = device.class().await.unwrap_or_else(|e| {
            debug!("Could not read class of {addr}: {e}");
            None
        });
        DeviceRecord {
            name,
            address: addr.to_string(),
            device_class: device_class.unwrap_or_default(),
        }
    }

    /// Connect straight to a known RFCOMM channel
    async fn connect_channel(addr: Address, channel: u8) -> Result<rfcomm::Stream> {
        let socket = rfcomm::Socket::new()?;
        Ok(socket.connect(SocketAddr::new(addr, channel)).await?)
    }

    /// Have BlueZ look up the SPP service record, connect it, and hand us
    /// the resulting stream via our client profile
    async fn connect_profile(
        &self,
        session: &Session,
        adapter: &Adapter,
        addr: Address,
    ) -> Result<rfcomm::Stream> {
        let mut profile = self.profile.lock().await;
        let mut handle = match profile.take() {
            Some(handle) => handle,
            None => {
                debug!("Registering SPP client profile");
                session
                    .register_profile(Profile {
                        uuid: SPP,
                        role: Some(Role::Client),
                        require_authentication: Some(false),
                        require_authorization: Some(false),
                        auto_connect: Some(false),
                        ..Default::default()
                    })
                    .await?
            }
        };
        let res = Self::accept_from(&mut handle, adapter, addr).await;
        *profile = Some(handle);
        res
    }

    async fn accept_from(
        handle: &mut ProfileHandle,
        adapter: &Adapter,
        addr: Address,
    ) -> Result<rfcomm::Stream> {
        let device = adapter.device(addr)?;
        let accept = async {
            while let Some(req) = handle.next().await {
                if req.device() == addr {
                    return Ok(req.accept()?);
                }
                // dropping the request rejects it
                debug!("Ignoring stray SPP connection from {}", req.device());
            }
            Err(Error::ConnectionFailed("SPP profile unregistered".into()))
        };
        let connect = async { device.connect_profile(&SPP).await.map_err(Error::from) };
        let (stream, ()) = tokio::try_join!(accept, connect)?;
        Ok(stream)
    }
}

#[async_trait]
impl Transport for Bluetooth {
    #[tracing::instrument(skip_all)]
    async fn paired_devices(&self) -> Result<Vec<DeviceRecord>> {
        let (_, adapter) = self.init_adapter().await?;
        let mut devices = Vec::new();
        for addr in adapter.device_addresses().await? {
            let device = adapter.device(addr)?;
            match device.is_paired().await {
                Ok(true) => devices.push(Self::record(&device).await),
                Ok(false) => {}
                // e.g. removed while we were enumerating
                Err(e) => debug!("Skipping {addr}: {e}"),
            }
        }
        debug!("{} paired devices", devices.len());
        Ok(devices)
    }

    #[tracing::instrument(skip(self))]
    async fn connect(
        &self,
        address: &str,
    ) -> Result<(Box<dyn Socket>, DeviceRecord)> {
        let (session, adapter) = self.init_adapter().await?;
        let addr: Address = address.parse().map_err(|_| {
            Error::ConnectionFailed(format!("{address} is not a valid Bluetooth address"))
        })?;

        let stream = match self.config.channel {
            Some(channel) => Self::connect_channel(addr, channel).await?,
            None => self.connect_profile(session, adapter, addr).await?,
        };
        info!("Connected to {addr} ({SPP_UUID})");

        let device = match adapter.device(addr) {
            Ok(device) => Self::record(&device).await,
            Err(_) => DeviceRecord::new(None::<String>, addr.to_string(), 0),
        };
        Ok((Box::new(RfcommSocket::from(stream)), device))
    }
}

/// Connected RFCOMM stream to a printer
pub struct RfcommSocket {
    stream: rfcomm::Stream,
}

impl From<rfcomm::Stream> for RfcommSocket {
    fn from(stream: rfcomm::Stream) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl Socket for RfcommSocket {
    #[tracing::instrument(skip_all)]
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        debug!("Writing {} bytes", data.len());
        self.stream.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.stream.flush().await
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }

    async fn close(self: Box<Self>) -> io::Result<()> {
        // the socket is closed once the stream is dropped
        drop(self.stream);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn spp_uuid_matches_string_form() {
        let parsed: Uuid = SPP_UUID.parse().unwrap();
        assert_eq!(parsed, SPP);
    }
}
