//! Tunables for the BlueZ transport

use serde::{Deserialize, Serialize};

/// Configuration for [`crate::socket::bluetooth::Bluetooth`]
///
/// ```
/// let config: btprinter::BluezConfig =
///     serde_json::from_str(r#"{ "adapter": "hci1", "channel": 1 }"#)
///         .unwrap();
/// assert!(config.power_on);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BluezConfig {
    /// Adapter name such as `hci0`; the default adapter when unset
    pub adapter: Option<String>,
    /// Fixed RFCOMM channel to connect to. When unset the channel is
    /// looked up from the device's SPP service record.
    pub channel: Option<u8>,
    /// Power the adapter on at first use
    pub power_on: bool,
}

impl Default for BluezConfig {
    fn default() -> Self {
        Self {
            adapter: None,
            channel: None,
            power_on: true,
        }
    }
}

impl BluezConfig {
    /// Use the named adapter rather than the default one
    #[must_use]
    pub fn with_adapter(mut self, adapter: impl Into<String>) -> Self {
        self.adapter = Some(adapter.into());
        self
    }

    /// Skip the service lookup and connect straight to `channel`
    #[must_use]
    pub const fn with_channel(mut self, channel: u8) -> Self {
        self.channel = Some(channel);
        self
    }
}
