//! Paired device records and the name heuristic used to pick out printers

use serde::{Deserialize, Serialize};

/// Lower-cased substrings which mark a device name as a printer
const NAME_CONTAINS: &[&str] = &["printer", "rpp"];
/// Lower-cased prefixes which mark a device name as a printer
const NAME_PREFIXES: &[&str] = &["bt", "pos", "escpos"];

/// Snapshot of a paired Bluetooth device as reported by the platform
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Human readable name, if the device advertised one
    pub name: Option<String>,
    /// Hardware address, e.g. `00:11:22:33:44:55`
    pub address: String,
    /// Platform classification code; 0 when unknown
    #[serde(rename = "type")]
    pub device_class: u32,
}

impl DeviceRecord {
    /// Build a record from its parts
    pub fn new(
        name: Option<impl Into<String>>,
        address: impl Into<String>,
        device_class: u32,
    ) -> Self {
        Self {
            name: name.map(Into::into),
            address: address.into(),
            device_class,
        }
    }

    /// Whether this device looks like a receipt printer. This is a name
    /// match only, so it will miss some printers and accept some
    /// non-printers.
    pub fn is_printer(&self) -> bool {
        self.name.as_deref().is_some_and(looks_like_printer)
    }
}

/// Case-insensitive name heuristic: contains "printer" or "rpp", or
/// starts with "bt", "pos" or "escpos"
pub fn looks_like_printer(name: &str) -> bool {
    let name = name.to_lowercase();
    NAME_CONTAINS.iter().any(|pat| name.contains(pat))
        || NAME_PREFIXES.iter().any(|pre| name.starts_with(pre))
}
