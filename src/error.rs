use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Bluetooth not supported")]
    AdapterUnavailable,

    #[error("{0}")]
    InvalidArgument(&'static str),

    #[error("{0}")]
    ConnectionFailed(String),

    #[error("Not connected to printer")]
    NotConnected,

    #[error("{0}")]
    WriteFailed(String),

    #[error("{0}")]
    DisconnectFailed(String),

    #[cfg(feature = "bluetooth")]
    #[error("bluetooth error: {0}")]
    Bluetooth(#[from] bluer::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid method call: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error codes reported to the host over the method channel
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NoAdapter,
    Invalid,
    ConnectionFailed,
    NoConnection,
    PrintFailed,
    DisconnectFailed,
}

impl ErrorCode {
    /// The code as the host sees it, e.g. `NO_ADAPTER`
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoAdapter => "NO_ADAPTER",
            Self::Invalid => "INVALID",
            Self::ConnectionFailed => "CONNECTION_FAILED",
            Self::NoConnection => "NO_CONNECTION",
            Self::PrintFailed => "PRINT_FAILED",
            Self::DisconnectFailed => "DISCONNECT_FAILED",
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Wire code for this error. Sessions never return the plumbing
    /// variants; they map here only for callers using a transport directly.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::AdapterUnavailable => ErrorCode::NoAdapter,
            Self::InvalidArgument(_) | Self::Json(_) => ErrorCode::Invalid,
            Self::NotConnected => ErrorCode::NoConnection,
            Self::WriteFailed(_) => ErrorCode::PrintFailed,
            Self::DisconnectFailed(_) => ErrorCode::DisconnectFailed,
            Self::ConnectionFailed(_) | Self::Io(_) => {
                ErrorCode::ConnectionFailed
            }
            #[cfg(feature = "bluetooth")]
            Self::Bluetooth(_) => ErrorCode::ConnectionFailed,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn codes_serialise_like_the_host_expects() {
        let json = serde_json::to_string(&ErrorCode::NoConnection).unwrap();
        assert_eq!(json, "\"NO_CONNECTION\"");
        assert_eq!(ErrorCode::DisconnectFailed.to_string(), "DISCONNECT_FAILED");
    }

    #[test]
    fn messages_match_host_strings() {
        assert_eq!(Error::AdapterUnavailable.to_string(), "Bluetooth not supported");
        assert_eq!(Error::NotConnected.to_string(), "Not connected to printer");
        assert_eq!(
            Error::WriteFailed("Broken pipe".into()).code(),
            ErrorCode::PrintFailed
        );
    }
}
