//! Request/response surface exposed to the host application. A call names
//! a method and carries JSON arguments; every outcome, including failures,
//! comes back as a [`Response`].

use crate::{Error, ErrorCode, PrinterSession, Result, Transport};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Methods understood by the channel
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Method {
    GetPairedPrinters,
    ConnectPrinter,
    PrintText,
    DisconnectPrinter,
}

impl Method {
    /// Name the host uses to call this method
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetPairedPrinters => "getPairedPrinters",
            Self::ConnectPrinter => "connectPrinter",
            Self::PrintText => "printText",
            Self::DisconnectPrinter => "disconnectPrinter",
        }
    }
}

impl FromStr for Method {
    type Err = ();
    fn from_str(name: &str) -> std::result::Result<Self, ()> {
        Ok(match name {
            "getPairedPrinters" => Self::GetPairedPrinters,
            "connectPrinter" => Self::ConnectPrinter,
            "printText" => Self::PrintText,
            "disconnectPrinter" => Self::DisconnectPrinter,
            _ => return Err(()),
        })
    }
}

/// A call from the host
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl MethodCall {
    /// A call to `method` with no arguments
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: Map::new(),
        }
    }

    /// Add an argument
    #[must_use]
    pub fn arg(mut self, key: impl Into<String>, val: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), val.into());
        self
    }

    /// A string argument; `None` when missing or null
    fn str_arg(&self, key: &'static str) -> Result<Option<&str>> {
        match self.arguments.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(Error::InvalidArgument("Argument must be a string")),
        }
    }
}

/// Outcome of a call, as sent back to the host
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Success { result: Value },
    Error { code: ErrorCode, message: String },
    NotImplemented,
}

impl Response {
    fn ok(result: impl Into<Value>) -> Self {
        Self::Success {
            result: result.into(),
        }
    }
}

impl From<Error> for Response {
    fn from(err: Error) -> Self {
        Self::Error {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Dispatches method calls onto a printer session
pub struct MethodChannel<T> {
    session: PrinterSession<T>,
}

impl<T: Transport> MethodChannel<T> {
    /// Serve calls from `session`
    pub fn new(session: PrinterSession<T>) -> Self {
        Self { session }
    }

    /// The session calls are dispatched to
    pub fn session(&self) -> &PrinterSession<T> {
        &self.session
    }

    /// Run a single call. Never fails; errors become [`Response::Error`]
    /// and unknown methods [`Response::NotImplemented`].
    #[tracing::instrument(skip_all, fields(method = %call.method))]
    pub async fn handle(&self, call: &MethodCall) -> Response {
        let Ok(method) = call.method.parse::<Method>() else {
            debug!("Not implemented");
            return Response::NotImplemented;
        };
        match self.dispatch(method, call).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("{} failed: {e}", method.name());
                e.into()
            }
        }
    }

    async fn dispatch(&self, method: Method, call: &MethodCall) -> Result<Response> {
        Ok(match method {
            Method::GetPairedPrinters => {
                let printers = self.session.list_printers().await?;
                Response::ok(serde_json::to_value(printers)?)
            }
            Method::ConnectPrinter => {
                let address = call
                    .str_arg("address")?
                    .ok_or(Error::InvalidArgument("No address provided"))?;
                self.session.connect(address).await?;
                Response::ok(true)
            }
            Method::PrintText => {
                let text = call.str_arg("text")?;
                self.session.print_text(text).await?;
                Response::ok(true)
            }
            Method::DisconnectPrinter => {
                self.session.disconnect().await?;
                Response::ok(true)
            }
        })
    }

    /// Decode a JSON call, run it, and encode the response as JSON
    pub async fn handle_json(&self, call: &str) -> String {
        let resp = match serde_json::from_str::<MethodCall>(call) {
            Ok(call) => self.handle(&call).await,
            Err(e) => Error::from(e).into(),
        };
        // a Response always serialises
        serde_json::to_string(&resp).unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{socket::memory::MemoryTransport, DeviceRecord};
    use serde_json::json;

    fn channel() -> (MethodChannel<MemoryTransport>, MemoryTransport) {
        let transport = MemoryTransport::new(vec![
            DeviceRecord::new(Some("HP LaserJet"), "AA:BB", 1),
            DeviceRecord::new(Some("BT-POS58"), "CC:DD", 2),
        ]);
        let session = PrinterSession::new(transport.clone());
        (MethodChannel::new(session), transport)
    }

    fn error_code(resp: Response) -> ErrorCode {
        match resp {
            Response::Error { code, .. } => code,
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn method_names_round_trip() {
        for m in [
            Method::GetPairedPrinters,
            Method::ConnectPrinter,
            Method::PrintText,
            Method::DisconnectPrinter,
        ] {
            assert_eq!(m.name().parse::<Method>(), Ok(m));
        }
        assert!("getpairedprinters".parse::<Method>().is_err());
    }

    #[tokio::test]
    async fn get_paired_printers() {
        let (chan, _) = channel();
        let resp = chan.handle(&MethodCall::new("getPairedPrinters")).await;
        assert_eq!(
            resp,
            Response::ok(json!([
                { "name": "BT-POS58", "address": "CC:DD", "type": 2 }
            ]))
        );
    }

    #[tokio::test]
    async fn no_adapter() {
        let chan = MethodChannel::new(PrinterSession::new(
            MemoryTransport::without_adapter(),
        ));
        let resp = chan.handle(&MethodCall::new("getPairedPrinters")).await;
        assert_eq!(
            resp,
            Response::Error {
                code: ErrorCode::NoAdapter,
                message: "Bluetooth not supported".into(),
            }
        );
    }

    #[tokio::test]
    async fn unknown_method() {
        let (chan, _) = channel();
        let resp = chan.handle(&MethodCall::new("scanDevices")).await;
        assert_eq!(resp, Response::NotImplemented);
    }

    #[tokio::test]
    async fn connect_requires_address() {
        let (chan, transport) = channel();
        let resp = chan.handle(&MethodCall::new("connectPrinter")).await;
        assert_eq!(error_code(resp), ErrorCode::Invalid);

        let call = MethodCall::new("connectPrinter").arg("address", "");
        assert_eq!(error_code(chan.handle(&call).await), ErrorCode::Invalid);

        let call = MethodCall::new("connectPrinter").arg("address", 42);
        assert_eq!(error_code(chan.handle(&call).await), ErrorCode::Invalid);
        assert_eq!(transport.connections(), 0);
    }

    #[tokio::test]
    async fn connect_failure_carries_message() {
        let (chan, transport) = channel();
        transport.fail_next_connect("read failed, socket might closed");
        let call = MethodCall::new("connectPrinter").arg("address", "CC:DD");
        assert_eq!(
            chan.handle(&call).await,
            Response::Error {
                code: ErrorCode::ConnectionFailed,
                message: "read failed, socket might closed".into(),
            }
        );
    }

    #[tokio::test]
    async fn print_session() {
        let (chan, transport) = channel();

        let call = MethodCall::new("printText").arg("text", "HELLO");
        assert_eq!(error_code(chan.handle(&call).await), ErrorCode::NoConnection);

        let connect = MethodCall::new("connectPrinter").arg("address", "CC:DD");
        assert_eq!(chan.handle(&connect).await, Response::ok(true));
        assert_eq!(chan.handle(&call).await, Response::ok(true));

        let call = MethodCall::new("printText").arg("text", Value::Null);
        assert_eq!(chan.handle(&call).await, Response::ok(true));

        transport.fail_next_write("Broken pipe");
        let call = MethodCall::new("printText").arg("text", "again");
        assert_eq!(error_code(chan.handle(&call).await), ErrorCode::PrintFailed);

        let disconnect = MethodCall::new("disconnectPrinter");
        assert_eq!(chan.handle(&disconnect).await, Response::ok(true));
        assert_eq!(chan.handle(&disconnect).await, Response::ok(true));

        assert_eq!(transport.written(0), b"HELLO\n\n");
    }

    #[tokio::test]
    async fn disconnect_failure() {
        let (chan, transport) = channel();
        let connect = MethodCall::new("connectPrinter").arg("address", "CC:DD");
        chan.handle(&connect).await;
        transport.fail_next_close("Socket closed");

        let resp = chan.handle(&MethodCall::new("disconnectPrinter")).await;
        assert_eq!(error_code(resp), ErrorCode::DisconnectFailed);
    }

    #[tokio::test]
    async fn json_in_json_out() {
        let (chan, _) = channel();

        let out = chan
            .handle_json(r#"{"method":"connectPrinter","arguments":{"address":"CC:DD"}}"#)
            .await;
        assert_eq!(
            serde_json::from_str::<Value>(&out).unwrap(),
            json!({ "status": "success", "result": true })
        );

        let out = chan.handle_json(r#"{"method":"disconnectPrinter"}"#).await;
        assert_eq!(
            serde_json::from_str::<Value>(&out).unwrap(),
            json!({ "status": "success", "result": true })
        );

        let out = chan.handle_json(r#"{"method":"beep"}"#).await;
        assert_eq!(out, r#"{"status":"not_implemented"}"#);

        let out = chan.handle_json("not json").await;
        let resp: Response = serde_json::from_str(&out).unwrap();
        assert_eq!(error_code(resp), ErrorCode::Invalid);
    }
}
