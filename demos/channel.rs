//! Line-delimited JSON host: one method call per line on stdin, one
//! response per line on stdout.
//!
//! ```text
//! {"method":"getPairedPrinters"}
//! {"method":"connectPrinter","arguments":{"address":"00:11:22:33:44:55"}}
//! {"method":"printText","arguments":{"text":"HELLO"}}
//! {"method":"disconnectPrinter"}
//! ```

use btprinter::{Bluetooth, BluezConfig, MethodChannel, PrinterSession};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser)]
struct Args {
    /// BlueZ transport configuration as JSON
    #[arg(long, default_value = "{}")]
    config: String,
}

#[tokio::main]
async fn main() -> btprinter::Result<()> {
    // stdout carries responses, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let config: BluezConfig = serde_json::from_str(&args.config)?;
    let channel =
        MethodChannel::new(PrinterSession::new(Bluetooth::new(config)));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let mut resp = channel.handle_json(&line).await;
        resp.push('\n');
        stdout.write_all(resp.as_bytes()).await?;
        stdout.flush().await?;
    }

    channel.session().disconnect().await
}
