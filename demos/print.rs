use btprinter::{Bluetooth, BluezConfig, PrinterSession};
use clap::Parser;

/// Print a line of text on a paired Bluetooth printer
#[derive(Parser)]
struct Args {
    /// Printer address; the first paired printer when omitted
    #[arg(short, long)]
    address: Option<String>,

    /// Fixed RFCOMM channel, skipping the SPP service lookup
    #[arg(short, long)]
    channel: Option<u8>,

    /// Text to print
    #[arg(default_value = "HELLO")]
    text: String,
}

#[tokio::main]
async fn main() -> btprinter::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let config = BluezConfig {
        channel: args.channel,
        ..BluezConfig::default()
    };
    let session = PrinterSession::new(Bluetooth::new(config));

    let printers = session.list_printers().await?;
    for printer in &printers {
        println!(
            "{} {}",
            printer.address,
            printer.name.as_deref().unwrap_or_default()
        );
    }

    let Some(address) =
        args.address.or_else(|| printers.first().map(|p| p.address.clone()))
    else {
        println!("No paired printers found");
        return Ok(());
    };

    session.connect(&address).await?;
    session.print_text(Some(&args.text)).await?;
    session.disconnect().await?;

    Ok(())
}
