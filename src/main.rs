use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use netgauge::config::Config;
use netgauge::probe::ProbeOutcome;
use netgauge::service::SpeedService;

#[derive(Parser)]
#[command(
    name = "netgauge",
    about = "Network link reporting and active HTTP speed probing",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file (overrides NETGAUGE_CONFIG and the system path)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon (HTTP API server)
    Serve {
        /// Bind address (defaults to the configured listener)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Print the transport type of the active connection
    NetType,

    /// Print the OS-reported link snapshot (capability, not a measurement)
    Snapshot {
        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Run an active download speed test
    Download {
        /// Target URL (defaults to the configured sample file)
        #[arg(long)]
        url: Option<String>,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Run an active upload speed test
    Upload {
        /// Target URL (defaults to the configured echo endpoint)
        #[arg(long)]
        url: Option<String>,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => Config::load(Path::new(path))?,
        None => Config::load_or_default(),
    };

    // Initialize tracing. RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.listen_address.clone());
            tracing::info!(%bind, "starting netgauge daemon");
            netgauge::serve(&bind, config).await?;
        }
        Commands::NetType => {
            let service = SpeedService::new(&config);
            println!("{}", service.current_network_type().await);
        }
        Commands::Snapshot { json } => {
            let service = SpeedService::new(&config);
            let snapshot = service.network_snapshot().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                println!("Network type    : {}", snapshot.network_type);
                println!("Download (link) : {:.1} Mbps", snapshot.download_mbps);
                println!("Upload (link)   : {:.1} Mbps", snapshot.upload_mbps);
                if snapshot.signal_strength >= 0 {
                    println!("Wi-Fi signal    : {}/4", snapshot.signal_strength);
                } else {
                    println!("Wi-Fi signal    : n/a");
                }
            }
        }
        Commands::Download { url, json } => {
            let service = SpeedService::new(&config);
            let outcome = service.run_download_test(url.as_deref()).await;
            print_outcome("Download", &outcome, json)?;
        }
        Commands::Upload { url, json } => {
            let service = SpeedService::new(&config);
            let outcome = service.run_upload_test(url.as_deref()).await;
            print_outcome("Upload", &outcome, json)?;
        }
    }

    Ok(())
}

fn print_outcome(label: &str, outcome: &ProbeOutcome, json: bool) -> Result<()> {
    if json {
        let value = match outcome {
            ProbeOutcome::Measured(t) => serde_json::json!({
                "mbps": t.mbps,
                "bytes": t.bytes,
                "elapsedMs": t.elapsed.as_millis() as u64,
            }),
            ProbeOutcome::Failed(_) => serde_json::json!({ "mbps": 0.0 }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        match outcome {
            ProbeOutcome::Measured(t) => println!(
                "{}: {:.2} Mbps ({} bytes in {:.2}s)",
                label,
                t.mbps,
                t.bytes,
                t.elapsed.as_secs_f64()
            ),
            ProbeOutcome::Failed(_) => println!("{}: 0.00 Mbps (probe failed)", label),
        }
    }
    Ok(())
}
