//! Mirror an Apple TV's playback state to the terminal
//!
//! ```text
//! cargo run -p atv-sdk --example mirror -- --address 192.168.1.20 --login-id 0x4A2B9C00DEADBEEF
//! cargo run -p atv-sdk --example mirror -- --config appletv.json --key select
//! cargo run -p atv-sdk --example mirror -- --config appletv.json --pair 1234
//! ```

use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use atv_sdk::logging::{init_logging, LoggingMode};
use atv_sdk::{AtvRemoteChannel, DeviceSession, SessionConfig, TracingSink, CHANNEL_KEYS_SEQUENCE};

/// Follow what an Apple TV is playing
#[derive(Parser, Debug)]
#[command(name = "mirror")]
#[command(about = "Mirror Apple TV playback state via atvremote")]
struct Args {
    /// JSON session configuration (overrides address and login id)
    #[arg(short, long)]
    config: Option<String>,

    /// Device IP address
    #[arg(short, long)]
    address: Option<String>,

    /// Device login id
    #[arg(short, long)]
    login_id: Option<String>,

    /// Keys to send once the session is running
    #[arg(short, long)]
    key: Option<String>,

    /// Scan the network and exit
    #[arg(long)]
    scan: bool,

    /// Pair using the pin shown on screen and exit
    #[arg(long, value_name = "PIN")]
    pair: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn session_config(&self) -> Result<SessionConfig> {
        if let Some(path) = &self.config {
            return SessionConfig::load(path).with_context(|| format!("loading {}", path));
        }
        let address = self.address.clone().context("--address or --config is required")?;
        let login_id = self.login_id.clone().context("--login-id or --config is required")?;
        Ok(SessionConfig::new(address, login_id))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mode = if args.verbose { LoggingMode::Debug } else { LoggingMode::Development };
    init_logging(mode)?;

    let config = args.session_config()?;
    let (events_tx, events_rx) = mpsc::channel();
    let channel = Arc::new(
        AtvRemoteChannel::new(&config.executable, events_tx)
            .with_command_timeout(config.command_timeout()),
    );
    let session = Arc::new(DeviceSession::new(config, channel, Arc::new(TracingSink))?);
    let pump = session.spawn_event_pump(events_rx);

    if args.scan {
        let scanner = Arc::clone(&session);
        tokio::task::spawn_blocking(move || scanner.scan(Duration::from_secs(3))).await??;
        // Give the pump a moment to deliver the device list
        tokio::time::sleep(Duration::from_millis(200)).await;
        for device in session.discovered_devices().unwrap_or_default().devices {
            println!("{} at {} (login id: {})", device.name, device.ip_address, device.login_id);
        }
        session.shutdown();
        drop(session);
        pump.join().ok();
        return Ok(());
    }

    if let Some(pin) = args.pair.clone() {
        let pairer = Arc::clone(&session);
        if let Err(e) = tokio::task::spawn_blocking(move || pairer.pair(&pin)).await? {
            warn!("Pairing failed: {}", e);
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        match session.pairing_result() {
            Some(outcome) if outcome.success => {
                println!("Paired: {}", outcome.message);
                if let Some(login_id) = session.device_id() {
                    println!("Login id: {}", login_id);
                }
            }
            Some(outcome) => println!("Pairing failed: {}", outcome.message),
            None => println!("No pairing result reported"),
        }
        session.shutdown();
        drop(session);
        pump.join().ok();
        return Ok(());
    }

    session.start()?;

    if let Some(keys) = args.key.clone() {
        let sender = Arc::clone(&session);
        let sent = tokio::task::spawn_blocking(move || sender.handle_command(CHANNEL_KEYS_SEQUENCE, &keys)).await?;
        if let Err(e) = sent {
            warn!("Sending keys failed: {}", e);
        }
    }

    info!("Mirroring, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    session.shutdown();
    let stats = session.poller_stats();
    info!(
        "Stopped after {} ticks ({} forced, {} natural, {} failed)",
        stats.ticks, stats.forced, stats.natural, stats.failed
    );
    Ok(())
}
