use adu_lib::{AduError, Command, DeviceConfig, Session, Transport, UsbTransport};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::fs::File;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Send commands to an Ontrak ADU relay/IO device and read back its responses.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// USB vendor ID (decimal or 0x-prefixed hex).
    #[arg(long, default_value = "0x0a07", value_parser = parse_u16)]
    vid: u16,
    /// USB product ID; the ADU model number, e.g. 208 for an ADU208.
    #[arg(long, default_value = "208", value_parser = parse_u16)]
    pid: u16,
    /// USB interface holding the interrupt endpoints.
    #[arg(long, default_value = "0", value_parser = parse_u8)]
    interface: u8,
    /// Interrupt OUT endpoint address.
    #[arg(long, default_value = "0x01", value_parser = parse_u8)]
    endpoint_out: u8,
    /// Interrupt IN endpoint address.
    #[arg(long, default_value = "0x81", value_parser = parse_u8)]
    endpoint_in: u8,
    /// Frame size in bytes: 8 for low-speed models, 64 for full-speed ones.
    /// Detected from the bus speed when omitted.
    #[arg(long)]
    packet_size: Option<usize>,
    /// Timeout for each send and each query response, in milliseconds.
    #[arg(long, default_value_t = 200)]
    timeout_ms: u64,
    /// Receive timeout while discarding stale responses, in milliseconds.
    #[arg(long, default_value_t = 200)]
    drain_timeout_ms: u64,
    /// Skip discarding stale responses after opening the device.
    #[arg(long)]
    no_drain: bool,
    /// Host library used to reach the device.
    #[arg(long, value_enum, default_value_t = Backend::Usb)]
    backend: Backend,
    /// Optional path to a file to write logs to, in addition to the console.
    #[arg(short, long)]
    log_file: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Interrupt endpoints through nusb
    Usb,
    /// The OS HID driver through hidapi (needs the `hidapi` feature)
    Hid,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Mode {
    /// Reset, set and read back relay K0, write and read port K, read the watchdog.
    Demo,
    /// Send commands that change device state; nothing is read back.
    Send {
        #[arg(required = true)]
        commands: Vec<String>,
    },
    /// Send one command that returns a value and print the response.
    Query {
        command: String,
        /// Require a decimal response and print it as a number.
        #[arg(long)]
        numeric: bool,
    },
    /// Discard any responses the device still has queued.
    Drain,
}

impl Cli {
    fn device_config(&self) -> DeviceConfig {
        let mut config = DeviceConfig::for_product(self.pid)
            .with_vendor_id(self.vid)
            .with_interface(self.interface)
            .with_endpoints(self.endpoint_out, self.endpoint_in)
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_drain_timeout(Duration::from_millis(self.drain_timeout_ms))
            // `drain` does its own draining and reports the count.
            .with_drain_on_open(!self.no_drain && self.mode != Mode::Drain);
        if let Some(size) = self.packet_size {
            config = config.with_packet_size(size);
        }
        config
    }
}

fn parse_u16(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number {s:?}: {e}"))
}

fn parse_u8(s: &str) -> Result<u8, String> {
    let value = parse_u16(s)?;
    u8::try_from(value).map_err(|_| format!("{value} does not fit in a byte"))
}

fn setup_logging(log_file_path: Option<PathBuf>, verbosity: &Verbosity<InfoLevel>) -> Result<Option<WorkerGuard>> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let (file_layer, guard) = if let Some(ref path) = log_file_path {
        let log_file =
            File::create(path).with_context(|| format!("Failed to create log file at: {:?}", path))?;
        let (non_blocking_writer, guard) = tracing_appender::non_blocking(log_file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_writer)
            .with_ansi(false)
            .with_target(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    // -v raises the level from INFO to DEBUG; RUST_LOG still wins per target.
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if let Some(path) = log_file_path {
        info!("Logging to file: {:?}", path);
    }

    Ok(guard)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let guard = setup_logging(cli.log_file.clone(), &cli.verbose)?;

    if let Err(e) = run(cli) {
        error!("Application failed: {:?}", e);
        drop(guard);
        process::exit(1);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.device_config();
    let transport = open_transport(cli.backend, &config)?;
    info!(packet_size = transport.packet_size(), "Device ready");
    let mut session = Session::open(transport, &config).context("Failed to drain stale responses")?;

    match cli.mode {
        Mode::Demo => run_demo(&mut session),
        Mode::Send { commands } => {
            for text in commands {
                let command = Command::action(text);
                session
                    .execute(&command)
                    .with_context(|| format!("Failed to send {command}"))?;
                info!(%command, "Sent");
            }
            Ok(())
        }
        Mode::Query { command, numeric } => {
            let command = Command::query(command);
            let response = session
                .query(&command)
                .with_context(|| format!("Query {command} failed"))?;
            if numeric {
                println!("{}", response.parse_numeric()?);
            } else {
                println!("{response}");
            }
            Ok(())
        }
        Mode::Drain => {
            let discarded = session.drain().context("Failed to drain stale responses")?;
            println!("Discarded {discarded} stale response(s)");
            Ok(())
        }
    }
}

fn open_transport(backend: Backend, config: &DeviceConfig) -> Result<Box<dyn Transport>> {
    match backend {
        Backend::Usb => {
            let transport = UsbTransport::open(config).context("Failed to open ADU device over USB")?;
            Ok(Box::new(transport))
        }
        Backend::Hid => open_hid(config),
    }
}

#[cfg(feature = "hidapi")]
fn open_hid(config: &DeviceConfig) -> Result<Box<dyn Transport>> {
    let transport = adu_lib::HidTransport::open(config).context("Failed to open ADU device over HID")?;
    Ok(Box::new(transport))
}

#[cfg(not(feature = "hidapi"))]
fn open_hid(_config: &DeviceConfig) -> Result<Box<dyn Transport>> {
    anyhow::bail!("This build has no HID backend; rebuild with `--features hidapi`")
}

fn run_demo<T: Transport>(session: &mut Session<T>) -> Result<()> {
    info!("--- Relay K0 ---");
    session.execute(&Command::reset_relay('K', 0))?;
    session.execute(&Command::set_relay('K', 0))?;
    // 1 expected, the relay was just closed
    print_query(session, "Relay K0", Command::read_relay('K', 0))?;

    info!("--- Port K ---");
    session.execute(&Command::write_port('K', 255))?;
    print_query(session, "Port K", Command::read_port('K'))?;

    info!("--- Watchdog ---");
    print_query(session, "Watchdog", Command::read_watchdog())?;
    Ok(())
}

/// Run a query and print its numeric value. A missing response is reported and skipped.
fn print_query<T: Transport>(session: &mut Session<T>, label: &str, command: Command) -> Result<()> {
    match session.query(&command) {
        Ok(response) => {
            println!("{label}: {}", response.numeric());
            Ok(())
        }
        Err(AduError::Transport(e)) if e.is_timeout() => {
            warn!(%command, "No response from device");
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Query {command} failed")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["adu-rs", "demo"]).unwrap();
        assert_eq!(cli.mode, Mode::Demo);
        assert_eq!(cli.backend, Backend::Usb);

        let config = cli.device_config();
        assert_eq!(config.vendor_id, 0x0A07);
        assert_eq!(config.product_id, 208);
        assert_eq!(config.endpoint_out, 0x01);
        assert_eq!(config.endpoint_in, 0x81);
        assert_eq!(config.packet_size, None);
        assert_eq!(config.timeout, Duration::from_millis(200));
        assert!(config.drain_on_open);
    }

    #[test]
    fn test_device_options() {
        let cli = Cli::try_parse_from([
            "adu-rs",
            "--vid",
            "0X0A07",
            "--pid",
            "200",
            "--packet-size",
            "64",
            "--timeout-ms",
            "500",
            "--backend",
            "hid",
            "query",
            "PA",
            "--numeric",
        ])
        .unwrap();
        assert_eq!(
            cli.mode,
            Mode::Query {
                command: "PA".to_string(),
                numeric: true
            }
        );
        assert_eq!(cli.backend, Backend::Hid);

        let config = cli.device_config();
        assert_eq!(config.product_id, 200);
        assert_eq!(config.packet_size, Some(64));
        assert_eq!(config.timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_send_needs_commands() {
        assert!(Cli::try_parse_from(["adu-rs", "send"]).is_err());
        let cli = Cli::try_parse_from(["adu-rs", "send", "RK0", "SK0"]).unwrap();
        assert_eq!(
            cli.mode,
            Mode::Send {
                commands: vec!["RK0".to_string(), "SK0".to_string()]
            }
        );
    }

    #[test]
    fn test_drain_mode_skips_open_drain() {
        let cli = Cli::try_parse_from(["adu-rs", "drain"]).unwrap();
        assert!(!cli.device_config().drain_on_open);

        let cli = Cli::try_parse_from(["adu-rs", "--no-drain", "demo"]).unwrap();
        assert!(!cli.device_config().drain_on_open);
    }

    #[test]
    fn test_parse_ids() {
        assert_eq!(parse_u16("0x0a07"), Ok(0x0A07));
        assert_eq!(parse_u16("208"), Ok(208));
        assert!(parse_u16("0xZZ").is_err());
        assert_eq!(parse_u8("0x81"), Ok(0x81));
        assert!(parse_u8("256").is_err());
    }
}
