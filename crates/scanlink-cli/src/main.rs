//! Command-line scan runner.
//!
//! Runs one scan attempt against either a physical serial port or the
//! in-memory mock link, printing the classified outcome. Intended for
//! bring-up and bench diagnostics, not production dispatch.
//!
//! ```text
//! # one mock scan, delimiter mode
//! scanlink --frame 'CRATE-0042\r'
//!
//! # read 12 bytes from a physical reader
//! scanlink --port /dev/ttyUSB0 --mode fixed-length --length 12
//! ```

use clap::{Parser, ValueEnum};
use scanlink_core::{FrameKind, FrameResult, ReadMode, Result, SerialLinkConfig, TracingLog};
use scanlink_link::{AnySerialLink, MockLink, SerialPortLink};
use scanlink_pipeline::{AcceptAll, ScanArtifact, ScanHandlers, ScanPipeline, TracingReporter};
use scanlink_reader::{ReadOrchestrator, ReaderSettings, StaticConfigSource};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Stop at the expected frame length (or after one second).
    FixedLength,
    /// Stop when the delimiter arrives.
    UntilDelimiter,
    /// Read until cancelled.
    UntilCancelled,
    /// Read for a fixed window.
    ForInterval,
}

impl From<ModeArg> for ReadMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::FixedLength => ReadMode::FixedLength,
            ModeArg::UntilDelimiter => ReadMode::UntilDelimiter,
            ModeArg::UntilCancelled => ReadMode::UntilCancelled,
            ModeArg::ForInterval => ReadMode::ForInterval,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "scanlink", about = "Run one barcode scan attempt", version)]
struct Args {
    /// Serial port to read from; omit to run against the mock link.
    #[arg(long)]
    port: Option<String>,

    /// Baud rate for the serial port.
    #[arg(long, default_value_t = 9600)]
    baud: u32,

    /// Frame termination policy.
    #[arg(long, value_enum, default_value_t = ModeArg::UntilDelimiter)]
    mode: ModeArg,

    /// Delimiter literal for until-delimiter mode (escapes like \r allowed).
    #[arg(long, default_value = "\\r")]
    delimiter: String,

    /// Expected frame length for fixed-length mode.
    #[arg(long, default_value_t = 1)]
    length: usize,

    /// Read window in milliseconds for for-interval mode.
    #[arg(long, default_value_t = 200)]
    interval_ms: u64,

    /// Delay before the attempt touches the port, in milliseconds.
    #[arg(long, default_value_t = 0)]
    pre_read_delay_ms: u64,

    /// Keep whatever is already buffered instead of flushing it.
    #[arg(long)]
    keep_input: bool,

    /// Frame to script into the mock link (escapes like \r allowed).
    #[arg(long, default_value = "CRATE-0042\\r")]
    frame: String,
}

/// Handlers that print the classified outcome to stdout.
struct PrintHandlers;

impl ScanHandlers for PrintHandlers {
    async fn on_frame_accepted(&mut self, artifact: ScanArtifact) -> Result<()> {
        println!("frame accepted: {:?}", artifact.data);
        Ok(())
    }

    async fn on_content_rejected(&mut self, artifact: ScanArtifact) -> Result<()> {
        println!("frame rejected: {:?}", artifact.data);
        Ok(())
    }

    async fn on_link_error(&mut self, result: FrameResult) -> Result<()> {
        println!("attempt failed: {}", result.error);
        println!("{}", result.link_info);
        Ok(())
    }

    async fn post_scan(&mut self) -> Result<()> {
        Ok(())
    }
}

fn link_config(args: &Args) -> SerialLinkConfig {
    let mut config = SerialLinkConfig::fallback();
    if let Some(port) = &args.port {
        config.port_name = port.clone();
        config.description = "cli reader".to_string();
    } else {
        config.description = "cli mock reader".to_string();
    }
    config.baud_rate = args.baud;
    config.pre_read_delay = Duration::from_millis(args.pre_read_delay_ms);
    config.clear_input = !args.keep_input;
    config
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let link = match &args.port {
        Some(_) => AnySerialLink::Serial(SerialPortLink::new()),
        None => {
            let (link, handle) = MockLink::new();
            // Land the scripted frame after the attempt's input flush.
            handle.push_str_after(
                Duration::from_millis(args.pre_read_delay_ms + 5),
                &scanlink_reader::decode_escapes(&args.frame),
            );
            AnySerialLink::Mock(link)
        }
    };

    let settings = ReaderSettings::new("cli", args.mode.into())
        .with_delimiter(args.delimiter.clone())
        .with_read_interval(Duration::from_millis(args.interval_ms))
        .with_frame_kinds(vec![FrameKind::new("cli-frame", args.length)]);

    let source = StaticConfigSource::new().with("cli", link_config(&args));
    let orchestrator =
        ReadOrchestrator::new(settings, link, source).with_log(Arc::new(TracingLog));

    let mut pipeline = ScanPipeline::new(orchestrator, AcceptAll, PrintHandlers, TracingReporter)
        .with_log(Arc::new(TracingLog));

    pipeline.run_scan().await;
}
