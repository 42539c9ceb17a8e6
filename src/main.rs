mod cli;

use clap::Parser;
use netsniff::capture::{self, CaptureSource, StopSignal};
use netsniff::config::{self, ConfigError};
use netsniff::decoder::{DecoderStats, SessionError};
use netsniff::display::{JsonLinesOutput, ScreenOutput};
use netsniff::sniffer::{Frames, PacketSniffer};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

/// Exit status after Ctrl-C, as a shell reports SIGINT.
const EXIT_INTERRUPTED: i32 = 130;

fn main() {
    let args = cli::Cli::parse();

    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    };

    if args.list_interfaces {
        list_interfaces();
        return;
    }

    let stop = StopSignal::new();
    let handler_stop = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_stop.trigger()) {
        eprintln!("error: failed to set Ctrl-C handler: {}", e);
        std::process::exit(1);
    }

    match run_capture(&config, stop) {
        Ok(CaptureEnd::Finished) => {}
        Ok(CaptureEnd::Interrupted) => {
            eprintln!("Aborting packet capture...");
            std::process::exit(EXIT_INTERRUPTED);
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

fn list_interfaces() {
    match capture::list_interfaces() {
        Ok(devices) => {
            println!("Available network interfaces:");
            println!("{:<20} {:<20} {}", "Name", "Description", "Addresses");
            println!("{}", "-".repeat(70));
            for device in &devices {
                let desc = device.desc.as_deref().unwrap_or("");
                let addrs: Vec<String> = device
                    .addresses
                    .iter()
                    .map(|a| a.addr.to_string())
                    .collect();
                println!("{:<20} {:<20} {}", device.name, desc, addrs.join(", "));
            }
            if devices.is_empty() {
                println!("  (no interfaces found, try running with sudo)");
            }
        }
        Err(e) => {
            eprintln!("error listing interfaces: {}", e);
            eprintln!("hint: try running with sudo");
        }
    }
}

enum CaptureEnd {
    Finished,
    Interrupted,
}

fn run_capture(
    config: &RuntimeConfig,
    stop: StopSignal,
) -> Result<CaptureEnd, Box<dyn std::error::Error>> {
    let mut sniffer = PacketSniffer::new()
        .with_capture_config((&config.file.capture).into())
        .with_stop_signal(stop);

    let output = &config.file.output;
    if !output.quiet {
        sniffer.register(ScreenOutput::new(output.display_data));
    }
    if let Some(path) = &output.json_lines {
        let file = File::create(path)?;
        sniffer.register(JsonLinesOutput::new(BufWriter::new(file)));
        tracing::info!(path = %path.display(), "writing JSON lines");
    }

    let count = config.file.run.count;
    let (stats, end) = match &config.read {
        Some(path) => drain(sniffer.replay(path)?, count)?,
        None => {
            let interface = config.file.capture.interface.as_deref();
            if !output.quiet {
                println!("netsniff v{}", env!("CARGO_PKG_VERSION"));
                println!("Capturing on interface: {}", interface.unwrap_or("(all)"));
                println!();
            }
            drain(sniffer.start(interface)?, count)?
        }
    };

    print_summary(&stats);
    Ok(end)
}

/// Pull frames until the source ends, `count` frames were decoded, or the
/// capture is interrupted. Observers do the per-frame work.
fn drain<S: CaptureSource>(
    mut frames: Frames<'_, S>,
    count: u64,
) -> Result<(DecoderStats, CaptureEnd), SessionError> {
    let mut yielded = 0u64;
    let end = loop {
        if count > 0 && yielded >= count {
            frames.close();
            break CaptureEnd::Finished;
        }
        match frames.next() {
            Some(Ok(_)) => yielded += 1,
            Some(Err(SessionError::Interrupted)) => break CaptureEnd::Interrupted,
            Some(Err(e)) => return Err(e),
            None => break CaptureEnd::Finished,
        }
    };
    Ok((frames.stats(), end))
}

fn print_summary(stats: &DecoderStats) {
    eprintln!();
    eprintln!("{}", "=".repeat(50));
    eprintln!("Capture complete.");
    eprintln!("  Frames captured:   {}", stats.captured);
    eprintln!("  Frames decoded:    {}", stats.decoded);
    eprintln!("  Frames dropped:    {}", stats.dropped);
    eprintln!(
        "  Success rate:      {:.1}%",
        if stats.captured > 0 {
            stats.decoded as f64 / stats.captured as f64 * 100.0
        } else {
            0.0
        }
    );
    eprintln!("{}", "=".repeat(50));
}

#[derive(Debug, Clone)]
struct RuntimeConfig {
    file: config::Config,
    read: Option<PathBuf>,
}

fn load_config(args: &cli::Cli) -> Result<RuntimeConfig, ConfigError> {
    let mut file = match &args.config {
        Some(path) => config::Config::load(path)?,
        None => config::Config::default(),
    };

    if let Some(value) = &args.interface {
        file.capture.interface = Some(value.clone());
    }
    if let Some(value) = args.count {
        file.run.count = value;
    }
    if let Some(value) = &args.json {
        file.output.json_lines = Some(value.clone()).filter(|p| !p.as_os_str().is_empty());
    }
    if args.data {
        file.output.display_data = true;
    }
    if args.quiet {
        file.output.quiet = true;
    }

    Ok(RuntimeConfig {
        file,
        read: args.read.clone(),
    })
}
