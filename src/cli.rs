use clap::Parser;
use std::path::PathBuf;

/// netsniff: decode link-layer frames into protocol layers
#[derive(Parser, Debug)]
#[command(name = "netsniff", version, about)]
pub struct Cli {
    /// Interface from which frames are captured.
    /// All available interfaces are monitored by default.
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Output packet data during capture
    #[arg(short, long)]
    pub data: bool,

    /// Suppress per-frame screen output
    #[arg(short, long)]
    pub quiet: bool,

    /// Also write one JSON object per frame to this file
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Stop after this many decoded frames (0 = unlimited)
    #[arg(short = 'c', long)]
    pub count: Option<u64>,

    /// Replay frames from a pcap file instead of capturing live
    #[arg(short, long, value_name = "FILE")]
    pub read: Option<PathBuf>,

    /// Load settings from a TOML file; flags take precedence
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// List available network interfaces and exit
    #[arg(short, long)]
    pub list_interfaces: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_capture_everywhere() {
        let cli = Cli::try_parse_from(["netsniff"]).unwrap();
        assert!(cli.interface.is_none());
        assert!(!cli.data);
        assert!(cli.count.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn short_flags() {
        let cli =
            Cli::try_parse_from(["netsniff", "-i", "eth0", "-d", "-c", "10", "-vv"]).unwrap();
        assert_eq!(cli.interface.as_deref(), Some("eth0"));
        assert!(cli.data);
        assert_eq!(cli.count, Some(10));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn long_flags() {
        let cli = Cli::try_parse_from([
            "netsniff",
            "--interface",
            "lo",
            "--data",
            "--json",
            "out.jsonl",
            "--read",
            "trace.pcap",
        ])
        .unwrap();
        assert_eq!(cli.interface.as_deref(), Some("lo"));
        assert!(cli.data);
        assert_eq!(cli.json, Some(PathBuf::from("out.jsonl")));
        assert_eq!(cli.read, Some(PathBuf::from("trace.pcap")));
    }
}
