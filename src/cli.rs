use clap::{ArgAction, Parser};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// The only event camsync acts on.
pub const TRIGGER_EVENT: &str = "device_mounted";

/// Rename the photos and videos of a freshly mounted camera card by capture
/// time and camera model, then upload whatever the remote doesn't hold yet.
///
/// Meant to be started by a device-mount hook as `camsync device_mounted /media/card`.
#[derive(Debug, Parser)]
#[command(name = "camsync", version, about)]
pub struct Cli {
    /// Event reported by the mount hook; anything but `device_mounted` is ignored.
    pub event: String,
    /// Mount point of the card.
    #[arg(default_value = "")]
    pub mount_path: PathBuf,
    /// Configuration file (TOML, YAML or JSON) layered over the defaults.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Fetch the remote index and report what would be uploaded, without uploading.
    #[arg(long)]
    pub dry_run: bool,
    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,
    /// Only log errors.
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn is_trigger(&self) -> bool {
        self.event == TRIGGER_EVENT
    }

    /// Log level selected by `-v`/`-q`, used when `RUST_LOG` is not set.
    pub fn level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::ERROR;
        }
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}
