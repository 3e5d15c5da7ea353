//! Command-Line Interface

use crate::session::flags::SimulatedFlags;
use crate::simulate::synth::MotionProfile;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Liveness Collector - behavioral telemetry and drag-path liveness challenge
#[derive(Parser, Debug)]
#[command(name = "liveness-collector")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Simulated risk switches
#[derive(Args, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagArgs {
    /// Report a headless browser
    #[arg(long)]
    pub headless: bool,

    /// Report a proxy, VPN or Tor exit
    #[arg(long)]
    pub proxy: bool,

    /// Report a language/locale mismatch
    #[arg(long)]
    pub lang_mismatch: bool,
}

impl FlagArgs {
    /// True when any switch was given on the command line
    pub fn any(&self) -> bool {
        self.headless || self.proxy || self.lang_mismatch
    }

    pub fn to_flags(self) -> SimulatedFlags {
        SimulatedFlags {
            headless: self.headless,
            proxy_or_vpn_or_tor: self.proxy,
            lang_mismatch: self.lang_mismatch,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fill and submit the protected payment form with synthetic telemetry
    Submit {
        /// Payment amount
        #[arg(short, long)]
        amount: String,

        /// Payee name
        #[arg(short, long)]
        beneficiary: String,

        /// Synthetic user to imitate
        #[arg(short, long, value_enum, default_value_t = MotionProfile::Human)]
        profile: MotionProfile,

        #[command(flatten)]
        flags: FlagArgs,
    },

    /// Run a standalone drag challenge against the collector
    Challenge {
        /// Synthetic user to imitate
        #[arg(short, long, value_enum, default_value_t = MotionProfile::Human)]
        profile: MotionProfile,

        /// Seed for path generation and motion
        #[arg(short, long)]
        seed: Option<u64>,

        /// Write the last challenge frame to this SVG file
        #[arg(long)]
        frame: Option<PathBuf>,

        #[command(flatten)]
        flags: FlagArgs,
    },

    /// Render a generated challenge path to SVG
    Preview {
        /// Output SVG file
        #[arg(short, long)]
        output: PathBuf,

        /// Seed for path generation
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Follow the live event stream
    Watch {
        /// WebSocket URL (defaults to the configured stream URL)
        #[arg(short, long)]
        url: Option<String>,
    },

    /// View or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
