//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::recording::{Duration, MimeType};

/// Reel - capture microphone audio into encoded takes
#[derive(Parser, Debug)]
#[command(name = "reel")]
#[command(version = "0.1.0")]
#[command(about = "Capture microphone audio into encoded takes")]
#[command(long_about = None)]
pub struct Cli {
    /// Output file (defaults to take.<ext> in the current directory)
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Capture limit before auto-stop (e.g., 30s, 1m, 2m30s)
    #[arg(short = 'l', long, value_name = "TIME")]
    pub limit: Option<String>,

    /// Encoder for the captured audio
    #[arg(short = 'e', long, value_name = "FORMAT")]
    pub encoder: Option<EncoderArg>,

    /// Ask the encoder for a partial chunk at this interval
    #[arg(long, value_name = "TIME")]
    pub flush_every: Option<String>,

    /// Play audio cues when capture starts and stops
    #[arg(long)]
    pub cue: bool,

    /// Config subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Encoder argument for clap ValueEnum
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum EncoderArg {
    Wav,
    Flac,
}

impl EncoderArg {
    /// Get the name used in config files
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Flac => "flac",
        }
    }

    /// Look up an encoder by its config-file name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "wav" => Some(Self::Wav),
            "flac" => Some(Self::Flac),
            _ => None,
        }
    }

    /// Container type this encoder produces
    pub const fn mime_type(&self) -> MimeType {
        match self {
            Self::Wav => MimeType::Wav,
            Self::Flac => MimeType::Flac,
        }
    }
}

/// Parsed capture options
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub output: Option<PathBuf>,
    pub limit: Duration,
    pub encoder: EncoderArg,
    pub flush_every: Option<Duration>,
    pub cue: bool,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &["limit", "encoder", "output_dir", "flush_every", "cue"];

/// Valid encoder values
pub const VALID_ENCODERS: &[&str] = &["wav", "flac"];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
