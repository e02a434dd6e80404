//! CLI argument parsing with clap.

use clap::Parser;
use std::path::{Path, PathBuf};

/// Interactive Raspberry Pi camera console
#[derive(Parser, Debug)]
#[command(name = "picam-console")]
#[command(version, about = "Adjust Raspberry Pi camera settings from the keyboard", long_about = None)]
pub struct Args {
    /// Directory captured images are written to
    #[arg(short, long)]
    pub path: PathBuf,

    /// Settings file (default: camera_config.json next to the executable)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Preview program
    #[arg(long, default_value = "raspivid")]
    pub preview_binary: String,

    /// Still capture program
    #[arg(long, default_value = "raspistill")]
    pub still_binary: String,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Log filter matching the requested verbosity.
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    }
}

/// Whether a clap error is really `--help`/`--version` output.
pub fn is_informational(err: &clap::Error) -> bool {
    matches!(
        err.kind(),
        clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
    )
}

/// Errors in command-line values that clap cannot check by itself.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Output path '{}' does not exist", .0.display())]
    PathMissing(PathBuf),
    #[error("Output path '{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),
}

/// Check that the output path exists and is a directory.
pub fn validate_output_dir(path: &Path) -> Result<(), CliError> {
    if !path.exists() {
        return Err(CliError::PathMissing(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(CliError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}
