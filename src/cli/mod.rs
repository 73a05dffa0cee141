//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the drycc-client binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::pagination::DEFAULT_LIMIT;

/// Drycc controller command-line interface.
#[derive(Parser, Debug)]
#[command(name = "drycc-client", about = "Drycc controller CLI", version)]
pub struct Cli {
    /// Output results as JSON instead of a table.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Fail when the controller API version does not match this client.
    #[arg(long, global = true, default_value = "false")]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the configured URL is a Drycc controller.
    Check,

    /// Check that the controller is healthy.
    Health,

    /// List a directory on an app volume.
    Ls {
        /// The app id.
        app: String,

        /// The volume name.
        volume: String,

        /// Directory inside the volume.
        #[arg(default_value = "/")]
        path: String,

        /// Maximum number of entries.
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: u32,
    },

    /// Upload a local file to an app volume.
    Put {
        /// The app id.
        app: String,

        /// The volume name.
        volume: String,

        /// Local file to upload.
        file: PathBuf,

        /// Target directory inside the volume.
        #[arg(long, default_value = "/")]
        path: String,

        /// Name on the volume (defaults to the local file name).
        #[arg(long)]
        name: Option<String>,
    },

    /// Download a file from an app volume.
    Get {
        /// The app id.
        app: String,

        /// The volume name.
        volume: String,

        /// File path inside the volume.
        path: String,

        /// Write to this file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Delete a file from an app volume.
    Rm {
        /// The app id.
        app: String,

        /// The volume name.
        volume: String,

        /// File path inside the volume.
        path: String,
    },
}
