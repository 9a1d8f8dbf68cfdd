use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{descriptor_command, init_command, inspect_command, report_command};

#[derive(Parser, Debug)]
#[command(name = "mojo-tools")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract goals and write plugin.xml and plugin-help.xml
    #[command(visible_alias = "d")]
    Descriptor {
        /// Project directory (defaults to current directory)
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Configuration file (defaults to the nearest .mojo-tools.json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Only run the given extractor; repeat to run several
        #[arg(short, long = "extractor", value_name = "ID")]
        extractors: Vec<String>,

        /// Directory the descriptors are written to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Succeed even when no goal is found
        #[arg(long)]
        skip_error_no_descriptors_found: bool,
    },
    /// Print the goal overview of a descriptor
    #[command(visible_alias = "r")]
    Report {
        /// Path to a plugin.xml document
        descriptor: PathBuf,

        /// Base URL of the API documentation used for type links
        #[arg(long)]
        javadoc_url: Option<String>,
    },
    /// Print a descriptor as JSON
    Inspect {
        /// Path to a plugin.xml document
        descriptor: PathBuf,
    },
    /// Initialize mojo-tools configuration
    Init {
        /// Specify the current working directory
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Force overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,

        #[arg(long, default_value = "com.example")]
        group_id: String,

        /// Defaults to the directory name
        #[arg(long)]
        artifact_id: Option<String>,

        #[arg(long = "plugin-version", default_value = "1.0-SNAPSHOT")]
        plugin_version: String,
    },
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Descriptor {
                cwd,
                config,
                extractors,
                output,
                skip_error_no_descriptors_found,
            } => descriptor_command(
                cwd.as_deref(),
                config.as_deref(),
                &extractors,
                output.as_deref(),
                skip_error_no_descriptors_found,
            ),
            Commands::Report {
                descriptor,
                javadoc_url,
            } => report_command(&descriptor, javadoc_url.as_deref()),
            Commands::Inspect { descriptor } => inspect_command(&descriptor),
            Commands::Init {
                cwd,
                force,
                group_id,
                artifact_id,
                plugin_version,
            } => init_command(
                cwd.as_deref(),
                force,
                &group_id,
                artifact_id.as_deref(),
                &plugin_version,
            ),
        }
    }
}
