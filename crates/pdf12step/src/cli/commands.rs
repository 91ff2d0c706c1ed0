//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::client::Format;
use crate::render::LAYOUT_TEMPLATE;

/// Download command arguments.
#[derive(Debug, Args)]
pub struct DownloadCommand {
    /// Format of downloaded meeting data
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    pub format: Format,

    /// Comma separated sections to download (default: all)
    #[arg(short, long, value_delimiter = ',')]
    pub sections: Vec<String>,
}

/// HTML command arguments.
#[derive(Debug, Args)]
pub struct HtmlCommand {
    /// Output file name. Use "-" for stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Download the meeting data before rendering
    #[arg(short, long)]
    pub download: bool,

    /// Limit the rendering to this number of meetings
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Base template to render
    #[arg(short, long, env = "PDF12STEP_TEMPLATE", default_value = LAYOUT_TEMPLATE)]
    pub template: String,
}

/// Init command arguments.
#[derive(Debug, Args)]
pub struct InitCommand {
    /// File to write the new configuration to
    #[arg(short, long, default_value = "config.yaml")]
    pub output: PathBuf,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_command_debug() {
        let cmd = HtmlCommand {
            output: None,
            download: false,
            limit: Some(3),
            template: LAYOUT_TEMPLATE.to_string(),
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("limit"));
        assert!(debug_str.contains("layout.html"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
