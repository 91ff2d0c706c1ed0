//! Command-line interface for pdf12step.
//!
//! This module provides the CLI structure and the interactive `init`
//! interview for the `pdf12step` binary.

mod commands;
pub mod init;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Overrides;
use crate::logging::{LogTarget, Verbosity};

pub use commands::{ConfigCommand, DownloadCommand, HtmlCommand, InitCommand};

/// pdf12step - Printable meeting directories from 12 Step Meeting List sites
///
/// Downloads meeting listings from a WordPress site running the 12 Step
/// Meeting List plugin and renders them into a printable HTML directory.
#[derive(Debug, Parser)]
#[command(name = "pdf12step")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration files, merged in order
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        env = "PDF12STEP_CONFIG",
        value_delimiter = ','
    )]
    pub config: Vec<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory for downloaded meeting data
    #[arg(short = 'D', long, global = true, value_name = "DIR", env = "PDF12STEP_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory for rendered assets
    #[arg(short = 'A', long, global = true, value_name = "DIR", env = "PDF12STEP_ASSET_DIR")]
    pub asset_dir: Option<PathBuf>,

    /// Write logs to this file ("-" for stdout)
    #[arg(long, global = true, value_name = "FILE")]
    pub logfile: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download meeting data from the configured site
    Download(DownloadCommand),

    /// Render the meeting directory as HTML
    Html(HtmlCommand),

    /// Create a configuration file interactively
    Init(InitCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }

    /// Where log output goes.
    #[must_use]
    pub fn log_target(&self) -> LogTarget {
        LogTarget::from_arg(self.logfile.as_deref())
    }

    /// Configuration values given on the command line.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        Overrides {
            data_dir: self.data_dir.clone(),
            asset_dir: self.asset_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    use crate::client::Format;
    use crate::render::LAYOUT_TEMPLATE;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "pdf12step");
    }

    #[test]
    fn test_cli_verify() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&["pdf12step", "-q", "html"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["pdf12step", "html"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["pdf12step", "-v", "html"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["pdf12step", "-vv", "html"]).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_download() {
        let cli = parse(&["pdf12step", "download", "-f", "csv", "-s", "meetings,regions"]);
        let Command::Download(cmd) = cli.command else {
            panic!("expected download");
        };
        assert_eq!(cmd.format, Format::Csv);
        assert_eq!(cmd.sections, ["meetings", "regions"]);
    }

    #[test]
    fn test_parse_download_defaults() {
        let Command::Download(cmd) = parse(&["pdf12step", "download"]).command else {
            panic!("expected download");
        };
        assert_eq!(cmd.format, Format::Json);
        assert!(cmd.sections.is_empty());
    }

    #[test]
    fn test_parse_html() {
        let cli = parse(&["pdf12step", "html", "-o", "-", "-d", "-l", "5"]);
        let Command::Html(cmd) = cli.command else {
            panic!("expected html");
        };
        assert_eq!(cmd.output, Some(PathBuf::from("-")));
        assert!(cmd.download);
        assert_eq!(cmd.limit, Some(5));
        assert_eq!(cmd.template, LAYOUT_TEMPLATE);
    }

    #[test]
    fn test_parse_init_default_output() {
        let Command::Init(cmd) = parse(&["pdf12step", "init"]).command else {
            panic!("expected init");
        };
        assert_eq!(cmd.output, PathBuf::from("config.yaml"));
    }

    #[test]
    fn test_parse_config_subcommands() {
        assert!(matches!(
            parse(&["pdf12step", "config", "show", "--json"]).command,
            Command::Config(ConfigCommand::Show { json: true })
        ));
        assert!(matches!(
            parse(&["pdf12step", "config", "path"]).command,
            Command::Config(ConfigCommand::Path)
        ));
    }

    #[test]
    fn test_parse_repeated_config() {
        let cli = parse(&["pdf12step", "-c", "base.yaml", "-c", "local.toml", "html"]);
        assert_eq!(
            cli.config,
            [PathBuf::from("base.yaml"), PathBuf::from("local.toml")]
        );
    }

    #[test]
    fn test_overrides_and_log_target() {
        let cli = parse(&["pdf12step", "-D", "/tmp/data", "--logfile", "-", "html"]);
        assert_eq!(
            cli.overrides(),
            Overrides {
                data_dir: Some(PathBuf::from("/tmp/data")),
                asset_dir: None,
            }
        );
        assert_eq!(cli.log_target(), LogTarget::Stdout);
    }
}
