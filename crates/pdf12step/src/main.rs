//! `pdf12step` - CLI for pdf12step
//!
//! This binary downloads TSML meeting data and renders printable meeting
//! directories from it.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use clap::Parser;
use tracing::info;

use pdf12step::cli::{init, Cli, Command, ConfigCommand, DownloadCommand, HtmlCommand, InitCommand};
use pdf12step::config::Overrides;
use pdf12step::{init_logging, Client, Config, Context, Format, RenderOptions};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity(), &cli.log_target()).context("failed to initialize logging")?;

    if let Command::Init(init_cmd) = &cli.command {
        return handle_init(init_cmd);
    }

    // Load configuration
    let overrides = cli.overrides();
    let config = Config::load_from(&cli.config, &overrides)?;

    // Execute the command
    match cli.command {
        Command::Download(download_cmd) => handle_download(&config, &download_cmd),
        Command::Html(html_cmd) => handle_html(config, &html_cmd),
        Command::Init(_) => Ok(()),
        Command::Config(config_cmd) => handle_config(&config, &overrides, config_cmd),
    }
}

fn ensure_site(config: &Config) -> Result<()> {
    if config.site_url.is_none() {
        bail!(
            "No site_url configured. Create a config with `pdf12step init` and pass it with --config"
        );
    }
    Ok(())
}

fn download(config: &Config, sections: &[String], format: Format) -> Result<Vec<PathBuf>> {
    ensure_site(config)?;
    let client = Client::from_config(config)?;
    let written = client
        .download(sections, format, &config.data_dir, config.site_domain())
        .with_context(|| format!("failed to download from {}", client.site_url()))?;
    Ok(written)
}

fn handle_download(config: &Config, cmd: &DownloadCommand) -> Result<()> {
    for path in download(config, &cmd.sections, cmd.format)? {
        println!("{}", path.display());
    }
    Ok(())
}

fn handle_html(config: Config, cmd: &HtmlCommand) -> Result<()> {
    ensure_site(&config)?;
    if cmd.download {
        download(&config, &[], Format::Json)?;
    }

    let context = Context::new(config, &RenderOptions { limit: cmd.limit })?;
    context.prerender()?;
    let content = context.render(&cmd.template)?;

    let output = cmd
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}.html", context.date_title())));
    if output.as_os_str() == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(content.as_bytes())?;
        stdout.flush()?;
    } else {
        std::fs::write(&output, content)
            .with_context(|| format!("failed to write {}", output.display()))?;
        info!("Wrote to {}", output.display());
    }
    Ok(())
}

fn handle_init(cmd: &InitCommand) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let config = init::interview(&mut stdin.lock(), &mut stdout)?;
    std::fs::write(&cmd.output, config.to_yaml()?)
        .with_context(|| format!("failed to write {}", cmd.output.display()))?;

    println!();
    println!("Your custom config has been rendered to {}", cmd.output.display());
    println!("You can now render documents using");
    println!("pdf12step -c {} html", cmd.output.display());
    Ok(())
}

fn handle_config(config: &Config, overrides: &Overrides, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                print!("{}", config.to_yaml()?);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(&[path], overrides) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
