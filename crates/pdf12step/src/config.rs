//! Configuration management for pdf12step.
//!
//! This module provides configuration loading and validation using figment,
//! supporting YAML and TOML config files, environment variables, and defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};
use figment::{
    providers::{Env, Format, Serialized, Toml, Yaml},
    Figment,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Application directory under the user's config dir.
const APP_DIR_NAME: &str = "pdf12step";

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "PDF12STEP_";

/// Directory configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Command line overrides
/// 2. Environment variables (prefixed with `PDF12STEP_`)
/// 3. Config files, later files overriding earlier ones
/// 4. Default values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root URL of the WordPress site running the TSML plugin.
    pub site_url: Option<String>,
    /// Host of `site_url`; names the downloaded data files.
    pub site_domain: Option<String>,
    /// AJAX endpoint, relative to the site URL or absolute.
    pub api_url: Option<String>,
    /// Page embedding the search nonce, relative to the site URL or absolute.
    pub nonce_url: Option<String>,
    /// Where downloaded data is kept.
    pub data_dir: PathBuf,
    /// Where rendered assets are written.
    pub asset_dir: PathBuf,

    /// Attribute the meeting list is grouped by first.
    pub section_group1: String,
    /// Attribute the meeting list is grouped by second.
    pub section_group2: String,

    /// Page size.
    pub size: String,
    /// Accent color.
    pub color: String,
    /// Header background color.
    pub header_color: String,

    /// Document author.
    pub author: String,
    /// Document description.
    pub description: String,
    /// Contact mailing address.
    pub address: String,
    /// Contact phone.
    pub phone: String,
    /// Contact fax.
    pub fax: String,
    /// Contact email.
    pub email: String,
    /// Contact website.
    pub website: String,
    /// Render links as anchors.
    pub show_links: bool,

    /// Meeting type codes to leave out.
    pub filtercodes: Vec<String>,
    /// Display names for type codes.
    pub codemap: BTreeMap<String, String>,
    /// Legend of type codes to names.
    pub meetingcodes: BTreeMap<String, String>,
    /// Zipcode to region name.
    pub zipcodes: BTreeMap<String, String>,
    /// Attendance options to keep (`in_person`, `hybrid`, `online`). Empty keeps all.
    pub attendance_options: Vec<String>,

    /// Extra stylesheets; environment variables are expanded.
    pub stylesheets: Vec<String>,
    /// Template directories searched before the built-in templates.
    pub template_dirs: Vec<String>,
    /// URL encoded in the cover QR code.
    pub qrcode_url: Option<String>,
    /// Blank note pages appended to the directory.
    pub notes_pages: u32,
    /// Pad the directory to an even number of pages.
    pub even_pages: bool,
    /// `strftime` format of the directory title.
    pub date_fmt: String,
    /// Sections to render, in order.
    pub sections: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_url: None,
            site_domain: None,
            api_url: None,
            nonce_url: None,
            data_dir: PathBuf::from("data"),
            asset_dir: PathBuf::from("assets"),
            section_group1: "day_display".to_string(),
            section_group2: "region_display".to_string(),
            size: "Letter".to_string(),
            color: "lightblue".to_string(),
            header_color: "lightblue".to_string(),
            author: "Recovery Intergroup Council".to_string(),
            description: String::new(),
            address: String::new(),
            phone: String::new(),
            fax: String::new(),
            email: String::new(),
            website: String::new(),
            show_links: true,
            filtercodes: Vec::new(),
            codemap: BTreeMap::new(),
            meetingcodes: BTreeMap::new(),
            zipcodes: BTreeMap::new(),
            attendance_options: Vec::new(),
            stylesheets: Vec::new(),
            template_dirs: Vec::new(),
            qrcode_url: None,
            notes_pages: 0,
            even_pages: true,
            date_fmt: "%B %Y Directory".to_string(),
            sections: default_sections(),
        }
    }
}

/// Default directory sections.
fn default_sections() -> Vec<String> {
    [
        "contact", "codes", "misc", "regions", "index", "list", "readings", "notes",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Runtime overrides from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Data directory.
    pub data_dir: Option<PathBuf>,
    /// Asset directory.
    pub asset_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default config file, if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(&[], &Overrides::default())
    }

    /// Load configuration from the given files and runtime overrides.
    ///
    /// With no files, the default config file is used when present.
    /// Files named explicitly must exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`] for a missing file, or an error if
    /// loading, parsing or validation fails.
    pub fn load_from(files: &[PathBuf], overrides: &Overrides) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if files.is_empty() {
            let default_file = Self::default_config_path();
            if default_file.is_file() {
                figment = merge_file(figment, &default_file);
            } else {
                debug!("No config file at {}, using defaults", default_file.display());
            }
        } else {
            for file in files {
                if !file.is_file() {
                    return Err(Error::ConfigNotFound { path: file.clone() });
                }
                figment = merge_file(figment, file);
            }
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX));
        if let Some(data_dir) = &overrides.data_dir {
            figment = figment.merge(Serialized::default("data_dir", data_dir));
        }
        if let Some(asset_dir) = &overrides.asset_dir {
            figment = figment.merge(Serialized::default("asset_dir", asset_dir));
        }

        let mut config: Config = figment.extract()?;
        config.resolve_site_domain();
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    ///
    /// `config.yaml` in the working directory wins over the per-user file.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.is_file() {
            return local;
        }
        Self::user_config_path()
    }

    /// Per-user configuration file path.
    #[must_use]
    pub fn user_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    fn resolve_site_domain(&mut self) {
        if let Some(site_url) = &self.site_url {
            if let Some(host) = url::Url::parse(site_url)
                .ok()
                .and_then(|url| url.host_str().map(str::to_string))
            {
                self.site_domain = Some(host);
            }
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if let Some(site_url) = &self.site_url {
            let valid = url::Url::parse(site_url)
                .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host());
            if !valid {
                return Err(Error::ConfigValidation {
                    message: format!("site_url is not an absolute http(s) URL: {site_url}"),
                });
            }
        }

        if self.size.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "size must not be empty".to_string(),
            });
        }

        if self.date_fmt.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "date_fmt must not be empty".to_string(),
            });
        }
        if StrftimeItems::new(&self.date_fmt).any(|item| matches!(item, Item::Error)) {
            return Err(Error::ConfigValidation {
                message: format!("date_fmt is not a valid strftime format: {}", self.date_fmt),
            });
        }

        Ok(())
    }

    /// Site domain, or an empty string when no site is configured.
    #[must_use]
    pub fn site_domain(&self) -> &str {
        self.site_domain.as_deref().unwrap_or_default()
    }

    /// Path of the downloaded meetings file.
    #[must_use]
    pub fn meetings_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}-meetings.json", self.site_domain()))
    }

    /// Directory title for a point in time, formatted with `date_fmt`.
    #[must_use]
    pub fn date_title<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        now.format(&self.date_fmt).to_string()
    }

    /// Serialize to YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

fn merge_file(figment: Figment, path: &Path) -> Figment {
    info!("Loaded config file {}", path.display());
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => figment.merge(Toml::file(path)),
        _ => figment.merge(Yaml::file(path)),
    }
}

fn env_var_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
            .expect("valid regex")
    })
}

/// Expand `$VAR` and `${VAR}` references; unset variables are left as written.
#[must_use]
pub fn expand_vars(input: &str) -> String {
    env_var_re()
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map_or("", |m| m.as_str());
            std::env::var(name).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}
