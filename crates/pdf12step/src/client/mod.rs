//! Client for the 12 Step Meeting List (TSML) WordPress plugin.
//!
//! The plugin exposes its data through WordPress' `admin-ajax.php`
//! endpoint. Meeting searches need a nonce scraped from a public meetings
//! page; the other entities (locations, groups, regions) do not.

pub mod export;
pub mod transport;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};

pub use export::Format;
pub use transport::{Method, ReqwestTransport, Request, Response, Transport};

/// Sections the plugin can export.
pub const SECTIONS: [&str; 4] = ["meetings", "locations", "groups", "regions"];

/// Default path of the AJAX endpoint, relative to the site URL.
pub const DEFAULT_API_URL: &str = "wordpress/wp-admin/admin-ajax.php";

/// Default path of a page embedding the search nonce.
pub const DEFAULT_NONCE_URL: &str = "meetings/";

const MEETING_DEFAULTS: [(&str, &str); 4] = [
    ("mode", "search"),
    ("distance", "2"),
    ("view", "list"),
    ("distance_units", "m"),
];

fn nonce_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"nonce":"([0-9a-fA-F]+)""#).expect("valid regex"))
}

/// TSML API client.
#[derive(Debug)]
pub struct Client<T = ReqwestTransport> {
    site_url: String,
    api_url: String,
    nonce_url: String,
    transport: T,
    nonce: OnceLock<String>,
    at_root: AtomicBool,
}

impl Client<ReqwestTransport> {
    /// Create a client for a site using the `reqwest` transport.
    ///
    /// # Errors
    ///
    /// Returns an error if `site_url` is empty or the HTTP client cannot be built.
    pub fn new(site_url: &str, api_url: Option<&str>, nonce_url: Option<&str>) -> Result<Self> {
        Self::with_transport(ReqwestTransport::new()?, site_url, api_url, nonce_url)
    }

    /// Create a client from the configured site, API and nonce URLs.
    ///
    /// # Errors
    ///
    /// Returns an error if no site URL is configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.site_url.as_deref().unwrap_or_default(),
            config.api_url.as_deref(),
            config.nonce_url.as_deref(),
        )
    }
}

impl<T: Transport> Client<T> {
    /// Create a client sending requests through `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Client`] if `site_url` is empty.
    pub fn with_transport(
        transport: T,
        site_url: &str,
        api_url: Option<&str>,
        nonce_url: Option<&str>,
    ) -> Result<Self> {
        let site_url = site_url.trim().trim_end_matches('/');
        if site_url.is_empty() {
            return Err(Error::client("site URL required"));
        }
        Ok(Self {
            site_url: site_url.to_string(),
            api_url: api_url.unwrap_or(DEFAULT_API_URL).to_string(),
            nonce_url: nonce_url.unwrap_or(DEFAULT_NONCE_URL).to_string(),
            transport,
            nonce: OnceLock::new(),
            at_root: AtomicBool::new(false),
        })
    }

    /// Site URL without a trailing slash.
    #[must_use]
    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    fn join(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.site_url, path.trim_start_matches('/'))
        }
    }

    /// Absolute URL of the AJAX endpoint.
    ///
    /// Once a request under `/wordpress/` has answered 404, the endpoint is
    /// looked up at the site root instead.
    #[must_use]
    pub fn api_endpoint(&self) -> String {
        let url = self.join(&self.api_url);
        if self.at_root.load(Ordering::Relaxed) {
            url.replacen("/wordpress", "", 1)
        } else {
            url
        }
    }

    /// Absolute URL of the page embedding the nonce.
    #[must_use]
    pub fn nonce_endpoint(&self) -> String {
        self.join(&self.nonce_url)
    }

    /// Search nonce, fetched on first use and cached afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be fetched or holds no nonce.
    pub fn nonce(&self) -> Result<&str> {
        if let Some(nonce) = self.nonce.get() {
            return Ok(nonce);
        }
        let url = self.nonce_endpoint();
        debug!("GET {url}");
        let response = self.transport.send(&Request::get(url.clone(), Vec::new()))?;
        if !response.is_success() {
            return Err(Error::HttpStatus {
                url,
                status: response.status,
            });
        }
        let nonce = nonce_re()
            .captures(&response.body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| Error::client(format!("no nonce found at {url}")))?;
        debug!("Using nonce {nonce}");
        Ok(self.nonce.get_or_init(|| nonce))
    }

    fn dispatch(&self, method: Method, params: Vec<(String, String)>) -> Result<Vec<serde_json::Value>> {
        let url = self.api_endpoint();
        debug!("{method} {url} {params:?}");
        let request = Request {
            method,
            url: url.clone(),
            params,
        };
        let response = self.transport.send(&request)?;
        if response.status == 404
            && url.contains("/wordpress/")
            && !self.at_root.swap(true, Ordering::Relaxed)
        {
            warn!("{url} not found, retrying at the site root");
            return self.dispatch(method, request.params);
        }
        if !response.is_success() {
            return Err(Error::HttpStatus {
                url,
                status: response.status,
            });
        }
        Ok(serde_json::from_str(&response.body)?)
    }

    /// Search meetings.
    ///
    /// `params` override the plugin's search defaults. The nonce and action
    /// are always added last.
    ///
    /// # Errors
    ///
    /// Returns an error if the nonce or the search request fails.
    pub fn meetings(&self, params: &[(&str, &str)]) -> Result<Vec<serde_json::Value>> {
        let mut data: Vec<(String, String)> = MEETING_DEFAULTS
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        for (key, value) in params {
            match data.iter_mut().find(|(existing, _)| existing == key) {
                Some(entry) => entry.1 = (*value).to_string(),
                None => data.push(((*key).to_string(), (*value).to_string())),
            }
        }
        data.push(("nonce".to_string(), self.nonce()?.to_string()));
        data.push(("action".to_string(), "meetings".to_string()));
        self.dispatch(Method::Post, data)
    }

    /// Fetch a TSML entity listing (`tsml_{entity}` action).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub fn tsml(&self, entity: &str) -> Result<Vec<serde_json::Value>> {
        self.dispatch(
            Method::Get,
            vec![("action".to_string(), format!("tsml_{entity}"))],
        )
    }

    /// All locations.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub fn locations(&self) -> Result<Vec<serde_json::Value>> {
        self.tsml("locations")
    }

    /// All groups.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub fn groups(&self) -> Result<Vec<serde_json::Value>> {
        self.tsml("groups")
    }

    /// All regions.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub fn regions(&self) -> Result<Vec<serde_json::Value>> {
        self.tsml("regions")
    }

    /// Fetch one section by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownSection`] for names outside [`SECTIONS`].
    pub fn section(&self, name: &str) -> Result<Vec<serde_json::Value>> {
        match name {
            "meetings" => self.meetings(&[]),
            "locations" => self.locations(),
            "groups" => self.groups(),
            "regions" => self.regions(),
            other => Err(Error::UnknownSection(other.to_string())),
        }
    }

    /// Download sections to `{data_dir}/{site_domain}-{section}.{ext}`.
    ///
    /// An empty `sections` slice downloads every section. Returns the
    /// written paths.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown sections, failed requests, or if the
    /// files cannot be written.
    pub fn download<S: AsRef<str>>(
        &self,
        sections: &[S],
        format: Format,
        data_dir: &Path,
        site_domain: &str,
    ) -> Result<Vec<PathBuf>> {
        let sections: Vec<&str> = if sections.is_empty() {
            SECTIONS.to_vec()
        } else {
            sections.iter().map(AsRef::as_ref).collect()
        };
        if let Some(unknown) = sections.iter().find(|s| !SECTIONS.contains(*s)) {
            return Err(Error::UnknownSection((*unknown).to_string()));
        }

        if !data_dir.exists() {
            warn!("Data directory not found, creating {}", data_dir.display());
            std::fs::create_dir_all(data_dir).map_err(|source| Error::DirectoryCreate {
                path: data_dir.to_path_buf(),
                source,
            })?;
        }

        let mut written = Vec::with_capacity(sections.len());
        for section in sections {
            let data = self.section(section)?;
            let path = data_path(data_dir, site_domain, section, format);
            export::write(&data, format, &path)?;
            info!("Downloaded {} ({} records)", path.display(), data.len());
            written.push(path);
        }
        Ok(written)
    }
}

/// Location of a downloaded section file.
#[must_use]
pub fn data_path(data_dir: &Path, site_domain: &str, section: &str, format: Format) -> PathBuf {
    data_dir.join(format!("{site_domain}-{section}.{}", format.extension()))
}
