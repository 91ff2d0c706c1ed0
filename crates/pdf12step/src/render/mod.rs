//! Directory rendering.
//!
//! A [`Context`] loads the configured meeting selection and renders it
//! through minijinja templates. Templates are looked up in the configured
//! template directories first, then among the built-in templates.

mod helpers;
mod objects;
pub mod templates;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Local};
use minijinja::value::Kwargs;
use minijinja::{context, Environment, Error as TemplateError, ErrorKind, Value as TemplateValue};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{expand_vars, Config};
use crate::error::{Error, Result};
use crate::meetings::{MeetingSet, DAYS};

pub use helpers::{link, slugify, Codify};
pub use objects::{MeetingObject, MeetingSetObject};
pub use templates::{BASE_CSS, LAYOUT_TEMPLATE};

/// Options for building a [`Context`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Render at most this many meetings. `None` or `0` renders all.
    pub limit: Option<usize>,
}

/// Load the configured meeting selection from the data directory.
///
/// # Errors
///
/// Returns [`Error::MeetingsNotFound`] when the data has not been
/// downloaded, or [`Error::EmptySelection`] when the attendance filter
/// leaves nothing.
pub fn get_meetings(config: &Config, limit: Option<usize>) -> Result<MeetingSet> {
    let meetings = MeetingSet::load(config.meetings_path())?;
    select_meetings(meetings, config, limit)
}

/// Apply the configured attendance and type filters, then the limit.
///
/// # Errors
///
/// Returns [`Error::EmptySelection`] when `attendance_options` matches
/// nothing or `filtercodes` excludes every meeting.
pub fn select_meetings(
    meetings: MeetingSet,
    config: &Config,
    limit: Option<usize>,
) -> Result<MeetingSet> {
    let mut meetings = meetings;
    if !config.attendance_options.is_empty() {
        meetings = meetings
            .by_value("attendance_option", None)
            .into_iter()
            .filter(|(option, _)| {
                config
                    .attendance_options
                    .iter()
                    .any(|wanted| option.as_str() == Some(wanted.as_str()))
            })
            .fold(MeetingSet::default(), |selected, (_, group)| selected + group);
        if meetings.is_empty() {
            return Err(Error::empty_selection(format!(
                "attendance_options {:?}",
                config.attendance_options
            )));
        }
    }
    if !config.filtercodes.is_empty() {
        meetings = meetings.filter_types(&config.filtercodes).cloned().collect();
        if meetings.is_empty() {
            return Err(Error::empty_selection(format!(
                "filtercodes {:?}",
                config.filtercodes
            )));
        }
    }
    if let Some(limit) = limit.filter(|n| *n > 0) {
        meetings = meetings.limit(limit);
    }
    debug!("Selected {} meetings", meetings.len());
    Ok(meetings)
}

#[derive(Debug, Serialize)]
struct Now {
    year: i32,
    month: u32,
    day: u32,
    iso: String,
}

/// Rendering context: configuration, meetings and the template environment.
#[derive(Debug)]
pub struct Context {
    config: Config,
    meetings: MeetingSet,
    now: DateTime<Local>,
    env: Environment<'static>,
}

impl Context {
    /// Build a context from the downloaded meeting data.
    ///
    /// # Errors
    ///
    /// Returns an error if the meetings cannot be loaded or a template
    /// directory is missing.
    pub fn new(config: Config, options: &RenderOptions) -> Result<Self> {
        let meetings = get_meetings(&config, options.limit)?;
        info!("Loaded {} meetings for rendering", meetings.len());
        Self::with_meetings(config, meetings)
    }

    /// Build a context around an already selected meeting set.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured template directory is missing.
    pub fn with_meetings(config: Config, meetings: MeetingSet) -> Result<Self> {
        let dirs = template_dirs(&config)?;
        let mut env = Environment::new();
        env.set_loader(move |name| load_template(&dirs, name));

        let codify = Codify::new(config.codemap.clone(), config.filtercodes.clone());
        let show_links = config.show_links;
        env.add_function("slugify", |value: String| slugify(&value));
        env.add_function("codify", move |codes: TemplateValue| -> std::result::Result<Vec<String>, TemplateError> {
            let codes: Vec<String> = codes
                .try_iter()?
                .map(|code| code.as_str().map_or_else(|| code.to_string(), str::to_string))
                .collect();
            Ok(codify.apply(&codes))
        });
        env.add_function(
            "link",
            move |url: String, name: String, kwargs: Kwargs| -> std::result::Result<TemplateValue, TemplateError> {
                let id: Option<String> = kwargs.get("id")?;
                kwargs.assert_all_used()?;
                let (text, markup) = link(show_links, &url, &name, id.as_deref());
                Ok(if markup {
                    TemplateValue::from_safe_string(text)
                } else {
                    TemplateValue::from(text)
                })
            },
        );

        Ok(Self {
            config,
            meetings,
            now: Local::now(),
            env,
        })
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The selected meetings.
    #[must_use]
    pub fn meetings(&self) -> &MeetingSet {
        &self.meetings
    }

    /// Directory title from `date_fmt`.
    #[must_use]
    pub fn date_title(&self) -> String {
        self.config.date_title(&self.now)
    }

    /// Stylesheets to link: the base sheet, then the configured ones.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AssetNotFound`] for a configured sheet that does not exist.
    pub fn stylesheets(&self) -> Result<Vec<String>> {
        let mut sheets = vec![BASE_CSS.to_string()];
        for sheet in &self.config.stylesheets {
            let path = absolute(&expand_vars(sheet))?;
            if !path.is_file() {
                return Err(Error::AssetNotFound {
                    kind: "CSS file",
                    path,
                });
            }
            sheets.push(path.display().to_string());
        }
        Ok(sheets)
    }

    /// Legend of meeting codes: filtered codes dropped, the rest renamed.
    #[must_use]
    pub fn filtered_codes(&self) -> Vec<(String, String)> {
        self.config
            .meetingcodes
            .iter()
            .filter(|(code, _)| !self.config.filtercodes.contains(*code))
            .map(|(code, name)| {
                let code = self.config.codemap.get(code).unwrap_or(code);
                (code.clone(), name.clone())
            })
            .collect()
    }

    /// Configured zipcodes grouped by region.
    #[must_use]
    pub fn zipcodes_by_region(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut by_region: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (zipcode, region) in &self.config.zipcodes {
            by_region
                .entry(region.clone())
                .or_default()
                .insert(zipcode.clone());
        }
        by_region
    }

    fn variables(&self) -> Result<TemplateValue> {
        let days: TemplateValue = DAYS
            .iter()
            .map(|(code, name)| (TemplateValue::from(*code), TemplateValue::from(*name)))
            .collect();
        let now = Now {
            year: self.now.year(),
            month: self.now.month(),
            day: self.now.day(),
            iso: self.now.to_rfc3339(),
        };
        Ok(context! {
            meetings => MeetingSetObject::value(self.meetings.clone()),
            config => TemplateValue::from_serialize(&self.config),
            days => days,
            now => TemplateValue::from_serialize(&now),
            date_fmt => self.date_title(),
            stylesheets => self.stylesheets()?,
            filtered_codes => self.filtered_codes(),
            zipcodes_by_region => TemplateValue::from_serialize(self.zipcodes_by_region()),
        })
    }

    /// Render a template by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the template cannot be found or fails to render.
    pub fn render(&self, template: &str) -> Result<String> {
        let rendered = self
            .env
            .get_template(template)?
            .render(self.variables()?)?;
        info!("Rendered {template}");
        Ok(rendered)
    }

    /// Render asset templates into the asset directory. Returns the written paths.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or the files cannot be written.
    pub fn prerender(&self) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for (template, dest) in templates::ASSET_TEMPLATES {
            let path = self.config.asset_dir.join(dest);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            std::fs::write(&path, self.render(template)?)?;
            debug!("Prerendered {template} to {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

fn absolute(path: &str) -> Result<PathBuf> {
    let path = Path::new(path);
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Resolve the configured template directories.
fn template_dirs(config: &Config) -> Result<Vec<PathBuf>> {
    config
        .template_dirs
        .iter()
        .map(|dir| {
            let path = absolute(&expand_vars(dir))?;
            if path.is_dir() {
                Ok(path)
            } else {
                Err(Error::AssetNotFound {
                    kind: "template folder",
                    path,
                })
            }
        })
        .collect()
}

fn load_template(dirs: &[PathBuf], name: &str) -> std::result::Result<Option<String>, TemplateError> {
    if name.split(['/', '\\']).any(|segment| segment == "..") {
        return Ok(None);
    }
    for dir in dirs {
        let path = dir.join(name);
        if path.is_file() {
            return std::fs::read_to_string(&path).map(Some).map_err(|err| {
                TemplateError::new(
                    ErrorKind::InvalidOperation,
                    format!("could not read template {}", path.display()),
                )
                .with_source(err)
            });
        }
    }
    Ok(templates::embedded(name).map(str::to_string))
}
