//! Functions exposed to directory templates.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

fn non_slug_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s-]").expect("valid regex"))
}

fn separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-\s]+").expect("valid regex"))
}

/// Turn text into an anchor-safe slug.
///
/// ```
/// assert_eq!(pdf12step::render::slugify("Ellicott City / West"), "ellicott-city-west");
/// ```
#[must_use]
pub fn slugify(value: &str) -> String {
    let lowered = value.to_lowercase();
    let stripped = non_slug_re().replace_all(&lowered, "");
    separator_re()
        .replace_all(stripped.trim(), "-")
        .into_owned()
}

/// Renames and filters meeting type codes for display.
#[derive(Debug, Clone, Default)]
pub struct Codify {
    codemap: BTreeMap<String, String>,
    filtercodes: Vec<String>,
}

impl Codify {
    /// Build from the configured `codemap` and `filtercodes`.
    #[must_use]
    pub fn new(codemap: BTreeMap<String, String>, filtercodes: Vec<String>) -> Self {
        Self {
            codemap,
            filtercodes,
        }
    }

    /// Display codes for a meeting's type codes.
    ///
    /// Empty and filtered codes are dropped, the rest renamed through the
    /// code map. Nothing is returned while no filter codes are configured.
    #[must_use]
    pub fn apply<S: AsRef<str>>(&self, codes: &[S]) -> Vec<String> {
        if self.filtercodes.is_empty() {
            return Vec::new();
        }
        codes
            .iter()
            .map(AsRef::as_ref)
            .filter(|code| !code.is_empty() && !self.filtercodes.iter().any(|f| f == code))
            .map(|code| self.codemap.get(code).map_or(code, String::as_str).to_string())
            .filter(|code| !code.is_empty())
            .collect()
    }
}

/// Anchor markup for a URL, or just the name when links are hidden.
///
/// The second element tells whether the string is markup.
#[must_use]
pub fn link(show_links: bool, url: &str, name: &str, id: Option<&str>) -> (String, bool) {
    if !show_links {
        return (name.to_string(), false);
    }
    let id = id.map(|id| format!(" id=\"{id}\"")).unwrap_or_default();
    (format!("<a{id} href=\"{url}\">{name}</a>"), true)
}
