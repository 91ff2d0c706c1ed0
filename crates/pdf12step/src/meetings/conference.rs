//! Conference link handling.
//!
//! Online meetings carry a `conference_url` that is frequently pasted in
//! by hand: doubled schemes, percent-encoded trailing spaces and
//! non-breaking spaces are all common. These helpers turn such a URL
//! into something printable.

use std::fmt;

use percent_encoding::percent_decode_str;
use url::Url;

const SCHEME_SEP: &str = "://";

/// Clean and percent-decode a conference URL.
///
/// When the scheme separator occurs exactly twice (a URL pasted twice),
/// everything from the second separator on is dropped. Three or more
/// occurrences are left alone.
#[must_use]
pub fn clean_url(url: &str) -> String {
    let collapsed = if url.matches(SCHEME_SEP).count() == 2 {
        url.match_indices(SCHEME_SEP)
            .nth(1)
            .map_or(url, |(idx, _)| &url[..idx])
    } else {
        url
    };
    percent_decode_str(collapsed)
        .decode_utf8_lossy()
        .trim()
        .to_string()
}

/// Conferencing provider inferred from a URL host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConferenceType {
    /// Zoom meeting.
    Zoom,
    /// GoToMeeting.
    GoToMeeting,
    /// Google Meet.
    Google,
    /// Any other provider, identified by its host.
    Other(String),
}

impl ConferenceType {
    /// Classify a cleaned conference URL. Empty or unparsable URLs have no type.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        if url.is_empty() {
            return None;
        }
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?.to_lowercase();
        Some(if host.contains("zoom") {
            Self::Zoom
        } else if host.contains("gotomeet") {
            Self::GoToMeeting
        } else if host.contains("google") {
            Self::Google
        } else {
            Self::Other(host)
        })
    }

    /// Short label used in templates.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Zoom => "zoom",
            Self::GoToMeeting => "gotomeet",
            Self::Google => "google",
            Self::Other(host) => host,
        }
    }
}

impl fmt::Display for ConferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trailing path segment of a cleaned URL.
///
/// The query string is only stripped for Zoom links, whose IDs are numeric.
#[must_use]
pub fn conference_id(url: &str, kind: Option<&ConferenceType>) -> String {
    if url.is_empty() {
        return String::new();
    }
    let last = url.rsplit('/').next().unwrap_or_default();
    match kind {
        Some(ConferenceType::Zoom) => last.split('?').next().unwrap_or_default().to_string(),
        _ => last.to_string(),
    }
}

/// Group a Zoom ID as `XXX XXXX XXXX` (11 digits) or `XXX XXX XXXX`.
///
/// Any length other than 11 uses the 10-digit split. Slices are clamped, so
/// IDs shorter than six characters end with empty groups.
#[must_use]
pub fn format_zoom_id(id: &str) -> String {
    if id.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = id.chars().collect();
    let len = chars.len();
    let split = if len == 11 { 7 } else { 6 };
    let first = 3.min(len);
    let second = split.min(len);
    let head: String = chars[..first].iter().collect();
    let middle: String = chars[first..second].iter().collect();
    let tail: String = chars[second..].iter().collect();
    format!("{head} {middle} {tail}")
}
