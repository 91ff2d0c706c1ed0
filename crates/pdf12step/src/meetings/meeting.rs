//! A single meeting listing.
//!
//! A [`Meeting`] wraps the raw TSML object and answers attribute lookups
//! with a default instead of failing. Derived fields (weekday name,
//! zipcode, conference details, ...) are computed on first access and
//! cached for the lifetime of the record.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use super::conference::{self, ConferenceType};
use super::value::Value;

/// Weekday names by TSML day code. Code 12 is the plugin's "appointment" day.
pub const DAYS: [(i64, &str); 8] = [
    (0, "Sunday"),
    (1, "Monday"),
    (2, "Tuesday"),
    (3, "Wednesday"),
    (4, "Thursday"),
    (5, "Friday"),
    (6, "Saturday"),
    (12, "Other"),
];

/// Display name for days without a weekday.
pub const OTHER_DAY: &str = "Other";

/// Names of all derived attributes, in the order they are documented.
pub const DERIVED_FIELDS: [&str; 9] = [
    "day_display",
    "zipcode",
    "conference_url",
    "conference_type",
    "conference_id",
    "conference_id_formatted",
    "attendance_option",
    "region_display",
    "notes_list",
];

fn us_zip_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{5})").expect("valid zipcode regex"))
}

fn ca_postal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([A-Za-z]\d[A-Za-z][ -]?\d[A-Za-z]\d)").expect("valid postal code regex")
    })
}

/// Map a day code to its weekday name.
#[must_use]
pub fn day_name(code: Option<i64>) -> &'static str {
    code.and_then(|code| DAYS.iter().find(|(day, _)| *day == code))
        .map_or(OTHER_DAY, |(_, name)| *name)
}

#[derive(Debug, Clone, Default)]
struct Derived {
    day_display: OnceLock<&'static str>,
    zipcode: OnceLock<String>,
    conference_url: OnceLock<String>,
    conference_type: OnceLock<Option<ConferenceType>>,
    conference_id: OnceLock<String>,
    conference_id_formatted: OnceLock<String>,
    attendance_option: OnceLock<String>,
    region_display: OnceLock<String>,
    notes_list: OnceLock<Vec<String>>,
}

/// One meeting listing with raw and derived fields.
#[derive(Debug, Clone)]
pub struct Meeting {
    fields: BTreeMap<String, Value>,
    default: Value,
    derived: Derived,
}

impl Meeting {
    /// Wrap raw fields; missing fields read as an empty string.
    #[must_use]
    pub fn new(fields: BTreeMap<String, Value>) -> Self {
        Self::with_default(fields, Value::Str(String::new()))
    }

    /// Wrap raw fields with an explicit default for missing fields.
    #[must_use]
    pub fn with_default(fields: BTreeMap<String, Value>, default: Value) -> Self {
        Self {
            fields,
            default,
            derived: Derived::default(),
        }
    }

    /// Build a meeting from a decoded JSON object.
    #[must_use]
    pub fn from_json(object: serde_json::Map<String, serde_json::Value>) -> Self {
        Self::new(
            object
                .into_iter()
                .map(|(key, value)| (key, Value::from(value)))
                .collect(),
        )
    }

    /// The raw fields.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Whether a raw field is present.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Raw field lookup, falling back to the default.
    #[must_use]
    pub fn get(&self, name: &str) -> &Value {
        self.fields.get(name).unwrap_or(&self.default)
    }

    /// Raw field rendered as text.
    #[must_use]
    pub fn text(&self, name: &str) -> String {
        self.get(name).to_string()
    }

    /// Attribute lookup: derived fields first, then raw fields.
    #[must_use]
    pub fn attr(&self, name: &str) -> Cow<'_, Value> {
        match name {
            "day_display" => Cow::Owned(Value::from(self.day_display())),
            "zipcode" => Cow::Owned(Value::from(self.zipcode())),
            "conference_url" => Cow::Owned(Value::from(self.conference_url())),
            "conference_type" => Cow::Owned(
                self.conference_type()
                    .map_or(Value::Null, |kind| Value::from(kind.as_str())),
            ),
            "conference_id" => Cow::Owned(Value::from(self.conference_id())),
            "conference_id_formatted" => Cow::Owned(Value::from(self.conference_id_formatted())),
            "attendance_option" => Cow::Owned(Value::from(self.attendance_option())),
            "region_display" => Cow::Owned(Value::from(self.region_display())),
            "notes_list" => Cow::Owned(Value::List(
                self.notes_list().iter().map(|n| Value::from(n.as_str())).collect(),
            )),
            _ => Cow::Borrowed(self.get(name)),
        }
    }

    // === Raw conveniences ===

    /// Meeting ID.
    #[must_use]
    pub fn id(&self) -> &Value {
        self.get("id")
    }

    /// Meeting name.
    #[must_use]
    pub fn name(&self) -> String {
        self.text("name")
    }

    /// Day code, accepting numeric strings.
    #[must_use]
    pub fn day(&self) -> Option<i64> {
        self.get("day").as_int()
    }

    /// Start time, as the plugin formats it (`19:00`).
    #[must_use]
    pub fn time(&self) -> String {
        self.text("time")
    }

    /// Region name.
    #[must_use]
    pub fn region(&self) -> String {
        self.text("region")
    }

    /// Meeting type codes.
    #[must_use]
    pub fn types(&self) -> Vec<String> {
        self.get("types")
            .as_list()
            .map(|codes| codes.iter().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    // === Derived fields ===

    /// Weekday name for the day code, `Other` when unmapped.
    pub fn day_display(&self) -> &str {
        self.derived.day_display.get_or_init(|| day_name(self.day()))
    }

    /// Postal code from `postal_code` or parsed out of `formatted_address`.
    ///
    /// The first token of the address (normally the street number) is
    /// skipped before searching. Canadian postal codes are matched when the
    /// listing URL is on a `.ca` site.
    pub fn zipcode(&self) -> &str {
        self.derived.zipcode.get_or_init(|| {
            let postal = self.text("postal_code");
            if !postal.trim().is_empty() {
                return postal.trim().to_string();
            }
            let address = self.text("formatted_address");
            let rest = address.split_whitespace().skip(1).collect::<Vec<_>>().join(" ");
            let pattern = if self.text("url").contains(".ca/") {
                ca_postal_re()
            } else {
                us_zip_re()
            };
            pattern
                .find(&rest)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        })
    }

    /// Cleaned, decoded conference URL.
    pub fn conference_url(&self) -> &str {
        self.derived
            .conference_url
            .get_or_init(|| conference::clean_url(&self.text("conference_url")))
    }

    /// Conferencing provider, if there is a conference URL.
    pub fn conference_type(&self) -> Option<&ConferenceType> {
        self.derived
            .conference_type
            .get_or_init(|| ConferenceType::from_url(self.conference_url()))
            .as_ref()
    }

    /// Trailing segment of the conference URL.
    pub fn conference_id(&self) -> &str {
        self.derived.conference_id.get_or_init(|| {
            conference::conference_id(self.conference_url(), self.conference_type())
        })
    }

    /// Conference ID grouped for reading aloud; non-Zoom IDs are unchanged.
    pub fn conference_id_formatted(&self) -> &str {
        self.derived.conference_id_formatted.get_or_init(|| {
            let id = self.conference_id();
            match self.conference_type() {
                Some(ConferenceType::Zoom) => conference::format_zoom_id(id),
                _ => id.to_string(),
            }
        })
    }

    /// `in_person`, `hybrid` or `online`.
    pub fn attendance_option(&self) -> &str {
        self.derived.attendance_option.get_or_init(|| {
            let explicit = self.text("attendance_option");
            if !explicit.is_empty() {
                return explicit;
            }
            let types = self.types();
            let has = |code: &str| types.iter().any(|t| t == code);
            if has("ONL") {
                "online".to_string()
            } else if has("HY") || has("HYB") {
                "hybrid".to_string()
            } else {
                "in_person".to_string()
            }
        })
    }

    /// Region label: `region/sub_region`, `region`, or the joined `regions` list.
    pub fn region_display(&self) -> &str {
        self.derived.region_display.get_or_init(|| {
            let region = self.region();
            let sub_region = self.text("sub_region");
            match (region.is_empty(), sub_region.is_empty()) {
                (false, false) => format!("{region}/{sub_region}"),
                (false, true) => region,
                _ => self
                    .get("regions")
                    .as_list()
                    .map(|regions| {
                        regions
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join("/")
                    })
                    .unwrap_or_default(),
            }
        })
    }

    /// Non-empty note lines with bullet dashes removed.
    pub fn notes_list(&self) -> &[String] {
        self.derived.notes_list.get_or_init(|| {
            self.text("notes")
                .split(['\n', '\r'])
                .map(|line| line.trim_start_matches('-').trim())
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

impl Serialize for Meeting {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}
