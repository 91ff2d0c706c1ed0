//! Meeting data model.
//!
//! This module holds the in-memory view of a downloaded TSML meeting list:
//!
//! - **[`Meeting`]**: one listing with raw fields and cached derived fields.
//! - **[`MeetingSet`]**: an ordered collection supporting value extraction,
//!   grouping, filtering, sorting and a few cached indexes used by the
//!   directory templates.
//!
//! # Example
//!
//! ```
//! use pdf12step::meetings::{MeetingSet, Value};
//!
//! let meetings = MeetingSet::from_records(vec![
//!     serde_json::json!({"id": 1, "name": "Dawn Patrol", "day": 1, "types": ["O"]}),
//!     serde_json::json!({"id": 2, "name": "Noon Group", "day": 1, "types": ["ONL"]}),
//! ]);
//!
//! let online: MeetingSet = meetings
//!     .filter(&[("attendance_option", Value::from("online"))])
//!     .cloned()
//!     .collect();
//! assert_eq!(online.len(), 1);
//! assert_eq!(meetings.by_value("day_display", None).len(), 1);
//! ```

pub mod conference;
mod meeting;
mod value;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ops::Add;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use conference::ConferenceType;
pub use meeting::{day_name, Meeting, DAYS, DERIVED_FIELDS, OTHER_DAY};
pub use value::Value;

/// How group keys are converted before sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cast {
    /// Keep the raw value.
    Raw,
    /// Compare the keys as text.
    #[default]
    Text,
    /// Compare the keys as integers where they parse; other keys are kept as-is.
    Number,
}

impl Cast {
    /// Apply the cast to a group key.
    #[must_use]
    pub fn apply(self, value: Value) -> Value {
        match self {
            Self::Raw => value,
            Self::Text => Value::Str(value.to_string()),
            Self::Number => value.as_int().map_or(value, Value::Int),
        }
    }
}

/// Options for [`MeetingSet::by_value_sorted`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupOptions {
    /// Maximum number of meetings visited before grouping. `None` or `0` visits all.
    pub limit: Option<usize>,
    /// Key conversion applied before sorting.
    pub cast: Cast,
    /// Sort descending.
    pub reverse: bool,
}

/// Index section entry: where and when a named meeting meets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    /// Zipcode of the first listing with this name.
    pub zip: String,
    /// Region of the first listing with this name.
    pub region: String,
    /// Day code to meeting ID.
    pub days: BTreeMap<Value, Value>,
}

#[derive(Debug, Clone, Default)]
struct Views {
    by_id: OnceLock<IndexMap<Value, Arc<Meeting>>>,
    index: OnceLock<Vec<(String, IndexEntry)>>,
    regions: OnceLock<Vec<(String, BTreeSet<String>)>>,
    names: OnceLock<HashSet<Value>>,
    types: OnceLock<HashSet<Value>>,
    zipcodes: OnceLock<HashSet<Value>>,
}

/// An ordered collection of meetings.
///
/// Operations never modify the set in place; grouping, filtering and
/// sorting build new sets that share the underlying [`Meeting`] records.
#[derive(Debug, Clone, Default)]
pub struct MeetingSet {
    items: Vec<Arc<Meeting>>,
    views: Views,
}

impl MeetingSet {
    /// Load meetings from a JSON file holding an array of objects.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MeetingsNotFound`] if the file does not exist, or an
    /// I/O or JSON error if it cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::MeetingsNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        let records: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_str(&text)?;
        let meetings = Self::from_objects(records);
        info!("Loaded {} meetings from {}", meetings.len(), path.display());
        Ok(meetings)
    }

    /// Build a set from decoded JSON values. Values that are not objects are skipped.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = serde_json::Value>) -> Self {
        Self::from_objects(records.into_iter().filter_map(|record| match record {
            serde_json::Value::Object(object) => Some(object),
            other => {
                debug!("Skipping non-object meeting record: {other}");
                None
            }
        }))
    }

    /// Build a set from decoded JSON objects.
    #[must_use]
    pub fn from_objects(
        objects: impl IntoIterator<Item = serde_json::Map<String, serde_json::Value>>,
    ) -> Self {
        objects
            .into_iter()
            .map(|object| Arc::new(Meeting::from_json(object)))
            .collect()
    }

    /// Build a set from already shared meetings.
    #[must_use]
    pub fn from_meetings(items: Vec<Arc<Meeting>>) -> Self {
        Self {
            items,
            views: Views::default(),
        }
    }

    /// Number of meetings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Meeting at a position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<Meeting>> {
        self.items.get(index)
    }

    /// Iterate the meetings in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Meeting>> {
        self.items.iter()
    }

    /// The meetings as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Arc<Meeting>] {
        &self.items
    }

    /// The first `num` meetings.
    #[must_use]
    pub fn limit(&self, num: usize) -> Self {
        self.items.iter().take(num).cloned().collect()
    }

    /// This set followed by `other`.
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        self.items.iter().chain(other.items.iter()).cloned().collect()
    }

    /// Distinct values of an attribute. List values contribute their members.
    ///
    /// With `filter_none`, falsy values (empty strings, nulls, ...) are left out.
    #[must_use]
    pub fn value_set(&self, attr: &str, filter_none: bool) -> HashSet<Value> {
        let mut values = HashSet::new();
        for meeting in &self.items {
            let value = meeting.attr(attr).into_owned();
            match value {
                Value::List(members) => values.extend(
                    members
                        .into_iter()
                        .filter(|member| !filter_none || member.is_truthy()),
                ),
                value if filter_none && !value.is_truthy() => {}
                value => {
                    values.insert(value);
                }
            }
        }
        values
    }

    /// [`value_set`](Self::value_set) in ascending order.
    #[must_use]
    pub fn sorted_value_set(&self, attr: &str, filter_none: bool) -> Vec<Value> {
        let mut values: Vec<Value> = self.value_set(attr, filter_none).into_iter().collect();
        values.sort();
        values
    }

    /// Occurrences of each value of an attribute, in first-seen order.
    ///
    /// List values are counted as a whole, not per member.
    #[must_use]
    pub fn value_count(&self, attr: &str) -> IndexMap<Value, usize> {
        let mut counter = IndexMap::new();
        for meeting in &self.items {
            *counter.entry(meeting.attr(attr).into_owned()).or_insert(0) += 1;
        }
        counter
    }

    /// Group meetings by an attribute value, in first-seen key order.
    ///
    /// A list value puts the meeting in the group of every member; an empty
    /// list groups under [`Value::Null`]. `limit` caps the total number of
    /// meetings visited, not the size of each group.
    #[must_use]
    pub fn by_value(&self, attr: &str, limit: Option<usize>) -> IndexMap<Value, MeetingSet> {
        let limit = limit.filter(|n| *n > 0).unwrap_or(usize::MAX);
        let mut groups: IndexMap<Value, Vec<Arc<Meeting>>> = IndexMap::new();
        for meeting in self.items.iter().take(limit) {
            match meeting.attr(attr).into_owned() {
                Value::List(members) if members.is_empty() => {
                    groups.entry(Value::Null).or_default().push(Arc::clone(meeting));
                }
                Value::List(members) => {
                    for member in members {
                        groups.entry(member).or_default().push(Arc::clone(meeting));
                    }
                }
                value => groups.entry(value).or_default().push(Arc::clone(meeting)),
            }
        }
        groups
            .into_iter()
            .map(|(key, items)| (key, Self::from_meetings(items)))
            .collect()
    }

    /// Group meetings by an attribute value and sort the groups by key.
    #[must_use]
    pub fn by_value_sorted(&self, attr: &str, options: &GroupOptions) -> Vec<(Value, MeetingSet)> {
        let mut groups: Vec<(Value, MeetingSet)> = self
            .by_value(attr, options.limit)
            .into_iter()
            .map(|(key, set)| (options.cast.apply(key), set))
            .collect();
        if options.reverse {
            groups.sort_by(|a, b| b.0.cmp(&a.0));
        } else {
            groups.sort_by(|a, b| a.0.cmp(&b.0));
        }
        groups
    }

    /// Meetings matching every `(attribute, value)` constraint.
    ///
    /// A constraint matches when the attribute equals the value, when the
    /// value is a list containing the attribute, or when the attribute is a
    /// list containing the value.
    pub fn filter<'a>(
        &'a self,
        query: &'a [(&'a str, Value)],
    ) -> impl Iterator<Item = &'a Arc<Meeting>> + 'a {
        self.items.iter().filter(move |meeting| {
            query.iter().all(|(attr, expected)| {
                let actual = meeting.attr(attr);
                *actual == *expected || expected.contains(&actual) || actual.contains(expected)
            })
        })
    }

    /// Meetings whose `types` share no code with `exclude`.
    pub fn filter_types<'a, S: AsRef<str>>(
        &'a self,
        exclude: &'a [S],
    ) -> impl Iterator<Item = &'a Arc<Meeting>> + 'a {
        self.items.iter().filter(move |meeting| {
            !meeting
                .types()
                .iter()
                .any(|code| exclude.iter().any(|excluded| code == excluded.as_ref()))
        })
    }

    /// A copy ordered by the given attributes. The sort is stable.
    #[must_use]
    pub fn sort(&self, attrs: &[&str], reverse: bool) -> Self {
        let mut keyed: Vec<(Vec<Value>, Arc<Meeting>)> = self
            .items
            .iter()
            .map(|meeting| {
                let key = attrs.iter().map(|attr| meeting.attr(attr).into_owned()).collect();
                (key, Arc::clone(meeting))
            })
            .collect();
        if reverse {
            keyed.sort_by(|a, b| b.0.cmp(&a.0));
        } else {
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
        }
        keyed.into_iter().map(|(_, meeting)| meeting).collect()
    }

    // === Cached views ===

    /// Meetings by ID; the first meeting wins when IDs repeat.
    pub fn by_id(&self) -> &IndexMap<Value, Arc<Meeting>> {
        self.views.by_id.get_or_init(|| {
            let mut by_id = IndexMap::new();
            for meeting in &self.items {
                by_id
                    .entry(meeting.id().clone())
                    .or_insert_with(|| Arc::clone(meeting));
            }
            by_id
        })
    }

    /// Which named meetings meet in which zipcode and on which days, sorted by name.
    ///
    /// Meetings without a zipcode are left out. Numeric day codes given as
    /// text are keyed as integers.
    pub fn index(&self) -> &[(String, IndexEntry)] {
        self.views.index.get_or_init(|| {
            let mut entries: BTreeMap<String, IndexEntry> = BTreeMap::new();
            for meeting in &self.items {
                let zip = meeting.zipcode();
                if zip.is_empty() {
                    continue;
                }
                entries
                    .entry(meeting.name())
                    .or_insert_with(|| IndexEntry {
                        zip: zip.to_string(),
                        region: meeting.region(),
                        days: BTreeMap::new(),
                    })
                    .days
                    .insert(
                        meeting.day().map_or_else(|| meeting.get("day").clone(), Value::Int),
                        meeting.id().clone(),
                    );
            }
            entries.into_iter().collect()
        })
    }

    /// Regions with the zipcodes their meetings use, sorted by region.
    pub fn regions(&self) -> &[(String, BTreeSet<String>)] {
        self.views.regions.get_or_init(|| {
            let mut regions: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
            for meeting in &self.items {
                let zip = meeting.zipcode();
                if !zip.is_empty() {
                    regions
                        .entry(meeting.region())
                        .or_default()
                        .insert(zip.to_string());
                }
            }
            regions.into_iter().collect()
        })
    }

    /// Distinct meeting names.
    pub fn names(&self) -> &HashSet<Value> {
        self.views.names.get_or_init(|| self.value_set("name", false))
    }

    /// Distinct meeting type codes.
    pub fn types(&self) -> &HashSet<Value> {
        self.views.types.get_or_init(|| self.value_set("types", false))
    }

    /// Distinct non-empty zipcodes.
    pub fn zipcodes(&self) -> &HashSet<Value> {
        self.views
            .zipcodes
            .get_or_init(|| self.value_set("zipcode", true))
    }
}

impl FromIterator<Arc<Meeting>> for MeetingSet {
    fn from_iter<I: IntoIterator<Item = Arc<Meeting>>>(iter: I) -> Self {
        Self::from_meetings(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a MeetingSet {
    type Item = &'a Arc<Meeting>;
    type IntoIter = std::slice::Iter<'a, Arc<Meeting>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Add for &MeetingSet {
    type Output = MeetingSet;

    fn add(self, other: Self) -> MeetingSet {
        self.concat(other)
    }
}

impl Add for MeetingSet {
    type Output = MeetingSet;

    fn add(mut self, other: Self) -> MeetingSet {
        self.items.extend(other.items);
        Self::from_meetings(self.items)
    }
}
