//! Template views of meetings and meeting sets.

use std::sync::Arc;

use minijinja::value::{from_args, Enumerator, Kwargs, Object, ObjectRepr};
use minijinja::{Error, ErrorKind, State, Value as TemplateValue};

use crate::meetings::{Cast, GroupOptions, Meeting, MeetingSet, Value, DERIVED_FIELDS};

/// Convert a meeting value for templates.
fn to_template(value: &Value) -> TemplateValue {
    TemplateValue::from_serialize(value)
}

/// Convert a template value back into a meeting value.
fn from_template(value: &TemplateValue) -> Value {
    serde_json::to_value(value).map_or(Value::Null, Value::from)
}

fn split_kwargs(args: &[TemplateValue]) -> Result<(&[TemplateValue], Option<Kwargs>), Error> {
    match args.split_last() {
        Some((last, rest)) if last.is_kwargs() => Ok((rest, Some(Kwargs::try_from(last.clone())?))),
        _ => Ok((args, None)),
    }
}

fn parse_cast(name: &str) -> Result<Cast, Error> {
    match name {
        "raw" => Ok(Cast::Raw),
        "text" | "str" => Ok(Cast::Text),
        "number" | "int" => Ok(Cast::Number),
        other => Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("unknown cast {other}"),
        )),
    }
}

/// A meeting as seen from templates: attributes resolve derived fields
/// first, then raw fields, then the empty string.
#[derive(Debug)]
pub struct MeetingObject(pub Arc<Meeting>);

impl MeetingObject {
    /// Wrap a meeting as a template value.
    #[must_use]
    pub fn value(meeting: &Arc<Meeting>) -> TemplateValue {
        TemplateValue::from_object(Self(Arc::clone(meeting)))
    }
}

impl Object for MeetingObject {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Map
    }

    fn get_value(self: &Arc<Self>, key: &TemplateValue) -> Option<TemplateValue> {
        let name = key.as_str()?;
        Some(to_template(&self.0.attr(name)))
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        let keys = self
            .0
            .fields()
            .keys()
            .map(String::as_str)
            .chain(DERIVED_FIELDS)
            .map(TemplateValue::from)
            .collect();
        Enumerator::Values(keys)
    }
}

/// A meeting set as seen from templates.
///
/// Iterates and indexes like a list. Cached views are attributes; the
/// collection operations are methods.
#[derive(Debug)]
pub struct MeetingSetObject(pub MeetingSet);

impl MeetingSetObject {
    /// Wrap a meeting set as a template value.
    #[must_use]
    pub fn value(meetings: MeetingSet) -> TemplateValue {
        TemplateValue::from_object(Self(meetings))
    }

    fn groups(groups: impl IntoIterator<Item = (Value, MeetingSet)>) -> impl Iterator<Item = TemplateValue> {
        groups.into_iter().map(|(key, set)| {
            TemplateValue::from(vec![to_template(&key), MeetingSetObject::value(set)])
        })
    }
}

impl Object for MeetingSetObject {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Seq
    }

    fn get_value(self: &Arc<Self>, key: &TemplateValue) -> Option<TemplateValue> {
        if let Some(index) = key.as_usize() {
            return self.0.get(index).map(MeetingObject::value);
        }
        let set = &self.0;
        Some(match key.as_str()? {
            "index" => TemplateValue::from_serialize(set.index()),
            "regions" => TemplateValue::from_serialize(set.regions()),
            "names" => TemplateValue::from_serialize(sorted(set.names())),
            "types" => TemplateValue::from_serialize(sorted(set.types())),
            "zipcodes" => TemplateValue::from_serialize(sorted(set.zipcodes())),
            "by_id" => set
                .by_id()
                .iter()
                .map(|(id, meeting)| (to_template(id), MeetingObject::value(meeting)))
                .collect(),
            _ => return None,
        })
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Seq(self.0.len())
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[TemplateValue],
    ) -> Result<TemplateValue, Error> {
        let set = &self.0;
        match method {
            "value_set" | "sorted_value_set" => {
                let (positional, kwargs) = split_kwargs(args)?;
                let (attr, mut sort, mut filter_none): (String, Option<bool>, Option<bool>) =
                    from_args(positional)?;
                if let Some(kwargs) = kwargs {
                    sort = kwargs.get::<Option<bool>>("sort")?.or(sort);
                    filter_none = kwargs.get::<Option<bool>>("filter_none")?.or(filter_none);
                    kwargs.assert_all_used()?;
                }
                let filter_none = filter_none.unwrap_or(false);
                if method == "sorted_value_set" || sort.unwrap_or(false) {
                    Ok(TemplateValue::from_serialize(set.sorted_value_set(&attr, filter_none)))
                } else {
                    Ok(TemplateValue::from_serialize(set.value_set(&attr, filter_none)))
                }
            }
            "value_count" => {
                let (attr,): (String,) = from_args(args)?;
                Ok(set
                    .value_count(&attr)
                    .iter()
                    .map(|(value, count)| (to_template(value), TemplateValue::from(*count)))
                    .collect())
            }
            "by_value" => {
                let (attr, limit): (String, Option<usize>) = from_args(args)?;
                Ok(set
                    .by_value(&attr, limit)
                    .into_iter()
                    .map(|(key, group)| (to_template(&key), MeetingSetObject::value(group)))
                    .collect())
            }
            "by_value_sorted" => {
                let (positional, kwargs) = split_kwargs(args)?;
                let (attr,): (String,) = from_args(positional)?;
                let mut options = GroupOptions::default();
                if let Some(kwargs) = kwargs {
                    options.limit = kwargs.get::<Option<usize>>("limit")?;
                    if let Some(cast) = kwargs.get::<Option<String>>("cast")? {
                        options.cast = parse_cast(&cast)?;
                    }
                    options.reverse = kwargs.get::<Option<bool>>("reverse")?.unwrap_or(false);
                    kwargs.assert_all_used()?;
                }
                Ok(TemplateValue::from_iter(Self::groups(
                    set.by_value_sorted(&attr, &options),
                )))
            }
            "filter" => {
                let (_, kwargs) = split_kwargs(args)?;
                let Some(kwargs) = kwargs else {
                    return Ok(MeetingSetObject::value(set.clone()));
                };
                let mut query = Vec::new();
                for key in kwargs.args() {
                    let value: TemplateValue = kwargs.get(key)?;
                    query.push((key, from_template(&value)));
                }
                Ok(MeetingSetObject::value(
                    set.filter(&query).cloned().collect(),
                ))
            }
            "filter_types" => {
                let (codes,): (Vec<String>,) = from_args(args)?;
                Ok(MeetingSetObject::value(
                    set.filter_types(&codes).cloned().collect(),
                ))
            }
            "sort" => {
                let (positional, kwargs) = split_kwargs(args)?;
                let attrs: Vec<String> = positional
                    .iter()
                    .map(|arg| arg.as_str().map(str::to_string))
                    .collect::<Option<_>>()
                    .ok_or_else(|| {
                        Error::new(ErrorKind::InvalidOperation, "sort attributes must be strings")
                    })?;
                let reverse = match kwargs {
                    Some(kwargs) => {
                        let reverse = kwargs.get::<Option<bool>>("reverse")?.unwrap_or(false);
                        kwargs.assert_all_used()?;
                        reverse
                    }
                    None => false,
                };
                let attrs: Vec<&str> = attrs.iter().map(String::as_str).collect();
                Ok(MeetingSetObject::value(set.sort(&attrs, reverse)))
            }
            "limit" => {
                let (num,): (usize,) = from_args(args)?;
                Ok(MeetingSetObject::value(set.limit(num)))
            }
            "concat" => {
                let (other,): (TemplateValue,) = from_args(args)?;
                let other = other.downcast_object_ref::<MeetingSetObject>().ok_or_else(|| {
                    Error::new(ErrorKind::InvalidOperation, "can only concat meeting sets")
                })?;
                Ok(MeetingSetObject::value(set.concat(&other.0)))
            }
            _ => Err(Error::from(ErrorKind::UnknownMethod)),
        }
    }
}

fn sorted(values: &std::collections::HashSet<Value>) -> Vec<&Value> {
    let mut values: Vec<&Value> = values.iter().collect();
    values.sort();
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::{context, Environment};
    use serde_json::json;

    fn meetings() -> MeetingSet {
        MeetingSet::from_records(vec![
            json!({"id": 2, "name": "Noon", "day": 1, "time": "12:00", "types": ["O", "ONL"],
                   "conference_url": "https://zoom.us/j/85755551465"}),
            json!({"id": 1, "name": "Dawn", "day": 0, "time": "06:30", "types": ["C"],
                   "formatted_address": "5 Main St, Town, MD 21044", "region": "North"}),
            json!({"id": 3, "name": "Dusk", "day": 1, "time": "19:00", "types": ["O"],
                   "formatted_address": "9 Oak Ave, Town, MD 21043", "region": "South"}),
        ])
    }

    fn render(source: &str) -> String {
        let mut env = Environment::new();
        env.add_template("test", source).unwrap();
        env.get_template("test")
            .unwrap()
            .render(context! { meetings => MeetingSetObject::value(meetings()) })
            .unwrap()
    }

    #[test]
    fn test_iterate_and_attributes() {
        let out = render("{% for m in meetings %}{{ m.name }}:{{ m.day_display }};{% endfor %}");
        assert_eq!(out, "Noon:Monday;Dawn:Sunday;Dusk:Monday;");
    }

    #[test]
    fn test_length_and_index() {
        assert_eq!(render("{{ meetings|length }}/{{ meetings[1].name }}"), "3/Dawn");
    }

    #[test]
    fn test_missing_attribute_is_empty() {
        assert_eq!(render("[{{ meetings[0].location }}]"), "[]");
    }

    #[test]
    fn test_derived_attributes() {
        assert_eq!(
            render("{{ meetings[0].conference_id_formatted }} {{ meetings[0].attendance_option }}"),
            "857 5555 1465 online"
        );
    }

    #[test]
    fn test_filter_method() {
        assert_eq!(
            render("{% for m in meetings.filter(day=1, types='O') %}{{ m.id }}{% endfor %}"),
            "23"
        );
    }

    #[test]
    fn test_sort_method() {
        assert_eq!(
            render("{% for m in meetings.sort('id', reverse=true) %}{{ m.id }}{% endfor %}"),
            "321"
        );
    }

    #[test]
    fn test_by_value_sorted_method() {
        let out = render(
            "{% for day, group in meetings.by_value_sorted('day_display') %}{{ day }}={{ group|length }};{% endfor %}",
        );
        assert_eq!(out, "Monday=2;Sunday=1;");
    }

    #[test]
    fn test_by_value_preserves_order() {
        let out = render("{% set groups = meetings.by_value('day') %}{% for key in groups %}{{ key }}:{{ groups[key]|length }};{% endfor %}");
        assert_eq!(out, "1:2;0:1;");
    }

    #[test]
    fn test_cached_views() {
        assert_eq!(render("{{ meetings.types|join(',') }}"), "C,O,ONL");
        assert_eq!(render("{{ meetings.zipcodes|join(',') }}"), "21043,21044");
        assert_eq!(
            render("{% for name, entry in meetings.index %}{{ name }}@{{ entry.zip }};{% endfor %}"),
            "Dawn@21044;Dusk@21043;"
        );
        assert_eq!(render("{{ meetings.by_id[3].name }}"), "Dusk");
    }

    #[test]
    fn test_limit_filter_types_and_concat() {
        assert_eq!(render("{{ meetings.limit(2)|length }}"), "2");
        assert_eq!(render("{{ meetings.filter_types(['ONL'])|length }}"), "2");
        assert_eq!(render("{{ meetings.concat(meetings.limit(1))|length }}"), "4");
    }

    #[test]
    fn test_value_set_method() {
        assert_eq!(render("{{ meetings.value_set('time', true)|join(' ') }}"), "06:30 12:00 19:00");
        assert_eq!(render("{{ meetings.value_set('time')|length }}"), "3");
        assert_eq!(render("{{ meetings.sorted_value_set('day')|join(' ') }}"), "0 1");
    }

    #[test]
    fn test_value_set_sort_and_filter_none() {
        assert_eq!(render("{{ meetings.value_set('region', true)|join(',') }}"), ",North,South");
        assert_eq!(
            render("{{ meetings.value_set('region', sort=true, filter_none=true)|join(',') }}"),
            "North,South"
        );
        assert_eq!(
            render("{{ meetings.value_set('region', true, true)|join(',') }}"),
            "North,South"
        );
    }

    #[test]
    fn test_unknown_method() {
        let mut env = Environment::new();
        env.add_template("test", "{{ meetings.explode() }}").unwrap();
        let result = env
            .get_template("test")
            .unwrap()
            .render(context! { meetings => MeetingSetObject::value(meetings()) });
        assert!(result.is_err());
    }
}
