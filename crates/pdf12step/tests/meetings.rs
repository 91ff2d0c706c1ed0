//! Meeting set behavior against the downloaded fixture.

use std::path::PathBuf;

use pdf12step::meetings::{GroupOptions, MeetingSet, Value};

fn fixture() -> MeetingSet {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("example.com-meetings.json");
    MeetingSet::load(path).unwrap()
}

#[test]
fn test_load() {
    let meetings = fixture();
    assert_eq!(meetings.len(), 12);
    assert_eq!((&meetings + &meetings).len(), 24);
}

#[test]
fn test_types() {
    let types = fixture().sorted_value_set("types", false);
    let codes: Vec<String> = types.iter().map(ToString::to_string).collect();
    assert_eq!(
        codes,
        ["B", "BE", "C", "D", "HY", "M", "O", "ONL", "ST", "TC", "W"]
    );
    assert_eq!(fixture().types().len(), 11);
}

#[test]
fn test_attendance_groups_partition_the_set() {
    let meetings = fixture();
    let groups = meetings.by_value("attendance_option", None);
    let sizes: Vec<(String, usize)> = groups
        .iter()
        .map(|(key, set)| (key.to_string(), set.len()))
        .collect();
    assert_eq!(
        sizes,
        [
            ("in_person".to_string(), 8),
            ("online".to_string(), 2),
            ("hybrid".to_string(), 2),
        ]
    );
    let total: usize = groups.values().map(MeetingSet::len).sum();
    assert_eq!(total, meetings.len());
}

#[test]
fn test_filter() {
    let meetings = fixture();
    let query = [
        ("attendance_option", Value::from("in_person")),
        ("time", Value::from("19:00")),
    ];
    let matched: Vec<_> = meetings.filter(&query).collect();
    assert_eq!(matched.len(), 3);
    for meeting in matched {
        assert_eq!(meeting.attendance_option(), "in_person");
        assert_eq!(meeting.time(), "19:00");
    }
}

#[test]
fn test_value_count() {
    let meetings = fixture();
    assert_eq!(meetings.value_count("location")[&Value::from("")], 2);
    let ids = meetings.value_count("id");
    assert_eq!(ids.len(), meetings.len());
    assert!(ids.values().all(|count| *count == 1));
}

#[test]
fn test_by_value_limit() {
    assert_eq!(fixture().by_value("id", Some(3)).len(), 3);
}

#[test]
fn test_online_locations_sorted() {
    let meetings = fixture();
    let online = &meetings.by_value("attendance_option", None)[&Value::from("online")];
    let locations = online.by_value_sorted("location", &GroupOptions::default());
    assert_eq!(locations[0].0, Value::from(""));
}

#[test]
fn test_index() {
    let meetings = fixture();
    let index = meetings.index();
    assert_eq!(index.len(), 10);
    let (name, entry) = &index[0];
    assert_eq!(name, "Beginners Hybrid");
    assert_eq!(entry.zip, "21061");
    assert_eq!(entry.region, "Glen Burnie");
    assert_eq!(entry.days[&Value::Int(6)], Value::Int(319_575));
}

#[test]
fn test_regions() {
    let meetings = fixture();
    let regions = meetings.regions();
    assert_eq!(regions.len(), 10);
    let names: Vec<&str> = regions.iter().map(|(name, _)| name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
    assert!(regions[0].1.iter().all(|zip| zip.len() == 5));
}

#[test]
fn test_zipcodes() {
    assert_eq!(fixture().zipcodes().len(), 10);
}

#[test]
fn test_sort_by_id() {
    let meetings = fixture();
    let original: Vec<Value> = meetings.iter().map(|m| m.id().clone()).collect();
    let sorted: Vec<Value> = meetings
        .sort(&["id"], false)
        .iter()
        .map(|m| m.id().clone())
        .collect();
    assert_ne!(sorted, original);
    assert_eq!(sorted[0], Value::Int(319_513));
    assert!(sorted.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_conference_ids() {
    let meetings = fixture();
    let by_id = meetings.by_id();
    assert_eq!(
        by_id[&Value::Int(319_601)].conference_id_formatted(),
        "857 5555 1465"
    );
    assert_eq!(
        by_id[&Value::Int(319_612)].conference_id_formatted(),
        "123 555 137"
    );
    assert_eq!(
        by_id[&Value::Int(319_575)].conference_id_formatted(),
        "233 555 8121"
    );
}

#[test]
fn test_notes_list() {
    let meetings = fixture();
    let notes = meetings.by_id()[&Value::Int(319_588)].notes_list();
    assert_eq!(notes, ["Childcare available", "Parking in rear"]);
}

#[test]
fn test_derived_values_are_cached() {
    let meetings = fixture();
    let meeting = &meetings.as_slice()[0];
    assert!(std::ptr::eq(meeting.zipcode(), meeting.zipcode()));
    assert!(std::ptr::eq(meetings.index(), meetings.index()));
}
