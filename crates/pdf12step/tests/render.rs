//! Directory rendering from configuration files and the downloaded fixture.

use std::path::PathBuf;

use pdf12step::config::{Config, Overrides};
use pdf12step::render::{self, LAYOUT_TEMPLATE};
use pdf12step::{Context, Error, RenderOptions};

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("data")
}

fn load_config(dir: &tempfile::TempDir, yaml: &str) -> Config {
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, yaml).unwrap();
    Config::load_from(
        &[path],
        &Overrides {
            data_dir: Some(data_dir()),
            asset_dir: Some(dir.path().join("assets")),
        },
    )
    .unwrap()
}

#[test]
fn test_config_file_and_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(
        &dir,
        "site_url: https://example.com\nauthor: Example Intergroup\nnotes_pages: 2\n",
    );
    assert_eq!(config.site_domain(), "example.com");
    assert_eq!(config.author, "Example Intergroup");
    assert_eq!(config.notes_pages, 2);
    assert_eq!(config.data_dir, data_dir());
    assert_eq!(
        config.meetings_path(),
        data_dir().join("example.com-meetings.json")
    );
}

#[test]
fn test_missing_config_file() {
    let err = Config::load_from(
        &[PathBuf::from("/nonexistent/config.yaml")],
        &Overrides::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::ConfigNotFound { .. }));
}

#[test]
fn test_render_directory() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(
        &dir,
        "site_url: https://example.com\nmeetingcodes:\n  O: Open\n  C: Closed\n  TC: Temporarily Closed\nfiltercodes: [TC]\nnotes_pages: 1\n",
    );
    let context = Context::new(config, &RenderOptions::default()).unwrap();
    assert_eq!(context.meetings().len(), 11);

    let written = context.prerender().unwrap();
    assert_eq!(written, [dir.path().join("assets/css/style.css")]);

    let html = context.render(LAYOUT_TEMPLATE).unwrap();
    for part in [
        "Dawn Patrol",
        "Women&#x27;s Step Study",
        "857 5555 1465",
        "233 555 8121",
        "Childcare available",
        "<td>Closed</td>",
        "Glen Burnie",
        "21061",
        "Sunday",
        "notes-page",
    ] {
        assert!(html.contains(part), "{part} not in output");
    }
    assert!(!html.contains("Severna Park Group"));
    assert!(!html.contains("Temporarily Closed"));
    assert!(html.contains(&context.date_title()));
}

#[test]
fn test_render_attendance_selection() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(
        &dir,
        "site_url: https://example.com\nattendance_options: [online, hybrid]\n",
    );
    let context = Context::new(config, &RenderOptions { limit: Some(3) }).unwrap();
    assert_eq!(context.meetings().len(), 3);
    assert!(context
        .meetings()
        .iter()
        .all(|m| m.attendance_option() != "in_person"));
}

#[test]
fn test_missing_data_hints_download() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(&dir, "site_url: https://other.example.org\n");
    let err = render::get_meetings(&config, None).unwrap_err();
    assert!(err.is_missing_data());
    assert!(err.to_string().contains("download"));
}
