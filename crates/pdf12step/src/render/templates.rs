//! Built-in directory templates.

/// Main directory template.
pub const LAYOUT_TEMPLATE: &str = "layout.html";

/// Base stylesheet, rendered into the asset directory before the page.
pub const BASE_CSS: &str = "assets/css/style.css";

/// Asset templates and their destination relative to the asset directory.
pub const ASSET_TEMPLATES: [(&str, &str); 1] = [(BASE_CSS, "css/style.css")];

const EMBEDDED: &[(&str, &str)] = &[
    (LAYOUT_TEMPLATE, include_str!("../../templates/layout.html")),
    (BASE_CSS, include_str!("../../templates/assets/css/style.css")),
    ("macros.html", include_str!("../../templates/macros.html")),
    ("sections/contact.html", include_str!("../../templates/sections/contact.html")),
    ("sections/codes.html", include_str!("../../templates/sections/codes.html")),
    ("sections/misc.html", include_str!("../../templates/sections/misc.html")),
    ("sections/regions.html", include_str!("../../templates/sections/regions.html")),
    ("sections/index.html", include_str!("../../templates/sections/index.html")),
    ("sections/list.html", include_str!("../../templates/sections/list.html")),
    ("sections/readings.html", include_str!("../../templates/sections/readings.html")),
    ("sections/notes.html", include_str!("../../templates/sections/notes.html")),
];

/// Source of a built-in template.
#[must_use]
pub fn embedded(name: &str) -> Option<&'static str> {
    EMBEDDED
        .iter()
        .find(|(template, _)| *template == name)
        .map(|(_, source)| *source)
}

/// Names of all built-in templates.
pub fn names() -> impl Iterator<Item = &'static str> {
    EMBEDDED.iter().map(|(name, _)| *name)
}
