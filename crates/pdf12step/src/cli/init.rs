//! Interactive creation of a configuration file.
//!
//! `pdf12step init` walks through a few groups of questions and writes the
//! answers, on top of the defaults, as a YAML configuration file.

use std::io::{self, BufRead, Write};

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};

/// Answer that clears a field.
pub const EMPTY: &str = "empty";

/// How an answer is converted before it lands in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Plain text.
    Text,
    /// Text that is left unset when cleared.
    Optional,
    /// Yes/no, see [`booler`].
    Bool,
    /// Comma separated list, see [`lister`].
    List,
}

/// One question of the interview.
#[derive(Debug, Clone, Copy)]
pub struct Question {
    /// Configuration key the answer is stored under.
    pub name: &'static str,
    /// Text shown to the user.
    pub title: &'static str,
    /// Answer used when the user just hits enter. `None` makes the field required.
    pub default: Option<&'static str>,
    /// Conversion of the answer.
    pub kind: Kind,
}

const fn question(
    name: &'static str,
    title: &'static str,
    default: Option<&'static str>,
    kind: Kind,
) -> Question {
    Question {
        name,
        title,
        default,
        kind,
    }
}

/// The interview, grouped by topic.
pub const QUESTIONS: &[(&str, &[Question])] = &[
    (
        "Data Gathering",
        &[question(
            "site_url",
            "Site URL running 12 Step Meeting WordPress plugin",
            None,
            Kind::Text,
        )],
    ),
    (
        "Metadata",
        &[
            question("author", "Document author", Some(EMPTY), Kind::Text),
            question("description", "Document description", Some(EMPTY), Kind::Text),
            question("website", "Contact website display", Some(EMPTY), Kind::Text),
            question("email", "Contact email address", Some(EMPTY), Kind::Text),
            question("address", "Contact street address", Some(EMPTY), Kind::Text),
            question("phone", "Contact phone number", Some(EMPTY), Kind::Text),
            question("fax", "Contact fax number", Some(EMPTY), Kind::Text),
        ],
    ),
    (
        "Formatting",
        &[
            question("size", "Page size to print", Some("Letter"), Kind::Text),
            question("color", "Cover background and header color", Some("lightblue"), Kind::Text),
            question("show_links", "Display links on pages", Some("yes"), Kind::Bool),
            question("qrcode_url", "URL to tie to QR code on cover", Some(EMPTY), Kind::Optional),
        ],
    ),
    (
        "Customizations",
        &[
            question(
                "template_dirs",
                "Directories to search for templates (comma separated)",
                Some(""),
                Kind::List,
            ),
            question(
                "stylesheets",
                "CSS files to add to modify page styles (comma separated)",
                Some(""),
                Kind::List,
            ),
            question("asset_dir", "Asset directory to look for static files", Some("./assets"), Kind::Text),
            question(
                "attendance_options",
                "Only display these comma separated attendance_options (eg in_person,hybrid,online)",
                Some(""),
                Kind::List,
            ),
            question(
                "filtercodes",
                "Do not display meetings that have these codes (comma separated)",
                Some(""),
                Kind::List,
            ),
        ],
    ),
];

/// Read a yes/no answer: `y`, `yes` and `true` in any case are yes.
#[must_use]
pub fn booler(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "y" | "yes" | "true")
}

/// Split a comma separated answer. Blank items are dropped.
#[must_use]
pub fn lister(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ask one question until it gets a usable answer.
///
/// # Errors
///
/// Returns an error if input ends before an answer is given or the prompt
/// cannot be written.
pub fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &Question) -> Result<Value> {
    loop {
        match question.default {
            Some(default) if !default.is_empty() => write!(output, "{} [{default}]: ", question.title)?,
            _ => write!(output, "{}: ", question.title)?,
        }
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("no answer for {}", question.name),
            )));
        }
        let mut answer = line.trim();
        if answer.is_empty() {
            match question.default {
                Some(default) => answer = default,
                None => {
                    writeln!(output, "Field {} is required", question.name)?;
                    continue;
                }
            }
        }
        if answer == EMPTY {
            answer = "";
        }
        debug!("Got prompt value {}={answer}", question.name);

        return Ok(match question.kind {
            Kind::Optional if answer.is_empty() => Value::Null,
            Kind::Text | Kind::Optional => Value::from(answer),
            Kind::Bool => Value::from(booler(answer)),
            Kind::List => Value::from(lister(answer)),
        });
    }
}

/// Run the whole interview and build the resulting configuration.
///
/// # Errors
///
/// Returns an error if input ends early or the answers do not form a
/// valid configuration.
pub fn interview<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Config> {
    let mut answers = Map::new();
    for (section, questions) in QUESTIONS {
        writeln!(output)?;
        writeln!(output, "{section}")?;
        writeln!(output, "{}", "-".repeat(section.len()))?;
        for question in *questions {
            let answer = prompt(input, output, question)?;
            answers.insert(question.name.to_string(), answer);
        }
    }

    let Value::Object(mut config) = serde_json::to_value(Config::default())? else {
        return Err(Error::ConfigValidation {
            message: "configuration is not a map".to_string(),
        });
    };
    config.extend(answers);
    let config: Config = serde_json::from_value(Value::Object(config))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn answers(lines: &[&str]) -> Cursor<Vec<u8>> {
        Cursor::new(format!("{}\n", lines.join("\n")).into_bytes())
    }

    #[test]
    fn test_booler() {
        assert!(booler("y"));
        assert!(booler("YES"));
        assert!(booler("True"));
        assert!(!booler("no"));
        assert!(!booler(""));
    }

    #[test]
    fn test_lister() {
        assert_eq!(lister("a, b,,c"), ["a", "b", "c"]);
        assert!(lister("").is_empty());
    }

    #[test]
    fn test_prompt_uses_default() {
        let question = question("size", "Page size", Some("Letter"), Kind::Text);
        let mut output = Vec::new();
        let value = prompt(&mut answers(&[""]), &mut output, &question).unwrap();
        assert_eq!(value, Value::from("Letter"));
        assert_eq!(String::from_utf8(output).unwrap(), "Page size [Letter]: ");
    }

    #[test]
    fn test_prompt_empty_clears() {
        let question = question("author", "Author", Some(EMPTY), Kind::Text);
        let value = prompt(&mut answers(&[""]), &mut Vec::new(), &question).unwrap();
        assert_eq!(value, Value::from(""));
    }

    #[test]
    fn test_prompt_repeats_required_fields() {
        let question = question("site_url", "Site", None, Kind::Text);
        let mut output = Vec::new();
        let value = prompt(&mut answers(&["", "https://x.org"]), &mut output, &question).unwrap();
        assert_eq!(value, Value::from("https://x.org"));
        assert!(String::from_utf8(output)
            .unwrap()
            .contains("Field site_url is required"));
    }

    #[test]
    fn test_prompt_fails_at_end_of_input() {
        let question = question("site_url", "Site", None, Kind::Text);
        let err = prompt(&mut answers(&[]), &mut Vec::new(), &question).unwrap_err();
        assert!(matches!(&err, Error::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof));
        assert!(err.to_string().contains("no answer for site_url"));
    }

    #[test]
    fn test_interview() {
        let mut input = answers(&[
            "https://aa-example.org",
            "Example Intergroup",
            "",
            "",
            "",
            "",
            "",
            "",
            "A4",
            "",
            "no",
            "",
            "",
            "",
            "",
            "online, hybrid",
            "TC",
        ]);
        let config = interview(&mut input, &mut Vec::new()).unwrap();
        assert_eq!(config.site_url.as_deref(), Some("https://aa-example.org"));
        assert_eq!(config.author, "Example Intergroup");
        assert_eq!(config.description, "");
        assert_eq!(config.size, "A4");
        assert_eq!(config.color, "lightblue");
        assert!(!config.show_links);
        assert_eq!(config.qrcode_url, None);
        assert_eq!(config.asset_dir, std::path::PathBuf::from("./assets"));
        assert_eq!(config.attendance_options, ["online", "hybrid"]);
        assert_eq!(config.filtercodes, ["TC"]);
        assert_eq!(config.date_fmt, Config::default().date_fmt);
    }

    #[test]
    fn test_interview_rejects_bad_site_url() {
        let mut lines = vec!["not a url"];
        lines.extend([""; 16]);
        assert!(interview(&mut answers(&lines), &mut Vec::new()).is_err());
    }
}
