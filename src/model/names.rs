//! Name casing and description formatting helpers shared by every emitter
//!
//! Dialect names are written in some flavour of snake case (`GPS_RAW_INT`,
//! `time_usec`). Emitters need them in other casings, and need the free-text
//! descriptions stripped of the indentation they inherited from the XML.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

static WORD_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").expect("valid word separator pattern"));

/// Target casing for a message, field or enum name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NameFormat {
    /// `message_name`
    LowerSnake,
    /// `MESSAGE_NAME`
    UpperSnake,
    /// `MessageName`
    UpperCamel,
    /// Name exactly as declared
    #[default]
    Raw,
}

impl FromStr for NameFormat {
    type Err = std::convert::Infallible;

    /// Case-insensitive; anything unrecognised selects [`NameFormat::Raw`]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "lower_snake" => NameFormat::LowerSnake,
            "upper_snake" => NameFormat::UpperSnake,
            "uppercamel" => NameFormat::UpperCamel,
            _ => NameFormat::Raw,
        })
    }
}

/// Best-effort conversion of a snake-ish name into `format`
pub fn format_name(name: &str, format: NameFormat) -> String {
    match format {
        NameFormat::LowerSnake => name.to_lowercase(),
        NameFormat::UpperSnake => name.to_uppercase(),
        NameFormat::UpperCamel => WORD_SEPARATOR
            .split(name)
            .filter(|word| !word.is_empty())
            .map(capitalize)
            .collect(),
        NameFormat::Raw => name.to_string(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Normalise a multi-line description taken from a dialect file.
///
/// Tabs become four spaces. The indentation shared by all indented lines is
/// replaced with `line_prefix` (or removed). A leading newline is dropped
/// unless `leading_newline` is set, in which case one is guaranteed.
pub fn format_description(raw: &str, line_prefix: Option<&str>, leading_newline: bool) -> String {
    let prefix = line_prefix.unwrap_or("");
    let mut text = raw.replace('\t', "    ");

    if !leading_newline {
        if let Some(rest) = text.trim_start_matches(' ').strip_prefix('\n') {
            text = rest.to_string();
        }
    }

    if text.contains('\n') {
        let common_indent = text
            .split('\n')
            .map(|line| line.len() - line.trim_start_matches(' ').len())
            .filter(|&indent| indent != 0)
            .min();
        if let Some(indent) = common_indent {
            let from = format!("\n{}", " ".repeat(indent));
            let to = format!("\n{}", prefix);
            text = text.replace(&from, &to);
        }
    }

    if leading_newline && !text.starts_with('\n') {
        text = format!("\n{}{}", prefix, text);
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_formats() {
        assert_eq!(format_name("GPS_RAW_INT", NameFormat::LowerSnake), "gps_raw_int");
        assert_eq!(format_name("time_usec", NameFormat::UpperSnake), "TIME_USEC");
        assert_eq!(format_name("GPS_RAW_INT", NameFormat::UpperCamel), "GpsRawInt");
        assert_eq!(format_name("param-id.2", NameFormat::UpperCamel), "ParamId2");
        assert_eq!(format_name("Mixed_Case", NameFormat::Raw), "Mixed_Case");
    }

    #[test]
    fn test_name_format_parsing() {
        assert_eq!("lower_snake".parse::<NameFormat>().unwrap(), NameFormat::LowerSnake);
        assert_eq!("UPPER_SNAKE".parse::<NameFormat>().unwrap(), NameFormat::UpperSnake);
        assert_eq!("UpperCamel".parse::<NameFormat>().unwrap(), NameFormat::UpperCamel);
        assert_eq!("kebab".parse::<NameFormat>().unwrap(), NameFormat::Raw);
    }

    #[test]
    fn test_description_strips_xml_indentation() {
        let raw = "\n        The first line.\n        The second line.\n          Indented more.";
        assert_eq!(
            format_description(raw, None, false),
            "        The first line.\nThe second line.\n  Indented more."
        );
        assert_eq!(
            format_description(raw, Some("/// "), false),
            "        The first line.\n/// The second line.\n///   Indented more."
        );
    }

    #[test]
    fn test_description_leading_newline() {
        assert_eq!(format_description("single", Some("# "), true), "\n# single");
        assert_eq!(format_description("\nalready", None, true), "\nalready");
        assert_eq!(format_description("", None, false), "");
    }

    #[test]
    fn test_tabs_expand() {
        assert_eq!(format_description("a\n\tb", None, false), "a\nb");
    }
}
