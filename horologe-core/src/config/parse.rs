//! Minimal TOML reader for `watch.toml`
//!
//! Handles only the subset the watch configuration uses, without
//! allocation, so it runs on the device:
//! - `key = value` pairs (string, integer, boolean)
//! - `[screen]`, `[layout]` and `[layout.<label>]` section headers
//! - single-level inline tables: `origin = { x = 4, y = 146 }`
//! - `#` comments
//!
//! Multi-line strings, arrays and escapes other than `\"` and `\\` are
//! not supported.

use heapless::String;

use super::types::{WatchConfig, MAX_PLACEHOLDER_LEN};
use crate::geometry::{Rect, Size};
use crate::scheduler::TickUnit;
use crate::traits::TextAlign;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not valid in its section
    UnknownKey,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// A string is longer than its buffer
    TooLong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Screen,
    Layout,
    Label(Label),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Day,
    Num,
    Temperature,
}

/// Parse `watch.toml` text on top of the defaults
///
/// Keys that are absent keep their default value. The result is not
/// validated; call [`WatchConfig::validate`] on it.
pub fn parse_config(input: &str) -> Result<WatchConfig, ParseError> {
    let mut config = WatchConfig::default();
    let mut section = Section::Root;
    let mut temperature_width_set = false;

    for line in input.lines() {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section = parse_section_header(header)?;
            continue;
        }

        let (key, value) = split_key_value(line).ok_or(ParseError::InvalidValue)?;
        match section {
            Section::Root => apply_root(&mut config, key, value)?,
            Section::Screen => apply_screen(&mut config.screen, key, value)?,
            Section::Layout => match key {
                "temperature_align" => config.layout.temperature_align = parse_align(value)?,
                _ => return Err(ParseError::UnknownKey),
            },
            Section::Label(label) => {
                let rect = match label {
                    Label::Day => &mut config.layout.day,
                    Label::Num => &mut config.layout.num,
                    Label::Temperature => &mut config.layout.temperature,
                };
                apply_rect(rect, key, value)?;
                if label == Label::Temperature && key == "size" {
                    temperature_width_set = true;
                }
            }
        }
    }

    // The temperature label spans the screen unless placed explicitly
    if !temperature_width_set {
        config.layout.temperature.size.width = config.screen.width;
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "screen" => Ok(Section::Screen),
        "layout" => Ok(Section::Layout),
        "layout.day" => Ok(Section::Label(Label::Day)),
        "layout.num" => Ok(Section::Label(Label::Num)),
        "layout.temperature" => Ok(Section::Label(Label::Temperature)),
        _ => Err(ParseError::InvalidSection),
    }
}

fn apply_root(config: &mut WatchConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "inbox_size" => config.inbox_size = parse_int(value)?,
        "outbox_size" => config.outbox_size = parse_int(value)?,
        "tick_unit" => {
            config.tick_unit = match parse_string(value)? {
                "second" => TickUnit::Second,
                "minute" => TickUnit::Minute,
                _ => return Err(ParseError::InvalidValue),
            }
        }
        "second_hand" => config.second_hand = parse_bool(value)?,
        "tick_marks" => config.tick_marks = parse_bool(value)?,
        "placeholder" => {
            let mut text: String<MAX_PLACEHOLDER_LEN> = String::new();
            unescape_into(parse_string(value)?, &mut text)?;
            config.placeholder = text;
        }
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

fn apply_screen(screen: &mut Size, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "width" => screen.width = parse_int(value)?,
        "height" => screen.height = parse_int(value)?,
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

fn apply_rect(rect: &mut Rect, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "origin" => {
            for entry in InlineTable::new(value)? {
                let (k, v) = entry?;
                match k {
                    "x" => rect.origin.x = parse_int(v)?,
                    "y" => rect.origin.y = parse_int(v)?,
                    _ => return Err(ParseError::UnknownKey),
                }
            }
        }
        "size" => {
            for entry in InlineTable::new(value)? {
                let (k, v) = entry?;
                match k {
                    "width" => rect.size.width = parse_int(v)?,
                    "height" => rect.size.height = parse_int(v)?,
                    _ => return Err(ParseError::UnknownKey),
                }
            }
        }
        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

fn parse_align(value: &str) -> Result<TextAlign, ParseError> {
    match parse_string(value)? {
        "left" => Ok(TextAlign::Left),
        "center" => Ok(TextAlign::Center),
        "right" => Ok(TextAlign::Right),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Drop a trailing `# comment` that is not inside a string
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            '\\' if in_string => {
                escaped = !escaped;
                continue;
            }
            '"' if !escaped => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
        escaped = false;
    }
    line
}

fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Contents of a quoted string, escapes untouched
fn parse_string(value: &str) -> Result<&str, ParseError> {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or(ParseError::InvalidValue)
}

fn unescape_into<const N: usize>(raw: &str, out: &mut String<N>) -> Result<(), ParseError> {
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        let c = match c {
            '\\' => match chars.next() {
                Some('"') => '"',
                Some('\\') => '\\',
                _ => return Err(ParseError::InvalidValue),
            },
            c => c,
        };
        out.push(c).map_err(|_| ParseError::TooLong)?;
    }
    Ok(())
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Iterator over the `key = value` pairs of `{ a = 1, b = 2 }`
struct InlineTable<'a> {
    rest: core::str::Split<'a, char>,
}

impl<'a> InlineTable<'a> {
    fn new(value: &'a str) -> Result<Self, ParseError> {
        let inner = value
            .strip_prefix('{')
            .and_then(|v| v.strip_suffix('}'))
            .ok_or(ParseError::InvalidValue)?;
        Ok(Self {
            rest: inner.split(','),
        })
    }
}

impl<'a> Iterator for InlineTable<'a> {
    type Item = Result<(&'a str, &'a str), ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = self.rest.next()?.trim();
            if entry.is_empty() {
                continue;
            }
            return Some(split_key_value(entry).ok_or(ParseError::InvalidValue));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_default() {
        assert_eq!(parse_config(""), Ok(WatchConfig::default()));
        assert_eq!(parse_config("# only a comment\n\n"), Ok(WatchConfig::default()));
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(
            r#"
            # Sync transport
            inbox_size = 128   # bytes
            outbox_size = 32
            tick_unit = "minute"
            second_hand = false
            tick_marks = false
            placeholder = "--°C # not a comment"

            [screen]
            width = 144
            height = 168

            [layout]
            temperature_align = "left"

            [layout.day]
            origin = { x = 2, y = 140 }
            size = { width = 30, height = 20 }
            "#,
        )
        .unwrap();

        assert_eq!(config.inbox_size, 128);
        assert_eq!(config.outbox_size, 32);
        assert_eq!(config.tick_unit, TickUnit::Minute);
        assert!(!config.second_hand);
        assert!(!config.tick_marks);
        assert_eq!(config.placeholder.as_str(), "--°C # not a comment");
        assert_eq!(config.layout.temperature_align, TextAlign::Left);
        assert_eq!(config.layout.day, Rect::new(2, 140, 30, 20));
        assert_eq!(config.layout.num, Rect::new(30, 146, 18, 20));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_temperature_width_follows_screen() {
        let config = parse_config("[screen]\nwidth = 200\nheight = 200\n").unwrap();
        assert_eq!(config.layout.temperature.size.width, 200);

        let config = parse_config(
            "[screen]\nwidth = 200\n[layout.temperature]\nsize = { width = 80, height = 20 }\n",
        )
        .unwrap();
        assert_eq!(config.layout.temperature.size.width, 80);
    }

    #[test]
    fn test_escaped_quote() {
        let config = parse_config(r#"placeholder = "say \"hi\"""#).unwrap();
        assert_eq!(config.placeholder.as_str(), "say \"hi\"");
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_config("[motor]"), Err(ParseError::InvalidSection));
        assert_eq!(parse_config("volume = 3"), Err(ParseError::UnknownKey));
        assert_eq!(parse_config("inbox_size = big"), Err(ParseError::InvalidValue));
        assert_eq!(parse_config("inbox_size = -1"), Err(ParseError::InvalidValue));
        assert_eq!(parse_config("tick_unit = \"hour\""), Err(ParseError::InvalidValue));
        assert_eq!(parse_config("second_hand = yes"), Err(ParseError::InvalidValue));
        assert_eq!(parse_config("placeholder = unquoted"), Err(ParseError::InvalidValue));
        assert_eq!(
            parse_config("placeholder = \"0123456789012345678901234567890123\""),
            Err(ParseError::TooLong)
        );
        assert_eq!(
            parse_config("[layout.day]\norigin = { z = 1 }"),
            Err(ParseError::UnknownKey)
        );
        assert_eq!(parse_config("[layout.day]\norigin = 4"), Err(ParseError::InvalidValue));
        assert_eq!(parse_config("[layout.day]\norigin = { x }"), Err(ParseError::InvalidValue));
    }

    #[test]
    fn test_embedded_watch_toml_shape() {
        // The shape shipped with the firmware
        let config = parse_config(
            r#"
            inbox_size = 64
            outbox_size = 64
            tick_unit = "second"
            second_hand = true
            tick_marks = true
            placeholder = "1234°C"

            [layout.temperature]
            origin = { x = 60, y = 146 }
            size = { width = 144, height = 68 }
            "#,
        )
        .unwrap();
        assert_eq!(config, WatchConfig::default());
    }
}
