//! Strict decoding of oracle replies.
//!
//! Nothing in here talks to an oracle; every function takes the raw reply
//! text, so each decoder can be exercised with canned strings.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::oracle::error::OracleParseError;

/// Four values the oracle extracts for a target element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementInfo {
    /// Screen name suitable for a page-object class
    pub screen: String,
    pub screen_description: String,
    /// Element name suitable for a page-object field
    pub name: String,
    pub xpath: String,
}

/// `true` only for an unambiguous "yes". Anything else counts as absent.
pub fn is_affirmative(reply: &str) -> bool {
    let answer = reply
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '*'))
        .trim_end_matches(['.', '!'])
        .trim();
    answer.eq_ignore_ascii_case("yes")
}

/// Locate the JSON object in a reply: a fenced ```json block when present,
/// otherwise the span between the first `{` and the last `}`.
pub fn extract_json(reply: &str) -> Option<&str> {
    if let Some(start) = reply.find("```json") {
        let body = &reply[start + "```json".len()..];
        if let Some(end) = body.find("```") {
            return Some(body[..end].trim());
        }
    }

    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

/// Decode the JSON object embedded in a reply into `T`.
pub fn parse_json_reply<T: DeserializeOwned>(reply: &str) -> Result<T, OracleParseError> {
    let json = extract_json(reply).ok_or(OracleParseError::NoJson)?;
    serde_json::from_str(json).map_err(|e| OracleParseError::Schema(e.to_string()))
}

pub fn parse_element_info(reply: &str) -> Result<ElementInfo, OracleParseError> {
    let mut info: ElementInfo = parse_json_reply(reply)?;

    info.xpath = clean_locator(&info.xpath).ok_or(OracleParseError::EmptyField("xpath"))?;
    if !looks_like_locator(&info.xpath) {
        return Err(OracleParseError::NotALocator(info.xpath));
    }
    for (field, value) in [
        ("screen", &info.screen),
        ("screen_description", &info.screen_description),
        ("name", &info.name),
    ] {
        if value.trim().is_empty() {
            return Err(OracleParseError::EmptyField(field));
        }
    }

    Ok(info)
}

/// Decode a reply that should contain nothing but a locator string.
///
/// Prose around the locator is skipped; the first line that reads as an
/// XPath expression wins.
pub fn parse_locator(reply: &str) -> Result<String, OracleParseError> {
    let body = strip_fence(reply.trim());
    let mut lines = body.lines().filter_map(clean_locator).peekable();
    let first = lines.peek().cloned();

    lines
        .find(|line| looks_like_locator(line))
        .ok_or(match first {
            Some(text) => OracleParseError::NotALocator(text),
            None => OracleParseError::EmptyLocator,
        })
}

/// XPath expressions start at a path step or a parenthesised group.
fn looks_like_locator(text: &str) -> bool {
    text.starts_with('/') || text.starts_with('(')
}

fn strip_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (```xpath, ```text, ...)
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().trim_end_matches("```")
}

fn clean_locator(line: &str) -> Option<String> {
    let mut locator = line.trim().trim_matches('`').trim();
    if let Some(rest) = locator.strip_prefix("xpath:") {
        locator = rest.trim();
    }

    let locator = unquote(locator).trim();
    (!locator.is_empty()).then(|| locator.to_string())
}

fn unquote(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// Format instructions appended to the extraction prompt.
pub fn element_info_format_instructions() -> &'static str {
    r#"The output should be a markdown code snippet formatted in the following schema, including the leading and trailing "```json" and "```":

```json
{
	"screen": string  // screen name
	"screen_description": string  // screen description
	"name": string  // target element name
	"xpath": string  // XPath of the target element
}
```"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquote_strips_matching_quotes_only() {
        assert_eq!(unquote("\"//a\""), "//a");
        assert_eq!(unquote("'//a'"), "//a");
        assert_eq!(unquote("\"//a'"), "\"//a'");
    }

    #[test]
    fn locator_shape() {
        assert!(looks_like_locator("//a"));
        assert!(looks_like_locator("(//a)[2]"));
        assert!(!looks_like_locator("Here it is:"));
    }

    #[test]
    fn strip_fence_drops_info_string() {
        assert_eq!(strip_fence("```xpath\n//b\n```"), "//b\n");
        assert_eq!(strip_fence("//b"), "//b");
    }
}
