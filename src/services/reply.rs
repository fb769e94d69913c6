//! Parsing of the model's reply into paper metadata.
//!
//! Two reply shapes are recognized:
//!
//! - a JSON object with a `title` and an `authors` list (what the model
//!   produces when the request carries a JSON schema), optionally wrapped in
//!   a Markdown code fence;
//! - labeled lines such as `Title: ...` and `Authors: A, B`.
//!
//! A reply yielding a title but no authors is still accepted. A reply without
//! a recoverable title becomes [`ParsedReply::Unparsed`].

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::models::{PaperMetadata, ParsedReply};

static LABELED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:[-*•]\s+)?\**\s*(title|authors?)\s*\**\s*:\s*(.*)$")
        .expect("valid labeled-line regex")
});

static BULLET_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+(.+)$").expect("valid bullet regex")
});

static AUTHOR_DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*(?:[,;&]|\band\b)\s*").expect("valid delimiter regex"));

/// Turn the model's raw reply into metadata, or flag it for review.
pub fn parse_reply(raw: &str) -> ParsedReply {
    parse_json(raw)
        .or_else(|| parse_labeled_lines(raw))
        .map(ParsedReply::Parsed)
        .unwrap_or_else(|| ParsedReply::Unparsed {
            raw: raw.to_string(),
        })
}

/// Split a free-text author list on commas, semicolons, `&` and `and`.
pub fn split_author_list(list: &str) -> Vec<String> {
    AUTHOR_DELIMITER
        .split(list)
        .map(clean_value)
        .filter(|a| !a.is_empty())
        .collect()
}

fn parse_json(raw: &str) -> Option<PaperMetadata> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    let value: Value = serde_json::from_str(&raw[start..=end]).ok()?;
    let object = value.as_object()?;

    let title = object.get("title")?.as_str().map(clean_value)?;
    if title.is_empty() {
        return None;
    }

    let authors = match object.get("authors").or_else(|| object.get("author")) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect(),
        Some(Value::String(list)) => split_author_list(list),
        _ => Vec::new(),
    };

    Some(PaperMetadata::new(title, authors))
}

fn parse_labeled_lines(raw: &str) -> Option<PaperMetadata> {
    let mut title = None;
    let mut authors = Vec::new();
    let mut lines = raw.lines().peekable();

    while let Some(line) = lines.next() {
        let Some(caps) = LABELED_LINE.captures(line) else {
            continue;
        };
        let value = clean_value(&caps[2]);

        if caps[1].eq_ignore_ascii_case("title") {
            if title.is_none() && !value.is_empty() {
                title = Some(value);
            }
        } else if value.is_empty() {
            // "Authors:" followed by one author per bullet line
            while let Some(caps) = lines.peek().and_then(|next| BULLET_LINE.captures(*next)) {
                authors.push(clean_value(&caps[1]));
                lines.next();
            }
        } else {
            authors.extend(split_author_list(&value));
        }
    }

    title.map(|title| PaperMetadata::new(title, authors))
}

/// Strip whitespace, Markdown emphasis and wrapping quotes from a field.
fn clean_value(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c: char| c == '*' || c == '"' || c == '\'' || c == '`')
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(raw: &str) -> PaperMetadata {
        match parse_reply(raw) {
            ParsedReply::Parsed(metadata) => metadata,
            ParsedReply::Unparsed { raw } => panic!("expected parsed reply, got unparsed: {raw}"),
        }
    }

    #[test]
    fn test_labeled_lines() {
        let metadata = parsed("Title: Deep Learning for X\nAuthors: A. Smith, B. Jones");
        assert_eq!(metadata.title, "Deep Learning for X");
        assert_eq!(metadata.authors, vec!["A. Smith", "B. Jones"]);
    }

    #[test]
    fn test_labeled_lines_with_markdown_and_chatter() {
        let raw = "Sure! Here is what I found:\n\n\
                   **Title:** Attention Is All You Need\n\
                   **Authors:** Ashish Vaswani; Noam Shazeer and Niki Parmar\n\n\
                   Let me know if you need anything else.";
        let metadata = parsed(raw);
        assert_eq!(metadata.title, "Attention Is All You Need");
        assert_eq!(
            metadata.authors,
            vec!["Ashish Vaswani", "Noam Shazeer", "Niki Parmar"]
        );
    }

    #[test]
    fn test_bulleted_authors() {
        let raw = "Title: \"Graph Methods\"\nAuthors:\n- Alice Liddell\n- Bob Dylan\n\nDone.";
        let metadata = parsed(raw);
        assert_eq!(metadata.title, "Graph Methods");
        assert_eq!(metadata.authors, vec!["Alice Liddell", "Bob Dylan"]);
    }

    #[test]
    fn test_singular_author_label() {
        let metadata = parsed("title: Solo Work\nauthor: Jane Roe");
        assert_eq!(metadata.authors, vec!["Jane Roe"]);
    }

    #[test]
    fn test_title_only_is_best_effort() {
        let metadata = parsed("Title: A Paper With No Byline");
        assert_eq!(metadata.title, "A Paper With No Byline");
        assert!(metadata.authors.is_empty());
    }

    #[test]
    fn test_json_reply() {
        let metadata =
            parsed(r#"{"title": "Deep Learning for X", "authors": ["A. Smith", " ", "B. Jones"]}"#);
        assert_eq!(metadata.title, "Deep Learning for X");
        assert_eq!(metadata.authors, vec!["A. Smith", "B. Jones"]);
    }

    #[test]
    fn test_fenced_json_with_string_authors() {
        let raw = "```json\n{\"title\": \"Fenced\", \"authors\": \"A. Smith and B. Jones\"}\n```";
        let metadata = parsed(raw);
        assert_eq!(metadata.title, "Fenced");
        assert_eq!(metadata.authors, vec!["A. Smith", "B. Jones"]);
    }

    #[test]
    fn test_json_missing_authors_is_best_effort() {
        let metadata = parsed(r#"{"title": "Lonely"}"#);
        assert!(metadata.authors.is_empty());
    }

    #[test]
    fn test_json_without_title_falls_back_to_lines() {
        let raw = "{\"note\": 1}\nTitle: From Lines\nAuthors: C. Doe";
        let metadata = parsed(raw);
        assert_eq!(metadata.title, "From Lines");
        assert_eq!(metadata.authors, vec!["C. Doe"]);
    }

    #[test]
    fn test_unrecognized_reply_is_unparsed() {
        let raw = "I'm sorry, I cannot read this document.";
        assert_eq!(
            parse_reply(raw),
            ParsedReply::Unparsed {
                raw: raw.to_string()
            }
        );
        assert!(matches!(
            parse_reply(r#"{"title": "   ", "authors": ["X"]}"#),
            ParsedReply::Unparsed { .. }
        ));
        assert!(matches!(parse_reply(""), ParsedReply::Unparsed { .. }));
    }

    #[test]
    fn test_split_author_list() {
        assert_eq!(
            split_author_list("A. Smith, B. Jones, and C. Alexander"),
            vec!["A. Smith", "B. Jones", "C. Alexander"]
        );
        assert_eq!(split_author_list("Tom & Jerry"), vec!["Tom", "Jerry"]);
        assert!(split_author_list(" , ; ").is_empty());
    }
}
