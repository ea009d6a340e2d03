use chrono::{NaiveDate, ParseResult};
use lazy_static::lazy_static;
use regex::Regex;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(buf: &str) -> ParseResult<NaiveDate> {
    NaiveDate::parse_from_str(buf, DATE_FORMAT)
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

lazy_static! {
    static ref TAG_REGEX: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref ENTITY_REGEX: Regex = Regex::new(r"^&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z][a-zA-Z0-9]*);").unwrap();
}

/// Removes markup and collapses whitespace. Entities are left encoded, so the
/// result is still safe to embed as HTML.
pub fn strip_tags(html: &str) -> String {
    let text = TAG_REGEX.replace_all(html, " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cuts entity-encoded `text` to at most `max_chars` characters. An entity
/// such as `&amp;` counts as one character and is never cut in half.
pub fn truncate_encoded(text: &str, max_chars: usize) -> &str {
    let mut idx = 0;
    let mut count = 0;
    while idx < text.len() {
        if count == max_chars {
            return &text[..idx];
        }
        let rest = &text[idx..];
        idx += match ENTITY_REGEX.find(rest) {
            Some(m) => m.end(),
            None => rest.chars().next().map_or(1, char::len_utf8),
        };
        count += 1;
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        let date = parse_date("2017-09-10").unwrap();
        assert_eq!(format_date(&date), "2017-09-10");

        assert!(parse_date("2017-9-10x").is_err());
        assert!(parse_date("README").is_err());
        assert!(parse_date("2017-02-30").is_err());
    }

    #[test]
    fn test_strip_tags() {
        let html = "<p>How to be a <strong>great</strong> engineer?</p>\n<p>Fish &amp; chips</p>";
        assert_eq!(strip_tags(html), "How to be a great engineer? Fish &amp; chips");

        let html = "<p>Use <code>&lt;script&gt;alert(1)&lt;/script&gt;</code> carefully</p>";
        assert_eq!(strip_tags(html), "Use &lt;script&gt;alert(1)&lt;/script&gt; carefully");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_encoded("abcdef", 3), "abc");
        assert_eq!(truncate_encoded("ééé", 2), "éé");
    }

    #[test]
    fn test_truncate_encoded() {
        assert_eq!(truncate_encoded("AT&amp;T rocks", 3), "AT&amp;");
        assert_eq!(truncate_encoded("AT&amp;T rocks", 2), "AT");
        assert_eq!(truncate_encoded("&lt;b&gt;", 2), "&lt;b");
        assert_eq!(truncate_encoded("&#x27;é&#39;", 2), "&#x27;é");
        assert_eq!(truncate_encoded("a & b", 3), "a &");
        assert_eq!(truncate_encoded("short", 10), "short");
    }
}
