// src/utils/link.rs

//! `Link` header parsing (RFC 8288 subset).

use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::{HeaderMap, LINK};

use crate::error::{AppError, Result};

static LINK_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<([^>]*)>((?:\s*;\s*[A-Za-z*-]+\s*=\s*(?:"[^"]*"|[^;,\s]*))*)"#)
        .expect("link value pattern is valid")
});

static LINK_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#";\s*([A-Za-z*-]+)\s*=\s*(?:"([^"]*)"|([^;,\s]*))"#)
        .expect("link param pattern is valid")
});

/// One `<uri>; rel="..."` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub uri: String,
    pub rel: String,
}

impl Link {
    /// Whether the space-separated `rel` list contains `relation`.
    pub fn has_rel(&self, relation: &str) -> bool {
        self.rel
            .split_whitespace()
            .any(|r| r.eq_ignore_ascii_case(relation))
    }
}

/// Parse a single header value into its links.
///
/// Entries without a `<uri>` are ignored.
pub fn parse(value: &str) -> Vec<Link> {
    LINK_VALUE
        .captures_iter(value)
        .map(|caps| {
            let uri = caps[1].trim().to_string();
            let params = caps.get(2).map_or("", |m| m.as_str());
            let rel = LINK_PARAM
                .captures_iter(params)
                .find(|p| p[1].eq_ignore_ascii_case("rel"))
                .and_then(|p| p.get(2).or_else(|| p.get(3)))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            Link { uri, rel }
        })
        .collect()
}

/// Collect the links of every `Link` header in a response.
pub fn from_headers(headers: &HeaderMap) -> Result<Vec<Link>> {
    let mut links = Vec::new();
    for value in headers.get_all(LINK) {
        let value = value
            .to_str()
            .map_err(|e| AppError::link(format!("non-ASCII Link header: {e}")))?;
        links.extend(parse(value));
    }
    Ok(links)
}

/// URI of the first link carrying `relation`, if any.
pub fn find_rel<'a>(links: &'a [Link], relation: &str) -> Option<&'a str> {
    links
        .iter()
        .find(|l| l.has_rel(relation))
        .map(|l| l.uri.as_str())
}
