//! Pulling image URLs out of scraped HTML and JSON-in-HTML payloads.

use regex::Regex;

/// Tries `patterns` in order and returns the first capture accepted by
/// `accept`, unescaped. Group 1 is used when the pattern has one, the whole
/// match otherwise.
pub(crate) fn first_match(
    patterns: &[Regex],
    haystack: &str,
    accept: impl Fn(&str) -> bool,
) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        pattern.captures_iter(haystack).find_map(|captures| {
            let raw = captures.get(1).or_else(|| captures.get(0))?.as_str();
            let url = unescape_url(raw);
            (!url.is_empty() && accept(&url)).then_some(url)
        })
    })
}

/// Undoes JSON and HTML escaping commonly found around embedded image URLs.
pub(crate) fn unescape_url(raw: &str) -> String {
    raw.replace("\\u0026", "&")
        .replace("\\u002F", "/")
        .replace("\\u002f", "/")
        .replace("\\/", "/")
        .replace('\\', "")
        .replace("&amp;", "&")
}

/// Swaps Twitter's 48px `_normal` variant for the 400px one.
pub(crate) fn upgrade_twitter_resolution(url: &str) -> String {
    url.replace("_normal", "_400x400")
}

/// First run of ASCII digits in `value`.
pub(crate) fn digit_run(value: &str) -> Option<&str> {
    let start = value.find(|c: char| c.is_ascii_digit())?;
    let rest = &value[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..end])
}
