//! Cleanup of raw field values: text whitespace, prices, and links.

use std::sync::LazyLock;

use regex::Regex;

/// A run of currency tokens, captured together with the non-letter (or text
/// edge) on each side so that `15000FCFA` matches but `chef` keeps its `f`.
static CURRENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|[^\p{L}])(?:(?:f\s*)?cfa|xof)(?:[\s.]*(?:(?:f\s*)?cfa|xof))*($|[^\p{L}])")
        .expect("valid regex")
});
static STYLE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*['"]?([^'")]+?)['"]?\s*\)"#).expect("valid regex")
});

/// Collapses every whitespace run (including non-breaking spaces) to a single
/// space and trims the ends.
#[must_use]
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalizes a displayed price.
///
/// Strips currency tokens (`FCFA`, `F CFA`, `CFA`, `XOF`), glued or repeated,
/// drops the thousands separators between digit groups, and collapses
/// remaining whitespace. `"15 000 FCFA "` and `"15000FCFA"` both become `"15000"`.
/// Non-numeric prices such as `"Prix sur demande"` keep their words.
///
/// The function is idempotent.
#[must_use]
pub fn normalize_price(raw: &str) -> String {
    join_digit_groups(&clean_text(&strip_currency(raw)))
}

/// Replaces currency tokens with spaces until none are left. A match consumes
/// its trailing delimiter, so a token right after it is only seen on the next
/// pass.
fn strip_currency(raw: &str) -> String {
    let mut current = raw.to_owned();
    loop {
        let next = CURRENCY_RE.replace_all(&current, "${1} ${2}").into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Removes single spaces that sit between two digits. Input must already be
/// whitespace-collapsed.
fn join_digit_groups(collapsed: &str) -> String {
    let chars: Vec<char> = collapsed.chars().collect();
    let mut out = String::with_capacity(collapsed.len());
    for (i, &c) in chars.iter().enumerate() {
        let between_digits = c == ' '
            && i > 0
            && chars[i - 1].is_ascii_digit()
            && chars.get(i + 1).is_some_and(char::is_ascii_digit);
        if !between_digits {
            out.push(c);
        }
    }
    out
}

/// Pulls the URL out of a CSS `url(...)` reference in a `style` attribute.
///
/// `"background-image: url('/img/a.jpg');"` → `"/img/a.jpg"`.
#[must_use]
pub fn extract_style_url(style: &str) -> Option<String> {
    STYLE_URL_RE
        .captures(style)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_owned())
        .filter(|url| !url.is_empty())
}

/// Resolves `candidate` against the site `origin` into an absolute http(s) URL.
///
/// Absolute URLs pass through unchanged; relative and protocol-relative paths
/// are joined onto the origin. Returns `None` for blank input, unparseable
/// values, and non-web schemes (`data:`, `javascript:`).
#[must_use]
pub fn resolve_link(origin: &str, candidate: &str) -> Option<String> {
    let candidate = candidate.trim().replace("&amp;", "&");
    if candidate.is_empty() {
        return None;
    }
    let base = reqwest::Url::parse(origin).ok()?;
    let url = base.join(&candidate).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
