//! Path normalization for the endpoint catalog.
//!
//! Accepts the messy template forms that accumulate in a routing
//! table (regex anchors, named capture groups, typed placeholders,
//! optional format suffixes) and produces the canonical form the
//! resolver matches against: leading `/`, single-`/` separators,
//! `{name}` parameters, no trailing `/` except the root itself.
//!
//! Normalization is idempotent: a canonical path passes through
//! unchanged.

use regex::Regex;

/// Normalize a raw route template into the canonical endpoint path.
pub fn normalize_path(raw: &str) -> String {
    let mut path = raw.trim().to_string();

    // Regex anchors contribute nothing to the canonical form.
    path = path.replace('^', "").replace('$', "");

    // Optional format-suffix groups (`\.(?P<format>[a-z0-9]+)/?`) are
    // dropped entirely rather than turned into a parameter.
    path = replace_all(&path, r"\\?\.\(\?P<format>[^)]*\)/?\??", "");
    path = replace_all(&path, r"\.\{format\}/?\??", "");

    // Named regex groups: `(?P<pk>[^/.]+)` -> `{pk}`.
    path = replace_all(&path, r"\(\?P<([A-Za-z_][A-Za-z0-9_]*)>[^)]*\)", "{$1}");

    // Typed placeholders: `<int:pk>` and `<pk>` -> `{pk}`.
    path = replace_all(
        &path,
        r"<(?:[A-Za-z_][A-Za-z0-9_]*:)?([A-Za-z_][A-Za-z0-9_]*)>",
        "{$1}",
    );

    // Leftover regex artifacts: optional-slash markers and escaping.
    path = path.replace("/?", "/");
    path = path.replace('\\', "");

    // Collapse duplicate slashes, force a leading slash.
    path = replace_all(&path, "/{2,}", "/");
    if !path.starts_with('/') {
        path.insert(0, '/');
    }

    // No trailing slash, except for the root itself.
    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    path
}

fn replace_all(input: &str, pattern: &str, replacement: &str) -> String {
    match Regex::new(pattern) {
        Ok(re) => re.replace_all(input, replacement).into_owned(),
        // Patterns are compile-time constants; this arm is unreachable
        // in practice but keeps the function total.
        Err(err) => {
            tracing::error!(pattern, %err, "invalid normalization pattern");
            input.to_string()
        }
    }
}
