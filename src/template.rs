//! Environment templating of scenario sources.
//!
//! Scenario files may reference `{{VAR}}` placeholders, expanded from the
//! process environment before YAML parsing. A handful of placeholders
//! carry defaults so stock scenarios run against a local instance without
//! any setup.

use std::env;

use lazy_regex::regex;

/// Expands every `{{name}}` placeholder in `source` from the environment.
///
/// The three stock keys `hostUrl`, `password` and `userId` resolve through
/// `HOST_URL`, `PASSWORD` and `USER_ID` with built-in defaults; the
/// environment-variable spellings are accepted too. Any other placeholder
/// looks up the variable of the same name. A set but empty variable counts
/// as unset; an unknown placeholder without a default expands to the empty
/// string.
#[must_use]
pub fn expand(source: &str) -> String {
    regex!(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}")
        .replace_all(source, |caps: &lazy_regex::Captures<'_>| {
            let (variable, default) = resolve(&caps[1]);
            env::var(variable)
                .ok()
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_owned())
        })
        .into_owned()
}

/// Maps a placeholder name to the environment variable backing it and its
/// default.
fn resolve(name: &str) -> (&str, &'static str) {
    match name {
        "hostUrl" | "HOST_URL" => ("HOST_URL", "http://localhost:3000"),
        "password" | "PASSWORD" => ("PASSWORD", "passw0rd"),
        "userId" | "USER_ID" => ("USER_ID", "test@example.com"),
        _ => (name, ""),
    }
}
