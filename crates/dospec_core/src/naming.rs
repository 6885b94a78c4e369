//! Component and app name sanitization.
//!
//! App Platform names must be 2-32 characters of lowercase alphanumerics and
//! hyphens, and may not start or end with a hyphen.

/// Maximum length of an App Platform name.
pub const MAX_NAME_LEN: usize = 32;

/// Minimum length of an App Platform name.
pub const MIN_NAME_LEN: usize = 2;

/// Prefix applied to names that sanitize to fewer than two characters.
const SHORT_NAME_PREFIX: &str = "app-";

/// Sanitize an arbitrary resource or app name into a valid App Platform name.
///
/// The transformation is total and idempotent:
///
/// 1. lowercase, mapping `_` and `.` to `-`
/// 2. drop anything outside `[a-z0-9-]`
/// 3. trim hyphens from both ends
/// 4. truncate to 32 characters and trim trailing hyphens again
/// 5. prefix names shorter than 2 characters with `app-`
///
/// ```
/// use dospec_core::sanitize;
///
/// assert_eq!(sanitize("My.App.Name"), "my-app-name");
/// assert_eq!(sanitize("a"), "app-a");
/// assert_eq!(sanitize("_"), "app");
/// ```
pub fn sanitize(name: &str) -> String {
    let filtered: String = name
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '_' | '.' => '-',
            other => other,
        })
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect();

    // Filtering leaves only ASCII, so byte truncation is safe.
    let mut result = filtered.trim_matches('-').to_string();
    result.truncate(MAX_NAME_LEN);
    let mut result = result.trim_end_matches('-').to_string();

    if result.len() < MIN_NAME_LEN {
        // An empty stem would leave a dangling hyphen after the prefix.
        result = format!("{}{}", SHORT_NAME_PREFIX, result)
            .trim_end_matches('-')
            .to_string();
    }

    result
}

/// Check whether a name already satisfies the App Platform naming grammar.
pub fn is_valid_name(name: &str) -> bool {
    let len = name.len();
    (MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len)
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.starts_with('-')
        && !name.ends_with('-')
}
