//! Email address format checking used by form rules.

use std::sync::OnceLock;

use regex::Regex;

/// Pragmatic format check: `local@domain.tld`, no whitespace.
/// Deliverability is not checked here.
pub fn is_valid_format(email: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    });
    re.is_match(email)
}
