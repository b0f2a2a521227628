/// Substrings of search-engine chrome: self-referential result pages, account,
/// settings, help, policy, maps, translate and cache endpoints.
const SKIP_PATTERNS: &[&str] = &[
    "google.com/search",
    "google.co.uk/search",
    "google.com/preferences",
    "google.com/webhp",
    "google.com/advanced_search",
    "accounts.google",
    "support.google",
    "policies.google",
    "maps.google",
    "translate.google",
    "webcache.googleusercontent",
    "/search?",
];

/// True when `url` is empty or points at navigation rather than a result.
/// Case-sensitive substring match on the raw string.
pub fn should_skip(url: &str) -> bool {
    url.is_empty() || SKIP_PATTERNS.iter().any(|p| url.contains(p))
}
