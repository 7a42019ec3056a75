//! Heuristics computed from the URL string alone. No network access.

use super::Signal;
use once_cell::sync::Lazy;
use regex::Regex;

/// Dotted-quad shaped substring anywhere in the URL.
static IPV4_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+){3}").unwrap());

/// Known URL-shortener hosts.
static SHORTENER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(bit\.ly|goo\.gl|tinyurl\.com|ow\.ly|t\.co)").unwrap());

/// 1 if the URL contains an IPv4-shaped substring.
pub fn having_ip_address(url: &str) -> Signal {
    Signal::from_bool(IPV4_PATTERN.is_match(url))
}

/// Character length of the URL.
pub fn url_length(url: &str) -> Signal {
    Signal::Value(url.chars().count() as i64)
}

/// 1 if the URL mentions a known shortener host.
pub fn shortening_service(url: &str) -> Signal {
    Signal::from_bool(SHORTENER_PATTERN.is_match(url))
}

/// 1 if the URL contains `@` (classic credential-trick obfuscation).
pub fn having_at_symbol(url: &str) -> Signal {
    Signal::from_bool(url.contains('@'))
}

/// 1 if the last `//` sits past the protocol separator (position > 6),
/// i.e. the path smuggles a second URL.
pub fn double_slash_redirecting(url: &str) -> Signal {
    Signal::from_bool(url.rfind("//").map_or(false, |idx| idx > 6))
}

/// 1 if the authority contains a dash (lookalike domains love hyphens).
pub fn prefix_suffix(authority: &str) -> Signal {
    Signal::from_bool(authority.contains('-'))
}

/// Dot count of the hostname minus one; 0 when there is no hostname.
/// `example.com` scores 0, each extra subdomain level adds one.
pub fn having_sub_domain(host: Option<&str>) -> Signal {
    match host {
        Some(host) => Signal::Value(host.matches('.').count() as i64 - 1),
        None => Signal::Value(0),
    }
}

/// 1 for an https scheme.
pub fn ssl_final_state(scheme: &str) -> Signal {
    Signal::from_bool(scheme == "https")
}

/// 1 if the authority carries an explicit `:port`.
pub fn explicit_port(authority: &str) -> Signal {
    Signal::from_bool(authority.contains(':'))
}

/// 1 if the literal token "https" appears inside the authority. This is a
/// deception check ("https-paypal.com"), not a transport check; the scheme
/// never reaches this string.
pub fn https_token(authority: &str) -> Signal {
    Signal::from_bool(authority.contains("https"))
}
