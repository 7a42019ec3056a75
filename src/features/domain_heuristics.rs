//! Heuristics over registration metadata and response history, plus the
//! placeholder slots for third-party reputation services.

use super::Signal;
use crate::fetcher::PageCapture;
use crate::whois::WhoisRecord;
use chrono::{DateTime, Utc};

/// Days until the registration expires. Short runways are a phishing tell;
/// unavailable registration data degrades at the assembly boundary.
pub fn domain_registration_length(record: &WhoisRecord, now: DateTime<Utc>) -> Signal {
    match record.expiration_date {
        Some(expiration) => Signal::Value((expiration - now).num_days()),
        None => Signal::Unavailable,
    }
}

/// 0 when WHOIS knows the domain, 1 when it does not.
pub fn abnormal_url(record: &WhoisRecord) -> Signal {
    Signal::Value(if record.domain_name.is_some() { 0 } else { 1 })
}

/// Days since the domain was registered.
pub fn age_of_domain(record: &WhoisRecord, now: DateTime<Utc>) -> Signal {
    match record.creation_date {
        Some(creation) => Signal::Value((now - creation).num_days()),
        None => Signal::Unavailable,
    }
}

/// Redirect hops observed while fetching; an absent response counts none.
pub fn redirect_hops(capture: &PageCapture) -> Signal {
    Signal::Value(capture.redirect_count as i64)
}

// Reputation slots below are fed by third-party services (traffic rank,
// page rank, index presence, backlink counts, blocklist reports) that are
// not integrated; they contribute a constant 0 so the vector keeps the
// column layout the model was trained on.

pub fn web_traffic() -> Signal {
    Signal::Value(0)
}

pub fn page_rank() -> Signal {
    Signal::Value(0)
}

pub fn google_index() -> Signal {
    Signal::Value(0)
}

pub fn links_pointing_to_page() -> Signal {
    Signal::Value(0)
}

pub fn statistical_report() -> Signal {
    Signal::Value(0)
}
