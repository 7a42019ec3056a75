//! WHOIS Resolver
//!
//! Queries domain registration metadata over the WHOIS protocol (TCP 43)
//! against a TLD-keyed server table, then parses the free-form response
//! line-wise into a `WhoisRecord`. WHOIS output has no standard format, so
//! field extraction is best-effort regex matching; dates are tried against
//! the formats registries actually emit. Lookup failure of any kind yields
//! an empty record, never an error past this boundary.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

static RE_DOMAIN_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:Domain Name|domain):\s*(\S.*)").unwrap());
static RE_REGISTRAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:Registrar|Sponsoring Registrar):\s*(\S.*)").unwrap());
static RE_CREATION_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:Creation Date|Created(?: On)?|Registered on|Registration Time):\s*(\S.*)")
        .unwrap()
});
static RE_EXPIRY_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:Registry Expiry Date|Registrar Registration Expiration Date|Expiry Date|Expiration Date|Expires(?: On)?|paid-till):\s*(\S.*)",
    )
    .unwrap()
});
static RE_NAME_SERVER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:Name Server|nserver):\s*(\S.*)").unwrap());

/// Lines that carry no field data and commonly trip the field regexes.
static RE_IGNORE_PREFIXES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:%|>>>|NOTE:|Registrar URL:)").unwrap());
static RE_NO_MATCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:no match|not found|no entries found|no data found|domain not found)")
        .unwrap()
});

#[derive(Error, Debug)]
pub enum WhoisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out talking to {0}")]
    Timeout(String),
}

/// Parsed registration metadata for a domain.
///
/// All fields optional; `Default` is the well-defined empty record returned
/// when the lookup fails or the registry reports no match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhoisRecord {
    pub domain_name: Option<String>,
    pub registrar: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub name_servers: Vec<String>,
}

impl WhoisRecord {
    pub fn is_empty(&self) -> bool {
        self.domain_name.is_none()
            && self.registrar.is_none()
            && self.creation_date.is_none()
            && self.expiration_date.is_none()
            && self.name_servers.is_empty()
    }
}

/// Source of WHOIS records. Production talks TCP 43; tests inject records.
#[async_trait]
pub trait WhoisSource: Send + Sync {
    async fn resolve(&self, domain: &str) -> WhoisRecord;
}

/// WHOIS client querying the registry responsible for the domain's TLD.
pub struct WhoisResolver {
    timeout: Duration,
}

impl WhoisResolver {
    pub fn new(timeout_seconds: u64) -> Self {
        WhoisResolver {
            timeout: Duration::from_secs(timeout_seconds),
        }
    }

    async fn query(&self, domain: &str) -> Result<String, WhoisError> {
        let tld = domain.rsplit('.').next().unwrap_or("");
        let server = server_for_tld(tld);

        let mut stream = timeout(self.timeout, TcpStream::connect(server))
            .await
            .map_err(|_| WhoisError::Timeout(server.to_string()))??;

        let request = format!("{}\r\n", domain);
        timeout(self.timeout, stream.write_all(request.as_bytes()))
            .await
            .map_err(|_| WhoisError::Timeout(server.to_string()))??;

        let mut raw = Vec::new();
        timeout(self.timeout, stream.read_to_end(&mut raw))
            .await
            .map_err(|_| WhoisError::Timeout(server.to_string()))??;

        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}

#[async_trait]
impl WhoisSource for WhoisResolver {
    async fn resolve(&self, domain: &str) -> WhoisRecord {
        let target = registrable_domain(domain);
        if target.is_empty() {
            return WhoisRecord::default();
        }
        match self.query(&target).await {
            Ok(raw) => parse_record(&raw),
            Err(e) => {
                tracing::debug!(domain = %target, error = %e, "whois lookup failed, using empty record");
                WhoisRecord::default()
            }
        }
    }
}

/// Reduce a hostname to the domain the registry knows about.
///
/// Naive eTLD+1: keeps the last two labels, or three when the tail is a
/// well-known second-level registry suffix. IP literals pass through
/// unchanged (registries answer "no match", which is the right signal).
pub fn registrable_domain(host: &str) -> String {
    const SECOND_LEVEL: [&str; 6] = ["co.uk", "org.uk", "com.au", "co.jp", "co.nz", "com.br"];

    let host = host.trim().trim_end_matches('.').to_lowercase();
    if host.parse::<std::net::IpAddr>().is_ok() {
        return host;
    }
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() <= 2 {
        return host;
    }
    let tail2 = labels[labels.len() - 2..].join(".");
    let keep = if SECOND_LEVEL.contains(&tail2.as_str()) {
        3
    } else {
        2
    };
    labels[labels.len() - keep.min(labels.len())..].join(".")
}

/// Registry server per TLD, port 43. Unknown TLDs fall back to IANA.
fn server_for_tld(tld: &str) -> &'static str {
    match tld {
        "com" | "net" => "whois.verisign-grs.com:43",
        "org" => "whois.pir.org:43",
        "info" => "whois.afilias.net:43",
        "io" => "whois.nic.io:43",
        "co" => "whois.nic.co:43",
        "me" => "whois.nic.me:43",
        "us" => "whois.nic.us:43",
        "uk" => "whois.nic.uk:43",
        "ca" => "whois.cira.ca:43",
        "de" => "whois.denic.de:43",
        "fr" => "whois.afnic.fr:43",
        "ru" => "whois.tcinet.ru:43",
        "cn" => "whois.cnnic.net.cn:43",
        "app" | "dev" | "page" => "whois.nic.google:43",
        "xyz" => "whois.nic.xyz:43",
        "ly" => "whois.nic.ly:43",
        _ => "whois.iana.org:43",
    }
}

/// Parse raw WHOIS output into a record.
///
/// First match wins for single-valued fields, which also resolves the
/// multiple-candidate-date case deterministically (registries sometimes
/// repeat date fields with differing values).
pub fn parse_record(raw: &str) -> WhoisRecord {
    if RE_NO_MATCH.is_match(raw) {
        return WhoisRecord::default();
    }

    let mut record = WhoisRecord::default();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || RE_IGNORE_PREFIXES.is_match(line) {
            continue;
        }

        if let Some(caps) = RE_DOMAIN_NAME.captures(line) {
            if record.domain_name.is_none() {
                record.domain_name = caps.get(1).map(|m| m.as_str().trim().to_lowercase());
            }
        } else if let Some(caps) = RE_CREATION_DATE.captures(line) {
            if record.creation_date.is_none() {
                record.creation_date = caps.get(1).and_then(|m| parse_whois_date(m.as_str()));
            }
        } else if let Some(caps) = RE_EXPIRY_DATE.captures(line) {
            if record.expiration_date.is_none() {
                record.expiration_date = caps.get(1).and_then(|m| parse_whois_date(m.as_str()));
            }
        } else if let Some(caps) = RE_REGISTRAR.captures(line) {
            if record.registrar.is_none() {
                record.registrar = caps.get(1).map(|m| m.as_str().trim().to_string());
            }
        } else if let Some(caps) = RE_NAME_SERVER.captures(line) {
            if let Some(value) = caps.get(1) {
                for ns in value.as_str().split_whitespace() {
                    let ns = ns.to_lowercase();
                    if !record.name_servers.contains(&ns) {
                        record.name_servers.push(ns);
                    }
                }
            }
        }
    }
    record
}

/// Try the date formats registries actually use, most common first.
fn parse_whois_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    const DATETIME_FORMATS: [&str; 3] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y.%m.%d %H:%M:%S",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%b-%Y", "%Y.%m.%d", "%d.%m.%Y"];
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }

    None
}
