//! Heuristic feature extraction pipeline.
//!
//! A URL is parsed once, its page and WHOIS record are fetched concurrently,
//! and ~30 independent heuristics each turn one aspect of the inputs into a
//! small integer signal. Heuristics are total: they report `Unavailable`
//! instead of failing, and the documented per-feature fallback value is
//! applied in one place, at vector assembly.

pub mod domain_heuristics;
pub mod page_heuristics;
pub mod url_heuristics;

use crate::config::Config;
use crate::dns::{DnsProbe, SystemDns};
use crate::fetcher::{FetchError, HttpFetcher, PageCapture, PageSource};
use crate::models::{FeatureName, FeatureVector};
use crate::whois::{WhoisRecord, WhoisResolver, WhoisSource};
use chrono::{DateTime, Utc};
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("URL must not be empty")]
    EmptyUrl,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Outcome of one heuristic: a concrete value, or "could not be computed".
///
/// Heuristics never decide their own fallback; `or` collapses to the
/// documented sentinel at the assembly boundary, keeping the degradation
/// policy in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Value(i64),
    Unavailable,
}

impl Signal {
    pub fn from_bool(hit: bool) -> Self {
        Signal::Value(hit as i64)
    }

    /// Collapse to a concrete value, substituting `fallback` when unavailable.
    pub fn or(self, fallback: i64) -> i64 {
        match self {
            Signal::Value(v) => v,
            Signal::Unavailable => fallback,
        }
    }
}

/// Orchestrates fetch + WHOIS + DNS and assembles the complete vector.
///
/// The I/O sources sit behind traits so tests can inject canned pages and
/// records; production wiring comes from `from_config`.
pub struct FeatureEngine {
    fetcher: Arc<dyn PageSource>,
    whois: Arc<dyn WhoisSource>,
    dns: Arc<dyn DnsProbe>,
}

impl FeatureEngine {
    pub fn new(
        fetcher: Arc<dyn PageSource>,
        whois: Arc<dyn WhoisSource>,
        dns: Arc<dyn DnsProbe>,
    ) -> Self {
        FeatureEngine {
            fetcher,
            whois,
            dns,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(
            Duration::from_secs(config.fetcher.timeout_seconds),
            config.fetcher.max_redirects,
            config.fetcher.user_agents.clone(),
        )?;
        Ok(FeatureEngine::new(
            Arc::new(fetcher),
            Arc::new(WhoisResolver::new(config.whois.timeout_seconds)),
            Arc::new(SystemDns),
        ))
    }

    /// Extract the full 30-feature vector for a URL.
    ///
    /// Only invalid input is an error; every I/O failure along the way
    /// degrades to the affected features' fallback values.
    pub async fn extract(&self, url: &str) -> ExtractResult<FeatureVector> {
        self.extract_at(url, Utc::now()).await
    }

    /// Like `extract`, with an injected clock for the time-based features.
    pub async fn extract_at(&self, url: &str, now: DateTime<Utc>) -> ExtractResult<FeatureVector> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(ExtractError::EmptyUrl);
        }
        let parsed = Url::parse(trimmed)?;

        let authority = authority_of(trimmed);
        let host = parsed.host_str().map(str::to_owned);
        let lookup_host = host.clone().unwrap_or_default();

        // Page fetch and WHOIS lookup are independent; run them together.
        let (capture, record) = tokio::join!(
            self.fetcher.fetch(trimmed),
            self.whois.resolve(&lookup_host)
        );
        let host_resolves = self.dns.resolves(&lookup_host).await;

        Ok(assemble(
            trimmed,
            authority,
            parsed.scheme(),
            host.as_deref(),
            &capture,
            &record,
            host_resolves,
            now,
        ))
    }
}

/// The authority component (`host[:port]`, possibly with userinfo) of a URL,
/// or "" when the URL has no `//` part. Several heuristics substring-match
/// against this exact string.
pub(crate) fn authority_of(url: &str) -> &str {
    let Some((_, rest)) = url.split_once("://") else {
        return "";
    };
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    &rest[..end]
}

/// Run every heuristic and collapse to the documented fallback values.
#[allow(clippy::too_many_arguments)]
fn assemble(
    raw_url: &str,
    authority: &str,
    scheme: &str,
    host: Option<&str>,
    capture: &PageCapture,
    record: &WhoisRecord,
    host_resolves: bool,
    now: DateTime<Utc>,
) -> FeatureVector {
    // One parse per extraction; the document view is shared by all
    // HTML-based heuristics and never crosses an await point.
    let document = Html::parse_document(&capture.body);
    let text = capture.body.as_str();

    let mut vector = FeatureVector::new();

    vector.set(
        FeatureName::HavingIpAddress,
        url_heuristics::having_ip_address(raw_url).or(0),
    );
    vector.set(FeatureName::UrlLength, url_heuristics::url_length(raw_url).or(0));
    vector.set(
        FeatureName::ShorteningService,
        url_heuristics::shortening_service(raw_url).or(0),
    );
    vector.set(
        FeatureName::HavingAtSymbol,
        url_heuristics::having_at_symbol(raw_url).or(0),
    );
    vector.set(
        FeatureName::DoubleSlashRedirecting,
        url_heuristics::double_slash_redirecting(raw_url).or(0),
    );
    vector.set(
        FeatureName::PrefixSuffix,
        url_heuristics::prefix_suffix(authority).or(0),
    );
    vector.set(
        FeatureName::HavingSubDomain,
        url_heuristics::having_sub_domain(host).or(0),
    );
    vector.set(
        FeatureName::SslFinalState,
        url_heuristics::ssl_final_state(scheme).or(0),
    );
    // Registration data degrades to -1, not 0: "unknown" must stay
    // distinguishable from a fresh registration.
    vector.set(
        FeatureName::DomainRegistrationLength,
        domain_heuristics::domain_registration_length(record, now).or(-1),
    );
    vector.set(
        FeatureName::Favicon,
        page_heuristics::favicon(&document).or(0),
    );
    vector.set(
        FeatureName::Port,
        url_heuristics::explicit_port(authority).or(0),
    );
    vector.set(
        FeatureName::HttpsToken,
        url_heuristics::https_token(authority).or(0),
    );
    vector.set(
        FeatureName::RequestUrl,
        page_heuristics::request_url(&document, authority).or(0),
    );
    vector.set(
        FeatureName::UrlOfAnchor,
        page_heuristics::url_of_anchor(&document, authority).or(0),
    );
    vector.set(
        FeatureName::LinksInTags,
        page_heuristics::links_in_tags(&document, authority).or(0),
    );
    vector.set(FeatureName::Sfh, page_heuristics::sfh(&document).or(0));
    vector.set(
        FeatureName::SubmittingToEmail,
        page_heuristics::submitting_to_email(text).or(0),
    );
    vector.set(
        FeatureName::AbnormalUrl,
        domain_heuristics::abnormal_url(record).or(1),
    );
    vector.set(
        FeatureName::Redirect,
        domain_heuristics::redirect_hops(capture).or(0),
    );
    vector.set(
        FeatureName::OnMouseover,
        page_heuristics::on_mouseover(text).or(0),
    );
    vector.set(
        FeatureName::RightClick,
        page_heuristics::right_click(text).or(0),
    );
    vector.set(
        FeatureName::PopupWindow,
        page_heuristics::popup_window(text).or(0),
    );
    vector.set(FeatureName::Iframe, page_heuristics::iframe(text).or(0));
    vector.set(
        FeatureName::AgeOfDomain,
        domain_heuristics::age_of_domain(record, now).or(-1),
    );
    vector.set(
        FeatureName::DnsRecord,
        Signal::from_bool(host_resolves).or(0),
    );
    vector.set(
        FeatureName::WebTraffic,
        domain_heuristics::web_traffic().or(0),
    );
    vector.set(FeatureName::PageRank, domain_heuristics::page_rank().or(0));
    vector.set(
        FeatureName::GoogleIndex,
        domain_heuristics::google_index().or(0),
    );
    vector.set(
        FeatureName::LinksPointingToPage,
        domain_heuristics::links_pointing_to_page().or(0),
    );
    vector.set(
        FeatureName::StatisticalReport,
        domain_heuristics::statistical_report().or(0),
    );

    vector
}
