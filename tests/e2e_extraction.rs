/// End-to-end extraction tests over the public library API.
/// These tests verify that:
/// 1. Extraction always yields the complete 30-feature vector
/// 2. Fetch/WHOIS/DNS failures degrade to documented fallbacks, never errors
/// 3. Extraction is deterministic given fixed inputs and a frozen clock
/// 4. The classifier adapter consumes the vector and fails loudly without a model
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use phishguard::classifier::{ClassifierError, ClassifierHandle, LinearModel};
use phishguard::dns::DnsProbe;
use phishguard::features::{ExtractError, FeatureEngine};
use phishguard::fetcher::{PageCapture, PageSource};
use phishguard::models::FeatureName;
use phishguard::whois::{WhoisRecord, WhoisSource};
use std::sync::Arc;

struct StaticPage {
    capture: PageCapture,
}

#[async_trait]
impl PageSource for StaticPage {
    async fn fetch(&self, _url: &str) -> PageCapture {
        self.capture.clone()
    }
}

/// Fetch target that behaves like an unreachable host.
struct Unreachable;

#[async_trait]
impl PageSource for Unreachable {
    async fn fetch(&self, _url: &str) -> PageCapture {
        PageCapture::empty()
    }
}

struct FixedWhois(WhoisRecord);

#[async_trait]
impl WhoisSource for FixedWhois {
    async fn resolve(&self, _domain: &str) -> WhoisRecord {
        self.0.clone()
    }
}

/// WHOIS source that behaves like a failed lookup.
struct NoWhois;

#[async_trait]
impl WhoisSource for NoWhois {
    async fn resolve(&self, _domain: &str) -> WhoisRecord {
        WhoisRecord::default()
    }
}

struct FixedDns(bool);

#[async_trait]
impl DnsProbe for FixedDns {
    async fn resolves(&self, _host: &str) -> bool {
        self.0
    }
}

fn frozen_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

fn offline_engine() -> FeatureEngine {
    FeatureEngine::new(Arc::new(Unreachable), Arc::new(NoWhois), Arc::new(FixedDns(false)))
}

fn page_engine(capture: PageCapture, record: WhoisRecord, resolves: bool) -> FeatureEngine {
    FeatureEngine::new(
        Arc::new(StaticPage { capture }),
        Arc::new(FixedWhois(record)),
        Arc::new(FixedDns(resolves)),
    )
}

fn registered_record() -> WhoisRecord {
    WhoisRecord {
        domain_name: Some("example.com".to_string()),
        registrar: Some("Example Registrar LLC".to_string()),
        creation_date: Some(Utc.with_ymd_and_hms(2014, 6, 15, 12, 0, 0).unwrap()),
        expiration_date: Some(Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()),
        name_servers: vec!["ns1.example.com".to_string()],
    }
}

#[tokio::test]
async fn test_vector_is_always_complete() {
    let engine = offline_engine();
    let vector = engine
        .extract_at("http://example.com/login", frozen_now())
        .await
        .unwrap();

    let json = serde_json::to_value(&vector).unwrap();
    let map = json.as_object().unwrap();
    assert_eq!(map.len(), 30);
    for name in FeatureName::ALL {
        let value = map.get(name.key()).unwrap_or_else(|| {
            panic!("missing feature key {}", name.key());
        });
        assert!(value.is_i64(), "{} is not numeric", name.key());
    }
}

#[tokio::test]
async fn test_unreachable_host_degrades_to_fallbacks() {
    let engine = offline_engine();
    let vector = engine
        .extract_at("http://example.com/", frozen_now())
        .await
        .unwrap();

    // fetch-dependent features at neutral values
    assert_eq!(vector.get(FeatureName::Redirect), 0);
    assert_eq!(vector.get(FeatureName::Favicon), 0);
    assert_eq!(vector.get(FeatureName::RequestUrl), 0);
    assert_eq!(vector.get(FeatureName::UrlOfAnchor), 0);
    assert_eq!(vector.get(FeatureName::LinksInTags), 0);
    assert_eq!(vector.get(FeatureName::Iframe), 0);
    // a body without forms passes the form-handler check
    assert_eq!(vector.get(FeatureName::Sfh), 1);

    // WHOIS-dependent features at their sentinels
    assert_eq!(vector.get(FeatureName::DomainRegistrationLength), -1);
    assert_eq!(vector.get(FeatureName::AgeOfDomain), -1);
    assert_eq!(vector.get(FeatureName::AbnormalUrl), 1);

    assert_eq!(vector.get(FeatureName::DnsRecord), 0);

    // URL-string features still computed normally
    assert_eq!(vector.get(FeatureName::UrlLength), 19);
    assert_eq!(vector.get(FeatureName::SslFinalState), 0);
}

#[tokio::test]
async fn test_registered_domain_features() {
    let engine = page_engine(PageCapture::empty(), registered_record(), true);
    let vector = engine
        .extract_at("https://example.com/", frozen_now())
        .await
        .unwrap();

    assert_eq!(vector.get(FeatureName::DomainRegistrationLength), 365);
    assert_eq!(vector.get(FeatureName::AgeOfDomain), 3653);
    assert_eq!(vector.get(FeatureName::AbnormalUrl), 0);
    assert_eq!(vector.get(FeatureName::DnsRecord), 1);
    assert_eq!(vector.get(FeatureName::SslFinalState), 1);
}

#[tokio::test]
async fn test_page_content_features() {
    let body = r#"<html><head>
        <link rel="icon" href="http://example.com/favicon.ico">
        <link rel="stylesheet" href="http://example.com/style.css">
        <script src="http://example.com/app.js"></script>
    </head><body>
        <img src="http://example.com/logo.png">
        <img src="http://example.com/banner.png">
        <a href="http://example.com/about">about</a>
        <form action="about:blank"><input name="password"></form>
        <a href="mailto:phisher@evil.net">contact</a>
        <script>window.open('http://popup.evil.net');</script>
        <iframe src="http://frame.evil.net"></iframe>
    </body></html>"#;

    let capture = PageCapture {
        final_url: Some("http://example.com/".to_string()),
        status: Some(200),
        redirect_count: 2,
        body: body.to_string(),
    };
    let engine = page_engine(capture, registered_record(), true);
    let vector = engine
        .extract_at("http://example.com/", frozen_now())
        .await
        .unwrap();

    assert_eq!(vector.get(FeatureName::Favicon), 1);
    // every img mentions example.com -> internal -> 1
    assert_eq!(vector.get(FeatureName::RequestUrl), 1);
    // one of two anchors is a mailto -> ratio 0.5 -> middle band
    assert_eq!(vector.get(FeatureName::UrlOfAnchor), 0);
    assert_eq!(vector.get(FeatureName::Sfh), -1);
    assert_eq!(vector.get(FeatureName::SubmittingToEmail), 1);
    assert_eq!(vector.get(FeatureName::PopupWindow), 1);
    assert_eq!(vector.get(FeatureName::Iframe), 1);
    assert_eq!(vector.get(FeatureName::Redirect), 2);
    // no right-click or mouseover hooks on this page
    assert_eq!(vector.get(FeatureName::RightClick), 0);
    assert_eq!(vector.get(FeatureName::OnMouseover), 0);
}

#[tokio::test]
async fn test_shortener_detected_regardless_of_network() {
    let engine = offline_engine();
    let vector = engine
        .extract_at("http://bit.ly/abcd", frozen_now())
        .await
        .unwrap();
    assert_eq!(vector.get(FeatureName::ShorteningService), 1);
}

#[tokio::test]
async fn test_url_shape_features() {
    let engine = offline_engine();
    let vector = engine
        .extract_at(
            "http://192.168.0.1:8080/a@b//c?x=https-token",
            frozen_now(),
        )
        .await
        .unwrap();

    assert_eq!(vector.get(FeatureName::HavingIpAddress), 1);
    assert_eq!(vector.get(FeatureName::HavingAtSymbol), 1);
    assert_eq!(vector.get(FeatureName::Port), 1);
    assert_eq!(vector.get(FeatureName::DoubleSlashRedirecting), 1);
    // "https" sits in the query, not the authority
    assert_eq!(vector.get(FeatureName::HttpsToken), 0);

    let subdomains = engine
        .extract_at("http://a.b.example.com/", frozen_now())
        .await
        .unwrap();
    assert_eq!(subdomains.get(FeatureName::HavingSubDomain), 2);

    let bare = engine
        .extract_at("http://example.com/", frozen_now())
        .await
        .unwrap();
    assert_eq!(bare.get(FeatureName::HavingSubDomain), 0);
}

#[tokio::test]
async fn test_extraction_is_deterministic() {
    let body = r#"<html><body><a href="http://other.net/x">x</a></body></html>"#;
    let capture = PageCapture {
        final_url: Some("http://example.com/".to_string()),
        status: Some(200),
        redirect_count: 1,
        body: body.to_string(),
    };
    let engine = page_engine(capture, registered_record(), true);

    let first = engine
        .extract_at("http://example.com/", frozen_now())
        .await
        .unwrap();
    let second = engine
        .extract_at("http://example.com/", frozen_now())
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_invalid_input_is_rejected_before_extraction() {
    let engine = offline_engine();

    let empty = engine.extract_at("", frozen_now()).await;
    assert!(matches!(empty, Err(ExtractError::EmptyUrl)));

    let blank = engine.extract_at("   ", frozen_now()).await;
    assert!(matches!(blank, Err(ExtractError::EmptyUrl)));

    let garbage = engine.extract_at("not a url", frozen_now()).await;
    assert!(matches!(garbage, Err(ExtractError::InvalidUrl(_))));
}

#[tokio::test]
async fn test_classifier_consumes_extracted_vector() {
    // weight on Shortining_Service (index 2) only
    let mut weights = vec![0.0; FeatureName::COUNT];
    weights[2] = 4.0;
    let raw = format!(
        r#"{{"version":"e2e","weights":[{}],"bias":-2.0}}"#,
        weights
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join(",")
    );
    let model = LinearModel::from_json(&raw).unwrap();
    let handle = ClassifierHandle::from_classifier(Box::new(model));

    let engine = offline_engine();

    let shortened = engine
        .extract_at("http://bit.ly/abcd", frozen_now())
        .await
        .unwrap();
    let prediction = handle.predict(&shortened).unwrap();
    assert_eq!(prediction.label, 1);
    assert_eq!(prediction.result, "Fake");

    let plain = engine
        .extract_at("http://example.com/", frozen_now())
        .await
        .unwrap();
    let prediction = handle.predict(&plain).unwrap();
    assert_eq!(prediction.label, 0);
    assert_eq!(prediction.result, "Legit");
}

#[tokio::test]
async fn test_missing_model_is_a_hard_failure() {
    let handle = ClassifierHandle::load("/definitely/not/here/model.json");
    let engine = offline_engine();
    let vector = engine
        .extract_at("http://example.com/", frozen_now())
        .await
        .unwrap();

    let err = handle.predict(&vector).unwrap_err();
    assert!(matches!(err, ClassifierError::Unavailable(_)));
}
