use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// The 30 heuristic features consumed by the classifier, in training order.
///
/// The declaration order below is the exact column order the bundled model
/// was fitted against. Reordering variants silently corrupts predictions, so
/// the positional index of a variant (`as usize`) is part of the contract.
/// Key strings are the historical column names, misspellings included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum FeatureName {
    HavingIpAddress,
    UrlLength,
    ShorteningService,
    HavingAtSymbol,
    DoubleSlashRedirecting,
    PrefixSuffix,
    HavingSubDomain,
    SslFinalState,
    DomainRegistrationLength,
    Favicon,
    Port,
    HttpsToken,
    RequestUrl,
    UrlOfAnchor,
    LinksInTags,
    Sfh,
    SubmittingToEmail,
    AbnormalUrl,
    Redirect,
    OnMouseover,
    RightClick,
    PopupWindow,
    Iframe,
    AgeOfDomain,
    DnsRecord,
    WebTraffic,
    PageRank,
    GoogleIndex,
    LinksPointingToPage,
    StatisticalReport,
}

impl FeatureName {
    pub const COUNT: usize = 30;

    /// All features in canonical (training) order.
    pub const ALL: [FeatureName; Self::COUNT] = [
        FeatureName::HavingIpAddress,
        FeatureName::UrlLength,
        FeatureName::ShorteningService,
        FeatureName::HavingAtSymbol,
        FeatureName::DoubleSlashRedirecting,
        FeatureName::PrefixSuffix,
        FeatureName::HavingSubDomain,
        FeatureName::SslFinalState,
        FeatureName::DomainRegistrationLength,
        FeatureName::Favicon,
        FeatureName::Port,
        FeatureName::HttpsToken,
        FeatureName::RequestUrl,
        FeatureName::UrlOfAnchor,
        FeatureName::LinksInTags,
        FeatureName::Sfh,
        FeatureName::SubmittingToEmail,
        FeatureName::AbnormalUrl,
        FeatureName::Redirect,
        FeatureName::OnMouseover,
        FeatureName::RightClick,
        FeatureName::PopupWindow,
        FeatureName::Iframe,
        FeatureName::AgeOfDomain,
        FeatureName::DnsRecord,
        FeatureName::WebTraffic,
        FeatureName::PageRank,
        FeatureName::GoogleIndex,
        FeatureName::LinksPointingToPage,
        FeatureName::StatisticalReport,
    ];

    /// Canonical column name as used at training time.
    pub fn key(self) -> &'static str {
        match self {
            FeatureName::HavingIpAddress => "having_IP_Address",
            FeatureName::UrlLength => "URL_Length",
            FeatureName::ShorteningService => "Shortining_Service",
            FeatureName::HavingAtSymbol => "having_At_Symbol",
            FeatureName::DoubleSlashRedirecting => "double_slash_redirecting",
            FeatureName::PrefixSuffix => "Prefix_Suffix",
            FeatureName::HavingSubDomain => "having_Sub_Domain",
            FeatureName::SslFinalState => "SSLfinal_State",
            FeatureName::DomainRegistrationLength => "Domain_registeration_length",
            FeatureName::Favicon => "Favicon",
            FeatureName::Port => "port",
            FeatureName::HttpsToken => "HTTPS_token",
            FeatureName::RequestUrl => "Request_URL",
            FeatureName::UrlOfAnchor => "URL_of_Anchor",
            FeatureName::LinksInTags => "Links_in_tags",
            FeatureName::Sfh => "SFH",
            FeatureName::SubmittingToEmail => "Submitting_to_email",
            FeatureName::AbnormalUrl => "Abnormal_URL",
            FeatureName::Redirect => "Redirect",
            FeatureName::OnMouseover => "on_mouseover",
            FeatureName::RightClick => "RightClick",
            FeatureName::PopupWindow => "popUpWidnow",
            FeatureName::Iframe => "Iframe",
            FeatureName::AgeOfDomain => "age_of_domain",
            FeatureName::DnsRecord => "DNSRecord",
            FeatureName::WebTraffic => "web_traffic",
            FeatureName::PageRank => "Page_Rank",
            FeatureName::GoogleIndex => "Google_Index",
            FeatureName::LinksPointingToPage => "Links_pointing_to_page",
            FeatureName::StatisticalReport => "Statistical_report",
        }
    }
}

/// A complete feature vector: every one of the 30 keys is always present.
///
/// Serializes as a name-to-value map in canonical order; `to_row` flattens
/// positionally for the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureVector {
    values: [i64; FeatureName::COUNT],
}

impl FeatureVector {
    pub fn new() -> Self {
        FeatureVector {
            values: [0; FeatureName::COUNT],
        }
    }

    pub fn get(&self, name: FeatureName) -> i64 {
        self.values[name as usize]
    }

    pub fn set(&mut self, name: FeatureName, value: i64) {
        self.values[name as usize] = value;
    }

    /// Positional flattening in canonical order, as the model expects.
    pub fn to_row(&self) -> Vec<f64> {
        self.values.iter().map(|&v| v as f64).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureName, i64)> + '_ {
        FeatureName::ALL
            .into_iter()
            .map(move |name| (name, self.get(name)))
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FeatureName::COUNT))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name.key(), &value)?;
        }
        map.end()
    }
}

/// Outcome of running the classifier over a feature vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 0 = legit, 1 = fake.
    pub label: u8,
    /// Human-readable class name.
    pub result: String,
}

impl PredictionResult {
    pub fn from_label(label: u8) -> Self {
        let result = if label == 1 { "Fake" } else { "Legit" };
        PredictionResult {
            label,
            result: result.to_string(),
        }
    }

    pub fn is_fake(&self) -> bool {
        self.label == 1
    }
}

/// A logged prediction request, as stored in the query log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRecord {
    pub id: String,
    pub website: String,
    pub result: String,
    pub label: i64,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_order_is_stable() {
        assert_eq!(FeatureName::ALL.len(), 30);
        assert_eq!(FeatureName::ALL[0].key(), "having_IP_Address");
        assert_eq!(FeatureName::ALL[8].key(), "Domain_registeration_length");
        assert_eq!(FeatureName::ALL[21].key(), "popUpWidnow");
        assert_eq!(FeatureName::ALL[29].key(), "Statistical_report");
        // positional index must agree with declaration order
        for (i, name) in FeatureName::ALL.iter().enumerate() {
            assert_eq!(*name as usize, i);
        }
    }

    #[test]
    fn test_vector_roundtrip() {
        let mut v = FeatureVector::new();
        v.set(FeatureName::UrlLength, 42);
        v.set(FeatureName::DomainRegistrationLength, -1);
        assert_eq!(v.get(FeatureName::UrlLength), 42);
        assert_eq!(v.get(FeatureName::DomainRegistrationLength), -1);
        assert_eq!(v.get(FeatureName::Favicon), 0);
        assert_eq!(v.to_row().len(), 30);
        assert_eq!(v.to_row()[1], 42.0);
    }

    #[test]
    fn test_vector_serializes_in_canonical_order() {
        let mut v = FeatureVector::new();
        v.set(FeatureName::HavingIpAddress, 1);
        let json = serde_json::to_string(&v).unwrap();
        assert!(json.starts_with("{\"having_IP_Address\":1"));
        assert!(json.ends_with("\"Statistical_report\":0}"));
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_object().unwrap().len(), 30);
    }

    #[test]
    fn test_prediction_labels() {
        let fake = PredictionResult::from_label(1);
        assert!(fake.is_fake());
        assert_eq!(fake.result, "Fake");

        let legit = PredictionResult::from_label(0);
        assert!(!legit.is_fake());
        assert_eq!(legit.result, "Legit");
    }
}
