//! Heuristics over the fetched page: the parsed document for structural
//! checks, the raw body text for substring checks.
//!
//! The ratio heuristics share one pattern: count how many matching elements
//! do NOT mention the page's own authority string in their rendered form,
//! then band the external/total ratio into a tri-state signal. A page with
//! no matching elements at all scores 0, not -1.

use super::Signal;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("link").unwrap());
static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static FORM_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("form").unwrap());
static META_LINK_SCRIPT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("link, script, meta").unwrap());

/// Share of elements whose rendered form does not contain `domain`.
/// None when there are no elements to judge.
fn external_ratio<'a>(
    elements: impl Iterator<Item = ElementRef<'a>>,
    domain: &str,
) -> Option<f64> {
    let mut total = 0usize;
    let mut external = 0usize;
    for element in elements {
        total += 1;
        if !element.html().contains(domain) {
            external += 1;
        }
    }
    if total == 0 {
        None
    } else {
        Some(external as f64 / total as f64)
    }
}

/// Band a ratio into 1 (mostly internal) / 0 / -1 (mostly external).
fn ratio_band(ratio: Option<f64>, low: f64, high: f64) -> Signal {
    match ratio {
        None => Signal::Value(0),
        Some(r) if r < low => Signal::Value(1),
        Some(r) if r < high => Signal::Value(0),
        Some(_) => Signal::Value(-1),
    }
}

/// 1 if the page declares a favicon (`<link rel="...icon...">`).
pub fn favicon(document: &Html) -> Signal {
    let found = document.select(&LINK_SELECTOR).any(|link| {
        link.value()
            .attr("rel")
            .map_or(false, |rel| rel.to_lowercase().contains("icon"))
    });
    Signal::from_bool(found)
}

/// Where do `<img>` resources come from.
pub fn request_url(document: &Html, domain: &str) -> Signal {
    ratio_band(
        external_ratio(document.select(&IMG_SELECTOR), domain),
        0.22,
        0.61,
    )
}

/// Where do `<a>` anchors point.
pub fn url_of_anchor(document: &Html, domain: &str) -> Signal {
    ratio_band(
        external_ratio(document.select(&ANCHOR_SELECTOR), domain),
        0.31,
        0.67,
    )
}

/// Where do `<link>`/`<script>`/`<meta>` references point.
pub fn links_in_tags(document: &Html, domain: &str) -> Signal {
    ratio_band(
        external_ratio(document.select(&META_LINK_SCRIPT_SELECTOR), domain),
        0.17,
        0.81,
    )
}

/// Server form handler: -1 if any form posts nowhere (missing, empty or
/// about:blank action), else 1. A page without forms passes.
pub fn sfh(document: &Html) -> Signal {
    for form in document.select(&FORM_SELECTOR) {
        match form.value().attr("action") {
            None => return Signal::Value(-1),
            Some(action) if action.is_empty() || action == "about:blank" => {
                return Signal::Value(-1)
            }
            Some(_) => {}
        }
    }
    Signal::Value(1)
}

/// 1 if the page can submit to a mail address.
pub fn submitting_to_email(text: &str) -> Signal {
    Signal::from_bool(text.contains("mailto:"))
}

/// 1 if the page hooks mouseover (status-bar spoofing).
pub fn on_mouseover(text: &str) -> Signal {
    Signal::from_bool(text.contains("onmouseover"))
}

/// 1 if the page intercepts right-click.
pub fn right_click(text: &str) -> Signal {
    Signal::from_bool(text.contains("event.button==2"))
}

/// 1 if the page opens popup windows.
pub fn popup_window(text: &str) -> Signal {
    Signal::from_bool(text.contains("window.open"))
}

/// 1 if the page embeds an iframe.
pub fn iframe(text: &str) -> Signal {
    Signal::from_bool(text.contains("<iframe"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn test_favicon_detection() {
        let with_icon = doc(r#"<html><head><link rel="shortcut ICON" href="/fav.ico"></head></html>"#);
        assert_eq!(favicon(&with_icon), Signal::Value(1));

        let stylesheet_only = doc(r#"<html><head><link rel="stylesheet" href="/a.css"></head></html>"#);
        assert_eq!(favicon(&stylesheet_only), Signal::Value(0));

        let empty = doc("");
        assert_eq!(favicon(&empty), Signal::Value(0));
    }

    #[test]
    fn test_request_url_bands() {
        // all images internal -> ratio 0.0 -> 1
        let internal = doc(r#"<img src="http://example.com/a.png"><img src="http://example.com/b.png">"#);
        assert_eq!(request_url(&internal, "example.com"), Signal::Value(1));

        // all images external -> ratio 1.0 -> -1
        let external = doc(r#"<img src="http://cdn.evil.net/a.png"><img src="http://cdn.evil.net/b.png">"#);
        assert_eq!(request_url(&external, "example.com"), Signal::Value(-1));

        // half external -> 0.5 -> middle band
        let mixed = doc(r#"<img src="http://example.com/a.png"><img src="http://cdn.evil.net/b.png">"#);
        assert_eq!(request_url(&mixed, "example.com"), Signal::Value(0));
    }

    #[test]
    fn test_zero_elements_score_zero() {
        let empty = doc("<html><body><p>nothing here</p></body></html>");
        assert_eq!(request_url(&empty, "example.com"), Signal::Value(0));
        assert_eq!(url_of_anchor(&empty, "example.com"), Signal::Value(0));
        assert_eq!(links_in_tags(&empty, "example.com"), Signal::Value(0));
    }

    #[test]
    fn test_url_of_anchor_bands() {
        // 2/3 external = 0.666.. sits just under the 0.67 edge -> middle band
        let two_thirds = doc(
            r#"<a href="http://evil.net/1"></a><a href="http://evil.net/2"></a><a href="http://example.com/3"></a>"#,
        );
        assert_eq!(url_of_anchor(&two_thirds, "example.com"), Signal::Value(0));

        // 3/4 external = 0.75 -> -1
        let three_quarters = doc(
            r#"<a href="http://evil.net/1"></a><a href="http://evil.net/2"></a><a href="http://evil.net/3"></a><a href="http://example.com/4"></a>"#,
        );
        assert_eq!(
            url_of_anchor(&three_quarters, "example.com"),
            Signal::Value(-1)
        );
    }

    #[test]
    fn test_links_in_tags_counts_meta_link_script() {
        let page = doc(
            r#"<head>
                <link rel="stylesheet" href="http://example.com/a.css">
                <script src="http://example.com/a.js"></script>
                <meta name="description" content="about example.com">
            </head>"#,
        );
        // everything mentions the domain -> ratio 0.0 -> 1
        assert_eq!(links_in_tags(&page, "example.com"), Signal::Value(1));
    }

    #[test]
    fn test_sfh() {
        let blank_action = doc(r#"<form action="about:blank"><input></form>"#);
        assert_eq!(sfh(&blank_action), Signal::Value(-1));

        let missing_action = doc(r#"<form><input></form>"#);
        assert_eq!(sfh(&missing_action), Signal::Value(-1));

        let empty_action = doc(r#"<form action=""><input></form>"#);
        assert_eq!(sfh(&empty_action), Signal::Value(-1));

        let proper = doc(r#"<form action="/login"><input></form>"#);
        assert_eq!(sfh(&proper), Signal::Value(1));

        let no_forms = doc("<p>formless</p>");
        assert_eq!(sfh(&no_forms), Signal::Value(1));
    }

    #[test]
    fn test_text_probes() {
        let text = r#"<a href="mailto:x@y.z">mail</a>
            <script>document.onmouseover=spoof; if(event.button==2){return false;}
            window.open('http://popup');</script>
            <iframe src="http://evil.net"></iframe>"#;
        assert_eq!(submitting_to_email(text), Signal::Value(1));
        assert_eq!(on_mouseover(text), Signal::Value(1));
        assert_eq!(right_click(text), Signal::Value(1));
        assert_eq!(popup_window(text), Signal::Value(1));
        assert_eq!(iframe(text), Signal::Value(1));

        let clean = "<p>hello</p>";
        assert_eq!(submitting_to_email(clean), Signal::Value(0));
        assert_eq!(on_mouseover(clean), Signal::Value(0));
        assert_eq!(right_click(clean), Signal::Value(0));
        assert_eq!(popup_window(clean), Signal::Value(0));
        assert_eq!(iframe(clean), Signal::Value(0));
    }
}
