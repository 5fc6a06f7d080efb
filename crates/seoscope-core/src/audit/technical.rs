//! Technical evaluation
//!
//! Mobile viewport, transport security, and canonicalization checks, plus two
//! fixed placeholders for checks that need out-of-page fetches.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use super::{Category, Finding, FindingStatus};

static VIEWPORT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="viewport"]"#).expect("viewport selector"));
static CANONICAL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"link[rel="canonical"]"#).expect("canonical selector"));

/// Run the five technical checks. Always produces exactly five findings.
pub fn evaluate_technical(document: &Html, url: &Url) -> Vec<Finding> {
    vec![
        check_viewport(document),
        check_https(url),
        check_canonical(document),
        robots_txt_placeholder(),
        sitemap_placeholder(),
    ]
}

fn check_viewport(document: &Html) -> Finding {
    let viewport = document
        .select(&VIEWPORT)
        .next()
        .and_then(|el| el.value().attr("content"));
    let responsive = viewport.is_some_and(|content| content.contains("width=device-width"));

    if responsive {
        Finding::new(
            Category::Technical,
            "viewport",
            FindingStatus::Good,
            100,
            "Viewport meta tag: Present",
            "Your page has a proper viewport meta tag for mobile responsiveness.",
        )
    } else {
        Finding::new(
            Category::Technical,
            "viewport",
            FindingStatus::Error,
            20,
            format!(
                "Viewport meta tag: {}",
                if viewport.is_some() { "Incomplete" } else { "Missing" }
            ),
            "No usable viewport meta tag found. Add one to ensure mobile-friendliness.",
        )
    }
}

fn check_https(url: &Url) -> Finding {
    if url.scheme() == "https" {
        Finding::new(
            Category::Technical,
            "https",
            FindingStatus::Good,
            100,
            "HTTPS: Yes",
            "Your site is secure with HTTPS.",
        )
    } else {
        Finding::new(
            Category::Technical,
            "https",
            FindingStatus::Error,
            0,
            "HTTPS: No",
            "Your site is not using HTTPS. Switch to HTTPS for better security and SEO.",
        )
    }
}

fn check_canonical(document: &Html) -> Finding {
    let href = document
        .select(&CANONICAL)
        .next()
        .and_then(|el| el.value().attr("href"))
        .filter(|href| !href.is_empty());

    match href {
        Some(href) => Finding::new(
            Category::Technical,
            "canonical",
            FindingStatus::Good,
            100,
            format!("Canonical URL: {href}"),
            "Your page has a canonical URL tag.",
        ),
        None => Finding::new(
            Category::Technical,
            "canonical",
            FindingStatus::Warning,
            60,
            "Canonical URL: Missing",
            "No canonical URL tag found. Consider adding one to prevent duplicate content issues.",
        ),
    }
}

// robots.txt and sitemap.xml need their own fetches; until that lands both
// checks report a fixed neutral score.

fn robots_txt_placeholder() -> Finding {
    Finding::new(
        Category::Technical,
        "robots_txt",
        FindingStatus::Info,
        50,
        "robots.txt check: Not implemented",
        "Ensure you have a robots.txt file that doesn't block important content.",
    )
}

fn sitemap_placeholder() -> Finding {
    Finding::new(
        Category::Technical,
        "sitemap",
        FindingStatus::Info,
        50,
        "sitemap.xml check: Not implemented",
        "Ensure you have a sitemap.xml file submitted to search engines.",
    )
}
