//! Meta tag evaluation
//!
//! Checks the document head for the tags search engines read first: title,
//! meta description, meta keywords, and the Open Graph trio.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::{Category, Finding, FindingStatus};

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("title selector"));
static DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).expect("description selector"));
static KEYWORDS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="keywords"]"#).expect("keywords selector"));
static OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).expect("og:title selector"));
static OG_DESCRIPTION: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[property="og:description"]"#).expect("og:description selector")
});
static OG_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:image"]"#).expect("og:image selector"));

/// Run the four meta checks. Always produces exactly four findings.
pub fn evaluate_meta(document: &Html) -> Vec<Finding> {
    vec![
        check_title(document),
        check_description(document),
        check_keywords(document),
        check_og_tags(document),
    ]
}

fn check_title(document: &Html) -> Finding {
    let title = document
        .select(&TITLE)
        .next()
        .map(|el| el.text().collect::<String>())
        .filter(|text| !text.trim().is_empty());

    let Some(title) = title else {
        return Finding::new(
            Category::Meta,
            "title",
            FindingStatus::Error,
            0,
            "Missing page title",
            "Add a descriptive title tag to your page. This is crucial for SEO.",
        );
    };

    let length = title.chars().count();
    let (status, score, recommendation) = if length < 10 {
        (
            FindingStatus::Error,
            30,
            "Your title is too short. Make it more descriptive.",
        )
    } else if length <= 60 {
        (FindingStatus::Good, 100, "Your title is the optimal length.")
    } else {
        (
            FindingStatus::Warning,
            70,
            "Your title is too long. Keep it under 60 characters for better visibility in search results.",
        )
    };

    Finding::new(
        Category::Meta,
        "title",
        status,
        score,
        format!("Title: {title} ({length} characters)"),
        recommendation,
    )
}

fn check_description(document: &Html) -> Finding {
    let description = document
        .select(&DESCRIPTION)
        .next()
        .and_then(|el| el.value().attr("content"))
        .filter(|content| !content.is_empty());

    let Some(description) = description else {
        return Finding::new(
            Category::Meta,
            "description",
            FindingStatus::Error,
            0,
            "Missing meta description",
            "Add a meta description tag to improve CTR from search results.",
        );
    };

    let length = description.chars().count();
    let (status, score, recommendation) = if length < 50 {
        (
            FindingStatus::Warning,
            50,
            "Your meta description is too short. Aim for 50-160 characters.",
        )
    } else if length <= 160 {
        (
            FindingStatus::Good,
            100,
            "Your meta description is the optimal length.",
        )
    } else {
        (
            FindingStatus::Warning,
            70,
            "Your meta description is too long. Keep it under 160 characters.",
        )
    };

    Finding::new(
        Category::Meta,
        "description",
        status,
        score,
        format!(
            "Description: {} ({length} characters)",
            truncate_chars(description, 100)
        ),
        recommendation,
    )
}

fn check_keywords(document: &Html) -> Finding {
    let keywords = document
        .select(&KEYWORDS)
        .next()
        .and_then(|el| el.value().attr("content"))
        .filter(|content| !content.is_empty());

    match keywords {
        Some(keywords) => {
            let count = keywords.split(',').count();
            Finding::new(
                Category::Meta,
                "keywords",
                FindingStatus::Info,
                70,
                format!(
                    "Keywords: {} ({count} keywords)",
                    truncate_chars(keywords, 100)
                ),
                "Search engines give the keywords meta tag little weight, but it can still help with site organization.",
            )
        }
        None => Finding::new(
            Category::Meta,
            "keywords",
            FindingStatus::Info,
            50,
            "Missing meta keywords",
            "While not critical for SEO, meta keywords can still help with site organization.",
        ),
    }
}

fn check_og_tags(document: &Html) -> Finding {
    let has_og = |selector: &Selector| {
        document
            .select(selector)
            .next()
            .and_then(|el| el.value().attr("content"))
            .is_some_and(|content| !content.is_empty())
    };

    let og_title = has_og(&OG_TITLE);
    let og_description = has_og(&OG_DESCRIPTION);
    let og_image = has_og(&OG_IMAGE);
    let present = [og_title, og_description, og_image]
        .iter()
        .filter(|p| **p)
        .count();

    let (status, score, recommendation) = match present {
        3 => (
            FindingStatus::Good,
            100,
            "Your Open Graph tags are complete, good for social sharing.",
        ),
        1 | 2 => (
            FindingStatus::Warning,
            60,
            "Some Open Graph tags are missing. Complete them for better social media sharing.",
        ),
        _ => (
            FindingStatus::Error,
            20,
            "Missing Open Graph tags. Add them to improve appearance when shared on social media.",
        ),
    };

    Finding::new(
        Category::Meta,
        "og_tags",
        status,
        score,
        format!(
            "Open Graph tags: {}/1 title, {}/1 description, {}/1 image",
            og_title as u8, og_description as u8, og_image as u8
        ),
        recommendation,
    )
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding_for(html: &str, component: &str) -> Finding {
        let document = Html::parse_document(html);
        evaluate_meta(&document)
            .into_iter()
            .find(|f| f.component == component)
            .expect("finding present")
    }

    #[test]
    fn produces_four_findings() {
        let document = Html::parse_document("<html><head></head></html>");
        assert_eq!(evaluate_meta(&document).len(), 4);
    }

    #[test]
    fn title_boundaries() {
        // 9 characters -> too short
        let f = finding_for("<head><title>012345678</title></head>", "title");
        assert_eq!((f.status, f.score), (FindingStatus::Error, 30));

        // exactly 10 -> good
        let f = finding_for("<head><title>0123456789</title></head>", "title");
        assert_eq!((f.status, f.score), (FindingStatus::Good, 100));

        // exactly 60 -> good
        let sixty = "a".repeat(60);
        let f = finding_for(&format!("<head><title>{sixty}</title></head>"), "title");
        assert_eq!((f.status, f.score), (FindingStatus::Good, 100));

        // 61 -> too long
        let sixty_one = "a".repeat(61);
        let f = finding_for(&format!("<head><title>{sixty_one}</title></head>"), "title");
        assert_eq!((f.status, f.score), (FindingStatus::Warning, 70));
    }

    #[test]
    fn missing_title_scores_zero() {
        let f = finding_for("<head></head>", "title");
        assert_eq!((f.status, f.score), (FindingStatus::Error, 0));
    }

    #[test]
    fn empty_title_counts_as_missing() {
        let f = finding_for("<head><title>  </title></head>", "title");
        assert_eq!((f.status, f.score), (FindingStatus::Error, 0));
    }

    #[test]
    fn description_boundaries() {
        let html = |content: &str| {
            format!(r#"<head><meta name="description" content="{content}"></head>"#)
        };

        let f = finding_for(&html(&"d".repeat(49)), "description");
        assert_eq!((f.status, f.score), (FindingStatus::Warning, 50));

        let f = finding_for(&html(&"d".repeat(50)), "description");
        assert_eq!((f.status, f.score), (FindingStatus::Good, 100));

        let f = finding_for(&html(&"d".repeat(160)), "description");
        assert_eq!((f.status, f.score), (FindingStatus::Good, 100));

        let f = finding_for(&html(&"d".repeat(161)), "description");
        assert_eq!((f.status, f.score), (FindingStatus::Warning, 70));

        let f = finding_for("<head></head>", "description");
        assert_eq!((f.status, f.score), (FindingStatus::Error, 0));
    }

    #[test]
    fn keywords_are_informational() {
        let f = finding_for("<head></head>", "keywords");
        assert_eq!((f.status, f.score), (FindingStatus::Info, 50));

        let f = finding_for(
            r#"<head><meta name="keywords" content="seo, audit"></head>"#,
            "keywords",
        );
        assert_eq!((f.status, f.score), (FindingStatus::Info, 70));
    }

    #[test]
    fn og_tags_counting() {
        let all = r#"<head>
            <meta property="og:title" content="T">
            <meta property="og:description" content="D">
            <meta property="og:image" content="https://example.com/i.png">
        </head>"#;
        let f = finding_for(all, "og_tags");
        assert_eq!((f.status, f.score), (FindingStatus::Good, 100));

        let some = r#"<head><meta property="og:title" content="T"></head>"#;
        let f = finding_for(some, "og_tags");
        assert_eq!((f.status, f.score), (FindingStatus::Warning, 60));

        let f = finding_for("<head></head>", "og_tags");
        assert_eq!((f.status, f.score), (FindingStatus::Error, 20));
    }

    #[test]
    fn og_tags_with_empty_content_do_not_count() {
        let html = r#"<head>
            <meta property="og:title" content="">
            <meta property="og:description" content="">
            <meta property="og:image" content="">
        </head>"#;
        let f = finding_for(html, "og_tags");
        assert_eq!((f.status, f.score), (FindingStatus::Error, 20));
    }
}
