//! Content structure evaluation
//!
//! Looks at headings, body length, and image alt text.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::{Category, Finding, FindingStatus};

static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("h1 selector"));
static H2: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").expect("h2 selector"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("p selector"));
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("img selector"));

/// Run the four content checks. Always produces exactly four findings.
pub fn evaluate_content(document: &Html) -> Vec<Finding> {
    vec![
        check_h1(document),
        check_heading_structure(document),
        check_content_length(document),
        check_image_alt(document),
    ]
}

fn check_h1(document: &Html) -> Finding {
    let count = document.select(&H1).count();

    let (status, score, recommendation) = match count {
        1 => (
            FindingStatus::Good,
            100,
            "Perfect! Your page has exactly one H1 tag.".to_string(),
        ),
        0 => (
            FindingStatus::Error,
            0,
            "Your page is missing an H1 tag. Add one that includes your primary keyword."
                .to_string(),
        ),
        n => (
            FindingStatus::Warning,
            50,
            format!("Your page has {n} H1 tags. It's best to have exactly one H1 tag."),
        ),
    };

    Finding::new(
        Category::Content,
        "h1_tag",
        status,
        score,
        format!("H1 tags: {count}"),
        recommendation,
    )
}

fn check_heading_structure(document: &Html) -> Finding {
    let h1_count = document.select(&H1).count();
    let h2_count = document.select(&H2).count();

    let (status, score, recommendation) = if h1_count == 1 && h2_count >= 1 {
        (
            FindingStatus::Good,
            100,
            "Your heading structure follows best practices.",
        )
    } else {
        (
            FindingStatus::Warning,
            60,
            "Your heading structure is not optimal. Use one H1 followed by H2 tags to structure your content.",
        )
    };

    Finding::new(
        Category::Content,
        "heading_structure",
        status,
        score,
        format!("Headings: {h1_count} H1, {h2_count} H2"),
        recommendation,
    )
}

fn check_content_length(document: &Html) -> Finding {
    let text = document
        .select(&PARAGRAPH)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ");
    let word_count = text.split_whitespace().count();

    let (status, score, recommendation) = if word_count >= 300 {
        (
            FindingStatus::Good,
            100,
            "Your content length is good for SEO.",
        )
    } else if word_count >= 100 {
        (
            FindingStatus::Warning,
            70,
            "Your content is a bit short. Aim for at least 300 words for better SEO performance.",
        )
    } else {
        (
            FindingStatus::Error,
            30,
            "Your content is too short. Create more comprehensive content with at least 300 words.",
        )
    };

    Finding::new(
        Category::Content,
        "content_length",
        status,
        score,
        format!("Content: {word_count} words"),
        recommendation,
    )
}

fn check_image_alt(document: &Html) -> Finding {
    let total = document.select(&IMAGE).count();
    let with_alt = document
        .select(&IMAGE)
        .filter(|img| img.value().attr("alt").is_some_and(|alt| !alt.is_empty()))
        .count();

    let (status, score, recommendation) = if total == 0 {
        (
            FindingStatus::Info,
            70,
            "Your page has no images. Consider adding relevant images with alt text to improve engagement.",
        )
    } else if with_alt == total {
        (
            FindingStatus::Good,
            100,
            "All images have alt text. Great job!",
        )
    } else {
        (
            FindingStatus::Warning,
            60,
            "Some images are missing alt text. Add descriptive alt text to all images.",
        )
    };

    Finding::new(
        Category::Content,
        "image_alt",
        status,
        score,
        format!("Images: {with_alt}/{total} have alt text"),
        recommendation,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding_for(html: &str, component: &str) -> Finding {
        let document = Html::parse_document(html);
        evaluate_content(&document)
            .into_iter()
            .find(|f| f.component == component)
            .expect("finding present")
    }

    fn page_with_words(count: usize) -> String {
        let words = vec!["word"; count].join(" ");
        format!("<body><h1>T</h1><p>{words}</p></body>")
    }

    #[test]
    fn produces_four_findings() {
        let document = Html::parse_document("<body></body>");
        assert_eq!(evaluate_content(&document).len(), 4);
    }

    #[test]
    fn h1_count_rules() {
        let f = finding_for("<body><h1>One</h1></body>", "h1_tag");
        assert_eq!((f.status, f.score), (FindingStatus::Good, 100));

        let f = finding_for("<body></body>", "h1_tag");
        assert_eq!((f.status, f.score), (FindingStatus::Error, 0));

        let f = finding_for("<body><h1>A</h1><h1>B</h1></body>", "h1_tag");
        assert_eq!((f.status, f.score), (FindingStatus::Warning, 50));
    }

    #[test]
    fn heading_structure_needs_h1_and_h2() {
        let f = finding_for("<body><h1>A</h1><h2>B</h2></body>", "heading_structure");
        assert_eq!((f.status, f.score), (FindingStatus::Good, 100));

        let f = finding_for("<body><h1>A</h1></body>", "heading_structure");
        assert_eq!((f.status, f.score), (FindingStatus::Warning, 60));

        let f = finding_for("<body><h2>B</h2></body>", "heading_structure");
        assert_eq!((f.status, f.score), (FindingStatus::Warning, 60));
    }

    #[test]
    fn content_length_boundaries() {
        let f = finding_for(&page_with_words(300), "content_length");
        assert_eq!((f.status, f.score), (FindingStatus::Good, 100));

        let f = finding_for(&page_with_words(299), "content_length");
        assert_eq!((f.status, f.score), (FindingStatus::Warning, 70));

        let f = finding_for(&page_with_words(100), "content_length");
        assert_eq!((f.status, f.score), (FindingStatus::Warning, 70));

        let f = finding_for(&page_with_words(99), "content_length");
        assert_eq!((f.status, f.score), (FindingStatus::Error, 30));
    }

    #[test]
    fn words_counted_across_paragraphs() {
        let html = "<body><p>one two</p><p>three</p></body>";
        let f = finding_for(html, "content_length");
        assert!(f.description.contains("3 words"));
    }

    #[test]
    fn image_alt_rules() {
        let f = finding_for("<body></body>", "image_alt");
        assert_eq!((f.status, f.score), (FindingStatus::Info, 70));

        let f = finding_for(
            r#"<body><img src="a.png" alt="a"><img src="b.png" alt="b"></body>"#,
            "image_alt",
        );
        assert_eq!((f.status, f.score), (FindingStatus::Good, 100));

        let f = finding_for(
            r#"<body><img src="a.png" alt="a"><img src="b.png"></body>"#,
            "image_alt",
        );
        assert_eq!((f.status, f.score), (FindingStatus::Warning, 60));
    }

    #[test]
    fn empty_alt_counts_as_missing() {
        let f = finding_for(r#"<body><img src="a.png" alt=""></body>"#, "image_alt");
        assert_eq!((f.status, f.score), (FindingStatus::Warning, 60));
    }
}
