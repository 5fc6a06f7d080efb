//! Semantic augmentation
//!
//! Runs only at deep depth. Extracts visible paragraph text and asks the
//! text-understanding collaborator for a relevance assessment. Failures here
//! degrade to a finding; they never abort the analysis.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::{Category, Finding, FindingStatus};
use crate::ai::{AiClient, SemanticSummary};

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("p selector"));
static KEYWORDS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="keywords"]"#).expect("keywords selector"));

/// Concatenate the visible paragraph text of the page.
pub fn extract_body_text(document: &Html) -> String {
    document
        .select(&PARAGRAPH)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Target keywords declared by the page itself, if any.
pub fn extract_keywords(document: &Html) -> Vec<String> {
    document
        .select(&KEYWORDS)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|content| {
            content
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Produce the semantic finding for a page body.
///
/// An empty body short-circuits without touching the collaborator. A missing
/// client uses the documented fallback summary. A collaborator error becomes
/// an error finding carrying the reason.
pub async fn augment(ai: Option<&AiClient>, body_text: &str, keywords: &[String]) -> Finding {
    if body_text.trim().is_empty() {
        return Finding::new(
            Category::Semantic,
            "no_text",
            FindingStatus::Warning,
            0,
            "No paragraph text found on the page",
            "Add meaningful body content so semantic relevance can be assessed.",
        );
    }

    let summary = match ai {
        None => {
            tracing::warn!("ai client not configured; using fallback semantic summary");
            SemanticSummary::fallback_unconfigured()
        }
        Some(client) => match client.summarize_relevance(body_text, keywords).await {
            Ok(summary) => summary,
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "semantic augmentation failed");
                return Finding::new(
                    Category::Semantic,
                    "error",
                    FindingStatus::Error,
                    0,
                    "Semantic analysis failed",
                    format!("{err:#}"),
                );
            }
        },
    };

    let score = summary.relevance_score.clamp(0, 100) as u8;
    Finding::new(
        Category::Semantic,
        "relevance",
        FindingStatus::Info,
        score,
        format!("Topic relevance: {score}/100"),
        summary.depth_assessment,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiConfig;

    fn unreachable_client() -> AiClient {
        // Nothing listens on port 9; any call would error out, which the
        // empty-body test must never see.
        AiClient::new(AiConfig {
            api_key: "test-key".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            model: "test-model".to_string(),
        })
        .expect("build client")
    }

    #[test]
    fn body_text_joins_paragraphs() {
        let document = Html::parse_document("<body><p>one two</p><p>three</p></body>");
        assert_eq!(extract_body_text(&document), "one two three");
    }

    #[test]
    fn body_text_ignores_non_paragraph_markup() {
        let document = Html::parse_document("<body><div>ignored</div><h1>ignored</h1></body>");
        assert_eq!(extract_body_text(&document), "");
    }

    #[test]
    fn keywords_split_and_trimmed() {
        let document = Html::parse_document(
            r#"<head><meta name="keywords" content="seo, content ,, audit"></head>"#,
        );
        assert_eq!(extract_keywords(&document), vec!["seo", "content", "audit"]);
    }

    #[tokio::test]
    async fn empty_body_never_calls_collaborator() {
        let client = unreachable_client();
        let finding = augment(Some(&client), "   ", &[]).await;

        assert_eq!(finding.category, Category::Semantic);
        assert_eq!(finding.component, "no_text");
        assert_eq!(finding.status, FindingStatus::Warning);
        assert_eq!(finding.score, 0);
    }

    #[tokio::test]
    async fn missing_client_uses_fallback_summary() {
        let finding = augment(None, "some body text", &[]).await;

        assert_eq!(finding.component, "relevance");
        assert_eq!(finding.status, FindingStatus::Info);
        assert_eq!(finding.score, 50);
    }

    #[tokio::test]
    async fn collaborator_failure_degrades_to_error_finding() {
        let client = unreachable_client();
        let finding = augment(Some(&client), "some body text", &[]).await;

        assert_eq!(finding.component, "error");
        assert_eq!(finding.status, FindingStatus::Error);
        assert_eq!(finding.score, 0);
        assert!(!finding.recommendation.is_empty());
    }
}
