//! AI collaborator integration
//!
//! Talks to an OpenAI-compatible chat endpoint for the semantic relevance
//! summary and the prose recommendation generation. Configuration is read
//! once at startup into an [`AiConfig`]; an unconfigured deployment gets the
//! documented fallback objects instead of network calls.

use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::audit::{AnalysisDepth, Category, Finding};

const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
const DEFAULT_MODEL: &str = "deepseek-chat";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Response language for generated recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Fr,
}

impl Locale {
    pub fn from_tag(tag: &str) -> Self {
        if tag.to_ascii_lowercase().starts_with("fr") {
            Locale::Fr
        } else {
            Locale::En
        }
    }
}

/// Collaborator configuration, resolved once at process start.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl AiConfig {
    /// Read configuration from the environment. `None` means AI features are
    /// disabled for this process and callers receive fallbacks.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("SEOSCOPE_AI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())?;
        let base_url = std::env::var("SEOSCOPE_AI_BASE_URL")
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("SEOSCOPE_AI_MODEL")
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Some(Self {
            api_key,
            base_url,
            model,
        })
    }
}

/// Structured result of the semantic relevance summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticSummary {
    pub relevance_score: i64,
    pub depth_assessment: String,
    #[serde(default)]
    pub keyword_suggestions: Vec<String>,
    #[serde(default)]
    pub structure_recommendations: Vec<String>,
}

impl SemanticSummary {
    /// Summary used when no collaborator is configured.
    pub fn fallback_unconfigured() -> Self {
        Self {
            relevance_score: 50,
            depth_assessment: "AI-powered semantic analysis requires an API key.".to_string(),
            keyword_suggestions: Vec::new(),
            structure_recommendations: vec![
                "Configure an AI API key to enable detailed semantic analysis".to_string(),
                "Ensure proper heading structure".to_string(),
            ],
        }
    }
}

/// One actionable recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub steps: Vec<String>,
}

/// The full recommendation payload handed back to reporting surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub summary: String,
    #[serde(default)]
    pub priorities: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    pub insights: String,
}

impl RecommendationSet {
    pub fn fallback_unconfigured(locale: Locale) -> Self {
        match locale {
            Locale::Fr => Self {
                summary: "Les recommandations propulsées par l'IA nécessitent une clé API."
                    .to_string(),
                priorities: vec![
                    "Corriger les erreurs techniques".to_string(),
                    "Améliorer les balises méta".to_string(),
                    "Améliorer le contenu".to_string(),
                ],
                recommendations: vec![Recommendation {
                    title: "Clé API requise".to_string(),
                    description:
                        "Pour accéder aux recommandations propulsées par l'IA, veuillez configurer une clé API valide."
                            .to_string(),
                    steps: vec![
                        "Configurez votre clé API".to_string(),
                        "Relancez l'analyse pour voir les recommandations IA".to_string(),
                    ],
                }],
                insights:
                    "Le rapport d'analyse détaillé fournit des informations précieuses sur les performances SEO de votre site."
                        .to_string(),
            },
            Locale::En => Self {
                summary: "AI-powered recommendations require an API key.".to_string(),
                priorities: vec![
                    "Fix technical errors".to_string(),
                    "Improve meta tags".to_string(),
                    "Enhance content".to_string(),
                ],
                recommendations: vec![Recommendation {
                    title: "API Key Required".to_string(),
                    description:
                        "To access AI-powered recommendations, please configure a valid API key."
                            .to_string(),
                    steps: vec![
                        "Configure your API key".to_string(),
                        "Re-run the analysis to see AI recommendations".to_string(),
                    ],
                }],
                insights:
                    "The detailed analysis report provides valuable information about your site's SEO performance."
                        .to_string(),
            },
        }
    }

    pub fn fallback_error(locale: Locale) -> Self {
        match locale {
            Locale::Fr => Self {
                summary: "Impossible de générer des recommandations IA pour le moment."
                    .to_string(),
                priorities: vec![
                    "Corriger les erreurs techniques".to_string(),
                    "Améliorer les balises méta".to_string(),
                    "Améliorer le contenu".to_string(),
                ],
                recommendations: vec![Recommendation {
                    title: "Erreur Système".to_string(),
                    description:
                        "Nous avons rencontré un problème lors de la génération des recommandations IA. Veuillez réessayer plus tard."
                            .to_string(),
                    steps: vec![
                        "Actualisez la page".to_string(),
                        "Contactez le support si le problème persiste".to_string(),
                    ],
                }],
                insights:
                    "Notre système d'IA est temporairement indisponible. Veuillez consulter le rapport d'analyse détaillé."
                        .to_string(),
            },
            Locale::En => Self {
                summary: "Unable to generate AI recommendations at this time.".to_string(),
                priorities: vec![
                    "Fix technical errors".to_string(),
                    "Improve meta tags".to_string(),
                    "Enhance content".to_string(),
                ],
                recommendations: vec![Recommendation {
                    title: "System Error".to_string(),
                    description:
                        "We encountered an issue generating AI recommendations. Please try again later."
                            .to_string(),
                    steps: vec![
                        "Refresh the page".to_string(),
                        "Contact support if the issue persists".to_string(),
                    ],
                }],
                insights:
                    "Our AI system is temporarily unavailable. Please check the detailed analysis report for recommendations."
                        .to_string(),
            },
        }
    }
}

/// Client for the OpenAI-compatible chat endpoint.
pub struct AiClient {
    client: reqwest::Client,
    config: AiConfig,
}

impl AiClient {
    pub fn new(config: AiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build ai http client")?;
        Ok(Self { client, config })
    }

    fn chat_endpoint(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    /// Summarize topic relevance of the page body.
    pub async fn summarize_relevance(
        &self,
        text: &str,
        keywords: &[String],
    ) -> anyhow::Result<SemanticSummary> {
        let excerpt: String = text.chars().take(1000).collect();
        let mut prompt =
            format!("Analyze the following content semantically for SEO purposes:\n\n{excerpt}\n\n");
        if !keywords.is_empty() {
            prompt.push_str(&format!("Target keywords: {}\n\n", keywords.join(", ")));
        }
        prompt.push_str(
            "Provide a semantic analysis with a topic relevance score (0-100), a content depth \
             assessment, semantic keyword suggestions, and content structure recommendations.\n\
             Format your response as JSON with these fields:\n\
             - relevance_score: number\n\
             - depth_assessment: string\n\
             - keyword_suggestions: array of strings\n\
             - structure_recommendations: array of strings\n",
        );

        let value = self
            .chat_json("You are an expert in semantic SEO analysis.", &prompt, 800)
            .await?;
        serde_json::from_value(value).context("parse semantic summary payload")
    }

    /// Turn scored findings into prose recommendations.
    ///
    /// Never fails: collaborator errors degrade to the localized fallback.
    pub async fn generate_recommendations(
        &self,
        url: &str,
        depth: AnalysisDepth,
        findings: &[Finding],
        locale: Locale,
    ) -> RecommendationSet {
        match self.request_recommendations(url, depth, findings, locale).await {
            Ok(set) => set,
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "recommendation generation failed");
                RecommendationSet::fallback_error(locale)
            }
        }
    }

    async fn request_recommendations(
        &self,
        url: &str,
        depth: AnalysisDepth,
        findings: &[Finding],
        locale: Locale,
    ) -> anyhow::Result<RecommendationSet> {
        let language_instruction = match locale {
            Locale::Fr => "in French",
            Locale::En => "in English",
        };
        let analysis_text = format_findings(url, depth, findings);

        let prompt = format!(
            "You are an expert SEO consultant analyzing the following website: {url}\n\n\
             Here is the SEO analysis data:\n{analysis_text}\n\n\
             Based on this analysis, please provide your response {language_instruction}:\n\
             1. A summary of the main SEO issues identified\n\
             2. The top 3-5 most important recommendations to improve the site's SEO\n\
             3. Specific actionable steps for each recommendation\n\
             4. Additional insights based on current SEO best practices\n\n\
             Structure your response as JSON with these fields:\n\
             - summary: A concise summary of findings\n\
             - priorities: Array of top issues to address\n\
             - recommendations: Array of objects with 'title', 'description', and 'steps' (array of specific steps)\n\
             - insights: Additional expert insights\n"
        );
        let system = format!(
            "You are an expert SEO analyst providing clear, actionable advice {language_instruction}."
        );

        let value = self.chat_json(&system, &prompt, 1000).await?;
        serde_json::from_value(value).context("parse recommendation payload")
    }

    async fn chat_json(&self, system: &str, user: &str, max_tokens: u32) -> anyhow::Result<Value> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "response_format": { "type": "json_object" },
            "max_tokens": max_tokens,
        });

        let endpoint = self.chat_endpoint();
        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {endpoint}"))?;

        let status = response.status();
        let raw = response.text().await.context("read chat response body")?;
        if !status.is_success() {
            let message = parse_error_message(&raw).unwrap_or_else(|| raw.clone());
            anyhow::bail!("chat API error ({status}): {message}");
        }

        let value: Value = serde_json::from_str(&raw).context("parse chat response")?;
        let content = value
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("missing message content in chat response"))?;
        serde_json::from_str(content).context("parse structured chat content")
    }
}

/// Ask for recommendations, falling back cleanly when no client is configured.
pub async fn recommendations(
    ai: Option<&AiClient>,
    url: &str,
    depth: AnalysisDepth,
    findings: &[Finding],
    locale: Locale,
) -> RecommendationSet {
    match ai {
        Some(client) => client.generate_recommendations(url, depth, findings, locale).await,
        None => {
            tracing::warn!("ai client not configured; returning fallback recommendations");
            RecommendationSet::fallback_unconfigured(locale)
        }
    }
}

/// Render findings as the text block the recommendation prompt consumes.
pub fn format_findings(url: &str, depth: AnalysisDepth, findings: &[Finding]) -> String {
    let mut sections = vec![
        format!("URL: {url}"),
        format!("Analysis Type: {depth}"),
        "\nFINDINGS:".to_string(),
    ];

    for category in [
        Category::Meta,
        Category::Content,
        Category::Technical,
        Category::Semantic,
    ] {
        let in_category: Vec<&Finding> =
            findings.iter().filter(|f| f.category == category).collect();
        if in_category.is_empty() {
            continue;
        }

        sections.push(format!(
            "\n== {} ANALYSIS ==",
            category.as_str().to_uppercase()
        ));
        for finding in in_category {
            sections.push(format!(
                "- {}: {} (Score: {}/100)",
                finding.component,
                finding.status.as_str().to_uppercase(),
                finding.score
            ));
            sections.push(format!("  {}", finding.description));
        }
    }

    sections.join("\n")
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: Value = serde_json::from_str(raw_json).ok()?;
    let message = value.get("error")?.get("message")?.as_str()?.to_owned();
    Some(message)
}
