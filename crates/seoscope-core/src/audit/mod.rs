//! Rule-based SEO auditing
//!
//! This module runs a fixed checklist of SEO rules against a fetched HTML
//! document and aggregates the per-check scores into category and overall
//! scores. Which categories run is decided by the requested analysis depth.

pub mod content;
pub mod meta;
pub mod semantic;
pub mod technical;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use scraper::Html;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::ai::AiClient;
use crate::fetcher::{self, FetchError};

/// How deep an analysis goes; each tier adds one evaluator category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisDepth {
    /// Meta tags only
    Meta,

    /// Meta + content
    Partial,

    /// Meta + content + technical
    Complete,

    /// Everything, plus the semantic augmentation pass
    Deep,
}

impl AnalysisDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisDepth::Meta => "meta",
            AnalysisDepth::Partial => "partial",
            AnalysisDepth::Complete => "complete",
            AnalysisDepth::Deep => "deep",
        }
    }

    pub fn includes_content(&self) -> bool {
        *self >= AnalysisDepth::Partial
    }

    pub fn includes_technical(&self) -> bool {
        *self >= AnalysisDepth::Complete
    }

    pub fn includes_semantic(&self) -> bool {
        *self == AnalysisDepth::Deep
    }

    /// Categories whose scores enter the overall average at this depth.
    ///
    /// Semantic findings are advisory and never part of the numeric average.
    pub fn scored_categories(&self) -> &'static [Category] {
        match self {
            AnalysisDepth::Meta => &[Category::Meta],
            AnalysisDepth::Partial => &[Category::Meta, Category::Content],
            AnalysisDepth::Complete | AnalysisDepth::Deep => {
                &[Category::Meta, Category::Content, Category::Technical]
            }
        }
    }
}

impl FromStr for AnalysisDepth {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meta" => Ok(AnalysisDepth::Meta),
            "partial" => Ok(AnalysisDepth::Partial),
            "complete" => Ok(AnalysisDepth::Complete),
            "deep" => Ok(AnalysisDepth::Deep),
            other => Err(AnalysisError::InvalidDepth(other.to_string())),
        }
    }
}

impl fmt::Display for AnalysisDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluator category a finding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Meta,
    Content,
    Technical,
    Semantic,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Meta => "meta",
            Category::Content => "content",
            Category::Technical => "technical",
            Category::Semantic => "semantic",
        }
    }
}

impl FromStr for Category {
    type Err = InvalidVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "meta" => Ok(Category::Meta),
            "content" => Ok(Category::Content),
            "technical" => Ok(Category::Technical),
            "semantic" => Ok(Category::Semantic),
            other => Err(InvalidVariant::new("category", other)),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome classification of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingStatus {
    Good,
    Warning,
    Error,
    Info,
}

impl FindingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingStatus::Good => "good",
            FindingStatus::Warning => "warning",
            FindingStatus::Error => "error",
            FindingStatus::Info => "info",
        }
    }
}

impl FromStr for FindingStatus {
    type Err = InvalidVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "good" => Ok(FindingStatus::Good),
            "warning" => Ok(FindingStatus::Warning),
            "error" => Ok(FindingStatus::Error),
            "info" => Ok(FindingStatus::Info),
            other => Err(InvalidVariant::new("status", other)),
        }
    }
}

/// A stored enum field held a value outside the known set.
#[derive(Debug, thiserror::Error)]
#[error("unrecognized {kind} value: {value}")]
pub struct InvalidVariant {
    kind: &'static str,
    value: String,
}

impl InvalidVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// One named, scored check result produced by an evaluator.
///
/// Findings are constructed once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub category: Category,
    pub component: String,
    pub status: FindingStatus,
    pub score: u8,
    pub description: String,
    pub recommendation: String,
}

impl Finding {
    pub fn new(
        category: Category,
        component: &str,
        status: FindingStatus,
        score: u8,
        description: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            category,
            component: component.to_string(),
            status,
            score,
            description: description.into(),
            recommendation: recommendation.into(),
        }
    }
}

/// Complete result of one fetch-and-evaluate cycle. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub url: String,
    pub depth: AnalysisDepth,
    pub category_scores: BTreeMap<Category, u8>,
    pub overall_score: u8,
    pub findings: Vec<Finding>,
}

/// Errors an analysis attempt can end with.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("unknown analysis depth: {0}")]
    InvalidDepth(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("could not parse document: {0}")]
    Parse(String),

    #[error("analysis failed: {0}")]
    Evaluation(String),
}

/// Truncating mean of the finding scores, `None` for an empty slice.
pub fn category_score(findings: &[Finding]) -> Option<u8> {
    if findings.is_empty() {
        return None;
    }
    let sum: u32 = findings.iter().map(|f| u32::from(f.score)).sum();
    Some((sum / findings.len() as u32) as u8)
}

/// Truncating mean of the category scores applicable at the given depth.
///
/// Meta is always present, so the divisor is never zero.
pub fn overall_score(scores: &BTreeMap<Category, u8>, depth: AnalysisDepth) -> u8 {
    let applicable: Vec<u32> = depth
        .scored_categories()
        .iter()
        .filter_map(|category| scores.get(category).map(|s| u32::from(*s)))
        .collect();

    if applicable.is_empty() {
        return 0;
    }
    (applicable.iter().sum::<u32>() / applicable.len() as u32) as u8
}

/// Coarse health label used by reporting surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthBand {
    Good,
    Fair,
    Poor,
}

pub fn health_band(score: u8) -> HealthBand {
    if score >= 80 {
        HealthBand::Good
    } else if score >= 60 {
        HealthBand::Fair
    } else {
        HealthBand::Poor
    }
}

/// Analyze a URL end to end: fetch, evaluate, aggregate, and (at deep depth)
/// augment with the semantic collaborator.
///
/// This is the single entry point route handlers call after the entitlement
/// check has passed.
pub async fn analyze(
    url: &str,
    depth: AnalysisDepth,
    ai: Option<&AiClient>,
) -> Result<AnalysisReport, AnalysisError> {
    let parsed = parse_target_url(url)?;

    tracing::info!(url = %parsed, depth = %depth, "starting analysis");
    let html = fetcher::fetch_page(parsed.as_str()).await?;

    // Html is not Send, so all document work happens before the augmentation
    // await point.
    let (mut report, body) = {
        let document = parse_html(&html)?;
        let report = evaluate_document(&document, &parsed, depth)?;
        let body = depth
            .includes_semantic()
            .then(|| (semantic::extract_body_text(&document), semantic::extract_keywords(&document)));
        (report, body)
    };

    if let Some((body_text, keywords)) = body {
        let finding = semantic::augment(ai, &body_text, &keywords).await;
        report.findings.push(finding);
    }

    tracing::info!(
        url = %report.url,
        overall = report.overall_score,
        findings = report.findings.len(),
        "analysis finished"
    );
    Ok(report)
}

/// Evaluate an already-fetched document without any network traffic.
///
/// The semantic augmentation pass is a collaborator call and only happens in
/// [`analyze`]; this function covers everything deterministic.
pub fn analyze_document(
    html: &str,
    url: &Url,
    depth: AnalysisDepth,
) -> Result<AnalysisReport, AnalysisError> {
    let document = parse_html(html)?;
    evaluate_document(&document, url, depth)
}

fn parse_target_url(url: &str) -> Result<Url, AnalysisError> {
    let parsed = Url::parse(url).map_err(|e| AnalysisError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(AnalysisError::InvalidUrl(format!(
            "unsupported scheme: {other}"
        ))),
    }
}

fn parse_html(html: &str) -> Result<Html, AnalysisError> {
    if html.trim().is_empty() {
        return Err(AnalysisError::Parse("document is empty".to_string()));
    }
    Ok(Html::parse_document(html))
}

fn evaluate_document(
    document: &Html,
    url: &Url,
    depth: AnalysisDepth,
) -> Result<AnalysisReport, AnalysisError> {
    let mut findings = Vec::new();
    let mut category_scores = BTreeMap::new();

    let meta_findings = meta::evaluate_meta(document);
    insert_category(&mut category_scores, Category::Meta, &meta_findings)?;
    findings.extend(meta_findings);

    if depth.includes_content() {
        let content_findings = content::evaluate_content(document);
        insert_category(&mut category_scores, Category::Content, &content_findings)?;
        findings.extend(content_findings);
    }

    if depth.includes_technical() {
        let technical_findings = technical::evaluate_technical(document, url);
        insert_category(&mut category_scores, Category::Technical, &technical_findings)?;
        findings.extend(technical_findings);
    }

    let overall = overall_score(&category_scores, depth);

    Ok(AnalysisReport {
        url: url.to_string(),
        depth,
        category_scores,
        overall_score: overall,
        findings,
    })
}

fn insert_category(
    scores: &mut BTreeMap<Category, u8>,
    category: Category,
    findings: &[Finding],
) -> Result<(), AnalysisError> {
    let score = category_score(findings).ok_or_else(|| {
        AnalysisError::Evaluation(format!("{category} evaluator produced no findings"))
    })?;
    scores.insert(category, score);
    Ok(())
}
