//! # seoscope-core
//!
//! Core library for rule-based SEO auditing of web pages.
//!
//! This library provides:
//! - Page fetching with a bounded timeout and typed failure taxonomy
//! - Deterministic rule evaluators (meta, content, technical) with fixed
//!   per-check scoring
//! - Depth-aware score aggregation
//! - An optional semantic augmentation pass backed by an AI collaborator
//! - A pure subscription entitlement policy with monthly quotas
//! - SQLite persistence for analyses, findings, and subscriptions
//!
//! ## Example
//!
//! ```no_run
//! use seoscope_core::{analyze, AnalysisDepth};
//!
//! # async fn example() -> Result<(), seoscope_core::AnalysisError> {
//! let report = analyze("https://example.com", AnalysisDepth::Complete, None).await?;
//! println!("overall score: {}", report.overall_score);
//! # Ok(())
//! # }
//! ```

pub mod ai;
pub mod audit;
pub mod entitlement;
pub mod fetcher;
pub mod store;

// Re-export commonly used types
pub use ai::{AiClient, AiConfig, Locale, Recommendation, RecommendationSet, SemanticSummary};
pub use audit::{
    AnalysisDepth, AnalysisError, AnalysisReport, Category, Finding, FindingStatus, HealthBand,
    analyze, analyze_document, health_band,
};
pub use entitlement::{
    EntitlementDecision, Plan, Subscription, SubscriptionStatus, check_entitlement, check_quota,
    month_start, monthly_quota, required_plans,
};
pub use fetcher::{FETCH_TIMEOUT, FetchError, fetch_page};
