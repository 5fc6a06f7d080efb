//! Subscription entitlement policy
//!
//! Pure read-and-decide functions over already-loaded subscription data. The
//! caller chooses how to render a denial (redirect, 403, etc.); this module
//! only computes allow/deny plus the reason to surface.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::audit::AnalysisDepth;

/// Subscription tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Basic,
    Premium,
    Enterprise,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Basic => "basic",
            Plan::Premium => "premium",
            Plan::Enterprise => "enterprise",
        }
    }
}

impl FromStr for Plan {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Plan::Free),
            "basic" => Ok(Plan::Basic),
            "premium" => Ok(Plan::Premium),
            "enterprise" => Ok(Plan::Enterprise),
            other => Err(UnknownField::new("plan", other)),
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Billing lifecycle state as reported by the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Canceled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            other => Err(UnknownField::new("subscription status", other)),
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored subscription field held a value outside the known set.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownField {
    kind: &'static str,
    value: String,
}

impl UnknownField {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// A user's subscription record. Billing webhooks mutate this; the policy
/// only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub renews_at: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }
}

/// Outcome of an entitlement or quota check. Not an error: denials are a
/// normal structured result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementDecision {
    pub allowed: bool,
    pub reason: String,
}

impl EntitlementDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: String::new(),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// Decide whether a caller may use a capability gated on the given plans.
///
/// An inactive subscription record never satisfies a paid-plan requirement,
/// even when its plan matches; the only thing an inactive or absent record
/// can grant is the free tier, and only when `free` is among the required
/// plans.
pub fn check_entitlement(
    subscription: Option<&Subscription>,
    required: &[Plan],
    is_admin: bool,
) -> EntitlementDecision {
    if is_admin {
        return EntitlementDecision::allow();
    }

    if let Some(sub) = subscription {
        if sub.is_active() {
            return if required.contains(&sub.plan) {
                EntitlementDecision::allow()
            } else {
                EntitlementDecision::deny(format!(
                    "This feature requires a {} subscription. Your current plan is \"{}\".",
                    plan_list(required),
                    sub.plan
                ))
            };
        }

        // Inactive record: free fallback only.
        if required.contains(&Plan::Free) && sub.plan == Plan::Free {
            return EntitlementDecision::allow();
        }
        return EntitlementDecision::deny(format!(
            "Your subscription status is \"{}\". This feature requires a {} subscription.",
            sub.status,
            plan_list(required)
        ));
    }

    // No record at all: users who never purchased anything are free-tier.
    if required.contains(&Plan::Free) {
        EntitlementDecision::allow()
    } else {
        EntitlementDecision::deny(
            "No subscription found. An active subscription is required to access this feature.",
        )
    }
}

/// Plans allowed to request each analysis depth.
pub fn required_plans(depth: AnalysisDepth) -> &'static [Plan] {
    match depth {
        AnalysisDepth::Meta => &[Plan::Free, Plan::Basic, Plan::Premium, Plan::Enterprise],
        AnalysisDepth::Partial => &[Plan::Basic, Plan::Premium, Plan::Enterprise],
        AnalysisDepth::Complete => &[Plan::Premium, Plan::Enterprise],
        AnalysisDepth::Deep => &[Plan::Enterprise],
    }
}

/// Analyses allowed per calendar month, `None` for unlimited.
pub fn monthly_quota(plan: Plan) -> Option<u32> {
    match plan {
        Plan::Free => Some(5),
        Plan::Basic => Some(25),
        Plan::Premium | Plan::Enterprise => None,
    }
}

/// Quota check, independent of plan gating. `used_this_month` counts analyses
/// created since [`month_start`].
pub fn check_quota(plan: Plan, used_this_month: u32) -> EntitlementDecision {
    match monthly_quota(plan) {
        Some(limit) if used_this_month >= limit => EntitlementDecision::deny(format!(
            "Monthly analysis quota reached ({limit} analyses per month on the {plan} plan)."
        )),
        _ => EntitlementDecision::allow(),
    }
}

/// First day of the current month at 00:00:00 UTC.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .expect("first of the month at midnight UTC is unambiguous")
}

fn plan_list(plans: &[Plan]) -> String {
    let names: Vec<&str> = plans.iter().map(Plan::as_str).collect();
    format!("\"{}\"", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(plan: Plan, status: SubscriptionStatus) -> Subscription {
        Subscription {
            plan,
            status,
            renews_at: None,
        }
    }

    #[test]
    fn admin_overrides_everything() {
        let decision = check_entitlement(None, &[], true);
        assert!(decision.allowed);

        let basic = sub(Plan::Basic, SubscriptionStatus::Canceled);
        let decision = check_entitlement(Some(&basic), &[Plan::Enterprise], true);
        assert!(decision.allowed);
    }

    #[test]
    fn active_matching_plan_is_allowed() {
        let premium = sub(Plan::Premium, SubscriptionStatus::Active);
        let decision = check_entitlement(Some(&premium), required_plans(AnalysisDepth::Complete), false);
        assert!(decision.allowed);
    }

    #[test]
    fn active_mismatched_plan_names_the_actual_plan() {
        let basic = sub(Plan::Basic, SubscriptionStatus::Active);
        let decision = check_entitlement(Some(&basic), &[Plan::Premium, Plan::Enterprise], false);
        assert!(!decision.allowed);
        assert!(decision.reason.contains("basic"));
    }

    #[test]
    fn no_record_falls_back_to_free() {
        let decision = check_entitlement(None, &[Plan::Free, Plan::Basic], false);
        assert!(decision.allowed);
    }

    #[test]
    fn no_record_is_denied_for_paid_plans() {
        let decision = check_entitlement(None, &[Plan::Premium], false);
        assert!(!decision.allowed);
        assert!(decision.reason.contains("No subscription found"));
    }

    #[test]
    fn inactive_record_never_grants_a_paid_plan() {
        let past_due = sub(Plan::Premium, SubscriptionStatus::PastDue);
        let decision = check_entitlement(Some(&past_due), &[Plan::Premium], false);
        assert!(!decision.allowed);
        assert!(decision.reason.contains("past_due"));
    }

    #[test]
    fn inactive_free_record_still_gets_free_features() {
        let canceled_free = sub(Plan::Free, SubscriptionStatus::Canceled);
        let decision = check_entitlement(
            Some(&canceled_free),
            required_plans(AnalysisDepth::Meta),
            false,
        );
        assert!(decision.allowed);
    }

    #[test]
    fn inactive_record_does_not_get_free_fallback_for_paid_features() {
        let canceled_free = sub(Plan::Free, SubscriptionStatus::Canceled);
        let decision = check_entitlement(Some(&canceled_free), &[Plan::Basic], false);
        assert!(!decision.allowed);
    }

    #[test]
    fn depth_permission_matrix() {
        assert_eq!(required_plans(AnalysisDepth::Meta).len(), 4);
        assert!(required_plans(AnalysisDepth::Partial).contains(&Plan::Basic));
        assert!(!required_plans(AnalysisDepth::Partial).contains(&Plan::Free));
        assert_eq!(required_plans(AnalysisDepth::Deep), &[Plan::Enterprise]);
    }

    #[test]
    fn quota_limits() {
        assert_eq!(monthly_quota(Plan::Free), Some(5));
        assert_eq!(monthly_quota(Plan::Basic), Some(25));
        assert_eq!(monthly_quota(Plan::Premium), None);

        // 5 already used on free: the 6th is denied.
        let decision = check_quota(Plan::Free, 5);
        assert!(!decision.allowed);
        assert!(decision.reason.contains("quota"));

        // 24 used on basic: the 25th is allowed.
        assert!(check_quota(Plan::Basic, 24).allowed);
        assert!(!check_quota(Plan::Basic, 25).allowed);

        // Unlimited tiers never hit a quota.
        assert!(check_quota(Plan::Enterprise, 100_000).allowed);
    }

    #[test]
    fn month_start_is_first_midnight_utc() {
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 15, 30, 45).unwrap();
        let start = month_start(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn plan_and_status_round_trip_strings() {
        assert_eq!("premium".parse::<Plan>().unwrap(), Plan::Premium);
        assert_eq!(
            "past_due".parse::<SubscriptionStatus>().unwrap(),
            SubscriptionStatus::PastDue
        );
        assert!("gold".parse::<Plan>().is_err());
    }
}
