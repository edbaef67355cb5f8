use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PlanInputError;

/// Billing tier of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Premium,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Premium => "premium",
        }
    }

    pub fn is_premium(&self) -> bool {
        matches!(self, Plan::Premium)
    }

    /// Map a boolean premium flag onto a plan.
    pub fn from_premium_flag(is_premium: bool) -> Self {
        if is_premium {
            Plan::Premium
        } else {
            Plan::Free
        }
    }

    /// Normalise a client-asserted plan.
    ///
    /// An explicit `plan` string wins and must name a known plan. Without one,
    /// the `isPremium` flag decides. Neither present is an error.
    pub fn from_client_input(
        plan: Option<&str>,
        is_premium: Option<bool>,
    ) -> Result<Self, PlanInputError> {
        match (plan, is_premium) {
            (Some(raw), _) => raw.parse(),
            (None, Some(flag)) => Ok(Plan::from_premium_flag(flag)),
            (None, None) => Err(PlanInputError::Missing),
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = PlanInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Plan::Free),
            "premium" => Ok(Plan::Premium),
            other => Err(PlanInputError::UnknownPlan(other.to_string())),
        }
    }
}

/// Who last wrote an account's plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanSource {
    /// The app asserted the plan itself. Not authoritative.
    Client,
    /// The billing provider's webhook. Authoritative.
    Webhook,
}

impl PlanSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanSource::Client => "client",
            PlanSource::Webhook => "webhook",
        }
    }
}

impl FromStr for PlanSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(PlanSource::Client),
            "webhook" => Ok(PlanSource::Webhook),
            other => Err(format!("unknown plan source: {other}")),
        }
    }
}

/// Stored per-user account record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub uid: String,
    pub plan: Plan,
    pub total_tokens_used: u64,
    /// Unix seconds.
    pub created_at: i64,
    /// Unix seconds.
    pub updated_at: i64,
    pub last_plan_sync_source: Option<PlanSource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_plan_wins_over_flag() {
        assert_eq!(
            Plan::from_client_input(Some("free"), Some(true)).unwrap(),
            Plan::Free
        );
        assert_eq!(
            Plan::from_client_input(Some("premium"), Some(false)).unwrap(),
            Plan::Premium
        );
    }

    #[test]
    fn test_flag_used_without_plan() {
        assert_eq!(
            Plan::from_client_input(None, Some(true)).unwrap(),
            Plan::Premium
        );
        assert_eq!(
            Plan::from_client_input(None, Some(false)).unwrap(),
            Plan::Free
        );
    }

    #[test]
    fn test_missing_and_unknown_input() {
        assert_eq!(
            Plan::from_client_input(None, None),
            Err(PlanInputError::Missing)
        );
        assert_eq!(
            Plan::from_client_input(Some("gold"), Some(true)),
            Err(PlanInputError::UnknownPlan("gold".to_string()))
        );
    }

    #[test]
    fn test_plan_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Plan::Premium).unwrap(), "\"premium\"");
        assert_eq!(Plan::Free.to_string(), "free");
    }
}
