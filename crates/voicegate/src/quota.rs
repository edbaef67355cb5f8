//! Token accounting for the free tier.
//!
//! The store runs [`decide_reservation`] inside the same transaction that
//! reads the account, so the cap check and the increment are never split.

use crate::error::QuotaError;
use crate::plan::{Plan, UserAccount};

/// Estimates how many quota tokens a piece of text costs.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> u64;
}

/// Counts Unicode scalar values. Stands in for a real tokenizer and treats
/// multi-byte scripts the same as ASCII.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCountEstimator;

impl TokenEstimator for CharCountEstimator {
    fn estimate(&self, text: &str) -> u64 {
        text.chars().count() as u64
    }
}

/// Outcome of a successful reservation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationDecision {
    /// Plan to write back; the stored plan, or free for a new account.
    pub plan: Plan,
    /// Premium by claim or stored plan.
    pub is_premium: bool,
    /// Tokens added to the counter. Zero for premium callers.
    pub charge: u64,
    /// Counter value before this reservation.
    pub used_before: u64,
    /// Whether the account record already existed.
    pub existed: bool,
}

/// Decide whether `cost` tokens may be reserved against `stored`.
///
/// A missing record reads as a free account with nothing used. A premium
/// claim overrides the stored plan. Non-premium callers are rejected when
/// `used + cost` would exceed `cap`.
pub fn decide_reservation(
    stored: Option<&UserAccount>,
    cost: u64,
    cap: u64,
    premium_claim: bool,
) -> Result<ReservationDecision, QuotaError> {
    let plan = stored.map(|a| a.plan).unwrap_or_default();
    let used = stored.map(|a| a.total_tokens_used).unwrap_or(0);
    let is_premium = premium_claim || plan.is_premium();

    if !is_premium && used.saturating_add(cost) > cap {
        return Err(QuotaError::LimitExceeded { used, cap });
    }

    Ok(ReservationDecision {
        plan,
        is_premium,
        charge: if is_premium { 0 } else { cost },
        used_before: used,
        existed: stored.is_some(),
    })
}
