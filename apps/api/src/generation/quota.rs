//! Two-tier usage policy.
//!
//! Cheap text operations are metered: free-tier callers get a counted
//! allowance and premium callers are unlimited. Expensive media operations
//! are gated on the premium plan outright, independent of the counter.

use crate::models::caller::Caller;

/// Free-tier allowance for metered operations.
pub const FREE_TIER_LIMIT: i64 = 10;

/// How an operation is billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Billing {
    /// Counts against the free-tier allowance for non-premium callers.
    Metered,
    /// Requires the premium plan unconditionally.
    PremiumOnly,
}

/// Why a caller was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDenied {
    LimitReached,
    PremiumRequired,
}

impl QuotaDenied {
    pub fn message(&self) -> &'static str {
        match self {
            QuotaDenied::LimitReached => {
                "Free usage limit reached. Upgrade to premium to continue."
            }
            QuotaDenied::PremiumRequired => {
                "This feature is only available to premium subscribers."
            }
        }
    }
}

/// Decides whether the caller may perform an operation. Pure; the caller's
/// plan and usage arrive with the request from the identity provider.
pub fn check(billing: Billing, caller: &Caller) -> Result<(), QuotaDenied> {
    match billing {
        Billing::Metered => {
            if !caller.plan.is_premium() && caller.free_usage >= FREE_TIER_LIMIT {
                Err(QuotaDenied::LimitReached)
            } else {
                Ok(())
            }
        }
        Billing::PremiumOnly => {
            if caller.plan.is_premium() {
                Ok(())
            } else {
                Err(QuotaDenied::PremiumRequired)
            }
        }
    }
}

/// Whether a successful metered operation should bump the caller's counter.
/// Premium usage is never counted.
pub fn counts_against_quota(billing: Billing, caller: &Caller) -> bool {
    billing == Billing::Metered && !caller.plan.is_premium()
}
