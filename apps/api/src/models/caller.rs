use serde::{Deserialize, Serialize};

/// Subscription tier attached to the caller by the identity provider.
/// Anything other than `premium` is treated as the free tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Premium,
    #[serde(other)]
    Free,
}

impl Plan {
    pub fn is_premium(&self) -> bool {
        matches!(self, Plan::Premium)
    }
}

/// Authenticated caller identity for one request, resolved by the auth
/// middleware and injected as an axum `Extension`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: String,
    pub plan: Plan,
    pub free_usage: i64,
}
