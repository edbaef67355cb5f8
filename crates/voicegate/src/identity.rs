use async_trait::async_trait;

use crate::error::IdentityError;

/// Authenticated caller, as established by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub uid: String,
    /// Value of the signed `premium` claim. Trusted without a store lookup.
    pub premium_claim: bool,
}

/// Admin operations on the identity provider used after a billing change.
#[async_trait]
pub trait IdentityAdmin: Send + Sync {
    /// Set the `premium` custom claim embedded in newly issued credentials.
    async fn set_premium_claim(&self, uid: &str, premium: bool) -> Result<(), IdentityError>;

    /// Invalidate every credential issued to `uid` so far.
    async fn revoke_tokens(&self, uid: &str) -> Result<(), IdentityError>;
}
