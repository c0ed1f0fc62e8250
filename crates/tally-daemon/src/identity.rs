//! Identity provider boundary.
//!
//! Authentication lives outside the daemon. Callers attach a bearer
//! token issued by the external identity provider and the daemon
//! resolves it to a [`Principal`] before touching any state; there is
//! no ambient current-user session. Auth lifecycle webhooks (login,
//! signup, onboarding) arrive over RPC as [`AuthEvent`]s.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use tally_types::UserId;

use crate::config::IdentityConfig;

/// A resolved caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub email: String,
}

/// Resolves bearer tokens to principals.
pub trait IdentityProvider: Send + Sync {
    /// Resolve a token. `None` when the token is unknown or expired.
    fn resolve(&self, token: &str) -> Option<Principal>;
}

/// Token table loaded from `[[identity.tokens]]` config entries.
///
/// v1 implementation; a production deployment would verify
/// provider-signed session tokens here instead.
pub struct StaticTokenProvider {
    tokens: HashMap<String, Principal>,
}

impl StaticTokenProvider {
    /// Build the table from config.
    pub fn from_config(config: &IdentityConfig) -> Self {
        let tokens = config
            .tokens
            .iter()
            .map(|entry| {
                (
                    entry.token.clone(),
                    Principal {
                        user_id: entry.user_id.clone(),
                        email: entry.email.clone(),
                    },
                )
            })
            .collect();
        Self { tokens }
    }
}

impl IdentityProvider for StaticTokenProvider {
    fn resolve(&self, token: &str) -> Option<Principal> {
        self.tokens.get(token).cloned()
    }
}

/// An auth lifecycle event relayed from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthEvent {
    /// Returning login. Guarantees the profile row exists.
    LoggedIn,
    /// New signup, optionally carrying the referral code the signup
    /// arrived through.
    SignedUp { referral_code: Option<String> },
    /// The referred user finished onboarding; the referral bonus
    /// becomes payable.
    OnboardingCompleted,
    /// Recovery flow started. Consumed for audit logging only.
    PasswordRecoveryRequested,
}
