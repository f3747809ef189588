mod apple;

pub use apple::AppleIdentityVerifier;

use async_trait::async_trait;
use thiserror::Error;

/// Identity asserted by an external sign-in provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    /// Stable provider subject.
    pub subject: String,
    pub email: Option<String>,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity token rejected: {0}")]
    InvalidToken(String),

    #[error("signing keys unavailable: {0}")]
    KeyFetch(#[from] reqwest::Error),

    #[error("external sign-in is not configured")]
    NotConfigured,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, identity_token: &str) -> Result<ExternalIdentity, IdentityError>;
}
