//! Authorization logic.

pub mod access_token;
pub mod issuer;
pub mod token_manager;

pub use self::{
    access_token::AccessToken,
    issuer::{Credentials, TokenIssuer},
    token_manager::TokenManager,
};

/// Exchanges long lived credentials for a fresh [`AccessToken`].
#[async_trait::async_trait]
pub trait TokenRefresher: Send + Sync {
    /// `current` is the token being replaced, if any.
    async fn refresh(&self, current: Option<&AccessToken>) -> crate::Result<AccessToken>;
}
