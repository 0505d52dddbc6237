//! Authentication hook for validating connect-time tokens.
//!
//! Syncline doesn't mint or verify credentials itself. Token issuance,
//! password hashing, and account storage live in the host application.
//! The framework only needs one question answered at connect time: *whose
//! token is this?* The [`Authenticator`] trait is that question.

use syncline_protocol::PlayerId;

use crate::SessionError;

/// Validates a client's connect-time token and returns their identity.
///
/// Called once per connection, before anything touches the registry. A
/// failure is fatal to that connection only; the client is disconnected
/// with a policy-violation close and no other player notices.
///
/// # Example
///
/// ```rust
/// use syncline_session::{Authenticator, SessionError};
/// use syncline_protocol::PlayerId;
///
/// /// Accepts any numeric token as the player id. Development only.
/// struct DevAuthenticator;
///
/// impl Authenticator for DevAuthenticator {
///     async fn verify_token(
///         &self,
///         token: &str,
///     ) -> Result<PlayerId, SessionError> {
///         let id: u32 = token.parse().map_err(|_| {
///             SessionError::AuthFailed("token must be a number".into())
///         })?;
///         Ok(PlayerId(id))
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates the given token and returns the player's identity.
    ///
    /// # Errors
    /// [`SessionError::AuthFailed`] if the token is invalid, expired, or
    /// rejected by the backing credential store.
    fn verify_token(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<PlayerId, SessionError>> + Send;
}
