pub mod pinentry;
pub mod prompt;
pub mod stub;

pub use pinentry::PinentryGate;
pub use stub::StubGate;

use std::time::Duration;

use crate::crypto::CHALLENGE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("User cancelled")]
    UserCancelled,
    #[error("Authenticator unavailable")]
    DeviceUnavailable,
    #[error("User action timeout")]
    Timeout,
    #[error("Operation not allowed")]
    NotAllowed,
}

/// Result of an enrollment ceremony.
#[derive(Debug, Clone)]
pub struct Enrollment {
    pub credential_id: Vec<u8>,
    pub public_key: Vec<u8>,
}

/// Result of a verification ceremony.
#[derive(Debug, Clone)]
pub struct Assertion {
    pub signature: Vec<u8>,
}

/// The physical-authenticator boundary.
///
/// Both operations run a full user-presence ceremony
/// (`AwaitingUserPresence -> Confirmed | Cancelled | TimedOut`) and keep no
/// state between invocations: every decrypt requires a fresh confirmation.
/// The `challenge` passed to `verify` must come from
/// [`crate::crypto::random_challenge`] and must never be reused.
#[async_trait::async_trait]
pub trait Authenticator {
    /// Enroll a new credential for `user_handle`. Called exactly once per
    /// stored secret, at creation time.
    async fn enroll(
        &self,
        user_handle: &[u8],
        display: &str,
        timeout: Duration,
    ) -> Result<Enrollment, GateError>;

    /// Prove possession of `credential_id`. Called exactly once per decrypt
    /// attempt.
    async fn verify(
        &self,
        credential_id: &[u8],
        challenge: &[u8; CHALLENGE_SIZE],
        display: &str,
        timeout: Duration,
    ) -> Result<Assertion, GateError>;
}
