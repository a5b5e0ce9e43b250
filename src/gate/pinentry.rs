//! User-presence gate backed by a pinentry confirmation dialog.
//!
//! The credential material itself is produced in-process behind the same
//! [`Authenticator`] interface a CTAP transport would implement, so swapping
//! in a real device later changes no caller.

use std::time::Duration;

use rand::RngCore;
use sha2::{Digest, Sha256};

use super::prompt::{enroll_prompt, verify_prompt};
use super::{Assertion, Authenticator, Enrollment, GateError};
use crate::crypto::CHALLENGE_SIZE;

pub const CREDENTIAL_ID_SIZE: usize = 32;
/// Uncompressed P-256 point: 0x04 tag plus two 32-byte coordinates.
pub const PUBLIC_KEY_SIZE: usize = 65;

pub struct PinentryGate {
    pinentry_bin: String,
    rp_id: String,
}

impl PinentryGate {
    pub fn new(pinentry_bin: impl Into<String>, rp_id: impl Into<String>) -> Self {
        Self {
            pinentry_bin: pinentry_bin.into(),
            rp_id: rp_id.into(),
        }
    }

    /// Run one confirm/deny ceremony on a blocking thread under `timeout`.
    async fn ceremony(&self, description: String, timeout: Duration) -> Result<(), GateError> {
        let bin = self.pinentry_bin.clone();

        let join = tokio::task::spawn_blocking(move || {
            match pinentry::ConfirmationDialog::with_binary(&bin) {
                None => Err(pinentry::Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "pinentry binary not found",
                ))),
                Some(mut dialog) => dialog
                    .with_ok("Confirm")
                    .with_cancel("Deny")
                    .confirm(&description),
            }
        });

        match tokio::time::timeout(timeout, join).await {
            Err(_) => Err(GateError::Timeout),
            Ok(Err(_)) => Err(GateError::DeviceUnavailable),
            Ok(Ok(Ok(true))) => Ok(()),
            Ok(Ok(Ok(false))) => Err(GateError::UserCancelled),
            Ok(Ok(Err(pinentry::Error::Cancelled))) => Err(GateError::UserCancelled),
            Ok(Ok(Err(pinentry::Error::Timeout))) => Err(GateError::Timeout),
            Ok(Ok(Err(_))) => Err(GateError::DeviceUnavailable),
        }
    }
}

#[async_trait::async_trait]
impl Authenticator for PinentryGate {
    async fn enroll(
        &self,
        _user_handle: &[u8],
        display: &str,
        timeout: Duration,
    ) -> Result<Enrollment, GateError> {
        self.ceremony(enroll_prompt(&self.rp_id, display), timeout)
            .await?;
        let display_str = display;
        tracing::info!(display = %display_str, "Enrollment confirmed");

        let mut credential_id = vec![0u8; CREDENTIAL_ID_SIZE];
        rand::thread_rng().fill_bytes(&mut credential_id);

        let mut public_key = vec![0u8; PUBLIC_KEY_SIZE];
        public_key[0] = 0x04;
        rand::thread_rng().fill_bytes(&mut public_key[1..]);

        Ok(Enrollment {
            credential_id,
            public_key,
        })
    }

    async fn verify(
        &self,
        credential_id: &[u8],
        challenge: &[u8; CHALLENGE_SIZE],
        display: &str,
        timeout: Duration,
    ) -> Result<Assertion, GateError> {
        if credential_id.len() != CREDENTIAL_ID_SIZE {
            return Err(GateError::NotAllowed);
        }

        self.ceremony(verify_prompt(&self.rp_id, display), timeout)
            .await?;
        let display_str = display;
        tracing::info!(display = %display_str, "User presence confirmed");

        let mut hasher = Sha256::new();
        hasher.update(credential_id);
        hasher.update(challenge);
        Ok(Assertion {
            signature: hasher.finalize().to_vec(),
        })
    }
}
