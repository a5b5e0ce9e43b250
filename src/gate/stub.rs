//! Deterministic in-process gate for tests: fixed delay, fake assertion,
//! scriptable outcome. Not wired into any production path.

use std::time::Duration;

use sha2::{Digest, Sha256};

use super::{Assertion, Authenticator, Enrollment, GateError};
use crate::crypto::CHALLENGE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubOutcome {
    Confirm,
    Cancel,
    Unavailable,
    TimeOut,
    Refuse,
}

pub struct StubGate {
    pub delay: Duration,
    pub outcome: StubOutcome,
}

impl StubGate {
    pub fn confirming() -> Self {
        Self {
            delay: Duration::from_millis(1),
            outcome: StubOutcome::Confirm,
        }
    }

    pub fn with_outcome(outcome: StubOutcome) -> Self {
        Self {
            delay: Duration::from_millis(1),
            outcome,
        }
    }

    fn gate_result(&self) -> Result<(), GateError> {
        match self.outcome {
            StubOutcome::Confirm => Ok(()),
            StubOutcome::Cancel => Err(GateError::UserCancelled),
            StubOutcome::Unavailable => Err(GateError::DeviceUnavailable),
            StubOutcome::TimeOut => Err(GateError::Timeout),
            StubOutcome::Refuse => Err(GateError::NotAllowed),
        }
    }
}

fn tagged_digest(tag: &[u8], data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(tag);
    hasher.update(data);
    hasher.finalize().to_vec()
}

#[async_trait::async_trait]
impl Authenticator for StubGate {
    async fn enroll(
        &self,
        user_handle: &[u8],
        _display: &str,
        timeout: Duration,
    ) -> Result<Enrollment, GateError> {
        if self.delay > timeout {
            return Err(GateError::Timeout);
        }
        tokio::time::sleep(self.delay).await;
        self.gate_result()?;

        // Deterministic per user handle so tests can re-derive material.
        let credential_id = tagged_digest(b"stub-cred", user_handle);
        let mut public_key = vec![0x04u8];
        public_key.extend_from_slice(&tagged_digest(b"stub-pk-x", user_handle));
        public_key.extend_from_slice(&tagged_digest(b"stub-pk-y", user_handle));

        Ok(Enrollment {
            credential_id,
            public_key,
        })
    }

    async fn verify(
        &self,
        credential_id: &[u8],
        challenge: &[u8; CHALLENGE_SIZE],
        _display: &str,
        timeout: Duration,
    ) -> Result<Assertion, GateError> {
        if self.delay > timeout {
            return Err(GateError::Timeout);
        }
        tokio::time::sleep(self.delay).await;
        self.gate_result()?;

        let mut hasher = Sha256::new();
        hasher.update(credential_id);
        hasher.update(challenge);
        Ok(Assertion {
            signature: hasher.finalize().to_vec(),
        })
    }
}
