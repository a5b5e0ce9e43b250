//! Wire contract for the exec-provider resolver.
//!
//! One JSON request arrives on stdin, one JSON response leaves on stdout.
//! Every requested id appears in exactly one of `values` or `errors`. A
//! request-fatal condition produces the same top-level response shape with a
//! single entry under the reserved `_system` key, so callers parse one shape
//! on both paths.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{MAX_REQUEST_IDS, PROTOCOL_VERSION, PROVIDER_ID};
use crate::error::Error;
use crate::gate::GateError;

pub const SYSTEM_ERROR_KEY: &str = "_system";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub protocol_version: u32,
    pub provider: String,
    #[serde(default)]
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub protocol_version: u32,
    pub provider: String,
    pub values: BTreeMap<String, String>,
    pub errors: BTreeMap<String, WireError>,
}

/// Per-identifier (or `_system`) failure entry. `code` splits retryable
/// user/device conditions from permanent data conditions; `message` is fixed
/// vocabulary plus the offending identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Per-identifier.
    KeyNotFound,
    UserCancelled,
    Timeout,
    DeviceUnavailable,
    DecryptionFailed,
    NotAllowed,
    UnsupportedRecord,
    // Request-fatal, reported under `_system`.
    UnsupportedVersion,
    ProviderMismatch,
    MalformedRequest,
    StoreCorrupt,
}

impl ErrorCode {
    /// Whether a caller may reasonably retry by re-invoking the resolver.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::UserCancelled | ErrorCode::Timeout | ErrorCode::DeviceUnavailable
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Unsupported protocol version {0}")]
    UnsupportedVersion(u32),
    #[error("Unknown provider \"{0}\"")]
    ProviderMismatch(String),
    #[error("Request names no secret ids")]
    EmptyIds,
    #[error("Request names {0} secret ids (limit {MAX_REQUEST_IDS})")]
    TooManyIds(usize),
    #[error("Request contains a blank secret id")]
    BlankId,
    #[error("Malformed request: {0}")]
    Malformed(String),
}

impl ProtocolError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ProtocolError::UnsupportedVersion(_) => ErrorCode::UnsupportedVersion,
            ProtocolError::ProviderMismatch(_) => ErrorCode::ProviderMismatch,
            ProtocolError::EmptyIds
            | ProtocolError::TooManyIds(_)
            | ProtocolError::BlankId
            | ProtocolError::Malformed(_) => ErrorCode::MalformedRequest,
        }
    }
}

pub fn parse_request(input: &str) -> Result<ResolveRequest, ProtocolError> {
    serde_json::from_str(input).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

/// Fail-fast checks; a mismatch means the wrong resolver was invoked, so no
/// partial output is ever produced past this point.
pub fn validate_request(req: &ResolveRequest) -> Result<(), ProtocolError> {
    if req.protocol_version != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion(req.protocol_version));
    }
    if req.provider != PROVIDER_ID {
        return Err(ProtocolError::ProviderMismatch(req.provider.clone()));
    }
    if req.ids.is_empty() {
        return Err(ProtocolError::EmptyIds);
    }
    if req.ids.len() > MAX_REQUEST_IDS {
        return Err(ProtocolError::TooManyIds(req.ids.len()));
    }
    if req.ids.iter().any(|id| id.trim().is_empty()) {
        return Err(ProtocolError::BlankId);
    }
    Ok(())
}

impl ResolveResponse {
    pub fn new() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            provider: PROVIDER_ID.to_string(),
            values: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    /// The fatal-path response: empty `values`, one `_system` entry.
    pub fn fatal(code: ErrorCode, message: String) -> Self {
        let mut response = Self::new();
        response
            .errors
            .insert(SYSTEM_ERROR_KEY.to_string(), WireError { code, message });
        response
    }
}

impl Default for ResolveResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a per-identifier resolution failure onto the wire vocabulary.
pub fn wire_error(err: &Error) -> WireError {
    let code = match err {
        Error::KeyNotFound(_) => ErrorCode::KeyNotFound,
        Error::UnsupportedRecord(_) => ErrorCode::UnsupportedRecord,
        Error::Gate(GateError::UserCancelled) => ErrorCode::UserCancelled,
        Error::Gate(GateError::Timeout) => ErrorCode::Timeout,
        Error::Gate(GateError::DeviceUnavailable) => ErrorCode::DeviceUnavailable,
        Error::Gate(GateError::NotAllowed) => ErrorCode::NotAllowed,
        Error::Crypto(_) => ErrorCode::DecryptionFailed,
    };
    WireError {
        code,
        message: err.to_string(),
    }
}
