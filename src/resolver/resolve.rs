use std::io::Read;
use std::process::ExitCode;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tokio::time::Instant;

use super::protocol::{
    self, wire_error, ErrorCode, ResolveRequest, ResolveResponse, WireError,
};
use crate::config::{Config, RELYING_PARTY_ID, VERIFY_TIMEOUT_SECS};
use crate::crypto::{self, CryptoError};
use crate::error::Error;
use crate::gate::{Authenticator, PinentryGate};
use crate::store::{file, SecretRecord, SecretStore};

/// Resolve every id in `req` against the loaded record set.
///
/// Identifiers are processed sequentially — the user can only answer one
/// presence prompt at a time — and independently: one failure never aborts a
/// sibling. When `deadline` runs out, every id not yet resolved still gets a
/// `timeout` entry, so the response covers the full request.
pub async fn resolve_request<A: Authenticator>(
    req: &ResolveRequest,
    records: &[SecretRecord],
    gate: &A,
    deadline: Duration,
) -> ResolveResponse {
    let start = Instant::now();
    let mut response = ResolveResponse::new();

    // Duplicate ids collapse onto a single entry in the response maps.
    let mut ids: Vec<&str> = Vec::new();
    for id in &req.ids {
        if !ids.contains(&id.as_str()) {
            ids.push(id);
        }
    }

    for id in ids {
        let remaining = deadline.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            tracing::warn!(id, "Deadline exceeded before resolution");
            response.errors.insert(
                id.to_string(),
                WireError {
                    code: ErrorCode::Timeout,
                    message: format!("Deadline exceeded before \"{id}\" was resolved"),
                },
            );
            continue;
        }

        match resolve_one(id, records, gate, remaining).await {
            Ok(plaintext) => {
                tracing::info!(id, "Resolved");
                response.values.insert(id.to_string(), plaintext);
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "Resolution failed");
                response.errors.insert(id.to_string(), wire_error(&e));
            }
        }
    }

    response
}

async fn resolve_one<A: Authenticator>(
    id: &str,
    records: &[SecretRecord],
    gate: &A,
    remaining: Duration,
) -> Result<String, Error> {
    let record = file::find_by_id(records, id).ok_or_else(|| Error::KeyNotFound(id.to_string()))?;
    let timeout = remaining.min(Duration::from_secs(VERIFY_TIMEOUT_SECS));
    unseal_record(record, gate, timeout).await
}

/// Verify the record's credential, re-derive its key, and decrypt.
///
/// A record without the full envelope is never passed through as plaintext;
/// it is an unsupported shape. The stored record is the sole source of
/// derivation parameters.
pub(crate) async fn unseal_record<A: Authenticator>(
    record: &SecretRecord,
    gate: &A,
    timeout: Duration,
) -> Result<String, Error> {
    let (Some(ciphertext_b64), Some(nonce_b64), Some(credential_id_b64), Some(public_key_b64)) = (
        record.ciphertext.as_ref(),
        record.nonce.as_ref(),
        record.credential_id.as_ref(),
        record.credential_public_key.as_ref(),
    ) else {
        return Err(Error::UnsupportedRecord(record.id.clone()));
    };

    let ciphertext = BASE64
        .decode(ciphertext_b64)
        .map_err(|_| Error::Crypto(CryptoError::DecryptionFailed))?;
    let nonce = BASE64
        .decode(nonce_b64)
        .map_err(|_| Error::Crypto(CryptoError::DecryptionFailed))?;
    let credential_id = BASE64
        .decode(credential_id_b64)
        .map_err(|_| Error::Crypto(CryptoError::DecryptionFailed))?;
    let public_key = BASE64
        .decode(public_key_b64)
        .map_err(|_| Error::Crypto(CryptoError::DecryptionFailed))?;

    // Fresh single-use challenge per verify ceremony.
    let challenge = crypto::random_challenge();
    gate.verify(&credential_id, &challenge, &record.id, timeout)
        .await?;

    let key = crypto::derive_key(credential_id_b64, &public_key);
    let plaintext = crypto::decrypt(&ciphertext, &nonce, &key)?;
    String::from_utf8(plaintext).map_err(|_| Error::Crypto(CryptoError::DecryptionFailed))
}

/// Resolver entrypoint: one request on stdin, one response on stdout.
///
/// Request-fatal and store-fatal conditions still emit a parseable response
/// (with the `_system` error entry) before the nonzero exit.
pub async fn run(cfg: &Config) -> anyhow::Result<ExitCode> {
    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        return emit_fatal(ErrorCode::MalformedRequest, format!("Cannot read request: {e}"));
    }

    let parsed = protocol::parse_request(&input).and_then(|req| {
        protocol::validate_request(&req)?;
        Ok(req)
    });
    let req = match parsed {
        Ok(req) => req,
        Err(e) => {
            tracing::error!(error = %e, "Rejecting request");
            return emit_fatal(e.code(), e.to_string());
        }
    };

    let store_path = match cfg.store_path() {
        Ok(path) => path,
        Err(e) => return emit_fatal(ErrorCode::StoreCorrupt, e.to_string()),
    };
    let records = match SecretStore::new(store_path).load() {
        Ok(records) => records,
        Err(e) => {
            tracing::error!(error = %e, "Store unreadable");
            return emit_fatal(ErrorCode::StoreCorrupt, e.to_string());
        }
    };

    let gate = PinentryGate::new(cfg.pinentry.clone(), RELYING_PARTY_ID);
    let deadline = Duration::from_secs(cfg.deadline_secs);
    let response = resolve_request(&req, &records, &gate, deadline).await;

    emit(&response)?;
    Ok(ExitCode::SUCCESS)
}

/// stdout carries exactly one JSON object; all diagnostics go to stderr.
fn emit(response: &ResolveResponse) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(response)?);
    Ok(())
}

fn emit_fatal(code: ErrorCode, message: String) -> anyhow::Result<ExitCode> {
    emit(&ResolveResponse::fatal(code, message))?;
    Ok(ExitCode::FAILURE)
}
