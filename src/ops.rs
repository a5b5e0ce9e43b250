//! Management operations: direct compositions of store, gate, and crypto.
//! One human operator; failures exit nonzero with the message on stderr.

use std::io::{self, BufRead, Read, Write};
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::config::{Config, RELYING_PARTY_ID, VERIFY_TIMEOUT_SECS};
use crate::crypto;
use crate::error::Error;
use crate::gate::{Authenticator, PinentryGate};
use crate::resolver::resolve::unseal_record;
use crate::store::{file, SecretRecord, SecretStore};

fn gate_for(cfg: &Config) -> PinentryGate {
    PinentryGate::new(cfg.pinentry.clone(), RELYING_PARTY_ID)
}

fn open_store(cfg: &Config) -> anyhow::Result<SecretStore> {
    Ok(SecretStore::new(cfg.store_path()?))
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Ask a yes/no question on stderr; anything but an explicit yes declines.
fn confirm(question: &str, assume_yes: bool) -> anyhow::Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    eprint!("{question} [y/N] ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

/// Enroll a fresh credential, seal `value` under its derived key, and
/// persist. An existing record with the same id is replaced outright — its
/// credential enrollment is replaced along with it.
pub async fn set(
    cfg: &Config,
    id: &str,
    label: Option<&str>,
    value: Option<&str>,
    yes: bool,
) -> anyhow::Result<()> {
    let store = open_store(cfg)?;
    let mut records = store.load()?;

    let value = match value {
        Some(v) => v.to_string(),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if file::find_by_id(&records, id).is_some()
        && !confirm(
            &format!("Secret \"{id}\" already exists. Replace it and its credential?"),
            yes,
        )?
    {
        eprintln!("Aborted.");
        return Ok(());
    }

    let label = label.unwrap_or(id);
    let user_handle = SecretRecord::user_handle_for(id);
    let enrollment = gate_for(cfg)
        .enroll(
            &user_handle,
            &format!("{label} ({id})"),
            Duration::from_secs(VERIFY_TIMEOUT_SECS),
        )
        .await?;

    let credential_id_b64 = BASE64.encode(&enrollment.credential_id);
    let key = crypto::derive_key(&credential_id_b64, &enrollment.public_key);
    let (ciphertext, nonce) = crypto::encrypt(value.as_bytes(), &key)?;

    let record = SecretRecord {
        id: id.to_string(),
        label: label.to_string(),
        ciphertext: Some(BASE64.encode(&ciphertext)),
        nonce: Some(BASE64.encode(nonce)),
        created_at: now_millis(),
        relying_party_id: RELYING_PARTY_ID.to_string(),
        user_handle: BASE64.encode(&user_handle),
        credential_id: Some(credential_id_b64),
        credential_public_key: Some(BASE64.encode(&enrollment.public_key)),
    };

    file::replace(&mut records, record);
    store.save(&records)?;
    eprintln!("Stored secret \"{id}\".");
    Ok(())
}

/// Verify the credential and print the decrypted value to stdout. The
/// plaintext goes nowhere else.
pub async fn get(cfg: &Config, id: &str) -> anyhow::Result<()> {
    let store = open_store(cfg)?;
    let records = store.load()?;
    let record =
        file::find_by_id(&records, id).ok_or_else(|| Error::KeyNotFound(id.to_string()))?;

    let timeout = Duration::from_secs(VERIFY_TIMEOUT_SECS);
    let plaintext = unseal_record(record, &gate_for(cfg), timeout).await?;
    println!("{plaintext}");
    Ok(())
}

/// Metadata only; never decrypts, never prompts.
pub fn list(cfg: &Config) -> anyhow::Result<()> {
    let store = open_store(cfg)?;
    let mut records = store.load()?;
    if records.is_empty() {
        eprintln!("No secrets stored.");
        return Ok(());
    }
    // Most recent first.
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    for r in &records {
        println!(
            "{}\t{}\t{}\t{}",
            r.id,
            r.label,
            r.created_at,
            r.credential_id.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

pub fn delete(cfg: &Config, id: &str, yes: bool) -> anyhow::Result<()> {
    let store = open_store(cfg)?;
    let mut records = store.load()?;
    if file::find_by_id(&records, id).is_none() {
        return Err(Error::KeyNotFound(id.to_string()).into());
    }
    if !confirm(&format!("Delete secret \"{id}\"?"), yes)? {
        eprintln!("Aborted.");
        return Ok(());
    }
    file::remove(&mut records, id);
    store.save(&records)?;
    eprintln!("Deleted secret \"{id}\".");
    Ok(())
}

pub fn clear(cfg: &Config, yes: bool) -> anyhow::Result<()> {
    let store = open_store(cfg)?;
    let records = store.load()?;
    if records.is_empty() {
        eprintln!("Store is already empty.");
        return Ok(());
    }
    if !confirm(
        &format!(
            "Delete all {} stored secret(s)? This cannot be undone.",
            records.len()
        ),
        yes,
    )? {
        eprintln!("Aborted.");
        return Ok(());
    }
    store.save(&[])?;
    eprintln!("Cleared {} secret(s).", records.len());
    Ok(())
}
