//! Credential-bound encryption of secret values.
//!
//! The symmetric key is derived from the enrolled credential's id and public
//! key with PBKDF2-HMAC-SHA256, so decryption is only possible by re-deriving
//! the key from the same record. Derivation takes no random input. Values are
//! sealed with AES-256-GCM under a fresh 96-bit nonce per call.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::KDF_ITERATIONS;

pub const NONCE_SIZE: usize = 12;
pub const CHALLENGE_SIZE: usize = 32;
const KEY_SIZE: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Encryption failed")]
    EncryptionFailed,
    /// Authentication tag mismatch. Deliberately does not say whether the
    /// key, the nonce, or the ciphertext was wrong.
    #[error("Decryption failed")]
    DecryptionFailed,
}

/// A derived 256-bit key. Lives only for the duration of one encrypt or
/// decrypt call frame; never serialized, zeroed on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_SIZE]);

/// Derive the encryption key for a record from its enrolled credential.
///
/// IKM is the UTF-8 bytes of `credential_id` followed by the raw public key
/// bytes; the public key doubles as the PBKDF2 salt. Identical inputs always
/// yield the identical key.
pub fn derive_key(credential_id: &str, credential_public_key: &[u8]) -> EncryptionKey {
    let mut ikm = Vec::with_capacity(credential_id.len() + credential_public_key.len());
    ikm.extend_from_slice(credential_id.as_bytes());
    ikm.extend_from_slice(credential_public_key);

    let mut key = [0u8; KEY_SIZE];
    pbkdf2::pbkdf2_hmac::<Sha256>(&ikm, credential_public_key, KDF_ITERATIONS, &mut key);
    ikm.zeroize();

    EncryptionKey(key)
}

/// Seal `plaintext` under `key` with a fresh random nonce. No associated data.
pub fn encrypt(
    plaintext: &[u8],
    key: &EncryptionKey,
) -> Result<(Vec<u8>, [u8; NONCE_SIZE]), CryptoError> {
    let nonce_bytes = random_nonce();
    let cipher = Aes256Gcm::new_from_slice(&key.0).map_err(|_| CryptoError::EncryptionFailed)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;
    Ok((ciphertext, nonce_bytes))
}

/// Open a sealed value. Any tag mismatch — wrong key, corrupt ciphertext,
/// corrupt nonce — reports the same `DecryptionFailed`.
pub fn decrypt(
    ciphertext: &[u8],
    nonce: &[u8],
    key: &EncryptionKey,
) -> Result<Vec<u8>, CryptoError> {
    if nonce.len() != NONCE_SIZE {
        return Err(CryptoError::DecryptionFailed);
    }
    let cipher = Aes256Gcm::new_from_slice(&key.0).map_err(|_| CryptoError::DecryptionFailed)?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed)
}

pub fn random_nonce() -> [u8; NONCE_SIZE] {
    let mut bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Fresh 32-byte assertion challenge. Single-use; callers must generate a new
/// one for every verify ceremony.
pub fn random_challenge() -> [u8; CHALLENGE_SIZE] {
    let mut bytes = [0u8; CHALLENGE_SIZE];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn test_key() -> EncryptionKey {
        derive_key("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", &[0x04u8; 65])
    }

    #[test]
    fn test_round_trip() {
        let key = test_key();
        let (ciphertext, nonce) = encrypt(b"sk-abc123", &key).unwrap();
        let plaintext = decrypt(&ciphertext, &nonce, &key).unwrap();
        assert_eq!(plaintext, b"sk-abc123");
    }

    #[test]
    fn test_round_trip_empty_plaintext() {
        let key = test_key();
        let (ciphertext, nonce) = encrypt(b"", &key).unwrap();
        assert_eq!(decrypt(&ciphertext, &nonce, &key).unwrap(), b"");
    }

    #[test]
    fn test_derive_key_deterministic() {
        let pk = [0x42u8; 65];
        let (ciphertext, nonce) = encrypt(b"value", &derive_key("cred", &pk)).unwrap();
        // A second derivation with identical inputs must decrypt.
        let plaintext = decrypt(&ciphertext, &nonce, &derive_key("cred", &pk)).unwrap();
        assert_eq!(plaintext, b"value");
    }

    #[test]
    fn test_wrong_credential_id_fails() {
        let pk = [0x42u8; 65];
        let (ciphertext, nonce) = encrypt(b"value", &derive_key("cred-a", &pk)).unwrap();
        let result = decrypt(&ciphertext, &nonce, &derive_key("cred-b", &pk));
        assert!(matches!(result, Err(CryptoError::DecryptionFailed)));
    }

    #[test]
    fn test_wrong_public_key_fails() {
        let (ciphertext, nonce) = encrypt(b"value", &derive_key("cred", &[0x42u8; 65])).unwrap();
        let result = decrypt(&ciphertext, &nonce, &derive_key("cred", &[0x43u8; 65]));
        assert!(matches!(result, Err(CryptoError::DecryptionFailed)));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = test_key();
        let (mut ciphertext, nonce) = encrypt(b"important", &key).unwrap();
        for idx in 0..ciphertext.len() {
            ciphertext[idx] ^= 0x01;
            assert!(
                decrypt(&ciphertext, &nonce, &key).is_err(),
                "bit flip at byte {idx} must fail authentication"
            );
            ciphertext[idx] ^= 0x01;
        }
    }

    #[test]
    fn test_tampered_nonce_fails() {
        let key = test_key();
        let (ciphertext, mut nonce) = encrypt(b"important", &key).unwrap();
        nonce[0] ^= 0xff;
        assert!(matches!(
            decrypt(&ciphertext, &nonce, &key),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_truncated_nonce_rejected() {
        let key = test_key();
        let (ciphertext, nonce) = encrypt(b"x", &key).unwrap();
        let result = decrypt(&ciphertext, &nonce[..8], &key);
        assert!(matches!(result, Err(CryptoError::DecryptionFailed)));
    }

    #[test]
    fn test_nonce_uniqueness() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(random_nonce()), "nonce repeated");
        }
    }

    #[test]
    fn test_challenge_uniqueness() {
        let mut seen = HashSet::new();
        for _ in 0..1_000 {
            assert!(seen.insert(random_challenge()), "challenge repeated");
        }
    }
}
