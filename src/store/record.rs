use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One stored secret, serialized camelCase inside the store's JSON array.
///
/// The binary fields (`ciphertext`, `nonce`, `user_handle`, `credential_id`,
/// `credential_public_key`) are transported as base64 strings. Envelope
/// fields are optional so that foreign or legacy record shapes still
/// deserialize; such records are rejected at use, never passed through.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretRecord {
    pub id: String,
    pub label: String,
    /// AES-256-GCM output, base64.
    pub ciphertext: Option<String>,
    /// 96-bit nonce used for `ciphertext`, base64. Never reused with the
    /// same derived key.
    pub nonce: Option<String>,
    /// Epoch milliseconds.
    pub created_at: u64,
    pub relying_party_id: String,
    /// SHA-256 of `id`, base64. Binds the authenticator enrollment to the
    /// record deterministically.
    pub user_handle: String,
    pub credential_id: Option<String>,
    pub credential_public_key: Option<String>,
}

impl SecretRecord {
    /// The per-record user handle handed to the authenticator at enrollment.
    pub fn user_handle_for(id: &str) -> Vec<u8> {
        Sha256::digest(id.as_bytes()).to_vec()
    }

    /// A record is decryptable only when the full envelope is present.
    pub fn is_hardware_bound(&self) -> bool {
        self.ciphertext.is_some()
            && self.nonce.is_some()
            && self.credential_id.is_some()
            && self.credential_public_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound_record(id: &str) -> SecretRecord {
        SecretRecord {
            id: id.to_string(),
            label: id.to_string(),
            ciphertext: Some("YWJj".into()),
            nonce: Some("AAAAAAAAAAAAAAAA".into()),
            created_at: 1_700_000_000_000,
            relying_party_id: "keywarden.local".into(),
            user_handle: "aGFuZGxl".into(),
            credential_id: Some("Y3JlZA==".into()),
            credential_public_key: Some("cGs=".into()),
        }
    }

    #[test]
    fn test_user_handle_deterministic() {
        assert_eq!(
            SecretRecord::user_handle_for("api-key"),
            SecretRecord::user_handle_for("api-key")
        );
        assert_ne!(
            SecretRecord::user_handle_for("api-key"),
            SecretRecord::user_handle_for("other-key")
        );
    }

    #[test]
    fn test_hardware_bound_requires_full_envelope() {
        assert!(bound_record("k").is_hardware_bound());

        let mut missing_pk = bound_record("k");
        missing_pk.credential_public_key = None;
        assert!(!missing_pk.is_hardware_bound());

        let mut missing_ct = bound_record("k");
        missing_ct.ciphertext = None;
        assert!(!missing_ct.is_hardware_bound());
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_string(&bound_record("k")).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"relyingPartyId\""));
        assert!(json.contains("\"credentialPublicKey\""));
        assert!(!json.contains("\"created_at\""));
    }

    #[test]
    fn test_legacy_shape_deserializes_but_is_not_bound() {
        // A record written before hardware binding: no envelope fields.
        let json = r#"{
            "id": "old",
            "label": "Old",
            "createdAt": 1000,
            "relyingPartyId": "keywarden.local",
            "userHandle": "aGFuZGxl"
        }"#;
        let record: SecretRecord = serde_json::from_str(json).unwrap();
        assert!(!record.is_hardware_bound());
    }
}
