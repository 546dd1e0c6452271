//! TRTC user signatures (TLS sig v2).
//!
//! A `UserSig` proves to TRTC that the holder of the application secret
//! issued a time-limited identity. The provider verifies it independently,
//! so the encoding below must stay byte compatible with its reference
//! implementations:
//!
//! 1. HMAC-SHA256 over the newline separated `TLS.identifier`,
//!    `TLS.sdkappid`, `TLS.time` and `TLS.expire` fields, base64 encoded.
//! 2. A JSON document carrying those fields plus `TLS.ver` and `TLS.sig`.
//! 3. zlib compression, base64, and a URL-safe character swap
//!    (`+` → `*`, `/` → `-`, `=` → `_`).

use std::io::{Read, Write};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const SIG_VERSION: &str = "2.0";

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("TRTC secret key is empty")]
    EmptySecret,
    #[error("identifier must not be empty")]
    EmptyIdentifier,
    #[error("expire time must be positive, got {0}")]
    InvalidExpire(i64),
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
    #[error("failed to encode signature document: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to compress signature document: {0}")]
    Compress(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("malformed signature: {0}")]
    Malformed(String),
    #[error("signature was issued for sdkappid {0}")]
    SdkAppIdMismatch(u64),
    #[error("signature was issued for identifier {0}")]
    IdentifierMismatch(String),
    #[error("signature digest does not match")]
    BadDigest,
    #[error("signature expired at {0}")]
    Expired(i64),
}

/// Decoded form of a user signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigDocument {
    #[serde(rename = "TLS.ver")]
    pub version: String,
    #[serde(rename = "TLS.identifier")]
    pub identifier: String,
    #[serde(rename = "TLS.sdkappid")]
    pub sdk_app_id: u64,
    #[serde(rename = "TLS.time")]
    pub time: i64,
    #[serde(rename = "TLS.expire")]
    pub expire: i64,
    #[serde(rename = "TLS.sig")]
    pub sig: String,
}

impl SigDocument {
    /// Unix timestamp after which the provider rejects the signature.
    pub fn expires_at(&self) -> i64 {
        self.time.saturating_add(self.expire)
    }
}

/// Issues user signatures for one TRTC application.
#[derive(Clone)]
pub struct UserSigGenerator {
    sdk_app_id: u64,
    secret_key: String,
}

impl std::fmt::Debug for UserSigGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSigGenerator")
            .field("sdk_app_id", &self.sdk_app_id)
            .finish_non_exhaustive()
    }
}

impl UserSigGenerator {
    pub fn new(sdk_app_id: u64, secret_key: impl Into<String>) -> Result<Self, SigningError> {
        let secret_key = secret_key.into();
        if secret_key.is_empty() {
            return Err(SigningError::EmptySecret);
        }
        Ok(Self {
            sdk_app_id,
            secret_key,
        })
    }

    pub fn sdk_app_id(&self) -> u64 {
        self.sdk_app_id
    }

    /// Signs `identifier` for `expire` seconds starting now.
    pub fn sign(&self, identifier: &str, expire: i64) -> Result<String, SigningError> {
        self.sign_at(identifier, expire, Utc::now().timestamp())
    }

    /// Signs `identifier` as if issued at `issued_at` (unix seconds).
    ///
    /// The output is a pure function of the arguments and the generator.
    pub fn sign_at(
        &self,
        identifier: &str,
        expire: i64,
        issued_at: i64,
    ) -> Result<String, SigningError> {
        if identifier.is_empty() {
            return Err(SigningError::EmptyIdentifier);
        }
        if expire <= 0 {
            return Err(SigningError::InvalidExpire(expire));
        }

        let sig = self.digest(identifier, issued_at, expire)?;
        let doc = SigDocument {
            version: SIG_VERSION.to_string(),
            identifier: identifier.to_string(),
            sdk_app_id: self.sdk_app_id,
            time: issued_at,
            expire,
            sig,
        };

        let json = serde_json::to_vec(&doc)?;
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        let compressed = encoder.finish()?;

        Ok(escape(&STANDARD.encode(compressed)))
    }

    /// Decodes `user_sig` and checks that it was issued by this application
    /// for `identifier` and is still valid at `now`.
    pub fn verify(
        &self,
        user_sig: &str,
        identifier: &str,
        now: i64,
    ) -> Result<SigDocument, VerifyError> {
        let compressed = STANDARD
            .decode(unescape(user_sig))
            .map_err(|e| VerifyError::Malformed(e.to_string()))?;
        let mut json = Vec::new();
        ZlibDecoder::new(compressed.as_slice())
            .read_to_end(&mut json)
            .map_err(|e| VerifyError::Malformed(e.to_string()))?;
        let doc: SigDocument =
            serde_json::from_slice(&json).map_err(|e| VerifyError::Malformed(e.to_string()))?;

        if doc.sdk_app_id != self.sdk_app_id {
            return Err(VerifyError::SdkAppIdMismatch(doc.sdk_app_id));
        }
        if doc.identifier != identifier {
            return Err(VerifyError::IdentifierMismatch(doc.identifier));
        }

        let claimed = STANDARD
            .decode(&doc.sig)
            .map_err(|e| VerifyError::Malformed(e.to_string()))?;
        let mut mac = self
            .mac()
            .map_err(|e| VerifyError::Malformed(e.to_string()))?;
        mac.update(content_to_sign(&doc.identifier, doc.sdk_app_id, doc.time, doc.expire).as_bytes());
        mac.verify_slice(&claimed)
            .map_err(|_| VerifyError::BadDigest)?;

        if doc.expires_at() < now {
            return Err(VerifyError::Expired(doc.expires_at()));
        }
        Ok(doc)
    }

    fn digest(&self, identifier: &str, time: i64, expire: i64) -> Result<String, SigningError> {
        let mut mac = self.mac()?;
        mac.update(content_to_sign(identifier, self.sdk_app_id, time, expire).as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    fn mac(&self) -> Result<HmacSha256, SigningError> {
        HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| SigningError::InvalidKey(e.to_string()))
    }
}

fn content_to_sign(identifier: &str, sdk_app_id: u64, time: i64, expire: i64) -> String {
    format!(
        "TLS.identifier:{identifier}\nTLS.sdkappid:{sdk_app_id}\nTLS.time:{time}\nTLS.expire:{expire}\n"
    )
}

fn escape(b64: &str) -> String {
    b64.chars()
        .map(|c| match c {
            '+' => '*',
            '/' => '-',
            '=' => '_',
            other => other,
        })
        .collect()
}

fn unescape(sig: &str) -> String {
    sig.chars()
        .map(|c| match c {
            '*' => '+',
            '-' => '/',
            '_' => '=',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP_ID: u64 = 1_400_000_000;
    const ISSUED_AT: i64 = 1_700_000_000;

    fn generator() -> UserSigGenerator {
        UserSigGenerator::new(APP_ID, "trtc-secret").unwrap()
    }

    #[test]
    fn digest_matches_reference_hmac() {
        let sig = generator().digest("user_123456", ISSUED_AT, 36_000).unwrap();
        assert_eq!(sig, "rCk03iJK3w/OAN378wkuQBVewLN65eeJ3LI5P5rlL3o=");
    }

    #[test]
    fn same_instant_gives_same_signature() {
        let signer = generator();
        let a = signer.sign_at("user_1", 36_000, ISSUED_AT).unwrap();
        let b = signer.sign_at("user_1", 36_000, ISSUED_AT).unwrap();
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }

    #[test]
    fn different_instants_give_different_signatures() {
        let signer = generator();
        let a = signer.sign_at("user_1", 36_000, ISSUED_AT).unwrap();
        let b = signer.sign_at("user_1", 36_000, ISSUED_AT + 1).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn output_is_url_safe() {
        let sig = generator().sign_at("user_1", 36_000, ISSUED_AT).unwrap();
        assert!(!sig.contains(['+', '/', '=']));
    }

    #[test]
    fn signed_document_round_trips_through_verify() {
        let signer = generator();
        let sig = signer.sign_at("ai_654321", 600, ISSUED_AT).unwrap();
        let doc = signer.verify(&sig, "ai_654321", ISSUED_AT + 599).unwrap();

        assert_eq!(doc.version, "2.0");
        assert_eq!(doc.identifier, "ai_654321");
        assert_eq!(doc.sdk_app_id, APP_ID);
        assert_eq!(doc.time, ISSUED_AT);
        assert_eq!(doc.expire, 600);
        assert_eq!(doc.expires_at(), ISSUED_AT + 600);
    }

    #[test]
    fn verify_rejects_wrong_identity_secret_and_expiry() {
        let signer = generator();
        let sig = signer.sign_at("user_1", 60, ISSUED_AT).unwrap();

        assert!(matches!(
            signer.verify(&sig, "user_2", ISSUED_AT),
            Err(VerifyError::IdentifierMismatch(_))
        ));

        let other = UserSigGenerator::new(APP_ID, "another-secret").unwrap();
        assert!(matches!(
            other.verify(&sig, "user_1", ISSUED_AT),
            Err(VerifyError::BadDigest)
        ));

        let other_app = UserSigGenerator::new(APP_ID + 1, "trtc-secret").unwrap();
        assert!(matches!(
            other_app.verify(&sig, "user_1", ISSUED_AT),
            Err(VerifyError::SdkAppIdMismatch(APP_ID))
        ));

        assert!(matches!(
            signer.verify(&sig, "user_1", ISSUED_AT + 61),
            Err(VerifyError::Expired(_))
        ));
        assert!(matches!(
            signer.verify("not a signature", "user_1", ISSUED_AT),
            Err(VerifyError::Malformed(_))
        ));
    }

    #[test]
    fn far_future_issue_time_saturates_expiry() {
        let signer = generator();
        let sig = signer.sign_at("x", 1, i64::MAX).unwrap();
        let doc = signer.verify(&sig, "x", ISSUED_AT).unwrap();
        assert_eq!(doc.expires_at(), i64::MAX);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(matches!(
            UserSigGenerator::new(APP_ID, ""),
            Err(SigningError::EmptySecret)
        ));

        let signer = generator();
        assert!(matches!(
            signer.sign("user_1", 0),
            Err(SigningError::InvalidExpire(0))
        ));
        assert!(matches!(
            signer.sign("user_1", -5),
            Err(SigningError::InvalidExpire(-5))
        ));
        assert!(matches!(
            signer.sign("", 60),
            Err(SigningError::EmptyIdentifier)
        ));
    }
}
