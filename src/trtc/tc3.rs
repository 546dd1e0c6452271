//! Tencent Cloud API v3 request signing (`TC3-HMAC-SHA256`).

use chrono::{DateTime, Utc};
use hmac::{digest::InvalidLength, Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "TC3-HMAC-SHA256";
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";
const SIGNED_HEADERS: &str = "content-type;host;x-tc-action";

/// Signs provider API calls with account-level credentials.
#[derive(Clone)]
pub struct Tc3Signer {
    secret_id: String,
    secret_key: String,
    service: String,
}

impl Tc3Signer {
    pub fn new(
        secret_id: impl Into<String>,
        secret_key: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
            service: service.into(),
        }
    }

    /// Builds the `Authorization` header value for a JSON `POST /` call.
    ///
    /// `host` must be exactly what the HTTP client sends in the `Host`
    /// header, port included when it is not the scheme default.
    pub fn authorization(
        &self,
        host: &str,
        action: &str,
        payload: &str,
        now: DateTime<Utc>,
    ) -> Result<String, InvalidLength> {
        let timestamp = now.timestamp();
        let date = now.format("%Y-%m-%d").to_string();

        let canonical_request = format!(
            "POST\n/\n\ncontent-type:{CONTENT_TYPE_JSON}\nhost:{host}\nx-tc-action:{}\n\n{SIGNED_HEADERS}\n{}",
            action.to_lowercase(),
            sha256_hex(payload.as_bytes()),
        );

        let credential_scope = format!("{date}/{}/tc3_request", self.service);
        let string_to_sign = format!(
            "{ALGORITHM}\n{timestamp}\n{credential_scope}\n{}",
            sha256_hex(canonical_request.as_bytes()),
        );

        let secret_date = hmac_sha256(format!("TC3{}", self.secret_key).as_bytes(), &date)?;
        let secret_service = hmac_sha256(&secret_date, &self.service)?;
        let secret_signing = hmac_sha256(&secret_service, "tc3_request")?;
        let signature = hex::encode(hmac_sha256(&secret_signing, &string_to_sign)?);

        Ok(format!(
            "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
            self.secret_id,
        ))
    }
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], msg: &str) -> Result<Vec<u8>, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(key)?;
    mac.update(msg.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}
