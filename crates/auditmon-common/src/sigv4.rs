//! AWS Signature Version 4 request signing.
//!
//! Shared by every AWS-facing client in the workspace (CloudWatch Logs,
//! CloudWatch, SNS, EC2). All of those are POST requests to the service
//! endpoint root with an empty query string, so the canonical request is
//! fixed to that shape.

use chrono::DateTime;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("HMAC signing error: {0}")]
    Hmac(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(i64),
}

pub type Result<T> = std::result::Result<T, SigningError>;

/// Static AWS credentials used to sign requests.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// A signed request: the headers the caller must attach verbatim.
#[derive(Debug, Clone)]
pub struct Signature {
    pub authorization: String,
    pub amz_date: String,
}

/// Sign a POST-to-endpoint-root request with SigV4.
///
/// `timestamp` is a Unix timestamp in seconds; the derived `x-amz-date`
/// header value is returned alongside the authorization header and must be
/// sent on the request exactly as returned.
pub fn sign_request(
    credentials: &Credentials,
    service: &str,
    region: &str,
    host: &str,
    content_type: &str,
    payload: &str,
    timestamp: i64,
) -> Result<Signature> {
    let datetime =
        DateTime::from_timestamp(timestamp, 0).ok_or(SigningError::InvalidTimestamp(timestamp))?;
    let amz_date = datetime.format("%Y%m%dT%H%M%SZ").to_string();
    let date = datetime.format("%Y%m%d").to_string();

    // Step 1: Build canonical request
    let canonical_uri = "/";
    let canonical_querystring = "";
    let canonical_headers = format!(
        "content-type:{}\nhost:{}\nx-amz-date:{}\n",
        content_type, host, amz_date
    );
    let signed_headers = "content-type;host;x-amz-date";

    let hashed_payload = format!("{:x}", Sha256::digest(payload.as_bytes()));
    let canonical_request = format!(
        "POST\n{}\n{}\n{}\n{}\n{}",
        canonical_uri, canonical_querystring, canonical_headers, signed_headers, hashed_payload
    );
    let hashed_canonical_request = format!("{:x}", Sha256::digest(canonical_request.as_bytes()));

    // Step 2: Build string to sign
    let credential_scope = format!("{}/{}/{}/aws4_request", date, region, service);
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{}\n{}\n{}",
        amz_date, credential_scope, hashed_canonical_request
    );

    // Step 3: Derive the signing key and calculate the signature
    let secret_date = hmac_sha256(
        format!("AWS4{}", credentials.secret_access_key).as_bytes(),
        date.as_bytes(),
    )?;
    let secret_region = hmac_sha256(&secret_date, region.as_bytes())?;
    let secret_service = hmac_sha256(&secret_region, service.as_bytes())?;
    let secret_signing = hmac_sha256(&secret_service, b"aws4_request")?;
    let signature = hex::encode(hmac_sha256(&secret_signing, string_to_sign.as_bytes())?);

    // Step 4: Build authorization header
    let authorization = format!(
        "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
        credentials.access_key_id, credential_scope, signed_headers, signature
    );

    Ok(Signature {
        authorization,
        amz_date,
    })
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| SigningError::Hmac(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
