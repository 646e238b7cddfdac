//! HMAC-SHA256 webhook signatures.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::SignatureError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded signature of the raw body.
pub const ZALO_SIGNATURE_HEADER: &str = "X-Zalo-Signature";

fn keyed_mac(secret: &str) -> Result<HmacSha256, SignatureError> {
    if secret.trim().is_empty() {
        return Err(SignatureError::EmptySecret);
    }
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::EmptySecret)
}

/// Hex-encoded HMAC-SHA256 of `payload`.
///
/// # Errors
/// Returns [`SignatureError::EmptySecret`] for a blank secret.
pub fn sign_payload(secret: &str, payload: &[u8]) -> Result<String, SignatureError> {
    let mut mac = keyed_mac(secret)?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check `signature` against the raw `payload`.
///
/// Inputs are checked in order: payload, signature, secret. The digest
/// comparison is constant-time; a signature that is not valid hex is a
/// mismatch.
///
/// # Errors
/// Returns the [`SignatureError`] naming the first failed check.
pub fn verify_signature(
    payload: &[u8],
    signature: &str,
    secret: &str,
) -> Result<(), SignatureError> {
    if payload.is_empty() {
        return Err(SignatureError::EmptyPayload);
    }
    let signature = signature.trim();
    if signature.is_empty() {
        return Err(SignatureError::EmptySignature);
    }
    let mut mac = keyed_mac(secret)?;
    let provided = hex::decode(signature).map_err(|_| SignatureError::Mismatch)?;
    mac.update(payload);
    mac.verify_slice(&provided).map_err(|_| SignatureError::Mismatch)
}
