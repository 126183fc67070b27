//! VAPID key pairs (P-256), exchanged as unpadded base64url.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use p256::SecretKey;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::PushError;

const PUBLIC_KEY_LEN: usize = 65;
const PRIVATE_KEY_LEN: usize = 32;

#[derive(Clone, PartialEq, Eq)]
pub struct VapidKeyPair {
    public_key: String,
    private_key: String,
}

impl VapidKeyPair {
    /// Generate a fresh key pair from the OS random source.
    pub fn generate() -> Result<Self, PushError> {
        let mut scalar = [0u8; PRIVATE_KEY_LEN];
        OsRng
            .try_fill_bytes(&mut scalar)
            .map_err(|e| PushError::KeyGeneration(e.to_string()))?;
        let secret = SecretKey::from_slice(&scalar)
            .map_err(|e| PushError::KeyGeneration(e.to_string()))?;
        Ok(Self::from_secret(&secret))
    }

    /// Rebuild a key pair from stored strings, checking that both halves agree.
    pub fn from_parts(public_key: &str, private_key: &str) -> Result<Self, PushError> {
        let private = decode(private_key, PRIVATE_KEY_LEN, "private key")?;
        let public = decode(public_key, PUBLIC_KEY_LEN, "public key")?;
        if public[0] != 0x04 {
            return Err(PushError::InvalidKey(
                "public key is not an uncompressed point".into(),
            ));
        }

        let secret =
            SecretKey::from_slice(&private).map_err(|e| PushError::InvalidKey(e.to_string()))?;
        let derived = Self::from_secret(&secret);
        if derived.public_key != public_key {
            return Err(PushError::InvalidKey(
                "public key does not match private key".into(),
            ));
        }
        Ok(derived)
    }

    /// Application server key passed to the distributor.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    fn from_secret(secret: &SecretKey) -> Self {
        let point = secret.public_key().to_encoded_point(false);
        Self {
            public_key: URL_SAFE_NO_PAD.encode(point.as_bytes()),
            private_key: URL_SAFE_NO_PAD.encode(secret.to_bytes()),
        }
    }
}

impl fmt::Debug for VapidKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VapidKeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

fn decode(value: &str, expected_len: usize, what: &str) -> Result<Vec<u8>, PushError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(value.trim().trim_end_matches('='))
        .map_err(|e| PushError::InvalidKey(format!("{what}: {e}")))?;
    if bytes.len() != expected_len {
        return Err(PushError::InvalidKey(format!(
            "{what}: expected {expected_len} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(bytes)
}
