use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Signature material is the webhook URL followed by every form field in
/// key order, each as `key||value`. Gateways that sign inbound posts put
/// the hex digest in the `x-haulaway-signature` header.
pub fn webhook_signature(secret: &str, url: &str, params: &BTreeMap<String, String>) -> String {
    let mut material = String::from(url);
    for (key, value) in params {
        material.push_str(key);
        material.push_str(value);
    }
    hmac_hex(secret.as_bytes(), material.as_bytes())
}

pub fn signature_matches(
    secret: &str,
    url: &str,
    params: &BTreeMap<String, String>,
    provided: &str,
) -> bool {
    webhook_signature(secret, url, params) == provided
}

fn hmac_hex(secret: &[u8], payload: &[u8]) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return sha256_hex(payload),
    };
    mac.update(payload);
    encode_hex(mac.finalize().into_bytes().as_slice())
}

fn sha256_hex(payload: &[u8]) -> String {
    let digest = Sha256::digest(payload);
    encode_hex(digest.as_slice())
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}
