use base64::Engine;
use russh::keys::ssh_key::public::KeyData;
use russh::keys::ssh_key::{EcdsaCurve, Mpint};
use russh::keys::{PublicKey, PublicKeyBase64};
use sha2::{Digest, Sha256};

/// What gets recorded about a key offered during public key auth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDescription {
    /// Wire algorithm name, e.g. `ssh-rsa`
    pub algorithm: String,
    /// Lowercase hex SHA-256 of the public key blob
    pub fingerprint: String,
    pub base64: String,
    pub bits: u32,
}

pub fn describe(key: &PublicKey) -> KeyDescription {
    let base64 = key.public_key_base64();
    let blob = base64::engine::general_purpose::STANDARD
        .decode(&base64)
        .unwrap_or_default();
    KeyDescription {
        algorithm: key.algorithm().as_str().to_string(),
        fingerprint: hex::encode(Sha256::digest(&blob)),
        base64,
        bits: key_bits(key.key_data()),
    }
}

/// Key size in bits; 0 for key types without a meaningful size.
fn key_bits(data: &KeyData) -> u32 {
    match data {
        KeyData::Ed25519(_) | KeyData::SkEd25519(_) => 256,
        KeyData::Ecdsa(k) => match k.curve() {
            EcdsaCurve::NistP256 => 256,
            EcdsaCurve::NistP384 => 384,
            _ => 521,
        },
        KeyData::SkEcdsaSha2NistP256(_) => 256,
        KeyData::Rsa(k) => mpint_bits(&k.n),
        KeyData::Dsa(k) => mpint_bits(&k.p),
        _ => 0,
    }
}

fn mpint_bits(value: &Mpint) -> u32 {
    let bytes = value.as_positive_bytes().unwrap_or(&[]);
    match bytes.iter().position(|b| *b != 0) {
        Some(first) => {
            let significant = &bytes[first..];
            (significant.len() as u32 - 1) * 8 + (8 - significant[0].leading_zeros())
        }
        None => 0,
    }
}
