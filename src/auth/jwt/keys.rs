// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the security-service project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # RS256 key material
//!
//! [`KeyMaterial`] owns the RSA key pair used to sign and verify tokens. It
//! is loaded once at startup and shared read-only between the signer and the
//! verifier.
//!
//! Loading fails fast when:
//!
//! * either PEM block cannot be parsed (PKCS#1 and PKCS#8/SPKI are accepted)
//! * the modulus is shorter than [`KeyMaterial::MIN_MODULUS_BITS`]
//! * the public key is not the public half of the private key
//! * a probe token signed with the private key does not verify
//!
//! ```rust,no_run
//! use security_service::auth::jwt::KeyMaterial;
//!
//! let keys = KeyMaterial::from_files("private.key", "pub.key").unwrap();
//! println!("kid = {}", keys.key_id());
//! ```

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::prelude::*;
use jsonwebtoken::jwk::{Jwk, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::sha2::{Digest, Sha256};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::path::Path;

use crate::config::KeysConfig;

/// RSA key pair for RS256 signing and verification
pub struct KeyMaterial {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    public_key: RsaPublicKey,
    key_id: String,
}

/// Never print key material
impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("algorithm", &Algorithm::RS256)
            .field("modulus_bits", &self.modulus_bits())
            .field("key_id", &self.key_id)
            .field("encoding_key", &"<EncodingKey>")
            .field("decoding_key", &"<DecodingKey>")
            .finish()
    }
}

impl KeyMaterial {
    /// Smallest RSA modulus accepted for RS256
    pub const MIN_MODULUS_BITS: usize = 2048;

    /// Load a key pair from PEM encoded data
    ///
    /// # Arguments
    ///
    /// * `private_pem` - `RSA PRIVATE KEY` (PKCS#1) or `PRIVATE KEY` (PKCS#8)
    /// * `public_pem` - `RSA PUBLIC KEY` (PKCS#1) or `PUBLIC KEY` (SPKI)
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self> {
        let private_pem =
            std::str::from_utf8(private_pem).context("RSA private key is not valid UTF-8")?;
        let public_pem =
            std::str::from_utf8(public_pem).context("RSA public key is not valid UTF-8")?;

        let private_key = parse_private_key(private_pem)?;
        let public_key = parse_public_key(public_pem)?;

        let modulus_bits = public_key.size() * 8;
        if modulus_bits < Self::MIN_MODULUS_BITS {
            bail!(
                "RSA key is {} bits, at least {} bits are required for RS256",
                modulus_bits,
                Self::MIN_MODULUS_BITS
            );
        }

        if RsaPublicKey::from(&private_key) != public_key {
            bail!("RSA public key does not match the private key");
        }

        let private_der = private_key
            .to_pkcs1_der()
            .map_err(|e| anyhow!("Failed to encode RSA private key: {}", e))?;
        let public_der = public_key
            .to_pkcs1_der()
            .map_err(|e| anyhow!("Failed to encode RSA public key: {}", e))?;

        let key_id = JwkKeySet::calculate_jwk_thumbprint(
            &URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            &URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        )?;

        let material = Self {
            encoding_key: EncodingKey::from_rsa_der(private_der.as_bytes()),
            decoding_key: DecodingKey::from_rsa_der(public_der.as_bytes()),
            public_key,
            key_id,
        };
        material.self_test()?;
        Ok(material)
    }

    /// Load a key pair from Base64 encoded PEM, the format used in the
    /// configuration file
    pub fn from_base64_pem(private_b64: &str, public_b64: &str) -> Result<Self> {
        let private_pem = BASE64_STANDARD
            .decode(private_b64.trim())
            .context("RSA private key is not valid Base64")?;
        let public_pem = BASE64_STANDARD
            .decode(public_b64.trim())
            .context("RSA public key is not valid Base64")?;
        Self::from_pem(&private_pem, &public_pem)
    }

    /// Load a key pair from PEM files
    pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(private_path: P, public_path: Q) -> Result<Self> {
        let private_pem = fs::read(private_path.as_ref()).with_context(|| {
            format!(
                "Failed to read RSA private key from {:?}",
                private_path.as_ref()
            )
        })?;
        let public_pem = fs::read(public_path.as_ref()).with_context(|| {
            format!(
                "Failed to read RSA public key from {:?}",
                public_path.as_ref()
            )
        })?;
        Self::from_pem(&private_pem, &public_pem)
    }

    /// Load the key pair of the `keys` configuration section
    pub fn from_config(keys: &KeysConfig) -> Result<Self> {
        Self::from_base64_pem(&keys.rs256_private_key, &keys.rs256_public_key)
    }

    /// RFC 7638 thumbprint of the public key, used as the `kid` header
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn modulus_bits(&self) -> usize {
        self.public_key.size() * 8
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Public half as a JSON Web Key Set
    pub fn jwks(&self) -> Result<JwkKeySet> {
        Ok(JwkKeySet {
            keys: vec![JwkKeySet::create_jwk_from_public_key(&self.public_key)?],
        })
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Sign and verify a throwaway token so a broken key pair is caught at
    /// load time rather than on the first request
    fn self_test(&self) -> Result<()> {
        let probe = json!({ "sub": "probe" });
        let token = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &probe, &self.encoding_key)
            .context("RSA private key cannot sign")?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims::<&str>(&[]);
        jsonwebtoken::decode::<serde_json::Value>(&token, &self.decoding_key, &validation)
            .context("RSA public key cannot verify a token signed by the private key")?;
        Ok(())
    }
}

fn parse_private_key(pem: &str) -> Result<RsaPrivateKey> {
    if pem.contains("BEGIN RSA PRIVATE KEY") {
        RsaPrivateKey::from_pkcs1_pem(pem)
            .map_err(|e| anyhow!("Failed to parse PKCS#1 RSA private key: {}", e))
    } else if pem.contains("BEGIN PRIVATE KEY") {
        RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| anyhow!("Failed to parse PKCS#8 RSA private key: {}", e))
    } else {
        bail!("RSA private key is not a PEM encoded PKCS#1 or PKCS#8 key")
    }
}

fn parse_public_key(pem: &str) -> Result<RsaPublicKey> {
    if pem.contains("BEGIN RSA PUBLIC KEY") {
        RsaPublicKey::from_pkcs1_pem(pem)
            .map_err(|e| anyhow!("Failed to parse PKCS#1 RSA public key: {}", e))
    } else if pem.contains("BEGIN PUBLIC KEY") {
        RsaPublicKey::from_public_key_pem(pem)
            .map_err(|e| anyhow!("Failed to parse SPKI RSA public key: {}", e))
    } else {
        bail!("RSA public key is not a PEM encoded PKCS#1 or SPKI key")
    }
}

/// JSON Web Key Set
///
/// RFC 7517 representation of the verification key, served so that resource
/// servers can verify tokens without sharing the PEM file.
#[derive(Debug, Serialize, Deserialize)]
pub struct JwkKeySet {
    /// The set of JWKs
    pub keys: Vec<Jwk>,
}

impl JwkKeySet {
    /// Create a JWK from an RSA public key
    ///
    /// `n` and `e` are Base64URL encoded without padding and the `kid` is the
    /// key thumbprint.
    pub fn create_jwk_from_public_key(public_key: &RsaPublicKey) -> Result<Jwk> {
        let n = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
        let e = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());

        let jwk_thumbprint = Self::calculate_jwk_thumbprint(&n, &e)?;

        Ok(Jwk {
            common: jsonwebtoken::jwk::CommonParameters {
                public_key_use: Some(PublicKeyUse::Signature),
                key_id: Some(jwk_thumbprint),
                key_algorithm: Some(jsonwebtoken::jwk::KeyAlgorithm::RS256),
                ..Default::default()
            },
            algorithm: jsonwebtoken::jwk::AlgorithmParameters::RSA(
                jsonwebtoken::jwk::RSAKeyParameters {
                    key_type: jsonwebtoken::jwk::RSAKeyType::RSA,
                    n,
                    e,
                },
            ),
        })
    }

    /// Find a key by its `kid`
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys
            .iter()
            .find(|jwk| jwk.common.key_id.as_deref() == Some(kid))
    }

    /// Calculate a JWK thumbprint according to RFC 7638
    ///
    /// SHA-256 of the canonical JSON form `{"e":..,"kty":"RSA","n":..}`,
    /// members in lexicographic order, Base64URL encoded.
    fn calculate_jwk_thumbprint(n: &str, e: &str) -> Result<String> {
        let canonical = json!({
            "e": e,
            "kty": "RSA",
            "n": n
        });
        let canonical_bytes = serde_json::to_vec(&canonical)?;

        let mut hasher = Sha256::new();
        hasher.update(&canonical_bytes);
        Ok(URL_SAFE_NO_PAD.encode(hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE_KEY: &str = include_str!("../../../resources/private.key");
    const PUBLIC_KEY: &str = include_str!("../../../resources/pub.key");
    const OTHER_PUBLIC_KEY: &str = include_str!("../../../tests/fixtures/other_pub.key");
    const PKCS1_PRIVATE_KEY: &str = include_str!("../../../tests/fixtures/pkcs1_private.key");
    const PKCS1_PUBLIC_KEY: &str = include_str!("../../../tests/fixtures/pkcs1_pub.key");
    const WEAK_PRIVATE_KEY: &str = include_str!("../../../tests/fixtures/weak_private.key");
    const WEAK_PUBLIC_KEY: &str = include_str!("../../../tests/fixtures/weak_pub.key");

    #[test]
    fn test_load_pkcs8_pair() {
        let keys = KeyMaterial::from_pem(PRIVATE_KEY.as_bytes(), PUBLIC_KEY.as_bytes()).unwrap();
        assert_eq!(keys.modulus_bits(), 2048);
        assert!(!keys.key_id().is_empty());
    }

    #[test]
    fn test_load_pkcs1_pair() {
        let keys =
            KeyMaterial::from_pem(PKCS1_PRIVATE_KEY.as_bytes(), PKCS1_PUBLIC_KEY.as_bytes())
                .unwrap();
        assert!(keys.modulus_bits() >= KeyMaterial::MIN_MODULUS_BITS);
    }

    #[test]
    fn test_reject_short_modulus() {
        let err = KeyMaterial::from_pem(WEAK_PRIVATE_KEY.as_bytes(), WEAK_PUBLIC_KEY.as_bytes())
            .unwrap_err();
        assert!(err.to_string().contains("at least 2048 bits"), "{}", err);
    }

    #[test]
    fn test_reject_mismatched_pair() {
        let err = KeyMaterial::from_pem(PRIVATE_KEY.as_bytes(), OTHER_PUBLIC_KEY.as_bytes())
            .unwrap_err();
        assert!(err.to_string().contains("does not match"), "{}", err);
    }

    #[test]
    fn test_reject_garbage() {
        assert!(KeyMaterial::from_pem(b"not a key", PUBLIC_KEY.as_bytes()).is_err());
        assert!(KeyMaterial::from_base64_pem("%%%", "%%%").is_err());
    }

    #[test]
    fn test_default_config_keys_load() {
        let keys = KeyMaterial::from_config(&KeysConfig::default()).unwrap();
        let direct = KeyMaterial::from_pem(PRIVATE_KEY.as_bytes(), PUBLIC_KEY.as_bytes()).unwrap();
        assert_eq!(keys.key_id(), direct.key_id());
    }

    #[test]
    fn test_jwks_exposes_thumbprint_kid() {
        let keys = KeyMaterial::from_pem(PRIVATE_KEY.as_bytes(), PUBLIC_KEY.as_bytes()).unwrap();
        let jwks = keys.jwks().unwrap();
        assert_eq!(jwks.keys.len(), 1);
        assert!(jwks.find(keys.key_id()).is_some());

        let json = serde_json::to_value(&jwks).unwrap();
        let key = &json["keys"][0];
        assert_eq!(key["kty"], "RSA");
        assert_eq!(key["use"], "sig");
        assert_eq!(key["alg"], "RS256");
        assert_eq!(key["e"], "AQAB");
        assert!(!key["n"].as_str().unwrap().contains('='));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let keys = KeyMaterial::from_pem(PRIVATE_KEY.as_bytes(), PUBLIC_KEY.as_bytes()).unwrap();
        let debug = format!("{:?}", keys);
        assert!(debug.contains("<EncodingKey>"));
        assert!(!debug.contains("BEGIN"));
    }
}
