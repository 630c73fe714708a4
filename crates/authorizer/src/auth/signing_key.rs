//! Verification keys built from JWKS records.
//!
//! A [`SigningKey`] is only constructed from a record that passes the
//! usability filter (signing use, RSA, non-empty `kid`, certificate or
//! modulus/exponent). Once built it is never mutated.

use crate::auth::jwks::Jwk;
use jsonwebtoken::DecodingKey;
use std::fmt;

/// PEM line width for certificate bodies.
const PEM_LINE_WIDTH: usize = 64;

/// Public key material a signing key was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    /// First `x5c` certificate, PEM encoded.
    Certificate {
        /// PEM-encoded certificate.
        pem: String,
    },

    /// RSA modulus and exponent (base64url, as published).
    Components {
        /// Modulus.
        n: String,
        /// Public exponent.
        e: String,
    },
}

/// Why a JWKS record was excluded from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRejection {
    /// `use` is not `sig`.
    NotSigningKey,
    /// `kty` is not `RSA`.
    NotRsa,
    /// `kid` absent or empty.
    MissingKid,
    /// Neither a certificate chain nor a modulus/exponent pair.
    NoPublicKey,
    /// Material present but could not be turned into a key.
    InvalidMaterial,
}

impl KeyRejection {
    /// Bounded label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyRejection::NotSigningKey => "not_signing_key",
            KeyRejection::NotRsa => "not_rsa",
            KeyRejection::MissingKid => "missing_kid",
            KeyRejection::NoPublicKey => "no_public_key",
            KeyRejection::InvalidMaterial => "invalid_material",
        }
    }
}

/// An RSA verification key for one `kid`.
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    material: KeyMaterial,
    decoding_key: DecodingKey,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("material", &self.material)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Build a signing key from a JWKS record.
    ///
    /// The first `x5c` certificate is preferred. When it cannot be parsed and
    /// the record also carries `n`/`e`, the modulus/exponent pair is used.
    ///
    /// # Errors
    ///
    /// Returns the [`KeyRejection`] describing the first filter the record failed.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, KeyRejection> {
        if jwk.key_use.as_deref() != Some("sig") {
            return Err(KeyRejection::NotSigningKey);
        }
        if jwk.kty.as_deref() != Some("RSA") {
            return Err(KeyRejection::NotRsa);
        }
        let kid = jwk
            .kid
            .as_deref()
            .filter(|kid| !kid.is_empty())
            .ok_or(KeyRejection::MissingKid)?;

        let certificate = jwk
            .x5c
            .as_ref()
            .and_then(|chain| chain.first())
            .filter(|cert| !cert.is_empty());
        let components = match (jwk.n.as_deref(), jwk.e.as_deref()) {
            (Some(n), Some(e)) if !n.is_empty() && !e.is_empty() => Some((n, e)),
            _ => None,
        };

        if certificate.is_none() && components.is_none() {
            return Err(KeyRejection::NoPublicKey);
        }

        if let Some(cert) = certificate {
            let pem = cert_to_pem(cert);
            match DecodingKey::from_rsa_pem(pem.as_bytes()) {
                Ok(decoding_key) => {
                    return Ok(Self {
                        kid: kid.to_string(),
                        material: KeyMaterial::Certificate { pem },
                        decoding_key,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        target: "authz.jwks",
                        kid = %kid,
                        error = %e,
                        "Unusable x5c certificate"
                    );
                }
            }
        }

        let (n, e) = components.ok_or(KeyRejection::InvalidMaterial)?;
        Self::from_components(kid, n, e)
    }

    /// Build a signing key from a base64url modulus/exponent pair.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMaterial` when the components are not valid base64url.
    pub fn from_components(kid: &str, n: &str, e: &str) -> Result<Self, KeyRejection> {
        let decoding_key = DecodingKey::from_rsa_components(n, e).map_err(|err| {
            tracing::warn!(target: "authz.jwks", kid = %kid, error = %err, "Unusable RSA components");
            KeyRejection::InvalidMaterial
        })?;

        Ok(Self {
            kid: kid.to_string(),
            material: KeyMaterial::Components {
                n: n.to_string(),
                e: e.to_string(),
            },
            decoding_key,
        })
    }

    /// Key ID.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Material the key was built from.
    pub fn material(&self) -> &KeyMaterial {
        &self.material
    }

    /// PEM encoding, when the key came from a certificate.
    pub fn pem(&self) -> Option<&str> {
        match &self.material {
            KeyMaterial::Certificate { pem } => Some(pem),
            KeyMaterial::Components { .. } => None,
        }
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

/// Wrap a base64 DER certificate (an `x5c` entry) as PEM.
///
/// The body is split into 64-character lines between the standard
/// certificate header and footer, with a trailing newline.
pub fn cert_to_pem(cert_b64: &str) -> String {
    let mut pem = String::with_capacity(cert_b64.len() + cert_b64.len() / PEM_LINE_WIDTH + 64);
    pem.push_str("-----BEGIN CERTIFICATE-----\n");
    // x5c is standard base64, which is pure ASCII, so byte chunks are char boundaries
    for line in cert_b64.as_bytes().chunks(PEM_LINE_WIDTH) {
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str("-----END CERTIFICATE-----\n");
    pem
}
