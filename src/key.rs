use openssl::{
    ec::EcKey,
    pkey::{PKey, Private},
    rsa::Rsa,
};

use crate::{
    certificate::KeyAlgorithm,
    error::{Result, TlsSecretError},
    pem,
};

/// How the key bytes are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEncoding {
    /// PKCS#8 `PrivateKeyInfo` (`BEGIN PRIVATE KEY`)
    Pkcs8,
    /// PKCS#1 `RSAPrivateKey` (`BEGIN RSA PRIVATE KEY`)
    RsaNative,
    /// SEC1 `ECPrivateKey` (`BEGIN EC PRIVATE KEY`)
    EcNative,
}

/// A decoded but not yet bound private key
pub struct PrivateKeyMaterial {
    algorithm: KeyAlgorithm,
    encoding: KeyEncoding,
    der: Vec<u8>,
    key: PKey<Private>,
}

impl PrivateKeyMaterial {
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    pub fn encoding(&self) -> KeyEncoding {
        self.encoding
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn private_key(&self) -> &PKey<Private> {
        &self.key
    }

    pub(crate) fn into_private_key(self) -> PKey<Private> {
        self.key
    }
}

// Key material is secret, never print the bytes
impl std::fmt::Debug for PrivateKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKeyMaterial")
            .field("algorithm", &self.algorithm)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

/// Parses a single PEM private key block for a certificate whose public key
/// uses `expected`.
///
/// The label selects the encoding. A PKCS#8 container is inspected to learn
/// its algorithm, native encodings are only accepted for their own algorithm.
pub fn parse_private_key(key_pem: &str, expected: KeyAlgorithm) -> Result<PrivateKeyMaterial> {
    let mut tokens = pem::tokens(key_pem).filter(|token| !token.trim().is_empty());

    let (Some(label), Some(body)) = (tokens.next(), tokens.next()) else {
        return Err(TlsSecretError::InvalidKeyFormat(
            "expected a single labeled PEM block".to_string(),
        ));
    };

    let (encoding, declared) = match label {
        pem::PRIVATE_KEY_LABEL => (KeyEncoding::Pkcs8, None),
        pem::RSA_PRIVATE_KEY_LABEL => (KeyEncoding::RsaNative, Some(KeyAlgorithm::Rsa)),
        pem::EC_PRIVATE_KEY_LABEL => (KeyEncoding::EcNative, Some(KeyAlgorithm::Ec)),
        other => {
            return Err(TlsSecretError::InvalidKeyFormat(format!(
                "unrecognized PEM label `{other}`"
            )))
        }
    };

    if let Some(declared) = declared {
        ensure_algorithm(expected, declared)?;
    }

    let der = pem::decode_body(body)?;
    let key = load_key(encoding, &der)?;

    let algorithm = match declared {
        Some(algorithm) => algorithm,
        None => KeyAlgorithm::from_pkey_id(key.id()).ok_or_else(|| {
            TlsSecretError::UnsupportedKeyAlgorithm(format!("PKCS#8 key of type {:?}", key.id()))
        })?,
    };

    ensure_algorithm(expected, algorithm)?;

    tracing::debug!(?encoding, %algorithm, "parsed private key material");

    Ok(PrivateKeyMaterial {
        algorithm,
        encoding,
        der,
        key,
    })
}

/// Loads the key into openssl according to its encoding.
/// Bytes that do not hold an RSA or EC key are reported as unsupported.
fn load_key(encoding: KeyEncoding, der: &[u8]) -> Result<PKey<Private>> {
    let key = match encoding {
        KeyEncoding::Pkcs8 => PKey::private_key_from_pkcs8(der),
        KeyEncoding::RsaNative => Rsa::private_key_from_der(der).and_then(PKey::from_rsa),
        KeyEncoding::EcNative => EcKey::private_key_from_der(der).and_then(PKey::from_ec_key),
    };

    key.map_err(|err| {
        TlsSecretError::UnsupportedKeyAlgorithm(format!("undecodable {encoding:?} key ({err})"))
    })
}

pub(crate) fn ensure_algorithm(certificate: KeyAlgorithm, key: KeyAlgorithm) -> Result<()> {
    if certificate == key {
        return Ok(());
    }

    Err(TlsSecretError::KeyAlgorithmMismatch {
        certificate: certificate.to_string(),
        key: key.to_string(),
    })
}
