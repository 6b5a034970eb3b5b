use std::fmt;

use openssl::{
    hash::MessageDigest,
    nid::Nid,
    pkey::{Id, PKey, Private, Public},
    x509::{X509NameRef, X509},
};

use crate::error::{Result, TlsSecretError};

/// Object identifier of `rsaEncryption`
pub const OID_RSA: &str = "1.2.840.113549.1.1.1";
/// Object identifier of `id-ecPublicKey`
pub const OID_EC: &str = "1.2.840.10045.2.1";

/// Public key algorithms a private key can be bound for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    Rsa,
    Ec,
}

impl KeyAlgorithm {
    pub fn oid(self) -> &'static str {
        match self {
            KeyAlgorithm::Rsa => OID_RSA,
            KeyAlgorithm::Ec => OID_EC,
        }
    }

    /// openssl resolves the SPKI algorithm OID to the key id, so
    /// `Id::RSA` is `rsaEncryption` and `Id::EC` is `id-ecPublicKey`
    pub(crate) fn from_pkey_id(id: Id) -> Option<Self> {
        match id {
            Id::RSA => Some(KeyAlgorithm::Rsa),
            Id::EC => Some(KeyAlgorithm::Ec),
            _ => None,
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAlgorithm::Rsa => write!(f, "RSA ({})", self.oid()),
            KeyAlgorithm::Ec => write!(f, "EC ({})", self.oid()),
        }
    }
}

/// A decoded certificate, optionally carrying the private key of its public key
#[derive(Clone)]
pub struct CertificateEntry {
    der: Vec<u8>,
    certificate: X509,
    private_key: Option<PKey<Private>>,
}

impl CertificateEntry {
    /// Decodes a DER certificate into an entry without a private key
    pub fn from_der(der: Vec<u8>) -> Result<Self> {
        let certificate = X509::from_der(&der).map_err(TlsSecretError::InvalidCertificate)?;

        Ok(Self {
            der,
            certificate,
            private_key: None,
        })
    }

    /// Returns a copy of this entry that carries `key`.
    /// The caller is responsible for checking that `key` matches the public key.
    pub(crate) fn with_private_key(&self, key: PKey<Private>) -> Self {
        Self {
            der: self.der.clone(),
            certificate: self.certificate.clone(),
            private_key: Some(key),
        }
    }

    pub fn certificate(&self) -> &X509 {
        &self.certificate
    }

    pub fn private_key(&self) -> Option<&PKey<Private>> {
        self.private_key.as_ref()
    }

    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    /// The encoded certificate exactly as it appeared in the PEM body
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn subject_name(&self) -> &X509NameRef {
        self.certificate.subject_name()
    }

    pub fn issuer_name(&self) -> &X509NameRef {
        self.certificate.issuer_name()
    }

    /// Human readable subject (ex: `CN=example.com, O=Example`)
    pub fn subject(&self) -> String {
        format_name(self.subject_name())
    }

    pub fn issuer(&self) -> String {
        format_name(self.issuer_name())
    }

    /// Whether the issuer name is byte-for-byte the subject name
    pub fn is_self_issued(&self) -> bool {
        match (self.subject_name().to_der(), self.issuer_name().to_der()) {
            (Ok(subject), Ok(issuer)) => subject == issuer,
            _ => false,
        }
    }

    /// The certificate's public key.
    /// An algorithm openssl cannot load is reported as unsupported.
    pub fn public_key(&self) -> Result<PKey<Public>> {
        self.certificate.public_key().map_err(|err| {
            TlsSecretError::UnsupportedKeyAlgorithm(format!("undecodable public key ({err})"))
        })
    }

    /// The algorithm of the certificate's public key, if RSA or EC
    pub fn key_algorithm(&self) -> Result<KeyAlgorithm> {
        let id = self.public_key()?.id();

        KeyAlgorithm::from_pkey_id(id)
            .ok_or_else(|| TlsSecretError::UnsupportedKeyAlgorithm(describe_key_id(id)))
    }

    /// Lowercase hex SHA-256 of the encoded certificate
    pub fn fingerprint(&self) -> Result<String> {
        let digest = self.certificate.digest(MessageDigest::sha256())?;
        Ok(hex::encode(&*digest))
    }
}

/// Entries are equal when their encoded certificates are equal, whether or
/// not a private key is attached.
impl PartialEq for CertificateEntry {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for CertificateEntry {}

impl fmt::Debug for CertificateEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateEntry")
            .field("subject", &self.subject())
            .field("issuer", &self.issuer())
            .field("has_private_key", &self.has_private_key())
            .finish()
    }
}

fn format_name(name: &X509NameRef) -> String {
    name.entries()
        .map(|entry| {
            let field = entry.object().nid().short_name().unwrap_or("UNKNOWN");
            let value = entry
                .data()
                .as_utf8()
                .map(|value| value.to_string())
                .unwrap_or_default();
            format!("{field}={value}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_key_id(id: Id) -> String {
    let nid = Nid::from_raw(id.as_raw());
    nid.long_name()
        .map(str::to_string)
        .unwrap_or_else(|_| format!("nid {}", id.as_raw()))
}

/// Ordered certificates, in the order their PEM blocks appeared
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateCollection {
    entries: Vec<CertificateEntry>,
}

impl CertificateCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes every DER block, failing on the first invalid certificate
    pub fn from_der_blocks(blocks: Vec<Vec<u8>>) -> Result<Self> {
        blocks
            .into_iter()
            .map(CertificateEntry::from_der)
            .collect::<Result<Vec<_>>>()
            .map(|entries| Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CertificateEntry> {
        self.entries.get(index)
    }

    pub fn first(&self) -> Option<&CertificateEntry> {
        self.entries.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CertificateEntry> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[CertificateEntry] {
        &self.entries
    }

    /// Consumes the collection and returns one where `index` holds `entry`.
    /// The entry previously at `index` is dropped.
    pub(crate) fn with_replaced(self, index: usize, entry: CertificateEntry) -> Self {
        let mut entries = self.entries;
        if let Some(slot) = entries.get_mut(index) {
            *slot = entry;
        }

        Self { entries }
    }
}

impl FromIterator<CertificateEntry> for CertificateCollection {
    fn from_iter<I: IntoIterator<Item = CertificateEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for CertificateCollection {
    type Item = CertificateEntry;
    type IntoIter = std::vec::IntoIter<CertificateEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a CertificateCollection {
    type Item = &'a CertificateEntry;
    type IntoIter = std::slice::Iter<'a, CertificateEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
