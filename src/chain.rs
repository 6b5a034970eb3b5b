//! Builds the certificate collection of a TLS secret and binds its key to the leaf.

use crate::{
    binder,
    certificate::{CertificateCollection, CertificateEntry},
    error::{Result, TlsSecretError},
    key, pem,
};

/// The certificates of a TLS secret, leaf first
#[derive(Debug, Clone)]
pub struct TlsIdentity {
    certificates: CertificateCollection,
    leaf_bound: bool,
}

impl TlsIdentity {
    pub fn certificates(&self) -> &CertificateCollection {
        &self.certificates
    }

    pub fn into_certificates(self) -> CertificateCollection {
        self.certificates
    }

    /// The leaf carrying the private key, `None` when no key was supplied
    pub fn leaf(&self) -> Option<&CertificateEntry> {
        if self.leaf_bound {
            return self.certificates.first();
        }

        None
    }
}

/// Parses `cert_chain_pem` and, when `private_key_pem` holds a key, binds it
/// to the first certificate of the chain.
///
/// A blank key is treated as absent. On any binding error nothing is
/// returned, the caller never sees a partially bound collection.
pub fn assemble_chain(cert_chain_pem: &str, private_key_pem: Option<&str>) -> Result<TlsIdentity> {
    let certificates = assemble_ca_chain(cert_chain_pem)?;

    let Some(key_pem) = private_key_pem.filter(|pem| !pem.trim().is_empty()) else {
        tracing::debug!(certificates = certificates.len(), "no private key supplied");
        return Ok(TlsIdentity {
            certificates,
            leaf_bound: false,
        });
    };

    let leaf = certificates.first().ok_or(TlsSecretError::EmptyChain)?;
    let material = key::parse_private_key(key_pem, leaf.key_algorithm()?)?;
    let bound = binder::bind_private_key(leaf, material)?;

    Ok(TlsIdentity {
        certificates: certificates.with_replaced(0, bound),
        leaf_bound: true,
    })
}

/// Parses a bundle of trust anchors, no key is involved
pub fn assemble_ca_chain(ca_bundle_pem: &str) -> Result<CertificateCollection> {
    let blocks = pem::parse_certificates(ca_bundle_pem)?;
    if blocks.is_empty() {
        return Err(TlsSecretError::EmptyChain);
    }

    CertificateCollection::from_der_blocks(blocks)
}
