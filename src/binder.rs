use crate::{
    certificate::CertificateEntry,
    error::{Result, TlsSecretError},
    key::{self, PrivateKeyMaterial},
};

/// Produces a copy of `entry` carrying the private key in `material`.
///
/// The certificate's public key decides which algorithm is acceptable, and the
/// key must be the private half of that public key. `material` is consumed and
/// the decoded key is moved into the returned entry, so no intermediate key
/// object outlives this call.
pub fn bind_private_key(
    entry: &CertificateEntry,
    material: PrivateKeyMaterial,
) -> Result<CertificateEntry> {
    let algorithm = entry.key_algorithm()?;
    key::ensure_algorithm(algorithm, material.algorithm())?;

    let private_key = material.into_private_key();
    let public_key = entry.public_key()?;

    if !public_key.public_eq(&private_key) {
        return Err(TlsSecretError::KeyCertificateMismatch {
            subject: entry.subject(),
        });
    }

    tracing::debug!(subject = %entry.subject(), %algorithm, "bound private key to certificate");

    Ok(entry.with_private_key(private_key))
}
