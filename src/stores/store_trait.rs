use crate::{certificate::CertificateEntry, error::Result};

/// A destination for certificates of one trust bucket
pub trait TrustStore {
    /// Name used in logs (ex: `personal`, `/etc/tls-secret/root`)
    fn name(&self) -> &str;

    /// Whether a certificate with the same encoding is already stored
    fn contains(&self, entry: &CertificateEntry) -> Result<bool>;

    /// Stores `entry`, including its private key when it carries one
    fn add(&mut self, entry: &CertificateEntry) -> Result<()>;

    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
