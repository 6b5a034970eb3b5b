use std::collections::HashMap;

use super::store_trait::TrustStore;
use crate::{certificate::CertificateEntry, error::Result};

pub struct MemoryTrustStore {
    name: String,
    /// Map of SHA-256 fingerprints to certificates
    inner_certs: HashMap<String, CertificateEntry>,
}

impl MemoryTrustStore {
    pub fn new(name: impl Into<String>) -> Self {
        MemoryTrustStore {
            name: name.into(),
            inner_certs: HashMap::new(),
        }
    }

    pub fn get(&self, fingerprint: &str) -> Option<&CertificateEntry> {
        self.inner_certs.get(fingerprint)
    }
}

impl TrustStore for MemoryTrustStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn contains(&self, entry: &CertificateEntry) -> Result<bool> {
        Ok(self.inner_certs.contains_key(&entry.fingerprint()?))
    }

    fn add(&mut self, entry: &CertificateEntry) -> Result<()> {
        self.inner_certs.insert(entry.fingerprint()?, entry.clone());
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.inner_certs.len())
    }
}
