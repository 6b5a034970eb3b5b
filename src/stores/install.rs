use super::store_trait::TrustStore;
use crate::{
    classify::{TrustBucket, TrustBuckets},
    error::Result,
};

/// The three stores certificates are installed into
pub struct TrustStores<S: TrustStore> {
    pub personal: S,
    pub intermediate: S,
    pub root: S,
}

impl<S: TrustStore> TrustStores<S> {
    pub fn get(&self, bucket: TrustBucket) -> &S {
        match bucket {
            TrustBucket::Personal => &self.personal,
            TrustBucket::IntermediateCa => &self.intermediate,
            TrustBucket::Root => &self.root,
        }
    }

    pub fn get_mut(&mut self, bucket: TrustBucket) -> &mut S {
        match bucket {
            TrustBucket::Personal => &mut self.personal,
            TrustBucket::IntermediateCa => &mut self.intermediate,
            TrustBucket::Root => &mut self.root,
        }
    }

    /// Whether any of the stores already holds `entry`
    fn any_contains(&self, entry: &crate::certificate::CertificateEntry) -> Result<bool> {
        for bucket in TrustBucket::ALL {
            if self.get(bucket).contains(entry)? {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledCertificate {
    pub bucket: TrustBucket,
    pub subject: String,
    pub fingerprint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub installed: Vec<InstalledCertificate>,
    /// Certificates that were already present in one of the stores
    pub skipped: usize,
}

/// Adds every bucketed certificate to its store.
///
/// A certificate already present in any of the three stores is skipped, so
/// installing the same buckets twice leaves the stores unchanged.
pub fn install<S: TrustStore>(
    buckets: &TrustBuckets,
    stores: &mut TrustStores<S>,
) -> Result<InstallReport> {
    let mut report = InstallReport::default();

    for (bucket, entries) in buckets.iter() {
        for entry in entries {
            if stores.any_contains(entry)? {
                tracing::debug!(subject = %entry.subject(), %bucket, "certificate already installed");
                report.skipped += 1;
                continue;
            }

            let store = stores.get_mut(bucket);
            store.add(entry)?;

            let installed = InstalledCertificate {
                bucket,
                subject: entry.subject(),
                fingerprint: entry.fingerprint()?,
            };
            tracing::info!(
                subject = %installed.subject,
                fingerprint = %installed.fingerprint,
                store = store.name(),
                "installed certificate in {bucket} store"
            );
            report.installed.push(installed);
        }
    }

    Ok(report)
}
