use std::fmt;

use crate::certificate::{CertificateCollection, CertificateEntry};

/// The platform store a certificate belongs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrustBucket {
    /// Certificates with a private key (the `My` store on Windows)
    Personal,
    IntermediateCa,
    Root,
}

impl TrustBucket {
    pub const ALL: [TrustBucket; 3] = [
        TrustBucket::Personal,
        TrustBucket::IntermediateCa,
        TrustBucket::Root,
    ];

    /// First match wins: a private key makes it personal, a self-issued
    /// certificate is a root, everything else is an intermediate.
    pub fn of(entry: &CertificateEntry) -> Self {
        if entry.has_private_key() {
            TrustBucket::Personal
        } else if entry.is_self_issued() {
            TrustBucket::Root
        } else {
            TrustBucket::IntermediateCa
        }
    }
}

impl fmt::Display for TrustBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustBucket::Personal => write!(f, "personal"),
            TrustBucket::IntermediateCa => write!(f, "intermediate"),
            TrustBucket::Root => write!(f, "root"),
        }
    }
}

/// Certificates grouped per bucket, each group in collection order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustBuckets {
    personal: Vec<CertificateEntry>,
    intermediate: Vec<CertificateEntry>,
    root: Vec<CertificateEntry>,
}

impl TrustBuckets {
    pub fn get(&self, bucket: TrustBucket) -> &[CertificateEntry] {
        match bucket {
            TrustBucket::Personal => &self.personal,
            TrustBucket::IntermediateCa => &self.intermediate,
            TrustBucket::Root => &self.root,
        }
    }

    pub fn len(&self) -> usize {
        self.personal.len() + self.intermediate.len() + self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates buckets in `TrustBucket::ALL` order
    pub fn iter(&self) -> impl Iterator<Item = (TrustBucket, &[CertificateEntry])> + '_ {
        TrustBucket::ALL
            .into_iter()
            .map(move |bucket| (bucket, self.get(bucket)))
    }

    fn push(&mut self, bucket: TrustBucket, entry: CertificateEntry) {
        match bucket {
            TrustBucket::Personal => self.personal.push(entry),
            TrustBucket::IntermediateCa => self.intermediate.push(entry),
            TrustBucket::Root => self.root.push(entry),
        }
    }
}

/// Partitions every certificate of `collection` into its trust bucket
pub fn classify(collection: &CertificateCollection) -> TrustBuckets {
    let mut buckets = TrustBuckets::default();

    for entry in collection {
        buckets.push(TrustBucket::of(entry), entry.clone());
    }

    buckets
}
