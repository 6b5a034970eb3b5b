//! Loads a TLS identity from the PEM material of a Kubernetes TLS secret and
//! sorts the resulting certificates into trust stores.
//!
//! ```no_run
//! use tls_secret::{assemble_chain, classify, TrustBucket};
//!
//! # fn run(cert_pem: &str, key_pem: &str) -> Result<(), tls_secret::TlsSecretError> {
//! let identity = assemble_chain(cert_pem, Some(key_pem))?;
//! let buckets = classify(identity.certificates());
//!
//! for entry in buckets.get(TrustBucket::Root) {
//!     println!("root: {}", entry.subject());
//! }
//! # Ok(())
//! # }
//! ```

pub mod binder;
pub mod certificate;
pub mod chain;
pub mod classify;
pub mod config;
pub mod error;
pub mod key;
pub mod pem;
pub mod services;
pub mod sources;
pub mod stores;

#[cfg(test)]
pub(crate) mod test_support;

pub use certificate::{CertificateCollection, CertificateEntry, KeyAlgorithm};
pub use chain::{assemble_ca_chain, assemble_chain, TlsIdentity};
pub use classify::{classify, TrustBucket, TrustBuckets};
pub use error::{Result, TlsSecretError};
pub use key::{parse_private_key, KeyEncoding, PrivateKeyMaterial};
