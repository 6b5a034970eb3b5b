//! Reads TLS secrets the way Kubernetes exposes them: as environment
//! variables or as files in a mounted secret volume.

use std::{fs, path::Path};

use crate::{
    certificate::CertificateCollection,
    chain::{assemble_ca_chain, assemble_chain, TlsIdentity},
    error::Result,
};

pub const DEFAULT_CERT_VAR: &str = "tls_crt";
pub const DEFAULT_KEY_VAR: &str = "tls_key";

pub const CERT_FILE: &str = "tls.crt";
pub const KEY_FILE: &str = "tls.key";
pub const CA_FILE: &str = "ca.crt";

/// Loads the identity from `cert_var` and the optional `key_var`.
/// Returns `None` when the certificate variable is not set.
pub fn from_environment(cert_var: &str, key_var: &str) -> Result<Option<TlsIdentity>> {
    let Ok(cert_pem) = std::env::var(cert_var) else {
        tracing::debug!("environment variable {cert_var} is not set");
        return Ok(None);
    };

    let key_pem = std::env::var(key_var).ok();
    assemble_chain(&cert_pem, key_pem.as_deref()).map(Some)
}

/// Loads `tls.crt` and the optional `tls.key` from a mounted secret directory.
/// Returns `None` when the directory or the certificate file does not exist.
pub fn from_mapped_path(path: impl AsRef<Path>) -> Result<Option<TlsIdentity>> {
    let path = path.as_ref();
    let Some(cert_pem) = read_optional(&path.join(CERT_FILE))? else {
        tracing::debug!("no {CERT_FILE} found in {}", path.to_string_lossy());
        return Ok(None);
    };

    let key_pem = read_optional(&path.join(KEY_FILE))?;
    assemble_chain(&cert_pem, key_pem.as_deref()).map(Some)
}

/// Loads a CA bundle named `file_name` from a mounted secret directory
pub fn ca_from_mapped_path(
    path: impl AsRef<Path>,
    file_name: &str,
) -> Result<Option<CertificateCollection>> {
    let Some(ca_pem) = read_optional(&path.as_ref().join(file_name))? else {
        return Ok(None);
    };

    assemble_ca_chain(&ca_pem).map(Some)
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }

    Ok(Some(fs::read_to_string(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::TlsSecretError, test_support};

    fn write_secret(dir: &Path, chain: &test_support::TestChain, with_key: bool) {
        fs::write(dir.join(CERT_FILE), chain.tls_crt()).unwrap();
        fs::write(dir.join(CA_FILE), chain.ca_crt()).unwrap();
        if with_key {
            fs::write(dir.join(KEY_FILE), chain.native_key()).unwrap();
        }
    }

    #[test]
    fn test_from_mapped_path() {
        let tmp = tempfile::tempdir().unwrap();
        write_secret(tmp.path(), test_support::rsa_chain(), true);

        let identity = from_mapped_path(tmp.path()).unwrap().unwrap();

        assert_eq!(identity.certificates().len(), 2);
        assert!(identity.leaf().unwrap().has_private_key());
        assert!(!identity.certificates().get(1).unwrap().has_private_key());
    }

    #[test]
    fn test_from_mapped_path_without_key() {
        let tmp = tempfile::tempdir().unwrap();
        write_secret(tmp.path(), test_support::ec_chain(), false);

        let identity = from_mapped_path(tmp.path()).unwrap().unwrap();

        assert!(identity.leaf().is_none());
    }

    #[test]
    fn test_from_mapped_path_missing() {
        let tmp = tempfile::tempdir().unwrap();

        assert!(from_mapped_path(tmp.path()).unwrap().is_none());
        assert!(from_mapped_path(tmp.path().join("nope")).unwrap().is_none());
        assert!(ca_from_mapped_path(tmp.path(), CA_FILE).unwrap().is_none());
    }

    #[test]
    fn test_ca_from_mapped_path() {
        let tmp = tempfile::tempdir().unwrap();
        write_secret(tmp.path(), test_support::ec_chain(), false);

        let ca = ca_from_mapped_path(tmp.path(), CA_FILE).unwrap().unwrap();
        assert_eq!(ca.len(), 1);
        assert!(ca.get(0).unwrap().is_self_issued());
    }

    #[test]
    fn test_from_mapped_path_propagates_errors() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(CERT_FILE), "").unwrap();

        let result = from_mapped_path(tmp.path());
        assert!(matches!(result, Err(TlsSecretError::EmptyChain)));
    }

    #[test]
    fn test_from_environment() {
        figment::Jail::expect_with(|jail| {
            let chain = test_support::ec_chain();
            jail.set_env("TEST_TLS_CRT", chain.tls_crt());
            jail.set_env("TEST_TLS_KEY", chain.pkcs8_key());

            let identity = from_environment("TEST_TLS_CRT", "TEST_TLS_KEY").unwrap().unwrap();
            assert_eq!(identity.certificates().len(), 2);
            assert!(identity.leaf().unwrap().has_private_key());

            assert!(from_environment("TEST_TLS_MISSING", "TEST_TLS_KEY").unwrap().is_none());

            Ok(())
        });
    }
}
