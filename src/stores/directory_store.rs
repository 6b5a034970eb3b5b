use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use super::store_trait::TrustStore;
use crate::{
    certificate::CertificateEntry,
    error::{Result, TlsSecretError},
};

const CERTIFICATE_EXTENSION: &str = "pem";
const KEY_EXTENSION: &str = "key";

/// A store backed by a directory holding one `<sha256>.pem` file per
/// certificate. Certificates with a private key also get a `<sha256>.key`
/// file in PKCS#8 format, only readable by the owner on unix.
pub struct DirectoryTrustStore {
    name: String,
    directory: PathBuf,
}

impl DirectoryTrustStore {
    /// Opens the store, creating the directory if needed
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        if directory.as_os_str().is_empty() {
            return Err(TlsSecretError::Store("store directory cannot be empty".to_string()));
        }

        fs::create_dir_all(&directory)?;

        let directory = std::path::absolute(&directory).unwrap_or(directory);
        tracing::debug!("opened trust store at {}", directory.to_string_lossy());

        Ok(Self {
            name: directory.to_string_lossy().into_owned(),
            directory,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, fingerprint: &str, extension: &str) -> PathBuf {
        self.directory.join(format!("{fingerprint}.{extension}"))
    }
}

impl TrustStore for DirectoryTrustStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn contains(&self, entry: &CertificateEntry) -> Result<bool> {
        let path = self.path_for(&entry.fingerprint()?, CERTIFICATE_EXTENSION);
        Ok(path.is_file())
    }

    fn add(&mut self, entry: &CertificateEntry) -> Result<()> {
        let fingerprint = entry.fingerprint()?;

        let certificate_pem = entry.certificate().to_pem()?;

        let key_path = match entry.private_key() {
            Some(key) => {
                let key_path = self.path_for(&fingerprint, KEY_EXTENSION);
                write_private(&key_path, &key.private_key_to_pem_pkcs8()?)?;
                Some(key_path)
            }
            None => None,
        };

        // The `.pem` file marks the entry as present, a key must never outlive it
        if let Err(err) = fs::write(
            self.path_for(&fingerprint, CERTIFICATE_EXTENSION),
            certificate_pem,
        ) {
            if let Some(key_path) = key_path {
                let _ = fs::remove_file(key_path);
            }
            return Err(err.into());
        }

        Ok(())
    }

    fn len(&self) -> Result<usize> {
        let mut count = 0;
        for dir_entry in fs::read_dir(&self.directory)? {
            let path = dir_entry?.path();
            if path.extension().is_some_and(|ext| ext == CERTIFICATE_EXTENSION) {
                count += 1;
            }
        }

        Ok(count)
    }
}

fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)?.write_all(contents)?;
    Ok(())
}
