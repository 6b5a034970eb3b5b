use anyhow::{anyhow, Context};
use clap::crate_version;
use tls_secret::{
    classify,
    config::{self, Config, LogFormat},
    services::{logger::SecretLog, sidecar},
    sources,
    stores::{self, DirectoryTrustStore, TrustStores},
    CertificateCollection, TlsIdentity,
};
use tracing_subscriber::EnvFilter;

#[deny(
    clippy::all,
    clippy::pedantic,
    clippy::perf,
    clippy::correctness,
    clippy::style,
    clippy::suspicious,
    clippy::complexity
)]
fn main() -> Result<(), anyhow::Error> {
    // Loads configuration from command-line, YAML, config maps or ENV sources
    let config = config::load("/etc/tls-secret/config")?;

    setup_logging(&config);

    tracing::info!(
        version = crate_version!(),
        service = %config.service_name,
        "loading TLS secret"
    );

    let identity = load_identity(&config)?;
    let ca = sources::ca_from_mapped_path(&config.secret.mount_path, &config.secret.ca_file)
        .context("failed to load CA bundle")?;

    if let Some(leaf) = identity.leaf() {
        tracing::info!(subject = %leaf.subject(), "leaf certificate bound to private key");
    }

    // Chain first, then trust anchors. Installation skips duplicates.
    let certificates: CertificateCollection = identity
        .into_certificates()
        .into_iter()
        .chain(ca.into_iter().flatten())
        .collect();

    let buckets = classify(&certificates);

    let mut trust_stores = TrustStores {
        personal: DirectoryTrustStore::open(&config.stores.personal)?,
        intermediate: DirectoryTrustStore::open(&config.stores.intermediate)?,
        root: DirectoryTrustStore::open(&config.stores.root)?,
    };

    let report = stores::install(&buckets, &mut trust_stores)?;

    tracing::info!(
        installed = report.installed.len(),
        skipped = report.skipped,
        "trust stores are up to date"
    );

    if config.sidecar.shutdown_enabled {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let acknowledged = runtime.block_on(sidecar::try_shutdown(&config.sidecar));
        tracing::info!(acknowledged, "sidecar shutdown notified");
    }

    Ok(())
}

/// Prefers the mounted secret and falls back to environment variables
fn load_identity(config: &Config) -> Result<TlsIdentity, anyhow::Error> {
    let mount_path = &config.secret.mount_path;

    if let Some(identity) = sources::from_mapped_path(mount_path)
        .with_context(|| format!("failed to load TLS secret from {}", mount_path.display()))?
    {
        return Ok(identity);
    }

    sources::from_environment(&config.secret.cert_var, &config.secret.key_var)
        .context("failed to load TLS secret from environment")?
        .ok_or_else(|| {
            anyhow!(
                "no TLS secret found in {} or in ${}",
                mount_path.display(),
                config.secret.cert_var
            )
        })
}

fn setup_logging(config: &Config) {
    let appender = SecretLog::new(config.logging.enabled);

    // Creates a tracing/logging subscriber based on the configuration provided
    if config.logging.format == LogFormat::Json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .with_max_level(&config.logging.level)
            .with_writer(appender)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_max_level(&config.logging.level)
            .with_writer(appender)
            .init();
    };
}
