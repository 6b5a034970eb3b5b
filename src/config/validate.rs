use anyhow::anyhow;

use super::Config;

/// given a Config struct, validate the values to ensure
/// that the loader won't fail halfway through when we try to use them
pub fn check_config(config: &Config) -> Result<(), anyhow::Error> {
    if config.secret.cert_var.is_empty() {
        return Err(anyhow!("secret.cert_var cannot be empty"));
    }

    if config.secret.ca_file.is_empty() {
        return Err(anyhow!("secret.ca_file cannot be empty"));
    }

    // Validate that the store paths are not empty strings
    for (name, path) in [
        ("personal", &config.stores.personal),
        ("intermediate", &config.stores.intermediate),
        ("root", &config.stores.root),
    ] {
        if path.as_os_str().is_empty() {
            return Err(anyhow!("stores.{name} cannot be empty"));
        }
    }

    if config.sidecar.timeout_secs == 0 {
        return Err(anyhow!("sidecar.timeout_secs must be greater than 0"));
    }

    if config.sidecar.shutdown_enabled && config.sidecar.shutdown_url.is_empty() {
        return Err(anyhow!(
            "sidecar.shutdown_url cannot be empty when sidecar.shutdown_enabled is true"
        ));
    }

    Ok(())
}
