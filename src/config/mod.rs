use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use clap::{ArgAction, Args, Parser, ValueEnum};
use figment::{
    providers::{Env, Format, Json, Serialized, Yaml},
    Figment, Provider,
};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::level_filters::LevelFilter;

mod validate;

/// Name of the directory (under the config path) holding mounted config maps
const CONFIGMAPS_DIR: &str = "configmaps";

fn default_mount_path() -> PathBuf {
    PathBuf::from("/etc/tls")
}

fn default_shutdown_url() -> Cow<'static, str> {
    Cow::Borrowed("http://localhost:4191/shutdown")
}

#[derive(Debug, Serialize, Deserialize, Clone, Args)]
#[group(id = "secret")]
pub struct Secret {
    /// Directory where the TLS secret is mounted (`tls.crt`, `tls.key`, `ca.crt`)
    #[serde(default = "default_mount_path")]
    #[arg(
        long = "secret.mount_path",
        required = false,
        value_parser,
        default_value = "/etc/tls"
    )]
    pub mount_path: PathBuf,

    /// Environment variable holding the certificate chain, used when nothing is mounted
    #[arg(
        long = "secret.cert_var",
        required = false,
        value_parser,
        default_value = "tls_crt"
    )]
    pub cert_var: Cow<'static, str>,

    /// Environment variable holding the private key
    #[arg(
        long = "secret.key_var",
        required = false,
        value_parser,
        default_value = "tls_key"
    )]
    pub key_var: Cow<'static, str>,

    /// Name of the CA bundle file inside the mount path
    #[arg(
        long = "secret.ca_file",
        required = false,
        value_parser,
        default_value = "ca.crt"
    )]
    pub ca_file: Cow<'static, str>,
}

impl Default for Secret {
    fn default() -> Self {
        Self {
            mount_path: default_mount_path(),
            cert_var: Cow::Borrowed(crate::sources::DEFAULT_CERT_VAR),
            key_var: Cow::Borrowed(crate::sources::DEFAULT_KEY_VAR),
            ca_file: Cow::Borrowed(crate::sources::CA_FILE),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Stores {
    /// Certificates that carry a private key
    pub personal: PathBuf,

    /// Certificates issued by another certificate
    pub intermediate: PathBuf,

    /// Self-issued certificates
    pub root: PathBuf,
}

impl Default for Stores {
    fn default() -> Self {
        Self {
            personal: PathBuf::from("/etc/tls-secret/personal"),
            intermediate: PathBuf::from("/etc/tls-secret/intermediate"),
            root: PathBuf::from("/etc/tls-secret/root"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Args)]
#[group(id = "sidecar")]
pub struct Sidecar {
    /// Ask the service mesh proxy to shut down once certificates are installed
    #[arg(
        long = "sidecar.shutdown_enabled",
        required = false,
        action = ArgAction::Set,
        default_value = "false",
        id = "sidecar.shutdown_enabled"
    )]
    pub shutdown_enabled: bool,

    /// The shutdown endpoint of the proxy
    #[serde(default = "default_shutdown_url")]
    #[arg(
        long = "sidecar.shutdown_url",
        required = false,
        value_parser,
        default_value = "http://localhost:4191/shutdown"
    )]
    pub shutdown_url: Cow<'static, str>,

    /// Request timeout in seconds
    #[arg(
        long = "sidecar.timeout_secs",
        required = false,
        value_parser,
        default_value = "2"
    )]
    pub timeout_secs: u64,
}

impl Default for Sidecar {
    fn default() -> Self {
        Self {
            shutdown_enabled: false,
            shutdown_url: default_shutdown_url(),
            timeout_secs: 2,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Trace,
}

/// Transforms our custom `LogLevel` enum into a `tracing::level_filters::LevelFilter`
/// enum used by the `tracing` crate.
impl From<&LogLevel> for tracing::level_filters::LevelFilter {
    fn from(val: &LogLevel) -> Self {
        match val {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Serialize, Deserialize, Clone, Args)]
#[group(id = "logging")]
pub struct Logging {
    /// If logging is enabled at all. Setting this to `false` will disable all logging output.
    #[arg(
        long = "log.enabled",
        required = false,
        action = ArgAction::Set,
        default_value = "true",
        id = "log.enabled"
    )]
    pub enabled: bool,

    /// The level of logging to be used.
    #[serde(deserialize_with = "log_level_deser")]
    #[arg(
        long = "log.level",
        required = false,
        value_enum,
        default_value = "info"
    )]
    pub level: LogLevel,

    /// The format of the log output
    #[serde(deserialize_with = "log_format_deser")]
    #[arg(
        long = "log.format",
        required = false,
        value_enum,
        default_value = "json"
    )]
    pub format: LogFormat,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            enabled: true,
            level: LogLevel::Info,
            format: LogFormat::Json,
        }
    }
}

/// The main configuration struct.
/// A configuration file (YAML, JSON config maps or through ENV) will be parsed into this struct.
/// Example:
///
/// ```yaml
/// service_name: "payments-api"
/// secret:
///   mount_path: "/var/run/secrets/tls"
///   ca_file: "ca.crt"
/// stores:
///   personal: "/etc/tls-secret/personal"
///   intermediate: "/etc/tls-secret/intermediate"
///   root: "/etc/tls-secret/root"
/// logging:
///   level: "INFO"
///   format: "pretty"
/// sidecar:
///   shutdown_enabled: true
/// ```
#[derive(Debug, Serialize, Deserialize, Parser)]
#[command(name = "tls-secret")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// The name of the service (will appear as a log property)
    #[serde(default)]
    #[clap(short, long, default_value = "tls-secret")]
    pub service_name: Cow<'static, str>,

    /// The PATH to the configuration directory or file.
    ///
    /// A directory may contain `tls-secret.yaml` and a `configmaps` folder whose
    /// sub-directories hold `*.json` files.
    #[clap(short, required = false, long)]
    #[allow(clippy::struct_field_names)]
    pub config_path: Option<Cow<'static, str>>,

    #[command(flatten)]
    pub secret: Secret,

    #[command(flatten)]
    pub logging: Logging,

    #[command(flatten)]
    pub sidecar: Sidecar,

    /// Directories of the trust stores
    #[clap(skip)]
    pub stores: Stores,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            service_name: Cow::Borrowed("tls-secret"),
            config_path: Some(Cow::Borrowed("/etc/tls-secret/config")),
            secret: Secret::default(),
            logging: Logging::default(),
            sidecar: Sidecar::default(),
            stores: Stores::default(),
        }
    }
}

/// Implement the `Provider` trait for the `Config` struct.
/// This allows the `Config` struct to be used as a configuration provider with *defaults*.
impl Provider for Config {
    fn metadata(&self) -> figment::Metadata {
        figment::Metadata::named("tls-secret")
    }

    fn data(
        &self,
    ) -> Result<figment::value::Map<figment::Profile, figment::value::Dict>, figment::Error> {
        Serialized::defaults(Config::default()).data()
    }
}

/// Load the configuration from the command line and configuration sources.
///
/// Nested keys can be separated by double underscores (__) in the environment variables.
/// E.g. `TLS_SECRET_LOGGING__LEVEL=DEBUG` will set the `level` key in the
/// `logging` section.
pub fn load(fallback: &str) -> Result<Config, figment::Error> {
    let parsed_commands = Config::parse();

    let path_with_fallback = match &parsed_commands.config_path {
        Some(path) => path.as_ref(),
        None => fallback,
    };

    load_from_path(path_with_fallback, &parsed_commands)
}

/// Test-friendly version of load that doesn't parse command line arguments
#[cfg(test)]
pub(crate) fn load_for_test(fallback: &str) -> Result<Config, figment::Error> {
    load_from_path(fallback, &Config::default())
}

/// Load configuration from a specific path
pub(crate) fn load_from_path(
    config_path: &str,
    parsed_commands: &Config,
) -> Result<Config, figment::Error> {
    let mut figment = Figment::new()
        .merge(Config::default())
        .merge(Serialized::defaults(parsed_commands));

    let path = Path::new(config_path);
    if path.is_file() {
        figment = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => figment.merge(Json::file(path)),
            _ => figment.merge(Yaml::file(path)),
        };
    } else {
        figment = figment
            .merge(Yaml::file(path.join("tls-secret.yml")))
            .merge(Yaml::file(path.join("tls-secret.yaml")));

        for configmap in configmap_files(&path.join(CONFIGMAPS_DIR)) {
            tracing::debug!("merging config map {}", configmap.to_string_lossy());
            figment = figment.merge(Json::file(configmap));
        }
    }

    let config: Config = figment
        .merge(Env::prefixed("TLS_SECRET_").split("__"))
        .extract()?;

    // validate configuration and throw error upwards
    validate::check_config(&config).map_err(|err| figment::Error::from(err.to_string()))?;

    Ok(config)
}

/// Every `*.json` file in each sub-directory of `root`, sorted by path.
/// Kubernetes mounts one directory per config map.
fn configmap_files(root: &Path) -> Vec<PathBuf> {
    let Ok(directories) = std::fs::read_dir(root) else {
        return vec![];
    };

    let mut files: Vec<PathBuf> = directories
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter_map(|dir| std::fs::read_dir(dir).ok())
        .flat_map(|entries| entries.filter_map(Result::ok).map(|entry| entry.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();

    files.sort();
    files
}

/// Deserialize function to convert a string to a `LogLevel` Enum
fn log_level_deser<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.to_lowercase().as_str() {
        "debug" => Ok(LogLevel::Debug),
        "info" => Ok(LogLevel::Info),
        "warn" => Ok(LogLevel::Warn),
        "error" => Ok(LogLevel::Error),
        "trace" => Ok(LogLevel::Trace),
        _ => Err(serde::de::Error::custom(
            "expected one of DEBUG, INFO, WARN, ERROR, TRACE",
        )),
    }
}

/// Deserialize function to convert a string to a `LogFormat` Enum
fn log_format_deser<'de, D>(deserializer: D) -> Result<LogFormat, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.to_lowercase().as_str() {
        "json" => Ok(LogFormat::Json),
        "pretty" => Ok(LogFormat::Pretty),
        _ => Err(serde::de::Error::custom("expected one of: json, pretty")),
    }
}
