use openssl::error::ErrorStack;

/// Errors raised while loading, binding or installing TLS material
#[derive(Debug, thiserror::Error)]
pub enum TlsSecretError {
    #[error("malformed base64 in PEM body: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("certificate chain contains no certificates")]
    EmptyChain,

    #[error("PEM body is not a DER certificate: {0}")]
    InvalidCertificate(#[source] ErrorStack),

    #[error("invalid private key format: {0}")]
    InvalidKeyFormat(String),

    #[error("unsupported public key algorithm: {0}")]
    UnsupportedKeyAlgorithm(String),

    #[error("private key algorithm {key} does not match certificate algorithm {certificate}")]
    KeyAlgorithmMismatch {
        certificate: String,
        key: String,
    },

    #[error("private key does not belong to certificate {subject}")]
    KeyCertificateMismatch { subject: String },

    #[error("trust store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Exporting or fingerprinting an already decoded certificate or key failed
    #[error("openssl error: {0}")]
    Openssl(#[from] ErrorStack),
}

pub type Result<T, E = TlsSecretError> = std::result::Result<T, E>;
