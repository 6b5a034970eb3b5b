//! Tolerant PEM tokenizer.
//!
//! Secrets produced by Kubernetes concatenate PEM blocks without any guarantee
//! about separators, so instead of a strict line-based parser the input is
//! split on the `-` delimiter that surrounds every header and footer. What is
//! left is an alternating sequence of labels and base64 bodies, plus any
//! whitespace found between blocks.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::Result;

pub(crate) const CERTIFICATE_LABEL: &str = "BEGIN CERTIFICATE";
pub(crate) const PRIVATE_KEY_LABEL: &str = "BEGIN PRIVATE KEY";
pub(crate) const RSA_PRIVATE_KEY_LABEL: &str = "BEGIN RSA PRIVATE KEY";
pub(crate) const EC_PRIVATE_KEY_LABEL: &str = "BEGIN EC PRIVATE KEY";

/// Splits a PEM string on the `-` delimiter, dropping empty fragments
pub(crate) fn tokens(pem: &str) -> impl Iterator<Item = &str> {
    pem.split('-').filter(|token| !token.is_empty())
}

/// Decodes a base64 body, ignoring line breaks and any other whitespace
pub(crate) fn decode_body(body: &str) -> Result<Vec<u8>> {
    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

/// Returns the DER bytes of every `CERTIFICATE` block in `pem`, in input order.
///
/// Only `BEGIN CERTIFICATE` labels anchor a block; footers, whitespace and any
/// other labels are skipped. Input without certificates yields an empty list.
pub fn parse_certificates(pem: &str) -> Result<Vec<Vec<u8>>> {
    let mut certificates = Vec::new();
    let mut tokens = tokens(pem);

    while let Some(token) = tokens.next() {
        if token != CERTIFICATE_LABEL {
            continue;
        }

        let Some(body) = tokens.next() else {
            break;
        };

        certificates.push(decode_body(body)?);
    }

    tracing::debug!(count = certificates.len(), "parsed PEM certificate blocks");
    Ok(certificates)
}
