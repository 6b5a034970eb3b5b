//! Certificate fixtures generated at test time.

use std::sync::OnceLock;

use base64::{engine::general_purpose::STANDARD, Engine};
use openssl::{
    asn1::Asn1Time,
    bn::BigNum,
    ec::{EcGroup, EcKey},
    hash::MessageDigest,
    nid::Nid,
    pkey::{PKey, Private},
    rsa::Rsa,
    x509::{extension::BasicConstraints, X509Builder, X509NameBuilder, X509},
};

pub(crate) struct TestChain {
    pub root: X509,
    pub intermediate: X509,
    pub leaf: X509,
    pub leaf_key: PKey<Private>,
}

impl TestChain {
    /// Leaf followed by intermediate, the layout of a `tls.crt` secret entry
    pub fn tls_crt(&self) -> String {
        [&self.leaf, &self.intermediate]
            .iter()
            .map(|cert| encode_pem(&cert.to_der().unwrap()))
            .collect()
    }

    pub fn ca_crt(&self) -> String {
        encode_pem(&self.root.to_der().unwrap())
    }

    /// `BEGIN PRIVATE KEY`
    pub fn pkcs8_key(&self) -> String {
        String::from_utf8(self.leaf_key.private_key_to_pem_pkcs8().unwrap()).unwrap()
    }

    /// `BEGIN RSA PRIVATE KEY` or `BEGIN EC PRIVATE KEY`
    pub fn native_key(&self) -> String {
        let pem = match self.leaf_key.id() {
            openssl::pkey::Id::RSA => self.leaf_key.rsa().unwrap().private_key_to_pem().unwrap(),
            _ => self.leaf_key.ec_key().unwrap().private_key_to_pem().unwrap(),
        };
        String::from_utf8(pem).unwrap()
    }
}

pub(crate) fn rsa_chain() -> &'static TestChain {
    static CHAIN: OnceLock<TestChain> = OnceLock::new();
    CHAIN.get_or_init(|| build_chain(rsa_key))
}

pub(crate) fn ec_chain() -> &'static TestChain {
    static CHAIN: OnceLock<TestChain> = OnceLock::new();
    CHAIN.get_or_init(|| build_chain(ec_key))
}

/// A self-signed Ed25519 certificate, whose algorithm cannot carry a bound key
pub(crate) fn ed25519_certificate() -> (X509, PKey<Private>) {
    let key = PKey::generate_ed25519().unwrap();
    let cert = build_certificate("ed25519.example.com", None, &key, &key, false, 9);
    (cert, key)
}

pub(crate) fn rsa_key() -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap()
}

pub(crate) fn ec_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

fn build_chain(generate: fn() -> PKey<Private>) -> TestChain {
    let root_key = generate();
    let intermediate_key = generate();
    let leaf_key = generate();

    let root = build_certificate("Root CA", None, &root_key, &root_key, true, 1);
    let intermediate = build_certificate(
        "Intermediate CA",
        Some(&root),
        &intermediate_key,
        &root_key,
        true,
        2,
    );
    let leaf = build_certificate(
        "leaf.example.com",
        Some(&intermediate),
        &leaf_key,
        &intermediate_key,
        false,
        3,
    );

    TestChain {
        root,
        intermediate,
        leaf,
        leaf_key,
    }
}

fn build_certificate(
    common_name: &str,
    issuer: Option<&X509>,
    key: &PKey<Private>,
    signing_key: &PKey<Private>,
    ca: bool,
    serial: u32,
) -> X509 {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", common_name).unwrap();
    name.append_entry_by_text("O", "TLS Secret").unwrap();
    let name = name.build();

    let digest = if key.id() == openssl::pkey::Id::ED25519 {
        MessageDigest::null()
    } else {
        MessageDigest::sha256()
    };

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(serial).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    match issuer {
        Some(issuer) => builder.set_issuer_name(issuer.subject_name()).unwrap(),
        None => builder.set_issuer_name(&name).unwrap(),
    }
    builder.set_pubkey(key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();
    if ca {
        builder
            .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
    }
    builder.sign(signing_key, digest).unwrap();
    builder.build()
}

/// Wraps DER bytes in a `CERTIFICATE` PEM block with 64 column lines
pub(crate) fn encode_pem(der: &[u8]) -> String {
    let body = STANDARD.encode(der);
    let mut pem = String::from("-----BEGIN CERTIFICATE-----\n");
    for line in body.as_bytes().chunks(64) {
        pem.push_str(std::str::from_utf8(line).unwrap());
        pem.push('\n');
    }
    pem.push_str("-----END CERTIFICATE-----\n");
    pem
}

/// Rewrites the `rsaEncryption` OID of the subject public key into an
/// unregistered arc (`1.2.840.113549.1.1.99`). The signature still parses.
pub(crate) fn with_unknown_key_oid(der: &[u8]) -> Vec<u8> {
    const RSA_ENCRYPTION: [u8; 11] = [
        0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01,
    ];

    let position = der
        .windows(RSA_ENCRYPTION.len())
        .rposition(|window| window == RSA_ENCRYPTION)
        .expect("certificate has an rsaEncryption public key");

    let mut patched = der.to_vec();
    patched[position + RSA_ENCRYPTION.len() - 1] = 0x63;
    patched
}
