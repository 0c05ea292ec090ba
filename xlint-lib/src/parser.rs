//! Certificate parsing from PEM and DER formats into [`CertificateData`].

use crate::fields::{
    AiaEntry, CertType, CertificateData, DateTime, DistinguishedName, Extension, ExtensionValue,
    KeyUsageBit, SanEntry,
};
use crate::oid::{self, Oid};
use crate::util;
use crate::XlintError;
use x509_parser::pem::Pem;
use x509_parser::prelude::*;

/// Parse a certificate from PEM or DER (auto-detected).
///
/// If the input begins with `-----BEGIN` (after stripping whitespace), it is
/// treated as PEM. Otherwise it is treated as DER.
pub fn parse_cert(input: &[u8]) -> Result<CertificateData, XlintError> {
    if input.is_empty() {
        return Err(XlintError::ParseError("empty input".into()));
    }

    if util::is_pem(input) {
        parse_pem(input)
    } else {
        parse_der(input)
    }
}

/// Parse a certificate from PEM format.
pub fn parse_pem(input: &[u8]) -> Result<CertificateData, XlintError> {
    let (_, pem) = x509_parser::pem::parse_x509_pem(input)
        .map_err(|e| XlintError::PemError(format!("{}", e)))?;

    if !is_certificate_label(&pem.label) {
        return Err(XlintError::PemError(format!(
            "expected CERTIFICATE, got {}",
            pem.label
        )));
    }

    parse_der(&pem.contents)
}

/// PEM labels that carry a DER certificate.
const CERTIFICATE_LABELS: [&str; 3] = ["CERTIFICATE", "TRUSTED CERTIFICATE", "X509 CERTIFICATE"];

fn is_certificate_label(label: &str) -> bool {
    CERTIFICATE_LABELS.contains(&label)
}

/// Parse every certificate in a PEM bundle, in file order.
pub fn parse_pem_bundle(input: &[u8]) -> Result<Vec<CertificateData>, XlintError> {
    let mut certs = Vec::new();

    for pem_result in Pem::iter_from_buffer(input) {
        match pem_result {
            Ok(pem) => {
                if is_certificate_label(&pem.label) {
                    certs.push(parse_der(&pem.contents)?);
                }
            }
            Err(e) => {
                // If we already have some certs, stop at first error (trailing garbage)
                if !certs.is_empty() {
                    break;
                }
                return Err(XlintError::PemError(format!("failed to parse PEM: {}", e)));
            }
        }
    }

    if certs.is_empty() {
        return Err(XlintError::PemError(
            "no certificates found in PEM input".into(),
        ));
    }
    Ok(certs)
}

/// Parse a certificate from DER format.
pub fn parse_der(input: &[u8]) -> Result<CertificateData, XlintError> {
    let (remaining, x509) =
        X509Certificate::from_der(input).map_err(|e| XlintError::DerError(format!("{}", e)))?;

    // Use only the actual certificate bytes, not any trailing data,
    // so that fingerprints are computed over the correct content.
    let cert_len = input.len() - remaining.len();
    let cert_der = input.get(..cert_len).unwrap_or(input);
    build_certificate_data(&x509, cert_der)
}

fn build_certificate_data(
    x509: &X509Certificate,
    raw_der: &[u8],
) -> Result<CertificateData, XlintError> {
    let tbs = &x509.tbs_certificate;

    let raw_version = tbs.version.0;
    if raw_version > 2 {
        return Err(XlintError::ParseError(format!(
            "unsupported X.509 version {} (expected v1, v2, or v3)",
            raw_version + 1
        )));
    }

    let extensions: Vec<Extension> = tbs.extensions().iter().map(build_extension).collect();
    let cert_type = classify(&extensions);

    Ok(CertificateData {
        version: raw_version + 1,
        serial: format_serial(tbs.raw_serial()),
        cert_type,
        issuer: build_dn(&tbs.issuer),
        subject: build_dn(&tbs.subject),
        not_before: build_datetime(&tbs.validity.not_before),
        not_after: build_datetime(&tbs.validity.not_after),
        extensions,
        raw_der: raw_der.to_vec(),
    })
}

/// Derive the certificate type.
///
/// CA certificates are recognized by BasicConstraints. Otherwise the first
/// CA/Browser Forum reserved policy OID decides, then the Extended Key Usage.
fn classify(extensions: &[Extension]) -> CertType {
    let mut policies: &[Oid] = &[];
    let mut ekus: &[Oid] = &[];
    for ext in extensions {
        match &ext.value {
            ExtensionValue::BasicConstraints { ca: true, .. } => return CertType::Ca,
            ExtensionValue::CertificatePolicies(p) => policies = p.as_slice(),
            ExtensionValue::ExtendedKeyUsage(e) => ekus = e.as_slice(),
            _ => {}
        }
    }

    let by_policy = policies.iter().find_map(|policy| {
        if *policy == oid::POLICY_EV {
            Some(CertType::Ev)
        } else if *policy == oid::POLICY_DV {
            Some(CertType::Dv)
        } else if *policy == oid::POLICY_OV {
            Some(CertType::Ov)
        } else if *policy == oid::POLICY_IV {
            Some(CertType::Iv)
        } else {
            None
        }
    });
    if let Some(cert_type) = by_policy {
        return cert_type;
    }

    let by_eku = [
        (oid::EKU_OCSP_SIGNING, CertType::Ocsp),
        (oid::EKU_TIME_STAMPING, CertType::Ts),
        (oid::EKU_CODE_SIGNING, CertType::Cs),
        (oid::EKU_EMAIL_PROTECTION, CertType::Ps),
    ];
    by_eku
        .into_iter()
        .find(|(eku, _)| ekus.contains(eku))
        .map_or(CertType::Unknown, |(_, cert_type)| cert_type)
}

/// Format a serial number as a colon-separated uppercase hex string,
/// stripping leading zero bytes but keeping at least one byte.
fn format_serial(raw: &[u8]) -> String {
    let stripped = match raw.iter().position(|&b| b != 0) {
        Some(pos) => raw.get(pos..).unwrap_or(raw),
        None => raw.get(raw.len().saturating_sub(1)..).unwrap_or(raw),
    };
    util::hex_colon_upper(stripped)
}

fn build_dn(name: &X509Name) -> DistinguishedName {
    let mut components = Vec::new();
    for rdn in name.iter() {
        for attr in rdn.iter() {
            let attr_oid = Oid::from(attr.attr_type());
            let key = oid::lookup(oid::DN_SHORT_NAMES, &attr_oid)
                .map(str::to_string)
                .unwrap_or_else(|| attr_oid.to_string());
            let value = attr.as_str().unwrap_or("<binary>").to_string();
            components.push((key, value));
        }
    }
    DistinguishedName { components }
}

fn build_datetime(asn1_time: &ASN1Time) -> DateTime {
    let ts = asn1_time.timestamp();
    let iso = match ::time::OffsetDateTime::from_unix_timestamp(ts) {
        Ok(dt) => format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            dt.year(),
            u8::from(dt.month()),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second()
        ),
        Err(_) => format!("{}", ts),
    };
    DateTime {
        iso8601: iso,
        timestamp: ts,
    }
}

fn build_extension(ext: &X509Extension) -> Extension {
    let oid = Oid::from(&ext.oid);
    let value = match ext.parsed_extension() {
        ParsedExtension::BasicConstraints(bc) => ExtensionValue::BasicConstraints {
            ca: bc.ca,
            path_len: bc.path_len_constraint,
        },
        ParsedExtension::KeyUsage(ku) => ExtensionValue::KeyUsage(key_usage_bits(ku)),
        ParsedExtension::ExtendedKeyUsage(eku) => {
            let mut usages = Vec::new();
            let flags = [
                (eku.any, oid::EKU_ANY),
                (eku.server_auth, oid::EKU_SERVER_AUTH),
                (eku.client_auth, oid::EKU_CLIENT_AUTH),
                (eku.code_signing, oid::EKU_CODE_SIGNING),
                (eku.email_protection, oid::EKU_EMAIL_PROTECTION),
                (eku.time_stamping, oid::EKU_TIME_STAMPING),
                (eku.ocsp_signing, oid::EKU_OCSP_SIGNING),
            ];
            for (set, usage) in flags {
                if set {
                    usages.push(usage);
                }
            }
            usages.extend(eku.other.iter().map(Oid::from));
            ExtensionValue::ExtendedKeyUsage(usages)
        }
        ParsedExtension::SubjectAlternativeName(san) => ExtensionValue::SubjectAltName(
            san.general_names
                .iter()
                .map(general_name_to_san_entry)
                .collect(),
        ),
        ParsedExtension::SubjectKeyIdentifier(ski) => {
            ExtensionValue::SubjectKeyIdentifier(util::hex_colon_upper(ski.0))
        }
        ParsedExtension::AuthorityKeyIdentifier(aki) => {
            let key_id = aki
                .key_identifier
                .as_ref()
                .map(|ki| util::hex_colon_upper(ki.0));
            let issuer = aki.authority_cert_issuer.as_ref().map(|names| {
                names
                    .iter()
                    .map(format_general_name)
                    .collect::<Vec<_>>()
                    .join(", ")
            });
            ExtensionValue::AuthorityKeyIdentifier { key_id, issuer }
        }
        ParsedExtension::AuthorityInfoAccess(aia) => ExtensionValue::AuthorityInfoAccess(
            aia.accessdescs
                .iter()
                .map(|desc| {
                    let method = match Oid::from(&desc.access_method) {
                        m if m == ACCESS_OCSP => "OCSP".to_string(),
                        m if m == ACCESS_CA_ISSUERS => "CA Issuers".to_string(),
                        m => m.to_string(),
                    };
                    AiaEntry {
                        method,
                        location: format_general_name(&desc.access_location),
                    }
                })
                .collect(),
        ),
        ParsedExtension::CRLDistributionPoints(cdp) => {
            let mut uris = Vec::new();
            for point in &cdp.points {
                if let Some(x509_parser::extensions::DistributionPointName::FullName(names)) =
                    &point.distribution_point
                {
                    for gn in names {
                        if let GeneralName::URI(uri) = gn {
                            uris.push(uri.to_string());
                        }
                    }
                }
            }
            ExtensionValue::CrlDistributionPoints(uris)
        }
        ParsedExtension::CertificatePolicies(policies) => ExtensionValue::CertificatePolicies(
            policies.iter().map(|p| Oid::from(&p.policy_id)).collect(),
        ),
        ParsedExtension::NameConstraints(nc) => ExtensionValue::NameConstraints {
            permitted: nc.permitted_subtrees.as_ref().map_or(0, Vec::len),
            excluded: nc.excluded_subtrees.as_ref().map_or(0, Vec::len),
        },
        ParsedExtension::ParseError { error } => ExtensionValue::Malformed(format!("{}", error)),
        _ => ExtensionValue::Raw(hex::encode(ext.value)),
    };

    Extension {
        value,
        ..Extension::raw(oid, ext.critical, ext.value.to_vec())
    }
}

const ACCESS_OCSP: Oid = Oid::from_static("1.3.6.1.5.5.7.48.1");
const ACCESS_CA_ISSUERS: Oid = Oid::from_static("1.3.6.1.5.5.7.48.2");

fn key_usage_bits(ku: &KeyUsage) -> Vec<KeyUsageBit> {
    let flags = [
        (ku.digital_signature(), KeyUsageBit::DigitalSignature),
        (ku.non_repudiation(), KeyUsageBit::NonRepudiation),
        (ku.key_encipherment(), KeyUsageBit::KeyEncipherment),
        (ku.data_encipherment(), KeyUsageBit::DataEncipherment),
        (ku.key_agreement(), KeyUsageBit::KeyAgreement),
        (ku.key_cert_sign(), KeyUsageBit::KeyCertSign),
        (ku.crl_sign(), KeyUsageBit::CrlSign),
        (ku.encipher_only(), KeyUsageBit::EncipherOnly),
        (ku.decipher_only(), KeyUsageBit::DecipherOnly),
    ];
    flags
        .into_iter()
        .filter_map(|(set, bit)| set.then_some(bit))
        .collect()
}

fn general_name_to_san_entry(gn: &GeneralName) -> SanEntry {
    match gn {
        GeneralName::DNSName(name) => SanEntry::Dns(name.to_string()),
        GeneralName::RFC822Name(email) => SanEntry::Email(email.to_string()),
        GeneralName::IPAddress(ip_bytes) => SanEntry::Ip(util::format_ip_bytes(ip_bytes)),
        GeneralName::URI(uri) => SanEntry::Uri(uri.to_string()),
        GeneralName::DirectoryName(dn) => SanEntry::DirName(build_dn(dn).to_oneline()),
        other => SanEntry::Other(format!("{:?}", other)),
    }
}

fn format_general_name(gn: &GeneralName) -> String {
    match general_name_to_san_entry(gn) {
        SanEntry::Dns(v)
        | SanEntry::Email(v)
        | SanEntry::Ip(v)
        | SanEntry::Uri(v)
        | SanEntry::DirName(v)
        | SanEntry::Other(v) => v,
    }
}
