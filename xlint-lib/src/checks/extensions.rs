//! Per-extension checks, registered under the extension OID they inspect.
//!
//! A check that cannot decode its extension returns
//! [`XlintError::Malformed`]; the engine reports that as a failed check.

use crate::fields::{CertificateData, Extension, ExtensionValue, KeyUsageBit, SanEntry};
use crate::lint::{CheckResult, Diagnostics, Filter, Registry};
use crate::oid;
use crate::XlintError;

pub fn register(registry: &Registry) {
    registry.register_extension_check(
        "Basic Constraints Check",
        oid::EXT_BASIC_CONSTRAINTS,
        None,
        basic_constraints,
    );
    registry.register_extension_check("Key Usage Check", oid::EXT_KEY_USAGE, None, key_usage);
    registry.register_extension_check(
        "Extended Key Usage Check",
        oid::EXT_EXTENDED_KEY_USAGE,
        Some(Filter::server_validated()),
        extended_key_usage,
    );
    registry.register_extension_check(
        "Subject Alternative Name Check",
        oid::EXT_SUBJECT_ALT_NAME,
        None,
        subject_alt_name,
    );
    registry.register_extension_check(
        "Subject Alternative Name BR Check",
        oid::EXT_SUBJECT_ALT_NAME,
        Some(Filter::server_validated()),
        subject_alt_name_br,
    );
    registry.register_extension_check(
        "Authority Key Identifier Check",
        oid::EXT_AUTHORITY_KEY_ID,
        None,
        authority_key_id,
    );
    registry.register_extension_check(
        "Subject Key Identifier Check",
        oid::EXT_SUBJECT_KEY_ID,
        None,
        subject_key_id,
    );
    registry.register_extension_check(
        "Name Constraints Check",
        oid::EXT_NAME_CONSTRAINTS,
        None,
        name_constraints,
    );
    registry.register_extension_check(
        "Certificate Policies Check",
        oid::EXT_CERTIFICATE_POLICIES,
        None,
        certificate_policies,
    );
    registry.register_extension_check(
        "CRL Distribution Points Check",
        oid::EXT_CRL_DISTRIBUTION_POINTS,
        None,
        crl_distribution_points,
    );
    registry.register_extension_check(
        "Authority Information Access Check",
        oid::EXT_AUTHORITY_INFO_ACCESS,
        None,
        authority_info_access,
    );
    registry.register_extension_check(
        "CT Precertificate Poison Check",
        oid::EXT_CT_POISON,
        None,
        ct_poison,
    );
    registry.register_extension_check("CT SCT List Check", oid::EXT_SCT_LIST, None, sct_list);
}

fn undecodable(ext: &Extension) -> XlintError {
    let reason = match &ext.value {
        ExtensionValue::Malformed(reason) => reason.as_str(),
        _ => "unexpected extension value",
    };
    XlintError::Malformed(format!("{} ({}): {}", ext.name, ext.oid, reason))
}

/// Checks that only look at criticality still refuse undecodable payloads.
fn ensure_decoded(ext: &Extension) -> Result<(), XlintError> {
    match ext.value {
        ExtensionValue::Malformed(_) => Err(undecodable(ext)),
        _ => Ok(()),
    }
}

/// RFC 5280 4.2.1.9: basicConstraints MUST be critical on CA certificates.
pub fn basic_constraints(ext: &Extension, _cert: &CertificateData) -> CheckResult {
    let ExtensionValue::BasicConstraints { ca, .. } = ext.value else {
        return Err(undecodable(ext));
    };
    let mut d = Diagnostics::new();
    if ca && !ext.critical {
        d.error("BasicConstraints extension is not marked critical on a CA certificate");
    }
    Ok(d)
}

/// RFC 5280 4.2.1.3.
pub fn key_usage(ext: &Extension, cert: &CertificateData) -> CheckResult {
    let ExtensionValue::KeyUsage(bits) = &ext.value else {
        return Err(undecodable(ext));
    };
    let mut d = Diagnostics::new();
    if !ext.critical {
        d.warning("KeyUsage extension should be marked critical");
    }
    if bits.is_empty() {
        d.error("KeyUsage extension asserts no key usage");
    }
    if cert.is_ca() && !bits.contains(&KeyUsageBit::KeyCertSign) {
        d.error("CA certificate KeyUsage does not assert keyCertSign");
    }
    Ok(d)
}

/// BR 7.1.2.3(f): no anyExtendedKeyUsage, and the extension is not critical.
pub fn extended_key_usage(ext: &Extension, _cert: &CertificateData) -> CheckResult {
    let ExtensionValue::ExtendedKeyUsage(usages) = &ext.value else {
        return Err(undecodable(ext));
    };
    let mut d = Diagnostics::new();
    if usages.contains(&oid::EKU_ANY) {
        d.error("Certificate asserts anyExtendedKeyUsage");
    }
    if ext.critical {
        d.error("ExtendedKeyUsage extension is marked critical");
    }
    Ok(d)
}

/// RFC 5280 4.2.1.6: the extension holds at least one well-formed name.
pub fn subject_alt_name(ext: &Extension, _cert: &CertificateData) -> CheckResult {
    let ExtensionValue::SubjectAltName(entries) = &ext.value else {
        return Err(undecodable(ext));
    };
    let mut d = Diagnostics::new();
    if entries.is_empty() {
        d.error("subjectAltName extension is empty");
    }
    for entry in entries {
        if let SanEntry::Dns(name) = entry {
            if name.is_empty() {
                d.error("subjectAltName contains an empty DNS name");
            } else if name.contains(' ') {
                d.error(format!("subjectAltName DNS name {:?} contains a space", name));
            }
        }
    }
    Ok(d)
}

/// BR 7.1.2.7.12: only dNSName and iPAddress entries; not critical unless
/// the subject is empty.
pub fn subject_alt_name_br(ext: &Extension, cert: &CertificateData) -> CheckResult {
    let ExtensionValue::SubjectAltName(entries) = &ext.value else {
        return Err(undecodable(ext));
    };
    let mut d = Diagnostics::new();
    for entry in entries {
        let kind = match entry {
            SanEntry::Dns(_) | SanEntry::Ip(_) => continue,
            SanEntry::Email(_) => "rfc822Name",
            SanEntry::Uri(_) => "uniformResourceIdentifier",
            SanEntry::DirName(_) => "directoryName",
            SanEntry::Other(_) => "otherName",
        };
        d.error(format!(
            "subjectAltName contains a {} entry, only dNSName and iPAddress are allowed",
            kind
        ));
    }
    if ext.critical && !cert.subject.is_empty() {
        d.error("subjectAltName extension is critical while the subject is not empty");
    }
    Ok(d)
}

/// RFC 5280 4.2.1.1: AKI MUST NOT be critical.
pub fn authority_key_id(ext: &Extension, _cert: &CertificateData) -> CheckResult {
    if !matches!(ext.value, ExtensionValue::AuthorityKeyIdentifier { .. }) {
        return Err(undecodable(ext));
    }
    let mut d = Diagnostics::new();
    if ext.critical {
        d.error("AuthorityKeyIdentifier extension is marked critical");
    }
    Ok(d)
}

/// RFC 5280 4.2.1.2: SKI MUST NOT be critical.
pub fn subject_key_id(ext: &Extension, _cert: &CertificateData) -> CheckResult {
    if !matches!(ext.value, ExtensionValue::SubjectKeyIdentifier(_)) {
        return Err(undecodable(ext));
    }
    let mut d = Diagnostics::new();
    if ext.critical {
        d.error("SubjectKeyIdentifier extension is marked critical");
    }
    Ok(d)
}

/// RFC 5280 4.2.1.10: only in CA certificates, and always critical.
pub fn name_constraints(ext: &Extension, cert: &CertificateData) -> CheckResult {
    let ExtensionValue::NameConstraints {
        permitted,
        excluded,
    } = ext.value
    else {
        return Err(undecodable(ext));
    };
    let mut d = Diagnostics::new();
    if !cert.is_ca() {
        d.error("NameConstraints extension on a non-CA certificate");
    } else if !ext.critical {
        d.error("NameConstraints extension is not marked critical");
    }
    if permitted == 0 && excluded == 0 {
        d.error("NameConstraints extension has no permitted or excluded subtrees");
    }
    Ok(d)
}

pub fn certificate_policies(ext: &Extension, _cert: &CertificateData) -> CheckResult {
    let ExtensionValue::CertificatePolicies(policies) = &ext.value else {
        return Err(undecodable(ext));
    };
    let mut d = Diagnostics::new();
    if policies.is_empty() {
        d.error("certificatePolicies extension contains no policy");
    }
    Ok(d)
}

/// RFC 5280 4.2.1.13: SHOULD be non-critical.
pub fn crl_distribution_points(ext: &Extension, _cert: &CertificateData) -> CheckResult {
    if !matches!(ext.value, ExtensionValue::CrlDistributionPoints(_)) {
        return Err(undecodable(ext));
    }
    let mut d = Diagnostics::new();
    if ext.critical {
        d.warning("CRLDistributionPoints extension should not be marked critical");
    }
    Ok(d)
}

/// RFC 5280 4.2.2.1: MUST be non-critical.
pub fn authority_info_access(ext: &Extension, _cert: &CertificateData) -> CheckResult {
    let ExtensionValue::AuthorityInfoAccess(entries) = &ext.value else {
        return Err(undecodable(ext));
    };
    let mut d = Diagnostics::new();
    if ext.critical {
        d.error("AuthorityInfoAccess extension is marked critical");
    }
    if entries.is_empty() {
        d.error("AuthorityInfoAccess extension contains no access description");
    }
    Ok(d)
}

/// RFC 6962 3.1: the poison extension MUST be critical.
pub fn ct_poison(ext: &Extension, _cert: &CertificateData) -> CheckResult {
    ensure_decoded(ext)?;
    let mut d = Diagnostics::new();
    if !ext.critical {
        d.error("CT precertificate poison extension is not marked critical");
    }
    Ok(d)
}

pub fn sct_list(ext: &Extension, _cert: &CertificateData) -> CheckResult {
    ensure_decoded(ext)?;
    let mut d = Diagnostics::new();
    if ext.critical {
        d.error("CT SCT list extension is marked critical");
    }
    Ok(d)
}
