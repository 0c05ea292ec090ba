//! Whole-certificate structure checks (RFC 5280 and CA/B Forum BR).

use crate::fields::{CertificateData, SanEntry};
use crate::lint::{CheckResult, Diagnostics, Filter, Registry};
use crate::oid;
use std::collections::HashSet;

pub fn register(registry: &Registry) {
    registry.register_certificate_check(
        "Certificate Version Check",
        Some(Filter::server_validated()),
        version,
    );
    registry.register_certificate_check("Duplicate Extension Check", None, duplicate_extensions);
    registry.register_certificate_check(
        "Subject Alternative Name Presence Check",
        Some(Filter::server_validated()),
        san_presence,
    );
}

/// BR 7.1.1: subscriber certificates are X.509 v3.
pub fn version(cert: &CertificateData) -> CheckResult {
    let mut d = Diagnostics::new();
    if cert.version != 3 {
        d.error(format!(
            "Certificate is version {} (v3 required)",
            cert.version
        ));
    }
    Ok(d)
}

/// RFC 5280 Section 4.2: a certificate MUST NOT include more than one
/// instance of a particular extension.
pub fn duplicate_extensions(cert: &CertificateData) -> CheckResult {
    let mut d = Diagnostics::new();
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for ext in &cert.extensions {
        if !seen.insert(&ext.oid) && reported.insert(&ext.oid) {
            d.error(format!(
                "Certificate contains duplicate extension ({})",
                ext.oid
            ));
        }
    }
    Ok(d)
}

/// BR 7.1.2.3: server certificates carry a subjectAltName, and a Subject
/// CN, when present, repeats one of its entries.
pub fn san_presence(cert: &CertificateData) -> CheckResult {
    let mut d = Diagnostics::new();
    if cert.extension(&oid::EXT_SUBJECT_ALT_NAME).is_none() {
        d.error("Certificate does not contain a subjectAltName extension");
        return Ok(d);
    }

    if let Some(cn) = cert.common_name().filter(|cn| !cn.is_empty()) {
        let listed = cert.san_entries().into_iter().any(|entry| match entry {
            SanEntry::Dns(name) => name.eq_ignore_ascii_case(cn),
            SanEntry::Ip(ip) => ip == cn,
            _ => false,
        });
        if !listed {
            d.error(format!(
                "Certificate CommonName {:?} is not present in subjectAltName",
                cn
            ));
        }
    }
    Ok(d)
}
