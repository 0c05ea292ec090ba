//! Names that are themselves a public suffix.
//!
//! A Subject CN or DNS subjectAltName equal to its own public suffix
//! (`com`, `co.uk`), or to the wildcard one label below it (`*.github.io`),
//! is a registry suffix rather than an identity and must never be issued.

use crate::fields::CertificateData;
use crate::lint::{CheckResult, Diagnostics, Filter, Registry};

pub const CHECK_NAME: &str = "Public Suffix (xTLD) Check";

pub fn register(registry: &Registry) {
    registry.register_certificate_check(CHECK_NAME, Some(Filter::server_validated()), check);
}

pub fn check(cert: &CertificateData) -> CheckResult {
    let mut d = Diagnostics::new();

    if let Some(cn) = cert.common_name().filter(|cn| !cn.is_empty()) {
        if let Some(suffix) = matched_suffix(cn) {
            d.error(format!(
                "Certificate CommonName {:?} equals {:?} from the public suffix list",
                cn, suffix
            ));
        }
    }

    for name in cert.dns_names() {
        if let Some(suffix) = matched_suffix(name) {
            d.error(format!(
                "Certificate subjectAltName {:?} equals {:?} from the public suffix list",
                name, suffix
            ));
        }
    }

    Ok(d)
}

/// The public suffix of `name` when `name` is that suffix or its wildcard.
pub fn matched_suffix(name: &str) -> Option<String> {
    let lower = name.to_ascii_lowercase();
    let suffix = psl::suffix_str(&lower)?;
    let is_bare = lower == suffix;
    let is_wildcard = lower.strip_prefix("*.").is_some_and(|rest| rest == suffix);
    (is_bare || is_wildcard).then(|| suffix.to_string())
}
