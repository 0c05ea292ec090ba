//! Lint report for one certificate, as text or JSON.

use crate::fields::{CertType, CertificateData};
use crate::lint::{Diagnostics, Severity};
use crate::XlintError;
use serde::Serialize;
use std::fmt;

/// Findings for one certificate, together with what identifies it.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Where the certificate was read from, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub subject: String,
    pub serial: String,
    pub cert_type: CertType,
    /// SHA-256 fingerprint.
    pub fingerprint: String,
    pub findings: Diagnostics,
}

impl Report {
    pub fn new(cert: &CertificateData, findings: Diagnostics) -> Self {
        Report {
            source: None,
            subject: cert.subject_string(),
            serial: cert.serial.clone(),
            cert_type: cert.cert_type,
            fingerprint: cert.fingerprint(),
            findings,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Drop findings below `min`.
    pub fn retain_at_least(&mut self, min: Severity) {
        self.findings = self.findings.at_least(min);
    }

    pub fn has_errors(&self) -> bool {
        self.findings.has_errors()
    }

    /// Human-readable rendering, one finding per line.
    pub fn display_text(&self) -> String {
        let mut out = String::new();

        if let Some(source) = &self.source {
            out.push_str(&format!("{}:\n", source));
        }
        out.push_str(&format!("  Subject: {}\n", self.subject));
        out.push_str(&format!("  Serial: {}\n", self.serial));
        out.push_str(&format!("  Type: {}\n", self.cert_type));
        out.push_str(&format!("  Fingerprint (SHA-256): {}\n", self.fingerprint));

        if self.findings.is_empty() {
            out.push_str("  No findings\n");
        } else {
            out.push_str(&format!("  Findings ({}):\n", self.findings.len()));
            for finding in &self.findings {
                out.push_str(&format!("    {}\n", finding));
            }
        }

        out
    }

    pub fn to_json(&self) -> Result<String, XlintError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}
