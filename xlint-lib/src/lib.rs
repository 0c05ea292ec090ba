//! xlint-lib: Pluggable linting engine for X.509 certificates.
//!
//! Checks register against two extension points, whole-certificate checks
//! and per-extension checks keyed by object identifier, on a [`Registry`].
//! Once registration is finished the registry is frozen into an [`Engine`]
//! that runs every applicable check against a parsed [`CertificateData`] and
//! merges the findings into one ordered [`Diagnostics`] value.
//!
//! ```no_run
//! use xlint_lib::{parse_cert, Engine};
//!
//! let pem = std::fs::read("cert.pem")?;
//! let cert = parse_cert(&pem)?;
//! let diagnostics = Engine::builtin().lint(&cert);
//! for finding in &diagnostics {
//!     println!("{}", finding);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod checks;
mod fields;
mod fingerprint;
pub mod lint;
pub mod oid;
mod parser;
mod report;
mod util;

pub use fields::{
    AiaEntry, CertType, CertificateData, DateTime, DistinguishedName, Extension, ExtensionValue,
    KeyUsageBit, SanEntry,
};
pub use fingerprint::compute_fingerprint;
pub use lint::{
    CertificateCheck, CertificateChecks, CheckResult, Diagnostics, Engine, ExtensionCheck,
    ExtensionChecks, Filter, Finding, LintOptions, Registry, Severity,
};
pub use oid::Oid;
pub use parser::{parse_cert, parse_der, parse_pem, parse_pem_bundle};
pub use report::Report;
pub use util::is_pem;

/// Errors returned by xlint-lib.
#[derive(Debug, thiserror::Error)]
pub enum XlintError {
    #[error("Failed to parse certificate: {0}")]
    ParseError(String),

    #[error("Invalid PEM format: {0}")]
    PemError(String),

    #[error("Invalid DER format: {0}")]
    DerError(String),

    #[error("Invalid object identifier: {0}")]
    InvalidOid(String),

    /// A check could not evaluate its input, e.g. an undecodable extension.
    #[error("Malformed input: {0}")]
    Malformed(String),

    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
