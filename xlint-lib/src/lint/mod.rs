//! Check registration and dispatch.
//!
//! Linting happens in two phases:
//!
//! 1. **Registration.** Check modules receive a shared `&Registry` and call
//!    [`Registry::register_certificate_check`] or
//!    [`Registry::register_extension_check`]. Each call appends under the
//!    registry's lock, so modules may register from several threads at once
//!    without losing or duplicating entries.
//! 2. **Execution.** [`Registry::build`] consumes the registry and produces a
//!    read-only [`Engine`]. The engine needs no locking and can lint many
//!    certificates concurrently.
//!
//! Report order equals registration order. A check that returns an error or
//! panics is reported as a finding carrying its name; the remaining checks
//! still run.

mod certificate;
mod diagnostics;
mod extension;
mod filter;

pub use certificate::{CertificateCheck, CertificateChecks};
pub use diagnostics::{Diagnostics, Finding, Severity};
pub use extension::{ExtensionCheck, ExtensionChecks};
pub use filter::Filter;

use crate::fields::{CertificateData, Extension};
use crate::oid::Oid;
use crate::XlintError;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// What a check returns: its findings, or the reason it could not evaluate.
pub type CheckResult = Result<Diagnostics, XlintError>;

/// Options controlling how the engine executes checks.
#[derive(Debug, Clone, Default)]
pub struct LintOptions {
    /// Evaluate the checks of one certificate on the rayon thread pool.
    /// Findings are re-joined in registration order either way.
    pub parallel: bool,
}

/// Check tables during the registration phase.
#[derive(Debug, Default)]
pub struct Registry {
    certificate: Mutex<Vec<CertificateCheck>>,
    extension: Mutex<Vec<ExtensionCheck>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a whole-certificate check.
    ///
    /// `None` (or an empty [`Filter`]) applies the check to every certificate
    /// type. Names are only used for reporting; duplicates are allowed.
    pub fn register_certificate_check<F>(
        &self,
        name: impl Into<String>,
        filter: Option<Filter>,
        function: F,
    ) where
        F: Fn(&CertificateData) -> CheckResult + Send + Sync + 'static,
    {
        let check = CertificateCheck::new(name.into(), filter, Box::new(function));
        tracing::debug!(check = %check.name(), "registered certificate check");
        self.certificate.lock().push(check);
    }

    /// Register a check for every extension whose OID equals `oid`.
    pub fn register_extension_check<F>(
        &self,
        name: impl Into<String>,
        oid: Oid,
        filter: Option<Filter>,
        function: F,
    ) where
        F: Fn(&Extension, &CertificateData) -> CheckResult + Send + Sync + 'static,
    {
        let check = ExtensionCheck::new(name.into(), oid, filter, Box::new(function));
        tracing::debug!(check = %check.name(), oid = %check.oid(), "registered extension check");
        self.extension.lock().push(check);
    }

    pub fn certificate_check_count(&self) -> usize {
        self.certificate.lock().len()
    }

    pub fn extension_check_count(&self) -> usize {
        self.extension.lock().len()
    }

    /// End the registration phase.
    pub fn build(self, options: LintOptions) -> Engine {
        let certificate_checks = CertificateChecks::new(self.certificate.into_inner());
        let extension_checks = ExtensionChecks::new(self.extension.into_inner());
        tracing::debug!(
            certificate_checks = certificate_checks.len(),
            extension_checks = extension_checks.len(),
            parallel = options.parallel,
            "check registry frozen"
        );
        Engine {
            certificate_checks,
            extension_checks,
            options,
        }
    }
}

/// Read-only check tables, ready to lint certificates.
#[derive(Debug)]
pub struct Engine {
    certificate_checks: CertificateChecks,
    extension_checks: ExtensionChecks,
    options: LintOptions,
}

impl Engine {
    /// An engine with every built-in check and default options.
    pub fn builtin() -> Self {
        Self::with_builtin_checks(LintOptions::default())
    }

    /// An engine with every built-in check.
    pub fn with_builtin_checks(options: LintOptions) -> Self {
        let registry = Registry::new();
        crate::checks::register_all(&registry);
        registry.build(options)
    }

    /// Run the whole-certificate checks.
    pub fn run_certificate_checks(&self, cert: &CertificateData) -> Diagnostics {
        if self.options.parallel {
            self.certificate_checks.run_parallel(cert)
        } else {
            self.certificate_checks.run(cert)
        }
    }

    /// Dispatch one extension to the checks registered for its OID.
    pub fn dispatch_extension(&self, ext: &Extension, cert: &CertificateData) -> Diagnostics {
        self.extension_checks.dispatch(ext, cert)
    }

    /// Run the whole-certificate pass, then dispatch every extension in
    /// certificate order, and merge all findings.
    pub fn lint(&self, cert: &CertificateData) -> Diagnostics {
        let _span =
            tracing::debug_span!("lint", subject = %cert.subject, cert_type = %cert.cert_type)
                .entered();
        let mut diagnostics = self.run_certificate_checks(cert);
        let per_extension: Vec<Diagnostics> = if self.options.parallel {
            cert.extensions
                .par_iter()
                .map(|ext| self.dispatch_extension(ext, cert))
                .collect()
        } else {
            cert.extensions
                .iter()
                .map(|ext| self.dispatch_extension(ext, cert))
                .collect()
        };
        for d in per_extension {
            diagnostics.append(d);
        }
        tracing::debug!(findings = diagnostics.len(), "lint finished");
        diagnostics
    }

    pub fn certificate_checks(&self) -> &CertificateChecks {
        &self.certificate_checks
    }

    pub fn extension_checks(&self) -> &ExtensionChecks {
        &self.extension_checks
    }

    pub fn options(&self) -> &LintOptions {
        &self.options
    }
}

/// Invoke one check, turning an error or panic into a finding attributed to it.
///
/// The process panic hook still runs before the panic is caught; with the
/// default hook that prints a `thread '...' panicked` line to stderr.
/// Embedders that want silent containment install their own hook.
pub(crate) fn isolate<F>(name: &str, check: F) -> Diagnostics
where
    F: FnOnce() -> CheckResult,
{
    match panic::catch_unwind(AssertUnwindSafe(check)) {
        Ok(Ok(diagnostics)) => diagnostics,
        Ok(Err(err)) => {
            tracing::warn!(check = name, error = %err, "check failed");
            Finding::new(Severity::Error, format!("check {:?} failed: {}", name, err)).into()
        }
        Err(payload) => {
            let reason = panic_reason(payload.as_ref());
            tracing::warn!(check = name, reason = %reason, "check panicked");
            Finding::new(Severity::Error, format!("check {:?} failed: {}", name, reason)).into()
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "check panicked".to_string()
    }
}
