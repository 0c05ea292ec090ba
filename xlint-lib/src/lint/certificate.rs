//! Whole-certificate checks.

use super::diagnostics::Diagnostics;
use super::filter::{self, Filter};
use super::{isolate, CheckResult};
use crate::fields::CertificateData;
use rayon::prelude::*;
use std::fmt;

pub(crate) type CertificateCheckFn = dyn Fn(&CertificateData) -> CheckResult + Send + Sync;

/// A registered whole-certificate check.
pub struct CertificateCheck {
    name: String,
    filter: Option<Filter>,
    function: Box<CertificateCheckFn>,
}

impl CertificateCheck {
    pub(crate) fn new(
        name: String,
        filter: Option<Filter>,
        function: Box<CertificateCheckFn>,
    ) -> Self {
        CertificateCheck {
            name,
            filter,
            function,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    /// Run the check if its filter admits `cert`, converting failures into findings.
    pub fn evaluate(&self, cert: &CertificateData) -> Diagnostics {
        if !filter::applies(self.filter.as_ref(), cert.cert_type) {
            tracing::trace!(check = %self.name, cert_type = %cert.cert_type, "filtered out");
            return Diagnostics::new();
        }
        tracing::trace!(check = %self.name, "running certificate check");
        isolate(&self.name, || (self.function)(cert))
    }
}

impl fmt::Debug for CertificateCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateCheck")
            .field("name", &self.name)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// The frozen, read-only list of whole-certificate checks in registration order.
#[derive(Debug, Default)]
pub struct CertificateChecks {
    entries: Vec<CertificateCheck>,
}

impl CertificateChecks {
    pub(crate) fn new(entries: Vec<CertificateCheck>) -> Self {
        CertificateChecks { entries }
    }

    /// Run every applicable check against `cert`, in registration order.
    pub fn run(&self, cert: &CertificateData) -> Diagnostics {
        self.entries.iter().map(|check| check.evaluate(cert)).collect()
    }

    /// Like [`run`](Self::run), but evaluates checks on the rayon pool.
    ///
    /// Results are re-joined in registration order, so the output is
    /// identical to the sequential run.
    pub fn run_parallel(&self, cert: &CertificateData) -> Diagnostics {
        self.entries
            .par_iter()
            .map(|check| check.evaluate(cert))
            .collect::<Vec<_>>()
            .into_iter()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CertificateCheck> {
        self.entries.iter()
    }

    /// Check names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(CertificateCheck::name).collect()
    }
}
