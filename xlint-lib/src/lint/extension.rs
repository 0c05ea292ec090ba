//! Per-extension checks keyed by object identifier.
//!
//! Each certificate extension is dispatched to every check registered under
//! its exact OID. Several checks may share one OID; all of them run, in
//! registration order. An extension no check is registered for is reported
//! as unknown, except below the private enterprise arc (`1.3.6.1.4.1`),
//! where operators are free to place proprietary extensions.

use super::diagnostics::Diagnostics;
use super::filter::{self, Filter};
use super::{isolate, CheckResult};
use crate::fields::{CertificateData, Extension};
use crate::oid::{self, Oid};
use std::collections::HashMap;
use std::fmt;

pub(crate) type ExtensionCheckFn =
    dyn Fn(&Extension, &CertificateData) -> CheckResult + Send + Sync;

/// A registered extension check.
pub struct ExtensionCheck {
    name: String,
    oid: Oid,
    filter: Option<Filter>,
    function: Box<ExtensionCheckFn>,
}

impl ExtensionCheck {
    pub(crate) fn new(
        name: String,
        oid: Oid,
        filter: Option<Filter>,
        function: Box<ExtensionCheckFn>,
    ) -> Self {
        ExtensionCheck {
            name,
            oid,
            filter,
            function,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    /// Run the check if its filter admits `cert`, converting failures into findings.
    pub fn evaluate(&self, ext: &Extension, cert: &CertificateData) -> Diagnostics {
        if !filter::applies(self.filter.as_ref(), cert.cert_type) {
            tracing::trace!(check = %self.name, cert_type = %cert.cert_type, "filtered out");
            return Diagnostics::new();
        }
        tracing::trace!(check = %self.name, oid = %ext.oid, "running extension check");
        isolate(&self.name, || (self.function)(ext, cert))
    }
}

impl fmt::Debug for ExtensionCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionCheck")
            .field("name", &self.name)
            .field("oid", &self.oid)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// The frozen, read-only extension check table.
#[derive(Debug, Default)]
pub struct ExtensionChecks {
    entries: Vec<ExtensionCheck>,
    /// OID -> indices into `entries`, ascending (registration order).
    by_oid: HashMap<Oid, Vec<usize>>,
}

impl ExtensionChecks {
    pub(crate) fn new(entries: Vec<ExtensionCheck>) -> Self {
        let mut by_oid: HashMap<Oid, Vec<usize>> = HashMap::new();
        for (i, check) in entries.iter().enumerate() {
            by_oid.entry(check.oid.clone()).or_default().push(i);
        }
        ExtensionChecks { entries, by_oid }
    }

    /// Run every check registered for `ext`'s OID.
    ///
    /// A registered OID counts as recognized even when every check for it is
    /// filtered out for this certificate type, so no unknown-extension finding
    /// is produced in that case.
    pub fn dispatch(&self, ext: &Extension, cert: &CertificateData) -> Diagnostics {
        match self.by_oid.get(&ext.oid) {
            Some(indices) => indices
                .iter()
                .filter_map(|&i| self.entries.get(i))
                .map(|check| check.evaluate(ext, cert))
                .collect(),
            None => unknown_extension(&ext.oid),
        }
    }

    /// Whether at least one check is registered for `oid`.
    pub fn recognizes(&self, oid: &Oid) -> bool {
        self.by_oid.contains_key(oid)
    }

    /// Checks registered for `oid`, in registration order.
    pub fn for_oid<'a>(&'a self, oid: &Oid) -> impl Iterator<Item = &'a ExtensionCheck> + 'a {
        self.by_oid
            .get(oid)
            .into_iter()
            .flatten()
            .filter_map(|&i| self.entries.get(i))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExtensionCheck> {
        self.entries.iter()
    }

    /// Check names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(ExtensionCheck::name).collect()
    }
}

fn unknown_extension(ext_oid: &Oid) -> Diagnostics {
    let mut d = Diagnostics::new();
    if ext_oid.is_under(&oid::PRIVATE_ENTERPRISE) {
        tracing::debug!(oid = %ext_oid, "unregistered private enterprise extension");
    } else {
        d.error(format!("Certificate contains unknown extension ({})", ext_oid));
    }
    d
}
