//! Certificate-type filters deciding whether a check applies.

use crate::fields::CertType;
use std::collections::BTreeSet;

/// Immutable set of certificate types a check applies to.
///
/// An empty filter applies to every certificate type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    types: BTreeSet<CertType>,
}

impl Filter {
    /// A filter that applies only to the given certificate types.
    pub fn new(types: impl IntoIterator<Item = CertType>) -> Self {
        Filter {
            types: types.into_iter().collect(),
        }
    }

    /// A filter that applies to every certificate type.
    pub fn any() -> Self {
        Self::default()
    }

    /// DV, OV, IV and EV TLS server certificates.
    pub fn server_validated() -> Self {
        Self::new(CertType::SERVER_VALIDATED)
    }

    pub fn matches(&self, cert_type: CertType) -> bool {
        self.types.is_empty() || self.types.contains(&cert_type)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn types(&self) -> impl Iterator<Item = CertType> + '_ {
        self.types.iter().copied()
    }
}

/// Absent filters apply to everything.
pub(crate) fn applies(filter: Option<&Filter>, cert_type: CertType) -> bool {
    filter.map_or(true, |f| f.matches(cert_type))
}
