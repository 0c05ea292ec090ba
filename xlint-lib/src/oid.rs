//! Object identifiers and the OID constants used throughout xlint-lib.
//!
//! Object Identifiers (OIDs) are defined by ITU-T X.660 and referenced
//! extensively in RFC 5280 (X.509) and the CA/Browser Forum Baseline
//! Requirements. An [`Oid`] is kept in canonical dotted-decimal form (no
//! leading zeros, no empty arcs), so two OIDs are equal exactly when every
//! component is equal. Arcs are unbounded: `2.25.<uuid>` needs 128 bits.

use crate::XlintError;
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// A dotted-integer object identifier such as `2.5.29.17`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Oid(Cow<'static, str>);

impl Oid {
    /// Build an OID from its canonical dotted form. Used for the constants below.
    pub const fn from_static(dotted: &'static str) -> Self {
        Oid(Cow::Borrowed(dotted))
    }

    /// The individual arcs of this OID, as decimal strings.
    pub fn arcs(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// The canonical dotted-decimal form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this OID lies strictly below `arc` (at least one more component).
    ///
    /// `1.3.6.1.4.1.9999` is under `1.3.6.1.4.1`; `1.3.6.1.4.1` and
    /// `1.3.6.1.4.10` are not.
    pub fn is_under(&self, arc: &Oid) -> bool {
        self.0
            .strip_prefix(arc.as_str())
            .is_some_and(|rest| rest.starts_with('.'))
    }
}

impl FromStr for Oid {
    type Err = XlintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || XlintError::InvalidOid(s.to_string());
        let mut arcs = Vec::new();
        for arc in s.trim().split('.') {
            if arc.is_empty() || !arc.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            let digits = arc.trim_start_matches('0');
            arcs.push(if digits.is_empty() { "0" } else { digits });
        }
        if arcs.len() < 2 {
            return Err(invalid());
        }
        Ok(Oid(Cow::Owned(arcs.join("."))))
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Oid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl From<&asn1_rs::Oid<'_>> for Oid {
    fn from(oid: &asn1_rs::Oid<'_>) -> Self {
        let arcs: Vec<String> = oid.iter_bigint().map(|arc| arc.to_string()).collect();
        Oid(Cow::Owned(arcs.join(".")))
    }
}

// ── X.509 Distinguished Name attributes (RFC 4519 / X.520) ──────────────

pub const COMMON_NAME: Oid = Oid::from_static("2.5.4.3");
pub const SURNAME: Oid = Oid::from_static("2.5.4.4");
pub const SERIAL_NUMBER: Oid = Oid::from_static("2.5.4.5");
pub const COUNTRY: Oid = Oid::from_static("2.5.4.6");
pub const LOCALITY: Oid = Oid::from_static("2.5.4.7");
pub const STATE_OR_PROVINCE: Oid = Oid::from_static("2.5.4.8");
pub const STREET_ADDRESS: Oid = Oid::from_static("2.5.4.9");
pub const ORGANIZATION: Oid = Oid::from_static("2.5.4.10");
pub const ORGANIZATIONAL_UNIT: Oid = Oid::from_static("2.5.4.11");
pub const GIVEN_NAME: Oid = Oid::from_static("2.5.4.42");
pub const EMAIL_ADDRESS: Oid = Oid::from_static("1.2.840.113549.1.9.1"); // PKCS#9
pub const DOMAIN_COMPONENT: Oid = Oid::from_static("0.9.2342.19200300.100.1.25");

// ── X.509v3 extensions (RFC 5280 Section 4.2) ───────────────────────────

pub const EXT_SUBJECT_KEY_ID: Oid = Oid::from_static("2.5.29.14");
pub const EXT_KEY_USAGE: Oid = Oid::from_static("2.5.29.15");
pub const EXT_SUBJECT_ALT_NAME: Oid = Oid::from_static("2.5.29.17");
pub const EXT_ISSUER_ALT_NAME: Oid = Oid::from_static("2.5.29.18");
pub const EXT_BASIC_CONSTRAINTS: Oid = Oid::from_static("2.5.29.19");
pub const EXT_NAME_CONSTRAINTS: Oid = Oid::from_static("2.5.29.30");
pub const EXT_CRL_DISTRIBUTION_POINTS: Oid = Oid::from_static("2.5.29.31");
pub const EXT_CERTIFICATE_POLICIES: Oid = Oid::from_static("2.5.29.32");
pub const EXT_POLICY_MAPPINGS: Oid = Oid::from_static("2.5.29.33");
pub const EXT_AUTHORITY_KEY_ID: Oid = Oid::from_static("2.5.29.35");
pub const EXT_POLICY_CONSTRAINTS: Oid = Oid::from_static("2.5.29.36");
pub const EXT_EXTENDED_KEY_USAGE: Oid = Oid::from_static("2.5.29.37");
pub const EXT_INHIBIT_ANY_POLICY: Oid = Oid::from_static("2.5.29.54");

// ── PKIX Authority Information Access (RFC 5280 Section 4.2.2.1) ────────

pub const EXT_AUTHORITY_INFO_ACCESS: Oid = Oid::from_static("1.3.6.1.5.5.7.1.1");

// ── Extended Key Usage values (RFC 5280 Section 4.2.1.12) ────────────────

pub const EKU_SERVER_AUTH: Oid = Oid::from_static("1.3.6.1.5.5.7.3.1");
pub const EKU_CLIENT_AUTH: Oid = Oid::from_static("1.3.6.1.5.5.7.3.2");
pub const EKU_CODE_SIGNING: Oid = Oid::from_static("1.3.6.1.5.5.7.3.3");
pub const EKU_EMAIL_PROTECTION: Oid = Oid::from_static("1.3.6.1.5.5.7.3.4");
pub const EKU_TIME_STAMPING: Oid = Oid::from_static("1.3.6.1.5.5.7.3.8");
pub const EKU_OCSP_SIGNING: Oid = Oid::from_static("1.3.6.1.5.5.7.3.9");
pub const EKU_ANY: Oid = Oid::from_static("2.5.29.37.0");

// ── CA/Browser Forum reserved policy identifiers ─────────────────────────

pub const POLICY_EV: Oid = Oid::from_static("2.23.140.1.1");
pub const POLICY_DV: Oid = Oid::from_static("2.23.140.1.2.1");
pub const POLICY_OV: Oid = Oid::from_static("2.23.140.1.2.2");
pub const POLICY_IV: Oid = Oid::from_static("2.23.140.1.2.3");

// ── Certificate Transparency (RFC 6962) ──────────────────────────────────

pub const EXT_SCT_LIST: Oid = Oid::from_static("1.3.6.1.4.1.11129.2.4.2");
pub const EXT_CT_POISON: Oid = Oid::from_static("1.3.6.1.4.1.11129.2.4.3");

// ── IANA Private Enterprise Numbers ──────────────────────────────────────

/// Arc under which operators embed proprietary extensions.
pub const PRIVATE_ENTERPRISE: Oid = Oid::from_static("1.3.6.1.4.1");

/// Short names for distinguished-name attribute types.
pub(crate) const DN_SHORT_NAMES: &[(Oid, &str)] = &[
    (COMMON_NAME, "CN"),
    (SURNAME, "SN"),
    (SERIAL_NUMBER, "serialNumber"),
    (COUNTRY, "C"),
    (LOCALITY, "L"),
    (STATE_OR_PROVINCE, "ST"),
    (STREET_ADDRESS, "street"),
    (ORGANIZATION, "O"),
    (ORGANIZATIONAL_UNIT, "OU"),
    (GIVEN_NAME, "GN"),
    (EMAIL_ADDRESS, "emailAddress"),
    (DOMAIN_COMPONENT, "DC"),
];

/// Human-readable names for the extensions xlint knows about.
pub(crate) const EXTENSION_NAMES: &[(Oid, &str)] = &[
    (EXT_SUBJECT_KEY_ID, "Subject Key Identifier"),
    (EXT_KEY_USAGE, "Key Usage"),
    (EXT_SUBJECT_ALT_NAME, "Subject Alternative Name"),
    (EXT_ISSUER_ALT_NAME, "Issuer Alternative Name"),
    (EXT_BASIC_CONSTRAINTS, "Basic Constraints"),
    (EXT_NAME_CONSTRAINTS, "Name Constraints"),
    (EXT_CRL_DISTRIBUTION_POINTS, "CRL Distribution Points"),
    (EXT_CERTIFICATE_POLICIES, "Certificate Policies"),
    (EXT_POLICY_MAPPINGS, "Policy Mappings"),
    (EXT_AUTHORITY_KEY_ID, "Authority Key Identifier"),
    (EXT_POLICY_CONSTRAINTS, "Policy Constraints"),
    (EXT_EXTENDED_KEY_USAGE, "Extended Key Usage"),
    (EXT_INHIBIT_ANY_POLICY, "Inhibit Any-Policy"),
    (EXT_AUTHORITY_INFO_ACCESS, "Authority Information Access"),
    (EXT_SCT_LIST, "CT Precertificate SCTs"),
    (EXT_CT_POISON, "CT Precertificate Poison"),
];

/// Look up `oid` in one of the name tables above.
pub(crate) fn lookup<'a>(table: &'a [(Oid, &'a str)], oid: &Oid) -> Option<&'a str> {
    table
        .iter()
        .find_map(|(known, name)| (known == oid).then_some(*name))
}
