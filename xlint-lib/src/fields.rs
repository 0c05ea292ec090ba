//! Certificate data types consumed by checks.

use crate::oid::Oid;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Validation class of a certificate, used to decide which checks apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub enum CertType {
    /// Domain Validated TLS server certificate.
    #[serde(rename = "DV")]
    Dv,
    /// Organization Validated TLS server certificate.
    #[serde(rename = "OV")]
    Ov,
    /// Individual Validated TLS server certificate.
    #[serde(rename = "IV")]
    Iv,
    /// Extended Validation TLS server certificate.
    #[serde(rename = "EV")]
    Ev,
    /// Certificate authority.
    #[serde(rename = "CA")]
    Ca,
    /// OCSP responder.
    #[serde(rename = "OCSP")]
    Ocsp,
    /// Time-stamping authority.
    #[serde(rename = "TS")]
    Ts,
    /// Code signing.
    #[serde(rename = "CS")]
    Cs,
    /// Personal (S/MIME) certificate.
    #[serde(rename = "PS")]
    Ps,
    /// Could not be classified.
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl CertType {
    /// The publicly-trusted TLS server classes covered by the Baseline Requirements.
    pub const SERVER_VALIDATED: [CertType; 4] =
        [CertType::Dv, CertType::Ov, CertType::Iv, CertType::Ev];

    /// Short label, e.g. `"DV"`.
    pub fn label(&self) -> &'static str {
        match self {
            CertType::Dv => "DV",
            CertType::Ov => "OV",
            CertType::Iv => "IV",
            CertType::Ev => "EV",
            CertType::Ca => "CA",
            CertType::Ocsp => "OCSP",
            CertType::Ts => "TS",
            CertType::Cs => "CS",
            CertType::Ps => "PS",
            CertType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CertType {
    type Err = crate::XlintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DV" => Ok(CertType::Dv),
            "OV" => Ok(CertType::Ov),
            "IV" => Ok(CertType::Iv),
            "EV" => Ok(CertType::Ev),
            "CA" => Ok(CertType::Ca),
            "OCSP" => Ok(CertType::Ocsp),
            "TS" => Ok(CertType::Ts),
            "CS" => Ok(CertType::Cs),
            "PS" => Ok(CertType::Ps),
            "UNKNOWN" => Ok(CertType::Unknown),
            _ => Err(crate::XlintError::Unsupported(format!(
                "unknown certificate type '{}'",
                s
            ))),
        }
    }
}

/// A parsed X.509 certificate as seen by checks.
///
/// Built once per input by the parser (or by hand in tests) and handed to
/// every check by shared reference.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CertificateData {
    /// Certificate version (1, 2, or 3).
    pub version: u32,
    /// Serial number as a colon-separated hex string.
    pub serial: String,
    /// Validation class derived from basic constraints, policies and EKU.
    pub cert_type: CertType,
    /// Issuer distinguished name.
    pub issuer: DistinguishedName,
    /// Subject distinguished name.
    pub subject: DistinguishedName,
    /// Validity start date.
    pub not_before: DateTime,
    /// Validity end date.
    pub not_after: DateTime,
    /// X.509v3 extensions, in certificate order.
    pub extensions: Vec<Extension>,

    /// Raw DER bytes of the entire certificate (for fingerprint computation).
    #[serde(skip)]
    pub raw_der: Vec<u8>,
}

/// Distinguished name with ordered components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistinguishedName {
    /// Ordered list of (attribute_type, value) pairs.
    /// Attribute types use short names where known (e.g., "CN", "O", "C").
    pub components: Vec<(String, String)>,
}

impl DistinguishedName {
    /// Build a name from `(short_name, value)` pairs.
    pub fn new<K, V>(components: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        DistinguishedName {
            components: components
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// First value for the attribute with the given short name.
    pub fn get(&self, short_name: &str) -> Option<&str> {
        self.components
            .iter()
            .find(|(k, _)| k == short_name)
            .map(|(_, v)| v.as_str())
    }

    /// True when the name has no attributes at all.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Format as a comma-separated one-line string matching OpenSSL's default format.
    /// Example: "C = US, O = Org, CN = example.com"
    ///
    /// Values containing commas, equals signs, or backslashes are escaped
    /// to prevent ambiguous output.
    pub fn to_oneline(&self) -> String {
        let mut result = String::new();
        for (i, (k, v)) in self.components.iter().enumerate() {
            if i > 0 {
                result.push_str(", ");
            }
            result.push_str(k);
            result.push_str(" = ");
            for ch in v.chars() {
                match ch {
                    '\\' => result.push_str("\\\\"),
                    ',' => result.push_str("\\,"),
                    '=' => result.push_str("\\="),
                    _ => result.push(ch),
                }
            }
        }
        result
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_oneline())
    }
}

/// A certificate extension.
#[derive(Debug, Clone, Serialize)]
pub struct Extension {
    /// Extension identifier.
    pub oid: Oid,
    /// Human-readable name (or OID string if unknown).
    pub name: String,
    /// Whether this extension is marked critical.
    pub critical: bool,
    /// Contents of the extnValue OCTET STRING.
    #[serde(skip)]
    pub raw: Vec<u8>,
    /// Decoded extension value.
    pub value: ExtensionValue,
}

impl Extension {
    /// Build an extension whose value is kept undecoded.
    pub fn raw(oid: Oid, critical: bool, raw: Vec<u8>) -> Self {
        let value = ExtensionValue::Raw(hex::encode(&raw));
        Extension {
            name: crate::oid::lookup(crate::oid::EXTENSION_NAMES, &oid)
                .map(str::to_string)
                .unwrap_or_else(|| oid.to_string()),
            oid,
            critical,
            raw,
            value,
        }
    }

    /// Build an extension with an already decoded value.
    pub fn with_value(oid: Oid, critical: bool, value: ExtensionValue) -> Self {
        Extension {
            value,
            ..Extension::raw(oid, critical, Vec::new())
        }
    }
}

/// Strongly-typed extension values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum ExtensionValue {
    BasicConstraints {
        ca: bool,
        path_len: Option<u32>,
    },
    KeyUsage(Vec<KeyUsageBit>),
    ExtendedKeyUsage(Vec<Oid>),
    SubjectAltName(Vec<SanEntry>),
    SubjectKeyIdentifier(String),
    AuthorityKeyIdentifier {
        key_id: Option<String>,
        issuer: Option<String>,
    },
    AuthorityInfoAccess(Vec<AiaEntry>),
    CrlDistributionPoints(Vec<String>),
    CertificatePolicies(Vec<Oid>),
    NameConstraints {
        permitted: usize,
        excluded: usize,
    },
    /// Fallback for extensions we don't parse into a specific variant
    /// (hex-encoded extnValue).
    Raw(String),
    /// The extension value could not be decoded.
    Malformed(String),
}

/// Key Usage bits (RFC 5280 Section 4.2.1.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyUsageBit {
    DigitalSignature,
    NonRepudiation,
    KeyEncipherment,
    DataEncipherment,
    KeyAgreement,
    KeyCertSign,
    CrlSign,
    EncipherOnly,
    DecipherOnly,
}

/// Subject Alternative Name entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum SanEntry {
    Dns(String),
    Email(String),
    Ip(String),
    Uri(String),
    DirName(String),
    Other(String),
}

/// Authority Information Access entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiaEntry {
    /// Access method: "OCSP", "CA Issuers" or the method OID.
    pub method: String,
    /// Access location (usually a URI).
    pub location: String,
}

/// Date-time representation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DateTime {
    /// ISO 8601 formatted string.
    pub iso8601: String,
    /// Unix timestamp.
    pub timestamp: i64,
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.iso8601)
    }
}

impl CertificateData {
    /// The first Subject Common Name, if any.
    pub fn common_name(&self) -> Option<&str> {
        self.subject.get("CN")
    }

    /// All Subject Alternative Name entries.
    pub fn san_entries(&self) -> Vec<&SanEntry> {
        self.extensions
            .iter()
            .find_map(|ext| match &ext.value {
                ExtensionValue::SubjectAltName(entries) => Some(entries.iter().collect()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// DNS-type Subject Alternative Names, in certificate order.
    pub fn dns_names(&self) -> Vec<&str> {
        self.san_entries()
            .into_iter()
            .filter_map(|entry| match entry {
                SanEntry::Dns(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The first extension with the given OID.
    pub fn extension(&self, oid: &Oid) -> Option<&Extension> {
        self.extensions.iter().find(|ext| &ext.oid == oid)
    }

    /// Whether BasicConstraints marks this certificate as a CA.
    pub fn is_ca(&self) -> bool {
        self.extensions.iter().any(|ext| {
            matches!(
                ext.value,
                ExtensionValue::BasicConstraints { ca: true, .. }
            )
        })
    }

    /// Return the subject as a one-line string.
    pub fn subject_string(&self) -> String {
        self.subject.to_oneline()
    }

    /// Compute the SHA-256 fingerprint of the certificate.
    pub fn fingerprint(&self) -> String {
        crate::fingerprint::compute_fingerprint(&self.raw_der)
    }
}
