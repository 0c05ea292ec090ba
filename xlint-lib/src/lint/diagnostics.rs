//! Findings produced by checks and the ordered collector that merges them.

use serde::Serialize;
use std::fmt;

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// One reported validation result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Finding {
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Ordered, append-only list of findings.
///
/// Merging keeps the order in which findings were appended; checks run in
/// registration order, so the merged list is stable from run to run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    findings: Vec<Finding>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    /// Append a finding with the given severity.
    pub fn add(&mut self, severity: Severity, message: impl Into<String>) {
        self.push(Finding::new(severity, message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.add(Severity::Error, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.add(Severity::Warning, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.add(Severity::Info, message);
    }

    /// Append every finding of `other`, after the ones already present.
    pub fn append(&mut self, other: Diagnostics) {
        self.findings.extend(other.findings);
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Finding> {
        self.findings.iter()
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// The most severe finding level, or `None` when there are no findings.
    pub fn max_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }

    /// Whether any finding is an error.
    pub fn has_errors(&self) -> bool {
        self.max_severity().is_some_and(|s| s >= Severity::Error)
    }

    /// Keep only findings at or above `min`.
    pub fn at_least(&self, min: Severity) -> Diagnostics {
        self.findings
            .iter()
            .filter(|f| f.severity >= min)
            .cloned()
            .collect()
    }
}

impl From<Finding> for Diagnostics {
    fn from(finding: Finding) -> Self {
        Diagnostics {
            findings: vec![finding],
        }
    }
}

impl FromIterator<Finding> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Finding>>(iter: I) -> Self {
        Diagnostics {
            findings: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<Diagnostics> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostics>>(iter: I) -> Self {
        let mut merged = Diagnostics::new();
        for diagnostics in iter {
            merged.append(diagnostics);
        }
        merged
    }
}

impl Extend<Finding> for Diagnostics {
    fn extend<I: IntoIterator<Item = Finding>>(&mut self, iter: I) {
        self.findings.extend(iter);
    }
}

impl IntoIterator for Diagnostics {
    type Item = Finding;
    type IntoIter = std::vec::IntoIter<Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.findings.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Finding;
    type IntoIter = std::slice::Iter<'a, Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.findings.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for finding in &self.findings {
            writeln!(f, "{}", finding)?;
        }
        Ok(())
    }
}
