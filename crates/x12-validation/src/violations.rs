//! Violation records and the accumulated report.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The envelope invariant a violation breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Invariant {
    /// ISA13 must equal IEA02.
    InterchangeControlNumber,
    /// GS06 must equal GE02 within a functional group.
    GroupControlNumber,
    /// IEA01 must equal the number of functional groups in the interchange.
    FunctionalGroupCount,
    /// GE01 must equal the number of transaction sets in its group.
    TransactionCount,
    /// ST02 must equal SE02 within a transaction.
    TransactionControlNumber,
    /// SE01 must equal the segment count from ST through SE inclusive.
    SegmentCount,
    /// A declared count that is not a decimal integer.
    NonNumericCount,
}

impl std::fmt::Display for Invariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Invariant::InterchangeControlNumber => "interchange control number mismatch",
            Invariant::GroupControlNumber => "group control number mismatch",
            Invariant::FunctionalGroupCount => "functional group count mismatch",
            Invariant::TransactionCount => "transaction set count mismatch",
            Invariant::TransactionControlNumber => "transaction set control number mismatch",
            Invariant::SegmentCount => "segment count mismatch",
            Invariant::NonNumericCount => "non-numeric count",
        };
        f.write_str(label)
    }
}

/// One broken invariant: where, which, and the two values that disagree.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{path}: {invariant}: expected {expected}, observed {observed}")]
pub struct Violation {
    /// Dotted path into the tree, e.g.
    /// `interchange.function_groups[0].transactions[1]`.
    pub path: String,
    /// The invariant broken.
    pub invariant: Invariant,
    /// The value the envelope should have declared.
    pub expected: String,
    /// The value actually observed.
    pub observed: String,
}

impl Violation {
    /// Build a violation at `path`.
    pub fn new(
        path: impl Into<String>,
        invariant: Invariant,
        expected: impl Into<String>,
        observed: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            invariant,
            expected: expected.into(),
            observed: observed.into(),
        }
    }
}

/// Every violation found in one validation pass. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Violations in tree order.
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// An empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no invariant was broken.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of violations found.
    pub fn count(&self) -> usize {
        self.violations.len()
    }

    /// Record a violation.
    pub fn add(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Iterate the violations in tree order.
    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }
}

impl<'a> IntoIterator for &'a ValidationReport {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
