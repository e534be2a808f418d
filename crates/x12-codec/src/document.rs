//! The typed document tree.
//!
//! All entities are immutable after construction; the tree is owned by the
//! caller and the codec holds no state across calls. Each interchange
//! carries the delimiter set it was framed with, so a decoded document
//! marshals back to its original bytes even with non-canonical delimiters.

use serde::{Deserialize, Serialize};

use crate::envelope::{Ge, Gs, Iea, Isa, Se, St};
use crate::segment::Segment;
use crate::syntax::Delimiters;

/// A decoded X12 document: one or more interchanges in stream order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Interchanges in the order they appeared. Streams observed in the wild
    /// carry exactly one, but back-to-back interchanges are accepted.
    pub interchanges: Vec<Interchange>,
}

impl Document {
    /// The first (usually only) interchange.
    pub fn interchange(&self) -> Option<&Interchange> {
        self.interchanges.first()
    }
}

/// An ISA/IEA-framed interchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interchange {
    /// Interchange Control Header.
    pub header: Isa,
    /// Functional groups in source order.
    pub function_groups: Vec<FunctionGroup>,
    /// Interchange Control Trailer.
    pub trailer: Iea,
    /// The delimiter set this interchange was framed with.
    pub delimiters: Delimiters,
}

/// A GS/GE-framed functional group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionGroup {
    /// Functional Group Header.
    pub header: Gs,
    /// Transaction sets in source order.
    pub transactions: Vec<Transaction>,
    /// Functional Group Trailer.
    pub trailer: Ge,
}

/// An ST/SE-framed transaction set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction Set Header.
    pub header: St,
    /// Every segment strictly between ST and SE, in source order.
    pub segments: Vec<Segment>,
    /// Transaction Set Trailer.
    pub trailer: Se,
}

impl Transaction {
    /// The segment count SE01 declares when correct: the inner segments plus
    /// the ST and SE framing them.
    pub fn enclosed_segment_count(&self) -> usize {
        self.segments.len() + 2
    }
}
