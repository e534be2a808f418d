//! # x12-validation
//!
//! Envelope referential-integrity validation for decoded X12 documents.
//!
//! The decoder guarantees structural shape (every interchange has its ISA and
//! IEA, every transaction its ST and SE), but the cross-references those
//! envelopes declare - control numbers matching between header and trailer,
//! declared counts matching actual counts - are checked here. Validation
//! never fails on a malformed tree: it walks the whole document and returns
//! every violation found, so a document with several bad trailers reports
//! them all at once.

/// Violation records and the accumulated report.
pub mod violations;
/// The envelope walk checking each invariant.
pub mod validator;

/// Validator entry points.
pub use validator::{validate, EnvelopeValidator};
/// Violation vocabulary.
pub use violations::{Invariant, ValidationReport, Violation};
