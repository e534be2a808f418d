#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # x12-codec
//!
//! Streaming codec for ASC X12 interchanges.
//!
//! An X12 document is a nested envelope: an Interchange (ISA/IEA) contains
//! Functional Groups (GS/GE), which contain Transactions (ST/SE), which
//! contain generic segments. The delimiters framing the stream are not fixed
//! by the standard but discovered from fixed byte offsets in the ISA prefix,
//! so decoding is a two-phase affair: probe the ISA, then tokenise the rest
//! with the discovered separators.
//!
//! The decoder materialises the whole tree (envelope trailers cannot be
//! cross-checked until seen); the marshaller reproduces the original bytes,
//! including empty trailing elements and non-canonical delimiter sets.

/// Pushdown assembly of the envelope hierarchy and the decode entry points.
pub mod decoder;
/// The typed document tree produced by the decoder.
pub mod document;
/// Named-field records for the six envelope segments.
pub mod envelope;
/// Serialisation of a document tree back to delimited bytes.
pub mod marshaler;
/// Generic segment and element model for non-envelope segments.
pub mod segment;
/// Delimiter discovery: the `Delimiters` set and the ISA prefix probe.
pub mod syntax;
/// Lazy segment iterator over the raw byte stream.
pub mod tokenizer;

/// Decode entry points and options.
pub use decoder::{decode, decode_with, DecodeOptions};
/// Tree types, outermost first.
pub use document::{Document, FunctionGroup, Interchange, Transaction};
/// Envelope records addressed by field name.
pub use envelope::{Ge, Gs, Iea, Isa, Se, St};
/// Marshal entry point.
pub use marshaler::Marshaler;
/// Generic segment model.
pub use segment::{Element, Segment};
/// Discovered delimiter set.
pub use syntax::Delimiters;

use thiserror::Error;

/// Errors produced while decoding or marshalling a stream.
///
/// Decode errors carry the segment index and byte offset at which they were
/// detected and render as `at segment N (offset M): <kind>: <detail>`.
#[derive(Error, Debug)]
pub enum Error {
    /// The input contained no segments.
    #[error("at segment 0 (offset 0): empty input: no segments")]
    Empty,

    /// The ISA prefix was missing, too short, or failed the fixed layout.
    #[error("at segment 0 (offset {offset}): malformed ISA: {message}")]
    MalformedIsa { offset: usize, message: String },

    /// An envelope segment had the wrong number of fields.
    #[error("at segment {segment} (offset {offset}): malformed {id} envelope: {message}")]
    MalformedEnvelope {
        id: String,
        segment: usize,
        offset: usize,
        message: String,
    },

    /// The envelope state machine rejected a segment id in this position.
    #[error("at segment {segment} (offset {offset}): unexpected segment: {id:?} {context}")]
    UnexpectedSegment {
        id: String,
        segment: usize,
        offset: usize,
        context: String,
    },

    /// Data followed the interchange trailer.
    #[error("at segment {segment} (offset {offset}): trailing segments: data after interchange trailer")]
    TrailingSegments { segment: usize, offset: usize },

    /// The stream ended mid-segment or mid-envelope.
    #[error("at segment {segment} (offset {offset}): unexpected EOF: {message}")]
    UnexpectedEof {
        segment: usize,
        offset: usize,
        message: String,
    },

    /// The underlying reader failed.
    #[error("at segment {segment} (offset {offset}): reader error: {source}")]
    Reader {
        segment: usize,
        offset: usize,
        #[source]
        source: std::io::Error,
    },

    /// The output writer failed while marshalling.
    #[error("writer error: {source}")]
    Writer {
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Build a malformed-ISA error at the given byte offset.
    pub fn malformed_isa(offset: usize, message: impl Into<String>) -> Self {
        Self::MalformedIsa {
            offset,
            message: message.into(),
        }
    }

    /// Build a malformed-envelope error for the segment at `segment`/`offset`.
    pub fn malformed_envelope(
        id: impl Into<String>,
        segment: usize,
        offset: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::MalformedEnvelope {
            id: id.into(),
            segment,
            offset,
            message: message.into(),
        }
    }

    /// Build an unexpected-segment error with the state machine's expectation.
    pub fn unexpected_segment(
        id: impl Into<String>,
        segment: usize,
        offset: usize,
        context: impl Into<String>,
    ) -> Self {
        Self::UnexpectedSegment {
            id: id.into(),
            segment,
            offset,
            context: context.into(),
        }
    }

    /// Build an unexpected-EOF error.
    pub fn unexpected_eof(segment: usize, offset: usize, message: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            segment,
            offset,
            message: message.into(),
        }
    }

    /// Wrap a reader failure with the segment index being tokenised.
    pub fn reader(segment: usize, offset: usize, source: std::io::Error) -> Self {
        Self::Reader {
            segment,
            offset,
            source,
        }
    }
}

/// Crate-local result type for codec operations.
pub type Result<T> = std::result::Result<T, Error>;
