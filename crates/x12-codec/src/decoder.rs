//! Pushdown assembly of the envelope hierarchy.
//!
//! The builder is a state machine over envelope segment ids: an interchange
//! opens at ISA and closes at IEA, groups at GS/GE, transactions at ST/SE,
//! and everything else is legal only inside a transaction. The first error
//! aborts the decode; validation of control numbers and declared counts is
//! deliberately not done here (see the validation crate) so that a document
//! with mismatched trailers can still be decoded and inspected.

use std::io::Read;

use tracing::debug;

use crate::document::{Document, FunctionGroup, Interchange, Transaction};
use crate::envelope::{Ge, Gs, Iea, Isa, Se, St};
use crate::syntax::{probe_isa, ByteSource, Delimiters};
use crate::tokenizer::Tokenizer;
use crate::{Error, Result};

/// Options accepted by [`decode_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    relaxed_segment_id_whitespace: bool,
    delimiters: Option<Delimiters>,
}

impl DecodeOptions {
    /// Default options: strict ISA layout, delimiters probed from the ISA.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a run of spaces between `"ISA"` and the first element
    /// separator. Some published samples pad the segment id; the marshaller
    /// never re-inserts the spaces.
    pub fn relaxed_segment_id_whitespace(mut self, relaxed: bool) -> Self {
        self.relaxed_segment_id_whitespace = relaxed;
        self
    }

    /// Tokenise with the given delimiter set instead of deriving one from
    /// the ISA prefix. The ISA is then read as an ordinary segment and must
    /// still carry all 16 fields.
    pub fn delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = Some(delimiters);
        self
    }
}

/// Decode an X12 byte stream into a [`Document`] with default options.
///
/// The reader is borrowed for the duration of the call and not closed;
/// reader failures are propagated verbatim, wrapped with the segment index
/// being tokenised.
pub fn decode<R: Read>(reader: R) -> Result<Document> {
    decode_with(reader, &DecodeOptions::default())
}

/// Decode an X12 byte stream into a [`Document`].
///
/// Interchanges are read back-to-back until end of stream; each probes its
/// own delimiter set unless the options supply one. An input with no
/// segments at all fails with [`Error::Empty`].
pub fn decode_with<R: Read>(reader: R, options: &DecodeOptions) -> Result<Document> {
    let mut source = ByteSource::new(reader);
    let mut interchanges = Vec::new();
    let mut next_index = 0;

    loop {
        source
            .skip_whitespace()
            .map_err(|e| Error::reader(next_index, source.offset(), e))?;
        if source
            .at_eof()
            .map_err(|e| Error::reader(next_index, source.offset(), e))?
        {
            break;
        }
        if !interchanges.is_empty() && !starts_with_isa(&mut source, next_index)? {
            return Err(Error::TrailingSegments {
                segment: next_index,
                offset: source.offset(),
            });
        }

        let interchange = if let Some(delimiters) = options.delimiters {
            let mut tokenizer = Tokenizer::new(&mut source, delimiters, next_index);
            let interchange = read_interchange_with_delimiters(&mut tokenizer, delimiters)?;
            next_index = tokenizer.segment_index();
            interchange
        } else {
            let probe = probe_isa(
                &mut source,
                options.relaxed_segment_id_whitespace,
                next_index,
            )?;
            let header = Isa::from_fields(&probe.fields)
                .map_err(|message| Error::malformed_isa(source.offset(), message))?;
            let mut tokenizer = Tokenizer::new(&mut source, probe.delimiters, next_index + 1);
            let interchange = build_interchange(header, probe.delimiters, &mut tokenizer)?;
            next_index = tokenizer.segment_index();
            interchange
        };
        interchanges.push(interchange);
    }

    if interchanges.is_empty() {
        return Err(Error::Empty);
    }
    Ok(Document { interchanges })
}

fn starts_with_isa<R: Read>(source: &mut ByteSource<R>, segment: usize) -> Result<bool> {
    let available = source
        .ensure(3)
        .map_err(|e| Error::reader(segment, source.offset(), e))?;
    Ok(available == 3 && (0..3).all(|i| source.peek_at(i) == Some(b"ISA"[i])))
}

/// Read an interchange whose ISA arrives through the tokenizer because the
/// caller supplied the delimiter set.
fn read_interchange_with_delimiters<R: Read>(
    tokenizer: &mut Tokenizer<'_, R>,
    delimiters: Delimiters,
) -> Result<Interchange> {
    let (segment, index, offset) = expect_segment(tokenizer, "stream ended before the ISA header")?;
    if segment.id != "ISA" {
        return Err(Error::unexpected_segment(
            segment.id,
            index,
            offset,
            "expected ISA to open an interchange",
        ));
    }
    let header = Isa::from_segment(&segment, &delimiters)
        .map_err(|message| Error::malformed_isa(offset, message))?;
    build_interchange(header, delimiters, tokenizer)
}

/// The InsideISA state: functional groups until the IEA trailer.
fn build_interchange<R: Read>(
    header: Isa,
    delimiters: Delimiters,
    tokenizer: &mut Tokenizer<'_, R>,
) -> Result<Interchange> {
    debug!(control_number = %header.control_number, "opened interchange");
    let mut function_groups = Vec::new();
    loop {
        let (segment, index, offset) = expect_segment(tokenizer, "stream ended inside an interchange")?;
        match segment.id.as_str() {
            "GS" => {
                let gs = Gs::from_segment(&segment, &delimiters)
                    .map_err(|m| Error::malformed_envelope("GS", index, offset, m))?;
                function_groups.push(build_function_group(gs, delimiters, tokenizer)?);
            }
            "IEA" => {
                let trailer = Iea::from_segment(&segment, &delimiters)
                    .map_err(|m| Error::malformed_envelope("IEA", index, offset, m))?;
                debug!(
                    control_number = %trailer.interchange_control_number,
                    function_groups = function_groups.len(),
                    "closed interchange"
                );
                return Ok(Interchange {
                    header,
                    function_groups,
                    trailer,
                    delimiters,
                });
            }
            _ => {
                return Err(Error::unexpected_segment(
                    segment.id,
                    index,
                    offset,
                    "expected GS or IEA inside an interchange",
                ));
            }
        }
    }
}

/// The InsideGS state: transactions until the GE trailer.
fn build_function_group<R: Read>(
    header: Gs,
    delimiters: Delimiters,
    tokenizer: &mut Tokenizer<'_, R>,
) -> Result<FunctionGroup> {
    let mut transactions = Vec::new();
    loop {
        let (segment, index, offset) =
            expect_segment(tokenizer, "stream ended inside a functional group")?;
        match segment.id.as_str() {
            "ST" => {
                let st = St::from_segment(&segment, &delimiters)
                    .map_err(|m| Error::malformed_envelope("ST", index, offset, m))?;
                transactions.push(build_transaction(st, delimiters, tokenizer)?);
            }
            "GE" => {
                let trailer = Ge::from_segment(&segment, &delimiters)
                    .map_err(|m| Error::malformed_envelope("GE", index, offset, m))?;
                return Ok(FunctionGroup {
                    header,
                    transactions,
                    trailer,
                });
            }
            _ => {
                return Err(Error::unexpected_segment(
                    segment.id,
                    index,
                    offset,
                    "expected ST or GE inside a functional group",
                ));
            }
        }
    }
}

/// The InsideST state: generic segments until the SE trailer. Envelope ids
/// other than SE cannot appear inside a transaction.
fn build_transaction<R: Read>(
    header: St,
    delimiters: Delimiters,
    tokenizer: &mut Tokenizer<'_, R>,
) -> Result<Transaction> {
    let mut segments = Vec::new();
    loop {
        let (segment, index, offset) =
            expect_segment(tokenizer, "stream ended inside a transaction")?;
        match segment.id.as_str() {
            "SE" => {
                let trailer = Se::from_segment(&segment, &delimiters)
                    .map_err(|m| Error::malformed_envelope("SE", index, offset, m))?;
                return Ok(Transaction {
                    header,
                    segments,
                    trailer,
                });
            }
            "ISA" | "GS" | "ST" | "GE" | "IEA" => {
                return Err(Error::unexpected_segment(
                    segment.id,
                    index,
                    offset,
                    "expected SE before another envelope segment",
                ));
            }
            _ => segments.push(segment),
        }
    }
}

fn expect_segment<R: Read>(
    tokenizer: &mut Tokenizer<'_, R>,
    eof_message: &str,
) -> Result<(crate::Segment, usize, usize)> {
    match tokenizer.next_segment()? {
        Some(segment) => Ok((
            segment,
            tokenizer.segment_index() - 1,
            tokenizer.segment_offset(),
        )),
        None => Err(Error::unexpected_eof(
            tokenizer.segment_index(),
            tokenizer.segment_offset(),
            eof_message,
        )),
    }
}
