//! Lazy segment iterator over the raw byte stream.
//!
//! Each call reads up to the next segment terminator, trims a single
//! optional `\n` or `\r\n` after it, and splits the payload into positional
//! elements. X12 has no escape character: a delimiter byte inside a value is
//! a data error upstream, not a tokenising concern, so the split never
//! second-guesses.

use std::io::Read;

use tracing::trace;

use crate::segment::{Element, Segment};
use crate::syntax::{ByteSource, Delimiters};
use crate::{Error, Result};

/// Pull-based segment tokenizer. Driven by the decoder; buffers at most one
/// segment's worth of bytes.
pub struct Tokenizer<'a, R> {
    source: &'a mut ByteSource<R>,
    delimiters: Delimiters,
    index: usize,
    segment_offset: usize,
}

impl<'a, R: Read> Tokenizer<'a, R> {
    pub(crate) fn new(
        source: &'a mut ByteSource<R>,
        delimiters: Delimiters,
        first_index: usize,
    ) -> Self {
        let segment_offset = source.offset();
        Self {
            source,
            delimiters,
            index: first_index,
            segment_offset,
        }
    }

    /// Index of the next segment to be produced, counted from the start of
    /// the stream (the probed ISA is segment 0).
    pub fn segment_index(&self) -> usize {
        self.index
    }

    /// Byte offset at which the most recently produced segment started.
    pub fn segment_offset(&self) -> usize {
        self.segment_offset
    }

    /// Produce the next segment, or `None` at a clean end of stream.
    ///
    /// Whitespace after the final terminator is ignored; any other leftover
    /// bytes mean the stream ended mid-segment.
    pub fn next_segment(&mut self) -> Result<Option<Segment>> {
        self.segment_offset = self.source.offset();
        let payload = self
            .source
            .read_until(self.delimiters.segment_terminator)
            .map_err(|e| Error::reader(self.index, self.source.offset(), e))?;

        let Some(payload) = payload else {
            if self.source.leftover_is_whitespace() {
                return Ok(None);
            }
            return Err(Error::unexpected_eof(
                self.index,
                self.segment_offset,
                "stream ended before the segment terminator",
            ));
        };

        self.source
            .trim_newline()
            .map_err(|e| Error::reader(self.index, self.source.offset(), e))?;

        let segment = self.split(&payload);
        trace!(id = %segment.id, elements = segment.elements.len(), "tokenised segment");
        self.index += 1;
        Ok(Some(segment))
    }

    fn split(&self, payload: &[u8]) -> Segment {
        let element_separator = self.delimiters.element_separator;
        let sub_element_separator = self.delimiters.sub_element_separator;

        let mut parts = payload.split(|&b| b == element_separator);
        let id = String::from_utf8_lossy(parts.next().unwrap_or_default()).into_owned();

        let mut segment = Segment::new(id);
        for (i, part) in parts.enumerate() {
            let element = if part.contains(&sub_element_separator) {
                let components = part
                    .split(|&b| b == sub_element_separator)
                    .map(|c| String::from_utf8_lossy(c).into_owned())
                    .collect();
                Element::with_components(i + 1, components)
            } else {
                Element::new(i + 1, String::from_utf8_lossy(part).into_owned())
            };
            segment.elements.push(element);
        }
        segment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize_all(input: &[u8]) -> Result<Vec<Segment>> {
        let mut source = ByteSource::new(input);
        let mut tokenizer = Tokenizer::new(&mut source, Delimiters::default(), 0);
        let mut segments = Vec::new();
        while let Some(segment) = tokenizer.next_segment()? {
            segments.push(segment);
        }
        Ok(segments)
    }

    #[test]
    fn test_splits_segments_and_elements() {
        let segments = tokenize_all(b"BGN*11*FFA.ABCDEF.123456~N1*41*ABC INSURANCE~").unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].id, "BGN");
        assert_eq!(segments[0].elements[0], Element::new(1, "11"));
        assert_eq!(segments[1].id, "N1");
        assert_eq!(segments[1].elements[1].value, "ABC INSURANCE");
    }

    #[test]
    fn test_empty_elements_are_kept() {
        let segments = tokenize_all(b"OTI*TA*TN*NA***20020709~").unwrap();
        let elements = &segments[0].elements;
        assert_eq!(elements.len(), 6);
        assert_eq!(elements[3], Element::new(4, ""));
        assert_eq!(elements[4], Element::new(5, ""));
        assert_eq!(elements[5].value, "20020709");
    }

    #[test]
    fn test_sub_elements_become_components() {
        let segments = tokenize_all(b"SV1*HC>99213*500*UN*1~").unwrap();
        let first = &segments[0].elements[0];
        assert!(first.is_composite());
        assert_eq!(first.components, vec!["HC", "99213"]);
        assert!(first.value.is_empty());
        assert!(!segments[0].elements[1].is_composite());
    }

    #[test]
    fn test_trims_one_newline_per_terminator() {
        let segments = tokenize_all(b"BGN*11~\r\nN1*41~\nSE*7*0001~\n").unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].id, "N1");
        assert_eq!(segments[2].id, "SE");
    }

    #[test]
    fn test_trailing_whitespace_after_final_terminator() {
        let segments = tokenize_all(b"N1*41~  \r\n").unwrap();
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_unexpected_eof_mid_segment() {
        let err = tokenize_all(b"N1*41~BGN*11").unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { segment: 1, .. }), "{err}");
    }

    #[test]
    fn test_segment_index_and_offset_advance() {
        let mut source = ByteSource::new(&b"N1*41~PER*IC~"[..]);
        let mut tokenizer = Tokenizer::new(&mut source, Delimiters::default(), 1);
        tokenizer.next_segment().unwrap();
        assert_eq!(tokenizer.segment_index(), 2);
        assert_eq!(tokenizer.segment_offset(), 0);
        tokenizer.next_segment().unwrap();
        assert_eq!(tokenizer.segment_offset(), 6);
    }
}
