//! X12 delimiter handling and the ISA prefix probe.
//!
//! Unlike formats with a fixed syntax, X12 discovers its delimiters from the
//! interchange header itself: the ISA segment has a fixed 106-byte layout in
//! which the element separator, sub-element separator and segment terminator
//! sit at known offsets. Only after probing the ISA can the rest of the
//! stream be tokenised.

use std::io::Read;

use serde::{Deserialize, Serialize};

/// Canonical segment terminator (`~`).
pub const DEFAULT_SEGMENT_TERMINATOR: u8 = b'~';
/// Canonical element separator (`*`).
pub const DEFAULT_ELEMENT_SEPARATOR: u8 = b'*';
/// Canonical sub-element (component) separator (`>`).
pub const DEFAULT_SUB_ELEMENT_SEPARATOR: u8 = b'>';
/// Canonical repetition separator (`^`), X12 00501 and later.
pub const DEFAULT_REPETITION_SEPARATOR: u8 = b'^';

/// Total length of a canonical ISA segment: the 3-byte id, 16 fields each
/// preceded by an element separator, and the segment terminator.
pub const ISA_SEGMENT_LENGTH: usize = 106;

/// Fixed widths of the 16 ISA fields, ISA01 through ISA16.
pub(crate) const ISA_FIELD_WIDTHS: [usize; 16] =
    [2, 10, 2, 10, 2, 15, 2, 15, 6, 4, 1, 5, 9, 1, 1, 1];

/// Position of the repetition separator within the ISA field list (ISA11).
const ISA_REPETITION_FIELD: usize = 10;

/// The delimiter set framing one interchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    /// Terminates each segment (canonically `~`).
    pub segment_terminator: u8,
    /// Separates elements within a segment (canonically `*`).
    pub element_separator: u8,
    /// Separates components within an element (canonically `>`).
    pub sub_element_separator: u8,
    /// Separates repeated elements (canonically `^`). Recorded by the probe
    /// but never split on; repetition support is deferred.
    pub repetition_separator: u8,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            segment_terminator: DEFAULT_SEGMENT_TERMINATOR,
            element_separator: DEFAULT_ELEMENT_SEPARATOR,
            sub_element_separator: DEFAULT_SUB_ELEMENT_SEPARATOR,
            repetition_separator: DEFAULT_REPETITION_SEPARATOR,
        }
    }
}

/// A pull buffer over the caller's reader.
///
/// The decoder borrows the reader for the duration of a decode call and never
/// closes it; this buffer holds at most one segment's worth of unconsumed
/// bytes plus one read chunk, and tracks the absolute offset of the next
/// unconsumed byte for error reporting.
pub(crate) struct ByteSource<R> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
    base: usize,
    eof: bool,
}

const READ_CHUNK: usize = 4096;

impl<R: Read> ByteSource<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            pos: 0,
            base: 0,
            eof: false,
        }
    }

    /// Absolute byte offset of the next unconsumed byte.
    pub(crate) fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn available(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Pull one chunk from the reader. Returns false once the reader is
    /// exhausted.
    fn fill(&mut self) -> std::io::Result<bool> {
        if self.eof {
            return Ok(false);
        }
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.base += self.pos;
            self.pos = 0;
        }
        let start = self.buf.len();
        self.buf.resize(start + READ_CHUNK, 0);
        let n = self.inner.read(&mut self.buf[start..])?;
        self.buf.truncate(start + n);
        if n == 0 {
            self.eof = true;
        }
        Ok(n > 0)
    }

    /// Fill until at least `n` bytes are buffered or the reader is exhausted;
    /// returns the number of bytes actually available.
    pub(crate) fn ensure(&mut self, n: usize) -> std::io::Result<usize> {
        while self.available() < n && self.fill()? {}
        Ok(self.available().min(n))
    }

    /// Look at the `i`-th unconsumed byte without pulling from the reader.
    pub(crate) fn peek_at(&self, i: usize) -> Option<u8> {
        self.buf.get(self.pos + i).copied()
    }

    /// Consume and return one byte. The caller must have ensured it.
    pub(crate) fn take_byte(&mut self) -> Option<u8> {
        let byte = self.buf.get(self.pos).copied();
        if byte.is_some() {
            self.pos += 1;
        }
        byte
    }

    pub(crate) fn skip(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.buf.len());
    }

    /// True once the reader and the buffer are both exhausted.
    pub(crate) fn at_eof(&mut self) -> std::io::Result<bool> {
        Ok(self.ensure(1)? == 0)
    }

    /// Consume a run of ASCII whitespace, pulling as needed.
    pub(crate) fn skip_whitespace(&mut self) -> std::io::Result<()> {
        loop {
            while let Some(b) = self.peek_at(0) {
                if b.is_ascii_whitespace() {
                    self.pos += 1;
                } else {
                    return Ok(());
                }
            }
            if !self.fill()? {
                return Ok(());
            }
        }
    }

    /// Consume a run of space bytes, returning how many were skipped.
    pub(crate) fn skip_spaces(&mut self) -> std::io::Result<usize> {
        let mut skipped = 0;
        loop {
            while self.peek_at(0) == Some(b' ') {
                self.pos += 1;
                skipped += 1;
            }
            if self.peek_at(0).is_some() || !self.fill()? {
                return Ok(skipped);
            }
        }
    }

    /// Read through the next occurrence of `delim`, returning the bytes
    /// before it. Returns `None` when the reader ends first; any leftover
    /// bytes stay buffered for inspection.
    pub(crate) fn read_until(&mut self, delim: u8) -> std::io::Result<Option<Vec<u8>>> {
        let mut scanned = 0;
        loop {
            if let Some(i) = self.buf[self.pos + scanned..].iter().position(|&b| b == delim) {
                let end = self.pos + scanned + i;
                let payload = self.buf[self.pos..end].to_vec();
                self.pos = end + 1;
                return Ok(Some(payload));
            }
            scanned = self.available();
            if !self.fill()? {
                return Ok(None);
            }
        }
    }

    /// Whether every unconsumed byte left in the buffer is whitespace.
    pub(crate) fn leftover_is_whitespace(&self) -> bool {
        self.buf[self.pos..].iter().all(u8::is_ascii_whitespace)
    }

    /// Consume a single `\n` or `\r\n` immediately after a segment
    /// terminator, if present.
    pub(crate) fn trim_newline(&mut self) -> std::io::Result<()> {
        self.ensure(2)?;
        match self.peek_at(0) {
            Some(b'\n') => self.pos += 1,
            Some(b'\r') if self.peek_at(1) == Some(b'\n') => self.pos += 2,
            _ => {}
        }
        Ok(())
    }
}

/// Outcome of probing the ISA prefix: the discovered delimiter set and the
/// 16 raw ISA field values.
#[derive(Debug)]
pub(crate) struct IsaProbe {
    pub(crate) delimiters: Delimiters,
    pub(crate) fields: Vec<String>,
}

/// Probe the ISA prefix of `source`.
///
/// Byte 3 (right after the `"ISA"` id) is the element separator, byte 104 the
/// sub-element separator, byte 105 the segment terminator, and byte 82 (the
/// ISA11 field) the repetition separator. The probe parses by separators and
/// validates every field against the fixed widths, which is equivalent to
/// enforcing the 106-byte layout while still yielding a field-level message.
///
/// With `relaxed_whitespace`, a run of spaces between `"ISA"` and the first
/// element separator is skipped; some publisher samples pad the segment id.
pub(crate) fn probe_isa<R: Read>(
    source: &mut ByteSource<R>,
    relaxed_whitespace: bool,
    segment_index: usize,
) -> crate::Result<IsaProbe> {
    let start = source.offset();
    let io_err =
        |source: &ByteSource<R>, e| crate::Error::reader(segment_index, source.offset(), e);
    let malformed = |offset, message: String| crate::Error::MalformedIsa { offset, message };

    if source.ensure(3).map_err(|e| io_err(source, e))? < 3 {
        return Err(malformed(start, "input shorter than the ISA segment id".into()));
    }
    let id: Vec<u8> = (0..3).filter_map(|i| source.peek_at(i)).collect();
    if id != b"ISA" {
        return Err(malformed(start, "input does not begin with ISA".into()));
    }
    source.skip(3);

    if relaxed_whitespace {
        source.skip_spaces().map_err(|e| io_err(source, e))?;
    }

    if source.ensure(1).map_err(|e| io_err(source, e))? < 1 {
        return Err(malformed(source.offset(), "input ends after the ISA segment id".into()));
    }
    let element_separator = source.take_byte().unwrap_or_default();

    let mut fields = Vec::with_capacity(16);
    for (index, width) in ISA_FIELD_WIDTHS[..15].iter().enumerate() {
        let mut field = Vec::with_capacity(*width);
        loop {
            if source.ensure(1).map_err(|e| io_err(source, e))? < 1 {
                return Err(malformed(
                    source.offset(),
                    format!("input ends inside ISA{:02}", index + 1),
                ));
            }
            let byte = source.take_byte().unwrap_or_default();
            if byte == element_separator {
                break;
            }
            field.push(byte);
            if field.len() > *width {
                return Err(malformed(
                    source.offset(),
                    format!("ISA{:02} is wider than {width} characters", index + 1),
                ));
            }
        }
        if field.len() != *width {
            return Err(malformed(
                source.offset(),
                format!(
                    "ISA{:02} must be {width} characters, found {}",
                    index + 1,
                    field.len()
                ),
            ));
        }
        fields.push(String::from_utf8_lossy(&field).into_owned());
    }

    // ISA16 is the single sub-element separator byte, and the byte after it
    // is the segment terminator.
    if source.ensure(2).map_err(|e| io_err(source, e))? < 2 {
        return Err(malformed(
            source.offset(),
            "input ends before the ISA16 sub-element separator".into(),
        ));
    }
    let sub_element_separator = source.take_byte().unwrap_or_default();
    let segment_terminator = source.take_byte().unwrap_or_default();
    if segment_terminator == element_separator {
        return Err(malformed(
            source.offset(),
            "segment terminator equals the element separator".into(),
        ));
    }
    fields.push(String::from_utf8_lossy(&[sub_element_separator]).into_owned());

    let repetition_separator = fields[ISA_REPETITION_FIELD].as_bytes()[0];

    source.trim_newline().map_err(|e| io_err(source, e))?;

    Ok(IsaProbe {
        delimiters: Delimiters {
            segment_terminator,
            element_separator,
            sub_element_separator,
            repetition_separator,
        },
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL_ISA: &[u8] = b"ISA*00*          *00*          *08*9254110060     \
*ZZ*123456789      *041216*0805*U*00501*000095071*0*P*>~";

    #[test]
    fn test_default_delimiters() {
        let d = Delimiters::default();
        assert_eq!(d.segment_terminator, b'~');
        assert_eq!(d.element_separator, b'*');
        assert_eq!(d.sub_element_separator, b'>');
        assert_eq!(d.repetition_separator, b'^');
    }

    #[test]
    fn test_canonical_isa_is_106_bytes() {
        assert_eq!(CANONICAL_ISA.len(), ISA_SEGMENT_LENGTH);
    }

    #[test]
    fn test_probe_canonical_isa() {
        let mut source = ByteSource::new(CANONICAL_ISA);
        let probe = probe_isa(&mut source, false, 0).unwrap();

        assert_eq!(probe.delimiters.element_separator, b'*');
        assert_eq!(probe.delimiters.sub_element_separator, b'>');
        assert_eq!(probe.delimiters.segment_terminator, b'~');
        assert_eq!(probe.delimiters.repetition_separator, b'U');
        assert_eq!(probe.fields.len(), 16);
        assert_eq!(probe.fields[0], "00");
        assert_eq!(probe.fields[5], "9254110060     ");
        assert_eq!(probe.fields[12], "000095071");
        assert_eq!(probe.fields[15], ">");
    }

    #[test]
    fn test_probe_custom_delimiters() {
        let input = CANONICAL_ISA
            .iter()
            .map(|&b| match b {
                b'*' => b'|',
                b'>' => b':',
                b'~' => b'!',
                other => other,
            })
            .collect::<Vec<u8>>();
        let mut source = ByteSource::new(input.as_slice());
        let probe = probe_isa(&mut source, false, 0).unwrap();

        assert_eq!(probe.delimiters.element_separator, b'|');
        assert_eq!(probe.delimiters.sub_element_separator, b':');
        assert_eq!(probe.delimiters.segment_terminator, b'!');
    }

    #[test]
    fn test_probe_rejects_short_input() {
        let mut source = ByteSource::new(&CANONICAL_ISA[..40]);
        let err = probe_isa(&mut source, false, 0).unwrap_err();
        assert!(matches!(err, crate::Error::MalformedIsa { .. }), "{err}");
    }

    #[test]
    fn test_probe_rejects_wrong_prefix() {
        let mut source = ByteSource::new(&b"GS*AG*5137624388*123456789~"[..]);
        let err = probe_isa(&mut source, false, 0).unwrap_err();
        assert!(matches!(err, crate::Error::MalformedIsa { .. }), "{err}");
    }

    #[test]
    fn test_probe_rejects_missing_sixteenth_field() {
        // The segment ends `*P~` instead of `*P*>~`, so the usage indicator
        // field runs past its 1-character width into the next segment.
        let input = b"ISA*00*          *00*          *08*9254110060     \
*ZZ*123456789      *041216*0805*U*00501*000095071*0*P~GS*AG*X~";
        let mut source = ByteSource::new(&input[..]);
        let err = probe_isa(&mut source, false, 0).unwrap_err();
        assert!(matches!(err, crate::Error::MalformedIsa { .. }), "{err}");
    }

    #[test]
    fn test_probe_relaxed_whitespace() {
        let mut input = b"ISA ".to_vec();
        input.extend_from_slice(&CANONICAL_ISA[3..]);

        let mut strict = ByteSource::new(input.as_slice());
        assert!(probe_isa(&mut strict, false, 0).is_err());

        let mut relaxed = ByteSource::new(input.as_slice());
        let probe = probe_isa(&mut relaxed, true, 0).unwrap();
        assert_eq!(probe.delimiters.element_separator, b'*');
        assert_eq!(probe.fields[12], "000095071");
    }

    #[test]
    fn test_read_until_consumes_delimiter() {
        let mut source = ByteSource::new(&b"abc~def~"[..]);
        assert_eq!(source.read_until(b'~').unwrap(), Some(b"abc".to_vec()));
        assert_eq!(source.offset(), 4);
        assert_eq!(source.read_until(b'~').unwrap(), Some(b"def".to_vec()));
        assert_eq!(source.read_until(b'~').unwrap(), None);
    }

    #[test]
    fn test_read_until_leaves_leftover() {
        let mut source = ByteSource::new(&b"abc"[..]);
        assert_eq!(source.read_until(b'~').unwrap(), None);
        assert!(!source.leftover_is_whitespace());

        let mut source = ByteSource::new(&b"\r\n  "[..]);
        assert_eq!(source.read_until(b'~').unwrap(), None);
        assert!(source.leftover_is_whitespace());
    }

    #[test]
    fn test_trim_newline_variants() {
        let mut source = ByteSource::new(&b"\nX"[..]);
        source.trim_newline().unwrap();
        assert_eq!(source.peek_at(0), Some(b'X'));

        let mut source = ByteSource::new(&b"\r\nX"[..]);
        source.trim_newline().unwrap();
        assert_eq!(source.peek_at(0), Some(b'X'));

        let mut source = ByteSource::new(&b"X"[..]);
        source.trim_newline().unwrap();
        assert_eq!(source.peek_at(0), Some(b'X'));
    }
}
