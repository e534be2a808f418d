//! Serialisation of a document tree back to delimited bytes.
//!
//! Decoding then marshalling reproduces the input byte for byte (modulo the
//! newline policy): envelope records emit every named field in order
//! including blanks, generic segments keep their trailing empty elements,
//! and composite elements re-join on the sub-element separator. Each
//! interchange is written with its own stored delimiter set unless the
//! marshaller overrides it.

use std::io::Write;

use crate::document::{Document, FunctionGroup, Interchange, Transaction};
use crate::segment::{Element, Segment};
use crate::syntax::Delimiters;
use crate::{Error, Result};

/// Writes a [`Document`] back to bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Marshaler {
    /// Append a `\n` after each segment terminator.
    pub new_lines: bool,
    /// Override the delimiter set stored on each interchange.
    pub delimiters: Option<Delimiters>,
}

impl Marshaler {
    /// A marshaller with default options: no line breaks, stored delimiters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marshal the document to an owned byte buffer.
    pub fn marshal(&self, document: &Document) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.marshal_to_writer(document, &mut out)?;
        Ok(out)
    }

    /// Marshal the document to a writer, each interchange in order.
    pub fn marshal_to_writer<W: Write>(&self, document: &Document, writer: &mut W) -> Result<()> {
        for interchange in &document.interchanges {
            self.write_interchange(interchange, writer)?;
        }
        Ok(())
    }

    fn write_interchange<W: Write>(
        &self,
        interchange: &Interchange,
        writer: &mut W,
    ) -> Result<()> {
        let delimiters = self.delimiters.unwrap_or(interchange.delimiters);

        self.write_isa(interchange, &delimiters, writer)?;
        for group in &interchange.function_groups {
            self.write_function_group(group, &delimiters, writer)?;
        }
        self.write_envelope("IEA", &interchange.trailer.fields(), &delimiters, writer)
    }

    /// ISA01 through ISA15 come from the record; ISA16 is the sub-element
    /// separator of the set in use, so an overridden delimiter set stays
    /// self-describing.
    fn write_isa<W: Write>(
        &self,
        interchange: &Interchange,
        delimiters: &Delimiters,
        writer: &mut W,
    ) -> Result<()> {
        put(writer, b"ISA")?;
        for field in interchange.header.leading_fields() {
            put(writer, &[delimiters.element_separator])?;
            put(writer, field.as_bytes())?;
        }
        put(writer, &[delimiters.element_separator])?;
        put(writer, &[delimiters.sub_element_separator])?;
        self.finish_segment(delimiters, writer)
    }

    fn write_function_group<W: Write>(
        &self,
        group: &FunctionGroup,
        delimiters: &Delimiters,
        writer: &mut W,
    ) -> Result<()> {
        self.write_envelope("GS", &group.header.fields(), delimiters, writer)?;
        for transaction in &group.transactions {
            self.write_transaction(transaction, delimiters, writer)?;
        }
        self.write_envelope("GE", &group.trailer.fields(), delimiters, writer)
    }

    fn write_transaction<W: Write>(
        &self,
        transaction: &Transaction,
        delimiters: &Delimiters,
        writer: &mut W,
    ) -> Result<()> {
        self.write_envelope("ST", &transaction.header.fields(), delimiters, writer)?;
        for segment in &transaction.segments {
            self.write_segment(segment, delimiters, writer)?;
        }
        self.write_envelope("SE", &transaction.trailer.fields(), delimiters, writer)
    }

    fn write_envelope<W: Write>(
        &self,
        id: &str,
        fields: &[&str],
        delimiters: &Delimiters,
        writer: &mut W,
    ) -> Result<()> {
        put(writer, id.as_bytes())?;
        for field in fields {
            put(writer, &[delimiters.element_separator])?;
            put(writer, field.as_bytes())?;
        }
        self.finish_segment(delimiters, writer)
    }

    fn write_segment<W: Write>(
        &self,
        segment: &Segment,
        delimiters: &Delimiters,
        writer: &mut W,
    ) -> Result<()> {
        put(writer, segment.id.as_bytes())?;
        for element in &segment.elements {
            put(writer, &[delimiters.element_separator])?;
            write_element(element, delimiters, writer)?;
        }
        self.finish_segment(delimiters, writer)
    }

    fn finish_segment<W: Write>(&self, delimiters: &Delimiters, writer: &mut W) -> Result<()> {
        put(writer, &[delimiters.segment_terminator])?;
        if self.new_lines {
            put(writer, b"\n")?;
        }
        Ok(())
    }
}

fn write_element<W: Write>(
    element: &Element,
    delimiters: &Delimiters,
    writer: &mut W,
) -> Result<()> {
    if element.is_composite() {
        for (i, component) in element.components.iter().enumerate() {
            if i > 0 {
                put(writer, &[delimiters.sub_element_separator])?;
            }
            put(writer, component.as_bytes())?;
        }
        Ok(())
    } else {
        put(writer, element.value.as_bytes())
    }
}

fn put<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    writer.write_all(bytes).map_err(|source| Error::Writer { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;

    const SAMPLE: &str = "ISA*00*          *00*          *08*9254110060     *ZZ*123456789      \
*041216*0805*U*00501*000095071*0*P*>~GS*AG*5137624388*123456789*20041216*0805*95071*X*005010~\
ST*824*021390001*005010X186A1~OTI*TA*TN*NA***20020709*0902*2*0001*834*005010X220A1~\
SE*3*021390001~GE*1*95071~IEA*1*000095071~";

    #[test]
    fn test_marshal_reproduces_input() {
        let document = decode(SAMPLE.as_bytes()).unwrap();
        let encoded = Marshaler::new().marshal(&document).unwrap();
        assert_eq!(String::from_utf8(encoded).unwrap(), SAMPLE);
    }

    #[test]
    fn test_marshal_with_new_lines() {
        let document = decode(SAMPLE.as_bytes()).unwrap();
        let marshaller = Marshaler {
            new_lines: true,
            ..Marshaler::new()
        };
        let encoded = String::from_utf8(marshaller.marshal(&document).unwrap()).unwrap();
        assert_eq!(encoded.matches('\n').count(), 7);
        assert!(encoded.ends_with("IEA*1*000095071~\n"));
    }

    #[test]
    fn test_marshal_keeps_trailing_empty_elements() {
        let input = SAMPLE.replace(
            "OTI*TA*TN*NA***20020709*0902*2*0001*834*005010X220A1~",
            "OTI*TA*TN*NA***20020709*0902*2**~",
        );
        let document = decode(input.as_bytes()).unwrap();
        let encoded = Marshaler::new().marshal(&document).unwrap();
        assert_eq!(String::from_utf8(encoded).unwrap(), input);
    }

    #[test]
    fn test_marshal_renders_components() {
        let input = SAMPLE.replace(
            "OTI*TA*TN*NA***20020709*0902*2*0001*834*005010X220A1~",
            "SV1*HC>99213>A*500~",
        );
        let document = decode(input.as_bytes()).unwrap();
        let encoded = Marshaler::new().marshal(&document).unwrap();
        assert_eq!(String::from_utf8(encoded).unwrap(), input);
    }

    #[test]
    fn test_marshal_with_overridden_delimiters() {
        let document = decode(SAMPLE.as_bytes()).unwrap();
        let marshaller = Marshaler {
            delimiters: Some(Delimiters {
                segment_terminator: b'!',
                element_separator: b'|',
                sub_element_separator: b':',
                repetition_separator: b'^',
            }),
            ..Marshaler::new()
        };
        let encoded = String::from_utf8(marshaller.marshal(&document).unwrap()).unwrap();
        assert!(encoded.starts_with("ISA|00|"));
        assert!(encoded.contains("|P|:!GS|AG|"));
        assert!(encoded.ends_with("IEA|1|000095071!"));
    }
}
