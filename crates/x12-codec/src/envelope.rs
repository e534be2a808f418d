//! Named-field records for the six envelope segments.
//!
//! ISA, GS, ST, SE, GE and IEA are parsed into typed records rather than
//! generic segments because the tree builder and the validator address their
//! fields by name (control numbers, declared counts). Mapping is strictly
//! positional; an envelope segment with the wrong number of fields is
//! rejected by the caller as malformed.

use serde::{Deserialize, Serialize};

use crate::segment::{Element, Segment};
use crate::syntax::Delimiters;

/// Interchange Control Header (ISA). Sixteen fixed-width fields; field
/// values keep their padding verbatim so the segment reproduces byte for
/// byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Isa {
    /// ISA01, 2 characters.
    pub authorization_info_qualifier: String,
    /// ISA02, 10 characters.
    pub authorization_information: String,
    /// ISA03, 2 characters.
    pub security_info_qualifier: String,
    /// ISA04, 10 characters.
    pub security_info: String,
    /// ISA05, 2 characters.
    pub sender_id_qualifier: String,
    /// ISA06, 15 characters.
    pub sender_id: String,
    /// ISA07, 2 characters.
    pub receiver_id_qualifier: String,
    /// ISA08, 15 characters.
    pub receiver_id: String,
    /// ISA09, 6 characters (YYMMDD).
    pub date: String,
    /// ISA10, 4 characters (HHMM).
    pub time: String,
    /// ISA11, 1 character. The repetition separator in 00501 and later.
    pub control_standards_id: String,
    /// ISA12, 5 characters.
    pub control_version: String,
    /// ISA13, 9 characters, zero-padded. Must match IEA02.
    pub control_number: String,
    /// ISA14, 1 character.
    pub acknowledgment_requested: String,
    /// ISA15, 1 character (`P` production / `T` test).
    pub usage_indicator: String,
    /// ISA16, 1 character: the sub-element separator itself.
    pub component_element_separator: String,
}

impl Isa {
    /// Number of ISA fields.
    pub const FIELD_COUNT: usize = 16;

    /// Map the 16 probed field values onto the record.
    pub(crate) fn from_fields(fields: &[String]) -> Result<Self, String> {
        if fields.len() != Self::FIELD_COUNT {
            return Err(format!(
                "ISA must have {} fields, found {}",
                Self::FIELD_COUNT,
                fields.len()
            ));
        }
        let mut fields = fields.iter().cloned();
        let mut next = || fields.next().unwrap_or_default();
        Ok(Self {
            authorization_info_qualifier: next(),
            authorization_information: next(),
            security_info_qualifier: next(),
            security_info: next(),
            sender_id_qualifier: next(),
            sender_id: next(),
            receiver_id_qualifier: next(),
            receiver_id: next(),
            date: next(),
            time: next(),
            control_standards_id: next(),
            control_version: next(),
            control_number: next(),
            acknowledgment_requested: next(),
            usage_indicator: next(),
            component_element_separator: next(),
        })
    }

    /// Map a tokenised ISA segment onto the record. Used when the caller
    /// supplied the delimiter set and the ISA was not probed.
    pub(crate) fn from_segment(
        segment: &Segment,
        delimiters: &Delimiters,
    ) -> Result<Self, String> {
        let fields = raw_fields(segment, delimiters);
        Self::from_fields(&fields)
    }

    /// ISA01 through ISA15. ISA16 is rendered from the delimiter set in use.
    pub(crate) fn leading_fields(&self) -> [&str; 15] {
        [
            &self.authorization_info_qualifier,
            &self.authorization_information,
            &self.security_info_qualifier,
            &self.security_info,
            &self.sender_id_qualifier,
            &self.sender_id,
            &self.receiver_id_qualifier,
            &self.receiver_id,
            &self.date,
            &self.time,
            &self.control_standards_id,
            &self.control_version,
            &self.control_number,
            &self.acknowledgment_requested,
            &self.usage_indicator,
        ]
    }
}

/// Functional Group Header (GS).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gs {
    /// GS01, functional identifier code (e.g. `AG`, `HC`).
    pub functional_id_code: String,
    /// GS02.
    pub application_sender_code: String,
    /// GS03.
    pub application_receiver_code: String,
    /// GS04 (CCYYMMDD).
    pub date: String,
    /// GS05.
    pub time: String,
    /// GS06. Must match GE02.
    pub group_control_number: String,
    /// GS07, responsible agency code (`X` for X12).
    pub responsible_agency_code: String,
    /// GS08, version/release/industry identifier.
    pub version_release_industry_id: String,
}

impl Gs {
    /// Number of GS fields.
    pub const FIELD_COUNT: usize = 8;

    pub(crate) fn from_segment(
        segment: &Segment,
        delimiters: &Delimiters,
    ) -> Result<Self, String> {
        let fields = exact_fields(segment, delimiters, Self::FIELD_COUNT)?;
        let mut fields = fields.into_iter();
        let mut next = || fields.next().unwrap_or_default();
        Ok(Self {
            functional_id_code: next(),
            application_sender_code: next(),
            application_receiver_code: next(),
            date: next(),
            time: next(),
            group_control_number: next(),
            responsible_agency_code: next(),
            version_release_industry_id: next(),
        })
    }

    pub(crate) fn fields(&self) -> [&str; 8] {
        [
            &self.functional_id_code,
            &self.application_sender_code,
            &self.application_receiver_code,
            &self.date,
            &self.time,
            &self.group_control_number,
            &self.responsible_agency_code,
            &self.version_release_industry_id,
        ]
    }
}

/// Transaction Set Header (ST).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct St {
    /// ST01, transaction set identifier code (e.g. `824`, `837`).
    pub transaction_set_id_code: String,
    /// ST02. Must match SE02.
    pub transaction_set_control_number: String,
    /// ST03, optional; its presence is preserved across a round-trip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation_convention_reference: Option<String>,
}

impl St {
    pub(crate) fn from_segment(
        segment: &Segment,
        delimiters: &Delimiters,
    ) -> Result<Self, String> {
        let fields = raw_fields(segment, delimiters);
        if fields.len() < 2 || fields.len() > 3 {
            return Err(format!("ST must have 2 or 3 fields, found {}", fields.len()));
        }
        let mut fields = fields.into_iter();
        Ok(Self {
            transaction_set_id_code: fields.next().unwrap_or_default(),
            transaction_set_control_number: fields.next().unwrap_or_default(),
            implementation_convention_reference: fields.next(),
        })
    }

    pub(crate) fn fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.transaction_set_id_code.as_str(),
            self.transaction_set_control_number.as_str(),
        ];
        if let Some(reference) = &self.implementation_convention_reference {
            fields.push(reference);
        }
        fields
    }
}

/// Transaction Set Trailer (SE).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Se {
    /// SE01: count of segments from ST through SE inclusive.
    pub number_of_included_segments: String,
    /// SE02. Must match ST02.
    pub transaction_set_control_number: String,
}

impl Se {
    pub(crate) fn from_segment(
        segment: &Segment,
        delimiters: &Delimiters,
    ) -> Result<Self, String> {
        let fields = exact_fields(segment, delimiters, 2)?;
        let mut fields = fields.into_iter();
        Ok(Self {
            number_of_included_segments: fields.next().unwrap_or_default(),
            transaction_set_control_number: fields.next().unwrap_or_default(),
        })
    }

    pub(crate) fn fields(&self) -> [&str; 2] {
        [
            &self.number_of_included_segments,
            &self.transaction_set_control_number,
        ]
    }
}

/// Functional Group Trailer (GE).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ge {
    /// GE01: count of transaction sets in the group.
    pub number_of_included_transaction_sets: String,
    /// GE02. Must match GS06.
    pub group_control_number: String,
}

impl Ge {
    pub(crate) fn from_segment(
        segment: &Segment,
        delimiters: &Delimiters,
    ) -> Result<Self, String> {
        let fields = exact_fields(segment, delimiters, 2)?;
        let mut fields = fields.into_iter();
        Ok(Self {
            number_of_included_transaction_sets: fields.next().unwrap_or_default(),
            group_control_number: fields.next().unwrap_or_default(),
        })
    }

    pub(crate) fn fields(&self) -> [&str; 2] {
        [
            &self.number_of_included_transaction_sets,
            &self.group_control_number,
        ]
    }
}

/// Interchange Control Trailer (IEA).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Iea {
    /// IEA01: count of functional groups in the interchange.
    pub number_of_included_functional_groups: String,
    /// IEA02. Must match ISA13.
    pub interchange_control_number: String,
}

impl Iea {
    pub(crate) fn from_segment(
        segment: &Segment,
        delimiters: &Delimiters,
    ) -> Result<Self, String> {
        let fields = exact_fields(segment, delimiters, 2)?;
        let mut fields = fields.into_iter();
        Ok(Self {
            number_of_included_functional_groups: fields.next().unwrap_or_default(),
            interchange_control_number: fields.next().unwrap_or_default(),
        })
    }

    pub(crate) fn fields(&self) -> [&str; 2] {
        [
            &self.number_of_included_functional_groups,
            &self.interchange_control_number,
        ]
    }
}

/// Flatten a tokenised segment's elements back to raw field text, re-joining
/// any component split with the sub-element separator.
fn raw_fields(segment: &Segment, delimiters: &Delimiters) -> Vec<String> {
    segment.elements.iter().map(|e| raw_value(e, delimiters)).collect()
}

fn raw_value(element: &Element, delimiters: &Delimiters) -> String {
    if element.is_composite() {
        let joiner = char::from(delimiters.sub_element_separator).to_string();
        element.components.join(&joiner)
    } else {
        element.value.clone()
    }
}

fn exact_fields(
    segment: &Segment,
    delimiters: &Delimiters,
    count: usize,
) -> Result<Vec<String>, String> {
    let fields = raw_fields(segment, delimiters);
    if fields.len() != count {
        return Err(format!(
            "{} must have {count} fields, found {}",
            segment.id,
            fields.len()
        ));
    }
    Ok(fields)
}
