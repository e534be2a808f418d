//! Generic segment and element model.
//!
//! Everything between ST and SE is kept generic: the X12 segment universe is
//! open, and transaction-set-specific meaning is a higher-layer concern. The
//! codec only splits bytes into positional elements and puts them back.

use serde::{Deserialize, Serialize};

/// A positional field within a segment.
///
/// `id` is the two-digit position label (`"01"`, `"02"`, ...). An element
/// that contained the sub-element separator carries its pieces in
/// `components` and an empty `value`; an element with empty `value` and no
/// components is an omitted field whose position is still framed by
/// delimiters, and it survives a round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Two-digit position label within the segment.
    pub id: String,
    /// Raw field value; empty when the element is omitted or composite.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    /// Sub-element components, present only when the field contained the
    /// sub-element separator.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
}

impl Element {
    /// Build a simple element at position `index` (1-based).
    pub fn new(index: usize, value: impl Into<String>) -> Self {
        Self {
            id: position_label(index),
            value: value.into(),
            components: Vec::new(),
        }
    }

    /// Build a composite element at position `index` (1-based).
    pub fn with_components(index: usize, components: Vec<String>) -> Self {
        Self {
            id: position_label(index),
            value: String::new(),
            components,
        }
    }

    /// Whether this element is a composite (contained the sub-element
    /// separator in the source).
    pub fn is_composite(&self) -> bool {
        !self.components.is_empty()
    }
}

/// Render a 1-based element position as its two-digit label.
pub fn position_label(index: usize) -> String {
    format!("{index:02}")
}

/// One delimited segment: a 2-3 character id followed by positional elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment identifier, e.g. `BGN` or `N1`.
    pub id: String,
    /// Elements in source order, trailing empties included.
    pub elements: Vec<Element>,
}

impl Segment {
    /// Build a segment with the given id and no elements.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            elements: Vec::new(),
        }
    }

    /// Build a segment from element values in positional order.
    pub fn with_values<I, S>(id: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            elements: values
                .into_iter()
                .enumerate()
                .map(|(i, v)| Element::new(i + 1, v))
                .collect(),
        }
    }

    /// The element at 1-based position `index`, if present.
    pub fn element(&self, index: usize) -> Option<&Element> {
        index.checked_sub(1).and_then(|i| self.elements.get(i))
    }
}
