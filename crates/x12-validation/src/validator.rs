//! The envelope walk checking each invariant.
//!
//! Control numbers are compared as strings, exactly as they appear on the
//! wire; declared counts are parsed as decimal integers and compared
//! numerically, so `07` still satisfies a count of seven while a non-numeric
//! declaration is reported as its own kind of violation.

use x12_codec::{Document, FunctionGroup, Interchange, Transaction};

use crate::violations::{Invariant, ValidationReport, Violation};

/// Checks the envelope cross-references of a decoded document.
///
/// Pure and infallible: the walk collects every violation rather than
/// stopping at the first, and a structurally sound document with no
/// mismatches yields an empty report.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeValidator;

impl EnvelopeValidator {
    /// Create a new envelope validator.
    pub fn new() -> Self {
        Self
    }

    /// Validate every interchange in the document.
    pub fn validate(&self, document: &Document) -> ValidationReport {
        let mut report = ValidationReport::new();
        for (index, interchange) in document.interchanges.iter().enumerate() {
            let path = if index == 0 {
                "interchange".to_string()
            } else {
                format!("interchange[{index}]")
            };
            self.validate_interchange(interchange, &path, &mut report);
        }
        report
    }

    fn validate_interchange(
        &self,
        interchange: &Interchange,
        path: &str,
        report: &mut ValidationReport,
    ) {
        if interchange.trailer.interchange_control_number != interchange.header.control_number {
            report.add(Violation::new(
                path,
                Invariant::InterchangeControlNumber,
                &interchange.header.control_number,
                &interchange.trailer.interchange_control_number,
            ));
        }
        check_count(
            report,
            path,
            Invariant::FunctionalGroupCount,
            &interchange.trailer.number_of_included_functional_groups,
            interchange.function_groups.len(),
        );
        for (index, group) in interchange.function_groups.iter().enumerate() {
            let group_path = format!("{path}.function_groups[{index}]");
            self.validate_group(group, &group_path, report);
        }
    }

    fn validate_group(&self, group: &FunctionGroup, path: &str, report: &mut ValidationReport) {
        if group.trailer.group_control_number != group.header.group_control_number {
            report.add(Violation::new(
                path,
                Invariant::GroupControlNumber,
                &group.header.group_control_number,
                &group.trailer.group_control_number,
            ));
        }
        check_count(
            report,
            path,
            Invariant::TransactionCount,
            &group.trailer.number_of_included_transaction_sets,
            group.transactions.len(),
        );
        for (index, transaction) in group.transactions.iter().enumerate() {
            let transaction_path = format!("{path}.transactions[{index}]");
            self.validate_transaction(transaction, &transaction_path, report);
        }
    }

    fn validate_transaction(
        &self,
        transaction: &Transaction,
        path: &str,
        report: &mut ValidationReport,
    ) {
        if transaction.trailer.transaction_set_control_number
            != transaction.header.transaction_set_control_number
        {
            report.add(Violation::new(
                path,
                Invariant::TransactionControlNumber,
                &transaction.header.transaction_set_control_number,
                &transaction.trailer.transaction_set_control_number,
            ));
        }
        check_count(
            report,
            path,
            Invariant::SegmentCount,
            &transaction.trailer.number_of_included_segments,
            transaction.enclosed_segment_count(),
        );
    }
}

/// Compare a declared count against the actual one, reporting a
/// `NonNumericCount` when the declaration does not parse.
fn check_count(
    report: &mut ValidationReport,
    path: &str,
    invariant: Invariant,
    declared: &str,
    actual: usize,
) {
    match declared.parse::<u64>() {
        Ok(count) if count == actual as u64 => {}
        Ok(_) => report.add(Violation::new(
            path,
            invariant,
            actual.to_string(),
            declared,
        )),
        Err(_) => report.add(Violation::new(
            path,
            Invariant::NonNumericCount,
            actual.to_string(),
            declared,
        )),
    }
}

/// Validate with a default [`EnvelopeValidator`].
pub fn validate(document: &Document) -> ValidationReport {
    EnvelopeValidator::new().validate(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use x12_codec::decode;

    const SAMPLE: &str = "ISA*00*          *00*          *08*9254110060     *ZZ*123456789      \
*041216*0805*U*00501*000095071*0*P*>~GS*AG*5137624388*123456789*20041216*0805*95071*X*005010~\
ST*824*021390001*005010X186A1~BGN*11*FFA.ABCDEF.123456*20020709*0932**123456789**WQ~\
SE*3*021390001~GE*1*95071~IEA*1*000095071~";

    #[test]
    fn test_valid_document_yields_empty_report() {
        let document = decode(SAMPLE.as_bytes()).unwrap();
        let report = validate(&document);
        assert!(report.is_valid(), "{:?}", report.violations);
    }

    #[test]
    fn test_interchange_control_number_mismatch() {
        let input = SAMPLE.replace("IEA*1*000095071~", "IEA*1*000095072~");
        let report = validate(&decode(input.as_bytes()).unwrap());

        assert_eq!(report.count(), 1);
        let violation = &report.violations[0];
        assert_eq!(violation.invariant, Invariant::InterchangeControlNumber);
        assert_eq!(violation.path, "interchange");
        assert_eq!(violation.expected, "000095071");
        assert_eq!(violation.observed, "000095072");
    }

    #[test]
    fn test_group_control_number_mismatch() {
        let input = SAMPLE.replace("GE*1*95071~", "GE*1*95072~");
        let report = validate(&decode(input.as_bytes()).unwrap());

        assert_eq!(report.count(), 1);
        let violation = &report.violations[0];
        assert_eq!(violation.invariant, Invariant::GroupControlNumber);
        assert_eq!(violation.path, "interchange.function_groups[0]");
    }

    #[test]
    fn test_segment_count_mismatch() {
        let input = SAMPLE.replace("SE*3*", "SE*9*");
        let report = validate(&decode(input.as_bytes()).unwrap());

        assert_eq!(report.count(), 1);
        let violation = &report.violations[0];
        assert_eq!(violation.invariant, Invariant::SegmentCount);
        assert_eq!(
            violation.path,
            "interchange.function_groups[0].transactions[0]"
        );
        assert_eq!(violation.expected, "3");
        assert_eq!(violation.observed, "9");
    }

    #[test]
    fn test_zero_padded_count_still_satisfies() {
        let input = SAMPLE.replace("SE*3*", "SE*03*");
        let report = validate(&decode(input.as_bytes()).unwrap());
        assert!(report.is_valid());
    }

    #[test]
    fn test_non_numeric_count() {
        let input = SAMPLE.replace("SE*3*", "SE*three*");
        let report = validate(&decode(input.as_bytes()).unwrap());

        assert_eq!(report.count(), 1);
        let violation = &report.violations[0];
        assert_eq!(violation.invariant, Invariant::NonNumericCount);
        assert_eq!(violation.observed, "three");
    }

    #[test]
    fn test_transaction_control_number_mismatch() {
        let input = SAMPLE.replace("SE*3*021390001~", "SE*3*021390002~");
        let report = validate(&decode(input.as_bytes()).unwrap());

        assert_eq!(report.count(), 1);
        assert_eq!(
            report.violations[0].invariant,
            Invariant::TransactionControlNumber
        );
    }

    #[test]
    fn test_multiple_violations_are_all_reported() {
        let input = SAMPLE
            .replace("SE*3*", "SE*9*")
            .replace("GE*1*95071~", "GE*2*95072~")
            .replace("IEA*1*", "IEA*3*");
        let report = validate(&decode(input.as_bytes()).unwrap());

        // One broken trailer per level: segment count, group control number,
        // transaction count, functional group count.
        assert_eq!(report.count(), 4);
        let kinds: Vec<Invariant> = report.iter().map(|v| v.invariant).collect();
        assert!(kinds.contains(&Invariant::SegmentCount));
        assert!(kinds.contains(&Invariant::GroupControlNumber));
        assert!(kinds.contains(&Invariant::TransactionCount));
        assert!(kinds.contains(&Invariant::FunctionalGroupCount));
    }
}
