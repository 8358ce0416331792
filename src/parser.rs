//! CSV parser for roster, objective and grade uploads.
//!
//! Every upload shares one shape: a header row, a `student_number` and
//! `student_name` column, an optional `student_email` column, and for each
//! tracked objective a pair of columns named `<id>_top` and `<id>_second`. Rows are turned into typed
//! [`UploadRow`]s here so the ingestion code never looks at raw cells.

use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;

use crate::models::Outcome;

pub const STUDENT_NUMBER_COLUMN: &str = "student_number";
pub const STUDENT_NAME_COLUMN: &str = "student_name";
/// Sign-in email of the student. Links a student-role account to the class.
pub const STUDENT_EMAIL_COLUMN: &str = "student_email";

const TOP_SUFFIX: &str = "_top";
const SECOND_SUFFIX: &str = "_second";

/// How to treat header columns that fit none of the known patterns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Unknown, blank or malformed columns are ignored.
    #[default]
    Lenient,
    /// Any column that is not a student column or a well-formed objective
    /// column rejects the whole upload.
    Strict,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file uploaded. Please choose a CSV file to upload.")]
    Empty,

    #[error("upload is missing the required '{0}' column")]
    MissingColumn(&'static str),

    #[error("unrecognised column '{0}' in upload header")]
    UnexpectedColumn(String),

    #[error("upload is not valid CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Which attempt an objective column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Top,
    Second,
}

/// Splits `LO1_top` into `("LO1", Top)`. Returns `None` when the suffix is
/// missing or the id in front of it is empty.
fn objective_column(name: &str) -> Option<(&str, Slot)> {
    let (id, slot) = if let Some(id) = name.strip_suffix(TOP_SUFFIX) {
        (id, Slot::Top)
    } else if let Some(id) = name.strip_suffix(SECOND_SUFFIX) {
        (id, Slot::Second)
    } else {
        return None;
    };

    if id.trim().is_empty() {
        None
    } else {
        Some((id, slot))
    }
}

/// Column positions of one objective's attempt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectiveColumns {
    pub id: String,
    top: Option<usize>,
    second: Option<usize>,
}

impl ObjectiveColumns {
    pub fn has_top(&self) -> bool {
        self.top.is_some()
    }
}

/// The interpreted header row of an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadHeader {
    student_number: Option<usize>,
    student_name: Option<usize>,
    student_email: Option<usize>,
    /// Objectives in the order their first column appears.
    pub objectives: Vec<ObjectiveColumns>,
}

impl UploadHeader {
    pub fn from_record(headers: &StringRecord, mode: ParseMode) -> Result<Self, UploadError> {
        let mut header = UploadHeader::default();

        for (idx, raw) in headers.iter().enumerate() {
            // Spreadsheet exports often lead with a byte-order mark.
            let name = raw.trim_start_matches('\u{feff}').trim();

            if name == STUDENT_NUMBER_COLUMN {
                header.student_number = Some(idx);
                continue;
            }
            if name == STUDENT_NAME_COLUMN {
                header.student_name = Some(idx);
                continue;
            }
            if name == STUDENT_EMAIL_COLUMN {
                header.student_email = Some(idx);
                continue;
            }

            let Some((id, slot)) = objective_column(name) else {
                if mode == ParseMode::Strict {
                    return Err(UploadError::UnexpectedColumn(name.to_string()));
                }
                continue;
            };

            let pos = match header.objectives.iter().position(|o| o.id == id) {
                Some(pos) => pos,
                None => {
                    header.objectives.push(ObjectiveColumns {
                        id: id.to_string(),
                        top: None,
                        second: None,
                    });
                    header.objectives.len() - 1
                }
            };
            let columns = &mut header.objectives[pos];
            match slot {
                Slot::Top => columns.top = Some(idx),
                Slot::Second => columns.second = Some(idx),
            }
        }

        Ok(header)
    }

    /// Fails unless the named student column is present.
    pub fn require(&self, column: &'static str) -> Result<(), UploadError> {
        let present = match column {
            STUDENT_NUMBER_COLUMN => self.student_number.is_some(),
            STUDENT_NAME_COLUMN => self.student_name.is_some(),
            STUDENT_EMAIL_COLUMN => self.student_email.is_some(),
            _ => false,
        };
        if present {
            Ok(())
        } else {
            Err(UploadError::MissingColumn(column))
        }
    }

    /// Objective ids that carry a `<id>_top` column, de-duplicated.
    pub fn defined_objectives(&self) -> impl Iterator<Item = &str> {
        self.objectives
            .iter()
            .filter(|o| o.has_top())
            .map(|o| o.id.as_str())
    }
}

/// One objective's outcome pair as read from a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectiveOutcome {
    pub objective_id: String,
    pub top: Outcome,
    pub second: Outcome,
}

/// A typed data row of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRow {
    /// 1-based line number in the source file, for log messages.
    pub line: u64,
    pub student_number: String,
    pub student_name: String,
    /// Lowercased; `None` when the column is absent or the cell blank.
    pub student_email: Option<String>,
    pub outcomes: Vec<ObjectiveOutcome>,
}

/// A fully parsed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub header: UploadHeader,
    pub rows: Vec<UploadRow>,
    /// Rows dropped because their student number was blank.
    pub skipped_rows: usize,
}

fn reader(bytes: &[u8]) -> Result<csv::Reader<&[u8]>, UploadError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(UploadError::Empty);
    }
    Ok(ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes))
}

/// Reads only the header row. Used where the data rows do not matter, such
/// as objective definition uploads.
pub fn parse_header(bytes: &[u8], mode: ParseMode) -> Result<UploadHeader, UploadError> {
    let mut rdr = reader(bytes)?;
    UploadHeader::from_record(rdr.headers()?, mode)
}

/// Parses a whole upload into typed rows.
///
/// # Errors
///
/// Returns [`UploadError::Empty`] for blank input,
/// [`UploadError::MissingColumn`] if `student_number` is absent, and
/// [`UploadError::UnexpectedColumn`] for stray columns in strict mode.
pub fn parse_upload(bytes: &[u8], mode: ParseMode) -> Result<Upload, UploadError> {
    let mut rdr = reader(bytes)?;
    let header = UploadHeader::from_record(rdr.headers()?, mode)?;
    header.require(STUDENT_NUMBER_COLUMN)?;

    let cell = |record: &StringRecord, idx: Option<usize>| -> String {
        idx.and_then(|i| record.get(i)).unwrap_or("").to_string()
    };
    let outcome = |record: &StringRecord, idx: Option<usize>| -> Outcome {
        idx.and_then(|i| record.get(i))
            .map(Outcome::from_cell)
            .unwrap_or_default()
    };

    let mut rows = Vec::new();
    let mut skipped_rows = 0;

    for result in rdr.records() {
        let record = result?;
        let student_number = cell(&record, header.student_number);
        if student_number.is_empty() {
            skipped_rows += 1;
            continue;
        }

        let outcomes = header
            .objectives
            .iter()
            .map(|columns| ObjectiveOutcome {
                objective_id: columns.id.clone(),
                top: outcome(&record, columns.top),
                second: outcome(&record, columns.second),
            })
            .collect();

        rows.push(UploadRow {
            line: record.position().map_or(0, |p| p.line()),
            student_number,
            student_name: cell(&record, header.student_name),
            student_email: Some(cell(&record, header.student_email).to_lowercase())
                .filter(|email| !email.is_empty()),
            outcomes,
        });
    }

    Ok(Upload {
        header,
        rows,
        skipped_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "student_number,student_name,LO1_top,LO1_second,LO2_top,LO2_second\n\
                          1,Alice,M,M,X,M\n\
                          2,Bob,,X,M,\n";

    #[test]
    fn test_parse_empty_bytes_is_rejected() {
        assert!(matches!(parse_upload(b"", ParseMode::Lenient), Err(UploadError::Empty)));
        assert!(matches!(parse_upload(b" \n\n", ParseMode::Lenient), Err(UploadError::Empty)));
        assert!(matches!(parse_header(b"", ParseMode::Lenient), Err(UploadError::Empty)));
    }

    #[test]
    fn test_parse_sample_rows() {
        let upload = parse_upload(SAMPLE.as_bytes(), ParseMode::Lenient).unwrap();
        assert_eq!(upload.rows.len(), 2);
        assert_eq!(upload.skipped_rows, 0);

        let alice = &upload.rows[0];
        assert_eq!(alice.student_number, "1");
        assert_eq!(alice.student_name, "Alice");
        assert_eq!(alice.line, 2);
        assert_eq!(
            alice.outcomes,
            vec![
                ObjectiveOutcome {
                    objective_id: "LO1".into(),
                    top: Outcome::Mastered,
                    second: Outcome::Mastered,
                },
                ObjectiveOutcome {
                    objective_id: "LO2".into(),
                    top: Outcome::NotMastered,
                    second: Outcome::Mastered,
                },
            ]
        );

        let bob = &upload.rows[1];
        assert_eq!(bob.outcomes[0].top, Outcome::Unset);
        assert_eq!(bob.outcomes[0].second, Outcome::NotMastered);
        assert_eq!(bob.outcomes[1].second, Outcome::Unset);
    }

    #[test]
    fn test_objective_with_only_second_column() {
        let csv = "student_number,student_name,LO9_second\n7,Cy,M\n";
        let upload = parse_upload(csv.as_bytes(), ParseMode::Lenient).unwrap();
        let outcome = &upload.rows[0].outcomes[0];
        assert_eq!(outcome.objective_id, "LO9");
        assert_eq!(outcome.top, Outcome::Unset);
        assert_eq!(outcome.second, Outcome::Mastered);
        assert_eq!(upload.header.defined_objectives().count(), 0);
    }

    #[test]
    fn test_missing_student_number_column() {
        let csv = "student_name,LO1_top\nAlice,M\n";
        let err = parse_upload(csv.as_bytes(), ParseMode::Lenient).unwrap_err();
        assert!(matches!(err, UploadError::MissingColumn(STUDENT_NUMBER_COLUMN)));
    }

    #[test]
    fn test_blank_student_number_rows_are_skipped() {
        let csv = "student_number,student_name,LO1_top\n,Ghost,M\n3,Real,M\n";
        let upload = parse_upload(csv.as_bytes(), ParseMode::Lenient).unwrap();
        assert_eq!(upload.rows.len(), 1);
        assert_eq!(upload.skipped_rows, 1);
        assert_eq!(upload.rows[0].student_name, "Real");
    }

    #[test]
    fn test_short_rows_read_as_unset() {
        let csv = "student_number,student_name,LO1_top,LO1_second\n4,Dee\n";
        let upload = parse_upload(csv.as_bytes(), ParseMode::Lenient).unwrap();
        assert_eq!(upload.rows[0].outcomes[0].top, Outcome::Unset);
        assert_eq!(upload.rows[0].outcomes[0].second, Outcome::Unset);
    }

    #[test]
    fn test_lenient_ignores_odd_columns() {
        let csv = "\u{feff}student_number,student_name,,_top,notes,LO1_top\n1,A,x,M,hi,M\n";
        let upload = parse_upload(csv.as_bytes(), ParseMode::Lenient).unwrap();
        let ids: Vec<_> = upload.header.objectives.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["LO1"]);
        assert_eq!(upload.rows[0].student_number, "1");
    }

    #[test]
    fn test_strict_rejects_odd_columns() {
        let csv = "student_number,student_name,notes,LO1_top\n1,A,hi,M\n";
        let err = parse_upload(csv.as_bytes(), ParseMode::Strict).unwrap_err();
        assert!(matches!(err, UploadError::UnexpectedColumn(ref c) if c == "notes"));

        let csv = "student_number,student_name,_second\n1,A,M\n";
        let err = parse_upload(csv.as_bytes(), ParseMode::Strict).unwrap_err();
        assert!(matches!(err, UploadError::UnexpectedColumn(ref c) if c == "_second"));

        assert!(parse_upload(SAMPLE.as_bytes(), ParseMode::Strict).is_ok());
    }

    #[test]
    fn test_student_email_column() {
        let csv = "student_number,student_name,student_email,LO1_top
                   1,Ana,Ana.Smith@School.test,M
                   2,Bo,,M
";
        let upload = parse_upload(csv.as_bytes(), ParseMode::Strict).unwrap();
        assert_eq!(upload.rows[0].student_email.as_deref(), Some("ana.smith@school.test"));
        assert_eq!(upload.rows[1].student_email, None);
        assert_eq!(upload.header.objectives.len(), 1);

        let upload = parse_upload(SAMPLE.as_bytes(), ParseMode::Lenient).unwrap();
        assert!(upload.rows.iter().all(|row| row.student_email.is_none()));
    }

    #[test]
    fn test_defined_objectives_deduplicated_in_order() {
        let csv = "LO2_top,LO1_top,LO2_second,LO2_top\n";
        let header = parse_header(csv.as_bytes(), ParseMode::Lenient).unwrap();
        let ids: Vec<_> = header.defined_objectives().collect();
        assert_eq!(ids, vec!["LO2", "LO1"]);
    }
}
