use tracing::info;

use super::{IngestError, IngestReport, find_or_create_student};
use crate::parser::{ParseMode, STUDENT_NAME_COLUMN, parse_upload};
use crate::services::GradebookStore;

/// Enrolls every student of a roster upload that the class does not know
/// yet. Objective columns, if any, are ignored.
#[tracing::instrument(skip(store, bytes), fields(bytes = bytes.len()))]
pub async fn ingest_roster<S>(
    store: &S,
    class_id: i64,
    bytes: &[u8],
    mode: ParseMode,
) -> Result<IngestReport, IngestError>
where
    S: GradebookStore + ?Sized,
{
    let upload = parse_upload(bytes, mode)?;
    upload.header.require(STUDENT_NAME_COLUMN)?;

    let mut report = IngestReport {
        skipped_rows: upload.skipped_rows,
        ..IngestReport::default()
    };

    for row in &upload.rows {
        report.rows += 1;
        let (_, created) = find_or_create_student(store, class_id, row).await?;
        if created {
            report.students_created += 1;
        }
    }

    info!(
        rows = report.rows,
        students_created = report.students_created,
        "Roster upload ingested"
    );
    Ok(report)
}
