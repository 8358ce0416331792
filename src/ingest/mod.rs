//! Upserting uploaded CSV content into the gradebook store.
//!
//! Ingestion is best-effort and non-transactional: rows are written one at a
//! time and a storage failure part-way through leaves earlier rows in place.

mod grades;
mod objectives;
mod roster;

pub use grades::ingest_grades;
pub use objectives::ingest_objectives;
pub use roster::ingest_roster;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::parser::{UploadError, UploadRow};
use crate::services::GradebookStore;

#[derive(Debug, Error)]
pub enum IngestError {
    /// The upload itself was unusable; nothing was written.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// The backend failed; rows before the failure stay written.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Counts of what a roster or grade upload did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Data rows processed.
    pub rows: usize,
    /// Data rows ignored for having no student number.
    pub skipped_rows: usize,
    pub students_created: usize,
    pub grades_inserted: usize,
    pub grades_updated: usize,
    /// Outcomes dropped because their objective does not exist in the class.
    pub grades_skipped: usize,
}

/// Returns the id of the class's student numbered like `row`, creating the
/// student if there is none. The flag is `true` on creation.
///
/// An existing student keeps their name, but picks up the row's email when
/// it differs from the stored one.
pub(crate) async fn find_or_create_student<S>(
    store: &S,
    class_id: i64,
    row: &UploadRow,
) -> anyhow::Result<(i64, bool)>
where
    S: GradebookStore + ?Sized,
{
    let email = row.student_email.as_deref();

    if let Some(student) = store.find_student(class_id, &row.student_number).await? {
        if let Some(email) = email.filter(|e| student.email.as_deref() != Some(*e)) {
            store.set_student_email(student.id, email).await?;
            debug!(class_id, student_id = student.id, "Updated student email");
        }
        return Ok((student.id, false));
    }

    let id = store
        .insert_student(class_id, &row.student_number, &row.student_name, email)
        .await?;
    debug!(
        class_id,
        student_number = %row.student_number,
        student_id = id,
        "Created student"
    );
    Ok((id, true))
}
