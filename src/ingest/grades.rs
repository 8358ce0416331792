use std::collections::HashMap;
use tracing::{debug, info};

use super::{IngestError, IngestReport, find_or_create_student};
use crate::parser::{ParseMode, parse_upload};
use crate::services::GradebookStore;

/// Records every outcome pair of a grade upload against the class.
///
/// Students are matched by number and created on first sight. Outcomes for
/// objectives the class does not define are skipped and counted in
/// [`IngestReport::grades_skipped`]. Existing grades are updated in place,
/// so re-running the same upload changes nothing.
#[tracing::instrument(skip(store, bytes), fields(bytes = bytes.len()))]
pub async fn ingest_grades<S>(
    store: &S,
    class_id: i64,
    bytes: &[u8],
    mode: ParseMode,
) -> Result<IngestReport, IngestError>
where
    S: GradebookStore + ?Sized,
{
    let upload = parse_upload(bytes, mode)?;
    let mut report = IngestReport {
        skipped_rows: upload.skipped_rows,
        ..IngestReport::default()
    };

    // Objectives are never created here, so one lookup per id is enough.
    let mut objectives: HashMap<String, Option<i64>> = HashMap::new();

    for row in &upload.rows {
        report.rows += 1;
        let (student_id, created) = find_or_create_student(store, class_id, row).await?;
        if created {
            report.students_created += 1;
        }

        for outcome in &row.outcomes {
            let objective_id = match objectives.get(&outcome.objective_id) {
                Some(known) => *known,
                None => {
                    let found = store
                        .find_objective(class_id, &outcome.objective_id)
                        .await?
                        .map(|o| o.id);
                    objectives.insert(outcome.objective_id.clone(), found);
                    found
                }
            };

            let Some(objective_id) = objective_id else {
                debug!(
                    line = row.line,
                    objective = %outcome.objective_id,
                    "Objective not defined for class, skipping grade"
                );
                report.grades_skipped += 1;
                continue;
            };

            match store.find_grade(student_id, objective_id).await? {
                Some(grade) => {
                    store
                        .update_grade(grade.id, outcome.top, outcome.second)
                        .await?;
                    report.grades_updated += 1;
                }
                None => {
                    store
                        .insert_grade(student_id, objective_id, outcome.top, outcome.second)
                        .await?;
                    report.grades_inserted += 1;
                }
            }
        }
    }

    info!(
        rows = report.rows,
        students_created = report.students_created,
        grades_inserted = report.grades_inserted,
        grades_updated = report.grades_updated,
        grades_skipped = report.grades_skipped,
        "Grade upload ingested"
    );
    Ok(report)
}
