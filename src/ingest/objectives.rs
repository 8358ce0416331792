use tracing::info;

use super::IngestError;
use crate::parser::{ParseMode, parse_header};
use crate::services::GradebookStore;

/// Creates a learning objective for every `<id>_top` column in the upload
/// header that the class does not have yet. Returns the names created, so a
/// repeated upload returns an empty list.
#[tracing::instrument(skip(store, bytes), fields(bytes = bytes.len()))]
pub async fn ingest_objectives<S>(
    store: &S,
    class_id: i64,
    bytes: &[u8],
    mode: ParseMode,
) -> Result<Vec<String>, IngestError>
where
    S: GradebookStore + ?Sized,
{
    let header = parse_header(bytes, mode)?;
    let mut created = Vec::new();

    for name in header.defined_objectives() {
        if store.find_objective(class_id, name).await?.is_some() {
            continue;
        }
        store.insert_objective(class_id, name).await?;
        created.push(name.to_string());
    }

    info!(created = created.len(), "Objective upload ingested");
    Ok(created)
}
