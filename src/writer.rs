use std::path::Path;

use log::info;

use crate::{SwingError, swings::SwingRecord};

/// Write `records` to `file` as JSON Lines, in list order. Diagnostic fields
/// are never written.
pub fn export_records(file: &Path, records: &[SwingRecord]) -> Result<(), SwingError> {
    serde_jsonlines::write_json_lines(file, records)
        .map_err(|e| SwingError::WriterError { source: e })?;
    info!("Exported {} swings to {:?}", records.len(), file);
    Ok(())
}
