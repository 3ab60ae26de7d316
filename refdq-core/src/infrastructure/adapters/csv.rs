// refdq-core/src/infrastructure/adapters/csv.rs

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::domain::upload::StagedDataset;
use crate::error::RefdqError;
use crate::infrastructure::error::InfrastructureError;

/// Reads an uploaded CSV file. The first record is the header row.
pub fn read_csv(path: &Path) -> Result<StagedDataset, RefdqError> {
    let file = File::open(path).map_err(|e| {
        InfrastructureError::Io(std::io::Error::new(
            e.kind(),
            format!("Opening upload {}: {e}", path.display()),
        ))
    })?;
    parse_csv(BufReader::new(file))
}

pub fn parse_csv<R: Read>(reader: R) -> Result<StagedDataset, RefdqError> {
    // Row length is checked by the dataset so the error names the row.
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .double_quote(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(InfrastructureError::from)?
        .clone();

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(InfrastructureError::from)?;
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    let dataset = StagedDataset::from_records(headers.iter(), records)?;
    tracing::debug!(
        "Read upload: {} columns, {} rows",
        dataset.columns().len(),
        dataset.len()
    );
    Ok(dataset)
}
