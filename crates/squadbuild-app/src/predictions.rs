// Prediction table loading.
//
// Reads the CSV produced by the points-prediction pipeline: one row per
// player with name, position, predicted points and current cost. Rows are
// handed to the core untouched apart from trimming; integrity checks
// (duplicates, negative costs, unknown positions) happen when the pool is
// built.

use squadbuild_core::RawCandidate;
use std::io::Read;
use std::path::Path;
use tracing::debug;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("malformed prediction row {row}: {message}")]
    Row { row: usize, message: String },

    #[error("prediction table {path} has no rows")]
    Empty { path: String },
}

// ---------------------------------------------------------------------------
// Reader-based loader (enables testing without temp files)
// ---------------------------------------------------------------------------

/// Parse prediction rows from any reader. `label` names the source in errors.
///
/// A single malformed row fails the whole load; `row` in the error counts
/// data rows from 1, not counting the header.
pub fn load_predictions_from_reader<R: Read>(
    rdr: R,
    label: &str,
) -> Result<Vec<RawCandidate>, PredictionError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(rdr);

    reader.headers().map_err(|e| PredictionError::Csv {
        path: label.to_string(),
        source: e,
    })?;

    let mut rows = Vec::new();
    for (i, result) in reader.deserialize::<RawCandidate>().enumerate() {
        let raw = result.map_err(|e| PredictionError::Row {
            row: i + 1,
            message: e.to_string(),
        })?;
        rows.push(raw);
    }

    if rows.is_empty() {
        return Err(PredictionError::Empty {
            path: label.to_string(),
        });
    }

    debug!("loaded {} prediction rows from {}", rows.len(), label);
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Path-based loader
// ---------------------------------------------------------------------------

pub fn load_predictions(path: &Path) -> Result<Vec<RawCandidate>, PredictionError> {
    let file = std::fs::File::open(path).map_err(|e| PredictionError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_predictions_from_reader(file, &path.display().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
