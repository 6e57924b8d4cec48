// error.rs

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading boundary or time-series sources.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column '{0}' in header")]
    MissingColumn(&'static str),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON parse error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("boundary document is not a FeatureCollection")]
    NotAFeatureCollection,
}
