use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Expected a FeatureCollection, found {0}")]
    NotAFeatureCollection(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Invalid date bound: {0}")]
    InvalidDate(String),

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("Malformed filter argument: {0}")]
    MalformedFilter(String),

    #[error("Dataset contains no usable rows")]
    EmptyDataset,
}
