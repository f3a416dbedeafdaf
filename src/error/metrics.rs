use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Histogram error during {context}: {source}")]
    Histogram {
        context: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Failed to write summary export '{path}': {source}")]
    WriteExport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode summary export: {source}")]
    EncodeExport {
        #[source]
        source: serde_json::Error,
    },
}
