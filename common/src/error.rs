use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{} not found.", path.display())]
    MissingInput { path: PathBuf },
    #[error("Malformed benchmark table {}", path.display())]
    MalformedInput {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Rendering {} failed: {message}", path.display())]
    Render { path: PathBuf, message: String },
    #[error("Invalid settings: {0}")]
    Config(String),
    #[error("Parse settings {}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },
}

pub type Result<T, E = ReportError> = std::result::Result<T, E>;
