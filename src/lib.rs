pub mod analysis;
pub mod cli;
pub mod config;
pub mod drive;
pub mod export;
pub mod models;
pub mod reporting;

use thiserror::Error;

/// Top-level error type for rfp-report.
#[derive(Debug, Error)]
pub enum RfpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Export error: {0}")]
    Export(#[from] export::ExportError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] analysis::AnalysisError),

    #[error("{0}")]
    Drive(#[from] drive::DriveError),
}
