//! Error types for mddoc operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while converting a document.
///
/// Malformed markup is never an error; only undecodable input fails the
/// parser. The remaining variants come from the tool and render layers.
#[derive(Error, Debug)]
pub enum Error {
    #[error("input is not valid UTF-8: {0}")]
    InvalidInput(#[from] std::str::Utf8Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid template: {0}")]
    Template(#[from] toml::de::Error),

    #[error("failed to parse config file at {path}: {source}")]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid color {0:?}, expected #RRGGBB")]
    InvalidColor(String),

    #[error("Typst compilation failed: {0}")]
    Compile(String),

    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

pub type Result<T> = std::result::Result<T, Error>;
