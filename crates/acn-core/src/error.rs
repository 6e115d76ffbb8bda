use std::path::PathBuf;

use thiserror::Error;

/// Reading embedded metadata failed (as opposed to the metadata simply being absent).
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed EXIF in {path:?}: {source}")]
    Exif {
        path: PathBuf,
        #[source]
        source: exif::Error,
    },

    #[error("Malformed container in {path:?}: {reason}")]
    Container { path: PathBuf, reason: String },
}

/// A file could not be fingerprinted.
#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("Failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// A filename does not follow the normalized naming scheme.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NameParseError {
    #[error("Not a normalized filename: {0}")]
    NoMatch(String),

    #[error("Invalid number in {name}: {field}")]
    InvalidNumber { name: String, field: &'static str },
}

/// Configuration loading error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
