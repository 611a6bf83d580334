use std::path::PathBuf;
use thiserror::Error;

use crate::model::FileKind;

#[derive(Error, Debug)]
pub enum HirelensError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),

    #[error("Enrichment error: {0}")]
    Enrichment(#[from] crate::enrichment::EnrichmentError),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] crate::evaluator::EvaluationError),

    #[error("Notification error: {0}")]
    Notification(#[from] crate::notifier::NotificationError),

    #[error("Callback error: {0}")]
    Callback(#[from] crate::notifier::CallbackError),

    #[error("Report error: {0}")]
    Report(#[from] crate::report::ReportError),

    #[error("Intake error: {0}")]
    Intake(#[from] crate::intake::IntakeError),

    #[error("Trigger rejected: {0}")]
    Trigger(#[from] crate::worker::TriggerError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Unknown text encoding '{0}'")]
    UnknownEncoding(String),
}

/// Failures turning resume bytes into plain text.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Document contains no extractable text")]
    EmptyDocument,

    #[error("Could not decode text with any of: {tried}")]
    UndecodableText { tried: String },

    #[error("Failed to parse {kind} document: {cause}")]
    ParseFailure { kind: FileKind, cause: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read blob '{blob}': {source}")]
    ReadBlob {
        blob: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to delete blob '{blob}': {source}")]
    DeleteBlob {
        blob: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid blob reference: {0}")]
    InvalidRef(String),

    #[error("Could not find a free file name for '{0}'")]
    NameExhausted(PathBuf),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to spawn worker: {0}")]
    SpawnFailed(String),

    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Failed to build async runtime: {0}")]
    Runtime(String),
}

pub type Result<T> = std::result::Result<T, HirelensError>;
