//! Error types for document ingestion and entity collections

use std::fmt;
use std::io;

/// Error loading or applying a scene document
#[derive(Debug)]
pub enum DocumentError {
    /// IO error (file not found, permission denied, etc.)
    Io(io::Error),
    /// Parse error (invalid RON syntax or shape)
    Parse(ron::error::SpannedError),
    /// Malformed `start/stop` interval
    InvalidInterval(String),
    /// Malformed timestamp
    InvalidTime(String),
    /// A directions list whose length does not match its encoding
    InvalidDirections(String),
    /// Adding an entity to the collection failed
    Collection(CollectionError),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::Io(e) => write!(f, "IO error: {}", e),
            DocumentError::Parse(e) => write!(f, "Parse error: {}", e),
            DocumentError::InvalidInterval(s) => write!(f, "Invalid interval: {}", s),
            DocumentError::InvalidTime(s) => write!(f, "Invalid time: {}", s),
            DocumentError::InvalidDirections(s) => write!(f, "Invalid directions: {}", s),
            DocumentError::Collection(e) => write!(f, "Collection error: {}", e),
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocumentError::Io(e) => Some(e),
            DocumentError::Parse(e) => Some(e),
            DocumentError::Collection(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DocumentError {
    fn from(e: io::Error) -> Self {
        DocumentError::Io(e)
    }
}

impl From<ron::error::SpannedError> for DocumentError {
    fn from(e: ron::error::SpannedError) -> Self {
        DocumentError::Parse(e)
    }
}

impl From<CollectionError> for DocumentError {
    fn from(e: CollectionError) -> Self {
        DocumentError::Collection(e)
    }
}

/// Error mutating an [`EntityCollection`](crate::EntityCollection)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// An entity with this id is already present
    DuplicateId(String),
    /// No entity with this id exists
    UnknownId(String),
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionError::DuplicateId(id) => {
                write!(f, "An entity with id '{}' already exists", id)
            }
            CollectionError::UnknownId(id) => write!(f, "No entity with id '{}'", id),
        }
    }
}

impl std::error::Error for CollectionError {}
