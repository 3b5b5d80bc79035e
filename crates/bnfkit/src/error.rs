//! Error types.

use std::{io, path::PathBuf};

/// Failures while processing a single grammar file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("Invalid grammar file: {}", .0.display())]
    InvalidGrammarDocument(PathBuf),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("grammar compiler failed: {0:#}")]
    Generate(anyhow::Error),
}

/// A type name could not be reconstructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("no candidate name for type `{type_name}`")]
    EmptyCandidates { type_name: String },
}
