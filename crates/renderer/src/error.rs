use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::frame::FrameError;
use crate::program::StageKind;

/// Failure modes of a program build request.
///
/// Variants are ordered the way a build reports them: resource problems stop
/// the request before anything is compiled, compile failures stop it before
/// linking, and link failures are reported last.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{stage} shader source not found at {}", path.display())]
    ResourceNotFound {
        stage: StageKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read {stage} shader source at {}", path.display())]
    ResourceRead {
        stage: StageKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("shader compilation failed:\n{diagnostics}")]
    Compile { diagnostics: String },
    #[error("program link failed:\n{diagnostics}")]
    Link { diagnostics: String },
}

impl BuildError {
    /// Diagnostic text accumulated by the compiler or linker, if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            BuildError::Compile { diagnostics } | BuildError::Link { diagnostics } => {
                Some(diagnostics.as_str())
            }
            _ => None,
        }
    }

    /// Stage whose source could not be loaded.
    pub fn stage(&self) -> Option<StageKind> {
        match self {
            BuildError::ResourceNotFound { stage, .. } | BuildError::ResourceRead { stage, .. } => {
                Some(*stage)
            }
            _ => None,
        }
    }
}

/// Fatal errors raised while bringing up the window and GPU context, or
/// while the frame loop runs.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to create window: {0}")]
    WindowCreation(String),
    #[error("failed to initialise GPU context: {0:#}")]
    ContextInit(#[source] anyhow::Error),
    #[error("rendering stopped: {0}")]
    Frame(#[from] FrameError),
}

impl StartupError {
    pub(crate) fn window(err: impl std::fmt::Display) -> Self {
        StartupError::WindowCreation(err.to_string())
    }
}
