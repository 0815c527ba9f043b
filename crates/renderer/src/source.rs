use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::BuildError;
use crate::program::StageKind;

/// Full text of a shader resource read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub path: PathBuf,
    pub text: String,
}

impl ShaderSource {
    /// Byte length of the loaded text.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Reads a shader resource fully into memory.
///
/// A resource that cannot be opened is reported as not found. Anything that
/// goes wrong after opening (length query, short read, invalid UTF-8) is a
/// read error. No partial text is ever returned.
pub fn load_source(path: &Path, stage: StageKind) -> Result<ShaderSource, BuildError> {
    let mut file = File::open(path).map_err(|source| BuildError::ResourceNotFound {
        stage,
        path: path.to_path_buf(),
        source,
    })?;

    let read_error = |source| BuildError::ResourceRead {
        stage,
        path: path.to_path_buf(),
        source,
    };

    let expected = file.metadata().map_err(read_error)?.len();
    let mut bytes = Vec::with_capacity(expected as usize);
    file.read_to_end(&mut bytes).map_err(read_error)?;

    let text = String::from_utf8(bytes).map_err(|err| {
        read_error(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })?;

    tracing::trace!(path = %path.display(), %stage, bytes = text.len(), "loaded shader source");
    Ok(ShaderSource {
        path: path.to_path_buf(),
        text,
    })
}
