use std::fmt;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

use wgpu::naga;

/// Pipeline stage a shader source is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Compute,
    Vertex,
    Fragment,
}

impl StageKind {
    pub(crate) fn naga_stage(self) -> naga::ShaderStage {
        match self {
            StageKind::Compute => naga::ShaderStage::Compute,
            StageKind::Vertex => naga::ShaderStage::Vertex,
            StageKind::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Compute => f.write_str("compute"),
            StageKind::Vertex => f.write_str("vertex"),
            StageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Where a build request currently stands.
///
/// ```text
///   Unbuilt ─▶ SourceLoaded ─▶ StagesCompiled ─▶ Linked
///                    │                 │
///                    ▼                 ▼
///              CompileFailed      LinkFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Unbuilt,
    SourceLoaded,
    StagesCompiled,
    Linked,
    CompileFailed,
    LinkFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramKind {
    /// A single compute stage.
    Compute,
    /// A vertex stage followed by a fragment stage.
    Render,
}

/// Opaque identifier of a linked program. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(NonZeroU64);

impl ProgramHandle {
    pub(crate) fn new(raw: NonZeroU64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

/// A stage that survived compilation and linking, ready to be realised on a
/// device.
#[derive(Debug, Clone)]
pub struct LinkedStage {
    pub kind: StageKind,
    pub origin: PathBuf,
    pub(crate) module: naga::Module,
}

impl LinkedStage {
    pub fn module(&self) -> &naga::Module {
        &self.module
    }
}

/// Executable combination of one or two linked stages.
///
/// A `Program` only exists once every attached stage compiled and the link
/// step succeeded, so holding one means it is ready.
#[derive(Debug, Clone)]
pub struct Program {
    kind: ProgramKind,
    handle: ProgramHandle,
    stages: Vec<LinkedStage>,
    diagnostics: String,
}

impl Program {
    pub(crate) fn new(
        kind: ProgramKind,
        handle: ProgramHandle,
        stages: Vec<LinkedStage>,
        diagnostics: String,
    ) -> Self {
        Self {
            kind,
            handle,
            stages,
            diagnostics,
        }
    }

    pub fn kind(&self) -> ProgramKind {
        self.kind
    }

    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    pub fn diagnostics(&self) -> &str {
        &self.diagnostics
    }

    pub fn stages(&self) -> &[LinkedStage] {
        &self.stages
    }

    pub fn stage(&self, kind: StageKind) -> Option<&LinkedStage> {
        self.stages.iter().find(|stage| stage.kind == kind)
    }

    /// Source path of the first stage, used for labels and log lines.
    pub fn origin(&self) -> &Path {
        self.stages
            .first()
            .map(|stage| stage.origin.as_path())
            .unwrap_or_else(|| Path::new(""))
    }
}
