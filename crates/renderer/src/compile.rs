//! Shader program construction.
//!
//! Every build request walks the same path:
//!
//! 1. Load all stage sources. A missing or unreadable resource aborts the
//!    request before anything is compiled.
//! 2. Compile each stage through naga's GLSL frontend and validate it.
//!    Sibling stages are always attempted so the caller sees every broken
//!    stage at once; diagnostics are appended in declaration order.
//! 3. Link: check entry points and, for render programs, that every fragment
//!    input is fed by a vertex output of the same type.
//!
//! The resulting [`Program`] holds validated naga modules which the GPU layer
//! turns into pipelines; per-stage validation info is dropped once linked.

use std::error::Error as StdError;
use std::fmt::Write as _;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

use wgpu::naga::{self, front::glsl, valid};

use crate::error::BuildError;
use crate::program::{
    BuildState, LinkedStage, Program, ProgramHandle, ProgramKind, StageKind,
};
use crate::source::{load_source, ShaderSource};

/// Builds compute and render programs from GLSL stage sources.
#[derive(Debug)]
pub struct ProgramBuilder {
    state: BuildState,
    next_handle: NonZeroU64,
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self {
            state: BuildState::Unbuilt,
            next_handle: NonZeroU64::MIN,
        }
    }
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// State reached by the most recent build request.
    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Loads, compiles, and links a single compute stage.
    pub fn build_compute(&mut self, path: &Path) -> Result<Program, BuildError> {
        self.state = BuildState::Unbuilt;
        let source = load_source(path, StageKind::Compute)?;
        self.build_compute_source(source)
    }

    pub fn build_compute_source(&mut self, source: ShaderSource) -> Result<Program, BuildError> {
        self.state = BuildState::SourceLoaded;
        let mut diagnostics = Diagnostics::default();

        let Some(stage) = compile_stage(StageKind::Compute, &source, &mut diagnostics) else {
            return Err(self.compile_failed(diagnostics));
        };
        self.state = BuildState::StagesCompiled;

        if let Err(message) = link_compute(&stage) {
            diagnostics.push(StageKind::Compute, &stage.origin, &message);
            return Err(self.link_failed(diagnostics));
        }

        Ok(self.finish(ProgramKind::Compute, vec![stage], diagnostics))
    }

    /// Loads both stages, compiles both, and links only if both compiled.
    pub fn build_render(
        &mut self,
        vertex_path: &Path,
        fragment_path: &Path,
    ) -> Result<Program, BuildError> {
        self.state = BuildState::Unbuilt;
        let vertex = load_source(vertex_path, StageKind::Vertex)?;
        let fragment = load_source(fragment_path, StageKind::Fragment)?;
        self.build_render_sources(vertex, fragment)
    }

    pub fn build_render_sources(
        &mut self,
        vertex: ShaderSource,
        fragment: ShaderSource,
    ) -> Result<Program, BuildError> {
        self.state = BuildState::SourceLoaded;
        let mut diagnostics = Diagnostics::default();

        let vertex_stage = compile_stage(StageKind::Vertex, &vertex, &mut diagnostics);
        let fragment_stage = compile_stage(StageKind::Fragment, &fragment, &mut diagnostics);

        let (Some(vertex_stage), Some(fragment_stage)) = (vertex_stage, fragment_stage) else {
            return Err(self.compile_failed(diagnostics));
        };
        self.state = BuildState::StagesCompiled;

        if let Err(message) = link_render(&vertex_stage, &fragment_stage) {
            diagnostics.push(StageKind::Fragment, &fragment_stage.origin, &message);
            return Err(self.link_failed(diagnostics));
        }

        Ok(self.finish(
            ProgramKind::Render,
            vec![vertex_stage, fragment_stage],
            diagnostics,
        ))
    }

    fn compile_failed(&mut self, diagnostics: Diagnostics) -> BuildError {
        self.state = BuildState::CompileFailed;
        BuildError::Compile {
            diagnostics: diagnostics.into_string(),
        }
    }

    fn link_failed(&mut self, diagnostics: Diagnostics) -> BuildError {
        self.state = BuildState::LinkFailed;
        BuildError::Link {
            diagnostics: diagnostics.into_string(),
        }
    }

    fn finish(
        &mut self,
        kind: ProgramKind,
        stages: Vec<CompiledStage>,
        diagnostics: Diagnostics,
    ) -> Program {
        self.state = BuildState::Linked;
        let handle = ProgramHandle::new(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);

        let stages = stages
            .into_iter()
            .map(|stage| LinkedStage {
                kind: stage.kind,
                origin: stage.origin,
                module: stage.module,
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            ?kind,
            handle = handle.get(),
            stages = stages.len(),
            "linked shader program"
        );
        Program::new(kind, handle, stages, diagnostics.into_string())
    }
}

/// Growable diagnostic text, one segment per failing stage.
#[derive(Debug, Default)]
struct Diagnostics {
    text: String,
}

impl Diagnostics {
    fn push(&mut self, stage: StageKind, origin: &Path, message: &str) {
        let _ = writeln!(self.text, "{stage} stage ({}):", origin.display());
        for line in message.lines() {
            let _ = writeln!(self.text, "  {line}");
        }
    }

    fn into_string(self) -> String {
        self.text
    }
}

struct CompiledStage {
    kind: StageKind,
    origin: PathBuf,
    module: naga::Module,
}

fn compile_stage(
    kind: StageKind,
    source: &ShaderSource,
    diagnostics: &mut Diagnostics,
) -> Option<CompiledStage> {
    let mut frontend = glsl::Frontend::default();
    let options = glsl::Options::from(kind.naga_stage());

    let module = match frontend.parse(&options, &source.text) {
        Ok(module) => module,
        Err(errors) => {
            let mut message = String::new();
            for error in &errors.errors {
                let location = error.meta.location(&source.text);
                let _ = writeln!(
                    message,
                    "{}:{}: {}",
                    location.line_number, location.line_position, error.kind
                );
            }
            diagnostics.push(kind, &source.path, &message);
            return None;
        }
    };

    let mut validator = valid::Validator::new(
        valid::ValidationFlags::all(),
        valid::Capabilities::default(),
    );
    if let Err(err) = validator.validate(&module) {
        let mut message = error_chain(err.as_inner());
        for (span, label) in err.spans() {
            let location = span.location(&source.text);
            let _ = write!(
                message,
                "\n{}:{}: {label}",
                location.line_number, location.line_position
            );
        }
        diagnostics.push(kind, &source.path, &message);
        return None;
    }

    Some(CompiledStage {
        kind,
        origin: source.path.clone(),
        module,
    })
}

fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        let _ = write!(message, ": {inner}");
        cause = inner.source();
    }
    message
}

fn entry_point(module: &naga::Module, stage: naga::ShaderStage) -> Option<&naga::EntryPoint> {
    module.entry_points.iter().find(|entry| entry.stage == stage)
}

fn link_compute(stage: &CompiledStage) -> Result<(), String> {
    let entry = entry_point(&stage.module, naga::ShaderStage::Compute)
        .ok_or_else(|| "no compute entry point defined".to_string())?;
    if entry.workgroup_size.contains(&0) {
        return Err(format!(
            "compute entry point '{}' has an empty workgroup size {:?}",
            entry.name, entry.workgroup_size
        ));
    }
    Ok(())
}

fn link_render(vertex: &CompiledStage, fragment: &CompiledStage) -> Result<(), String> {
    let vertex_entry = entry_point(&vertex.module, naga::ShaderStage::Vertex)
        .ok_or_else(|| "no vertex entry point defined".to_string())?;
    let fragment_entry = entry_point(&fragment.module, naga::ShaderStage::Fragment)
        .ok_or_else(|| "no fragment entry point defined".to_string())?;

    let outputs = vertex_outputs(&vertex.module, vertex_entry);
    let inputs = fragment_inputs(&fragment.module, fragment_entry);

    let mut errors = Vec::new();
    for (location, input) in &inputs {
        match outputs.iter().find(|(candidate, _)| candidate == location) {
            None => errors.push(format!(
                "fragment input at location {location} is not written by the vertex stage"
            )),
            Some((_, output)) if output != input => errors.push(format!(
                "fragment input at location {location} is {input:?} but the vertex stage writes {output:?}"
            )),
            Some(_) => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("\n"))
    }
}

type Interface = Vec<(u32, naga::TypeInner)>;

fn vertex_outputs(module: &naga::Module, entry: &naga::EntryPoint) -> Interface {
    let mut interface = Vec::new();
    if let Some(result) = &entry.function.result {
        collect_locations(module, result.ty, result.binding.as_ref(), &mut interface);
    }
    interface
}

fn fragment_inputs(module: &naga::Module, entry: &naga::EntryPoint) -> Interface {
    let mut interface = Vec::new();
    for argument in &entry.function.arguments {
        collect_locations(module, argument.ty, argument.binding.as_ref(), &mut interface);
    }
    interface
}

fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    interface: &mut Interface,
) {
    let inner = &module.types[ty].inner;
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            interface.push((*location, inner.clone()));
        }
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = inner {
                for member in members {
                    if let Some(naga::Binding::Location { location, .. }) = &member.binding {
                        interface.push((*location, module.types[member.ty].inner.clone()));
                    }
                }
            }
        }
    }
}
