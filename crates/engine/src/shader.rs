//! WGSL program building.
//!
//! A program is a vertex stage and a fragment stage loaded from separate
//! files. Each stage is parsed and validated with naga ("compile"), then the
//! pair is checked for interface compatibility ("link"):
//!
//! - each stage has an entry point of its kind,
//! - every fragment input location is written by the vertex stage with the
//!   same type,
//! - uniform blocks declared at the same `(group, binding)` in both stages
//!   have the same size.
//!
//! wgpu has no geometry stage; a geometry path is read and then rejected.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::error::{ShaderError, UniformError};
use crate::uniform::UniformBlock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
    Geometry,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
            Stage::Geometry => "geometry",
        };
        f.write_str(name)
    }
}

/// One parsed and validated stage.
#[derive(Debug, Clone)]
pub struct CompiledStage {
    path: PathBuf,
    source: String,
    module: naga::Module,
    entry_point: String,
}

impl CompiledStage {
    pub fn module(&self) -> &naga::Module {
        &self.module
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }
}

/// A linked vertex + fragment program.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    vertex: CompiledStage,
    fragment: CompiledStage,
}

/// GPU shader modules created from a [`ShaderProgram`].
pub struct GpuProgram {
    pub vertex: wgpu::ShaderModule,
    pub fragment: wgpu::ShaderModule,
    pub vertex_entry: String,
    pub fragment_entry: String,
}

impl ShaderProgram {
    /// Read, compile and link a program from source files.
    ///
    /// All files are read before anything is compiled.
    pub fn build(
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
        geometry_path: Option<&Path>,
    ) -> Result<Self, ShaderError> {
        let vertex_path = vertex_path.as_ref();
        let fragment_path = fragment_path.as_ref();

        let vertex_source = read_stage(Stage::Vertex, vertex_path)?;
        let fragment_source = read_stage(Stage::Fragment, fragment_path)?;
        if let Some(path) = geometry_path {
            read_stage(Stage::Geometry, path)?;
            return Err(ShaderError::UnsupportedStage(Stage::Geometry));
        }

        let program = Self::from_wgsl(
            (vertex_path, vertex_source),
            (fragment_path, fragment_source),
        )?;
        tracing::debug!(
            vertex = %vertex_path.display(),
            fragment = %fragment_path.display(),
            "shader program linked"
        );
        Ok(program)
    }

    /// Compile and link from in-memory sources. The paths only label
    /// diagnostics.
    pub fn from_wgsl(
        vertex: (impl AsRef<Path>, String),
        fragment: (impl AsRef<Path>, String),
    ) -> Result<Self, ShaderError> {
        let vertex = compile_stage(Stage::Vertex, vertex.0.as_ref(), vertex.1)?;
        let fragment = compile_stage(Stage::Fragment, fragment.0.as_ref(), fragment.1)?;
        link(&vertex, &fragment)?;
        Ok(Self { vertex, fragment })
    }

    pub fn vertex(&self) -> &CompiledStage {
        &self.vertex
    }

    pub fn fragment(&self) -> &CompiledStage {
        &self.fragment
    }

    /// CPU-side storage for the uniform block bound to the global `name`.
    ///
    /// The vertex stage's declaration is preferred; linking already checked
    /// that both stages agree on its size.
    pub fn uniform_block(&self, name: &str) -> Result<UniformBlock, UniformError> {
        UniformBlock::from_module(self.vertex.module(), name)
            .or_else(|_| UniformBlock::from_module(self.fragment.module(), name))
    }

    pub fn create_modules(&self, device: &wgpu::Device) -> GpuProgram {
        let create = |stage: &CompiledStage| {
            let label = stage.path.display().to_string();
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&label),
                source: wgpu::ShaderSource::Wgsl(stage.source.as_str().into()),
            })
        };
        GpuProgram {
            vertex: create(&self.vertex),
            fragment: create(&self.fragment),
            vertex_entry: self.vertex.entry_point.clone(),
            fragment_entry: self.fragment.entry_point.clone(),
        }
    }
}

fn read_stage(stage: Stage, path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::Read {
        stage,
        path: path.to_path_buf(),
        source,
    })
}

fn compile_stage(stage: Stage, path: &Path, source: String) -> Result<CompiledStage, ShaderError> {
    let compile_error = |message: String| ShaderError::Compile {
        stage,
        path: path.to_path_buf(),
        message,
    };

    let module = naga::front::wgsl::parse_str(&source)
        .map_err(|e| compile_error(e.emit_to_string(&source)))?;
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| compile_error(e.emit_to_string(&source)))?;

    let wanted = match stage {
        Stage::Vertex => naga::ShaderStage::Vertex,
        Stage::Fragment => naga::ShaderStage::Fragment,
        Stage::Geometry => return Err(ShaderError::UnsupportedStage(stage)),
    };
    let entry_point = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == wanted)
        .map(|ep| ep.name.clone())
        .ok_or_else(|| {
            ShaderError::Link(format!(
                "{stage} shader {} has no @{stage} entry point",
                path.display()
            ))
        })?;

    Ok(CompiledStage {
        path: path.to_path_buf(),
        source,
        module,
        entry_point,
    })
}

fn link(vertex: &CompiledStage, fragment: &CompiledStage) -> Result<(), ShaderError> {
    let outputs = vertex_outputs(vertex);
    let inputs = fragment_inputs(fragment);

    for (location, input_ty) in &inputs {
        match outputs.get(location) {
            None => {
                return Err(ShaderError::Link(format!(
                    "fragment input @location({location}) is not written by the vertex stage"
                )));
            }
            Some(output_ty) if output_ty != input_ty => {
                return Err(ShaderError::Link(format!(
                    "@location({location}) type mismatch: \
                     vertex writes {output_ty:?}, fragment reads {input_ty:?}"
                )));
            }
            Some(_) => {}
        }
    }

    let vertex_blocks = uniform_spans(&vertex.module);
    for (slot, (name, span)) in uniform_spans(&fragment.module) {
        if let Some((vertex_name, vertex_span)) = vertex_blocks.get(&slot) {
            if *vertex_span != span {
                return Err(ShaderError::Link(format!(
                    "uniform @group({}) @binding({}) is {vertex_span} bytes as `{vertex_name}` \
                     in the vertex stage but {span} bytes as `{name}` in the fragment stage",
                    slot.0, slot.1
                )));
            }
        }
    }

    tracing::trace!(
        vertex = %vertex.path.display(),
        fragment = %fragment.path.display(),
        locations = inputs.len(),
        "stage interfaces match"
    );
    Ok(())
}

type Locations = BTreeMap<u32, naga::TypeInner>;

fn vertex_outputs(stage: &CompiledStage) -> Locations {
    let mut out = Locations::new();
    let module = &stage.module;
    if let Some(ep) = find_entry(stage) {
        if let Some(result) = &ep.function.result {
            collect_locations(module, result.ty, result.binding.as_ref(), &mut out);
        }
    }
    out
}

fn fragment_inputs(stage: &CompiledStage) -> Locations {
    let mut out = Locations::new();
    let module = &stage.module;
    if let Some(ep) = find_entry(stage) {
        for arg in &ep.function.arguments {
            collect_locations(module, arg.ty, arg.binding.as_ref(), &mut out);
        }
    }
    out
}

fn find_entry(stage: &CompiledStage) -> Option<&naga::EntryPoint> {
    stage
        .module
        .entry_points
        .iter()
        .find(|ep| ep.name == stage.entry_point)
}

fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Locations,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            out.insert(*location, module.types[ty].inner.clone());
        }
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

/// `(group, binding)` -> (global name, struct size) for uniform globals.
fn uniform_spans(module: &naga::Module) -> BTreeMap<(u32, u32), (String, u32)> {
    module
        .global_variables
        .iter()
        .filter(|(_, var)| var.space == naga::AddressSpace::Uniform)
        .filter_map(|(_, var)| {
            let binding = var.binding.as_ref()?;
            let span = match &module.types[var.ty].inner {
                naga::TypeInner::Struct { span, .. } => *span,
                _ => return None,
            };
            let name = var.name.clone().unwrap_or_default();
            Some(((binding.group, binding.binding), (name, span)))
        })
        .collect()
}
