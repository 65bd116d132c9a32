//! Shader programs and the shader-source collaborator.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::PathBuf;

use super::types::ShaderModuleId;

/// Pipeline stage a shader module is compiled for.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Supplies shader source text by id.
///
/// Where the text lives (disk, embedded, generated) is up to the implementor;
/// the render context only ever asks for it by id.
pub trait ShaderLibrary {
    fn source(&self, id: &str) -> Option<Cow<'_, str>>;
}

/// Reads `<root>/<id>.wgsl`.
#[derive(Debug, Clone)]
pub struct DirShaderLibrary {
    root: PathBuf,
}

impl DirShaderLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ShaderLibrary for DirShaderLibrary {
    fn source(&self, id: &str) -> Option<Cow<'_, str>> {
        let path = self.root.join(format!("{id}.wgsl"));
        match std::fs::read_to_string(&path) {
            Ok(text) => Some(Cow::Owned(text)),
            Err(err) => {
                log::warn!("cannot read shader {}: {err}", path.display());
                None
            }
        }
    }
}

/// In-memory sources keyed by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryShaderLibrary {
    sources: HashMap<String, String>,
}

impl MemoryShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(id, source);
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(id.into(), source.into());
    }
}

impl ShaderLibrary for MemoryShaderLibrary {
    fn source(&self, id: &str) -> Option<Cow<'_, str>> {
        self.sources.get(id).map(|s| Cow::Borrowed(s.as_str()))
    }
}

/// Parses and validates WGSL source, logging the first diagnostic.
///
/// Both backends run this before creating a module so that a broken shader
/// surfaces as an invalid module instead of a device error.
pub fn check_wgsl(label: &str, source: &str) -> bool {
    use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};

    if source.trim().is_empty() {
        log::error!("shader `{label}` has no source");
        return false;
    }

    let module = match wgpu::naga::front::wgsl::parse_str(source) {
        Ok(module) => module,
        Err(err) => {
            log::error!("shader `{label}` failed to parse:\n{}", err.emit_to_string(source));
            return false;
        }
    };

    match Validator::new(ValidationFlags::all(), Capabilities::all()).validate(&module) {
        Ok(_) => true,
        Err(err) => {
            log::error!("shader `{label}` failed validation: {err}");
            false
        }
    }
}

/// A compiled (or failed) shader module.
///
/// Compile failures are not errors at creation time: the module is returned
/// with `valid == false` and pipeline creation rejects it later.
#[derive(Debug, Clone)]
pub struct ShaderModule {
    pub id: ShaderModuleId,
    pub label: String,
    pub stage: ShaderStage,
    pub valid: bool,
}

/// A vertex + fragment module pair.
#[derive(Debug, Clone)]
pub struct Program {
    vertex: ShaderModule,
    fragment: ShaderModule,
}

impl Program {
    pub(crate) fn new(vertex: ShaderModule, fragment: ShaderModule) -> Self {
        Self { vertex, fragment }
    }

    pub fn vertex(&self) -> &ShaderModule {
        &self.vertex
    }

    pub fn fragment(&self) -> &ShaderModule {
        &self.fragment
    }

    pub fn is_valid(&self) -> bool {
        self.vertex.valid && self.fragment.valid
    }
}
