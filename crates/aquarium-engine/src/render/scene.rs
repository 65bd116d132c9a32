//! Scene-supplied inputs: frame-wide uniform values and named model resources.
//!
//! The simulation that fills these in lives outside the render layer; this
//! module only fixes their GPU layout (std140-compatible, 16-byte aligned).

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use super::resources::{Buffer, Texture};

pub type Mat4 = [[f32; 4]; 4];

pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct LightUniforms {
    pub light_color: [f32; 4],
    pub specular: [f32; 4],
    pub ambient: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct FogUniforms {
    pub fog_power: f32,
    pub fog_mult: f32,
    pub fog_offset: f32,
    pub _pad: f32,
    pub fog_color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct LightWorldPositionUniform {
    pub light_world_pos: [f32; 3],
    pub _pad: f32,
    pub view_projection: Mat4,
    pub view_inverse: Mat4,
}

/// Per-object camera transforms.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct ViewUniforms {
    pub world: Mat4,
    pub world_inverse_transpose: Mat4,
    pub world_view_projection: Mat4,
}

/// Frame-wide values read by the render context.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SceneState {
    pub light: LightUniforms,
    pub fog: FogUniforms,
    pub light_world_position: LightWorldPositionUniform,
    pub view: ViewUniforms,
    /// Scene clock in seconds; monotonically increasing.
    pub clock: f32,
}

/// Well-known resource names.
pub mod keys {
    pub const POSITION: &str = "position";
    pub const NORMAL: &str = "normal";
    pub const TEX_COORD: &str = "texCoord";
    pub const TANGENT: &str = "tangent";
    pub const BINORMAL: &str = "binormal";
    pub const INDICES: &str = "indices";

    pub const DIFFUSE: &str = "diffuse";
    pub const NORMAL_MAP: &str = "normalMap";
    pub const REFLECTION_MAP: &str = "reflectionMap";
    pub const SKYBOX: &str = "skybox";
}

/// Name-to-resource mapping for one model.
///
/// Borrows wrappers owned elsewhere (typically a scene-wide store), so the
/// same skybox texture can appear in many maps.
#[derive(Debug, Default)]
pub struct ResourceMap<'a> {
    buffers: HashMap<String, &'a Buffer>,
    textures: HashMap<String, &'a Texture>,
}

impl<'a> ResourceMap<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buffer(mut self, name: impl Into<String>, buffer: &'a Buffer) -> Self {
        self.insert_buffer(name, buffer);
        self
    }

    pub fn with_texture(mut self, name: impl Into<String>, texture: &'a Texture) -> Self {
        self.insert_texture(name, texture);
        self
    }

    pub fn insert_buffer(&mut self, name: impl Into<String>, buffer: &'a Buffer) {
        self.buffers.insert(name.into(), buffer);
    }

    pub fn insert_texture(&mut self, name: impl Into<String>, texture: &'a Texture) {
        self.textures.insert(name.into(), texture);
    }

    /// Missing names resolve to `None`; the model decides whether that is fatal.
    pub fn buffer(&self, name: &str) -> Option<&'a Buffer> {
        self.buffers.get(name).copied()
    }

    pub fn texture(&self, name: &str) -> Option<&'a Texture> {
        self.textures.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_blocks_are_16_byte_multiples() {
        assert_eq!(std::mem::size_of::<LightUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<FogUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<LightWorldPositionUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<ViewUniforms>(), 192);
    }

    #[test]
    fn default_scene_is_zeroed() {
        let scene = SceneState::default();
        assert!(bytemuck::bytes_of(&scene.light).iter().all(|b| *b == 0));
        assert_eq!(scene.clock, 0.0);
    }
}
