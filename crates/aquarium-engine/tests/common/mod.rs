#![allow(dead_code)]

use aquarium_engine::render::scene::keys;
use aquarium_engine::render::{
    Buffer, Context, HeadlessBackend, MemoryShaderLibrary, Program, ResourceMap, SceneState,
    Texture, ViewDimension,
};

pub const VS: &str = r#"
struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn main(@location(0) position: vec3<f32>, @location(2) uv: vec2<f32>) -> VertexOut {
    var out: VertexOut;
    out.position = vec4<f32>(position, 1.0);
    out.uv = uv;
    return out;
}
"#;

pub const FS: &str = r#"
@fragment
fn main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(uv, 0.5, 1.0);
}
"#;

pub const BROKEN: &str = "@vertex fn main( -> vec4<f32> {";

pub fn shaders() -> MemoryShaderLibrary {
    MemoryShaderLibrary::new()
        .with("vs", VS)
        .with("fs", FS)
        .with("broken", BROKEN)
}

/// Context with general resources already created.
pub fn context() -> Context<HeadlessBackend> {
    let mut ctx = Context::new(HeadlessBackend::new(320, 240));
    ctx.init_general_resources(&SceneState::default())
        .expect("general resources");
    ctx
}

pub fn program(ctx: &mut Context<HeadlessBackend>) -> Program {
    ctx.create_program(&shaders(), "vs", "fs").expect("program")
}

/// One triangle with every vertex stream plus each texture kind.
pub struct Assets {
    pub position: Buffer,
    pub normal: Buffer,
    pub tex_coord: Buffer,
    pub tangent: Buffer,
    pub binormal: Buffer,
    pub indices: Buffer,
    pub diffuse: Texture,
    pub normal_map: Texture,
    pub reflection_map: Texture,
    pub skybox: Texture,
}

impl Assets {
    pub fn load(ctx: &mut Context<HeadlessBackend>) -> Self {
        let pixel: &[u8] = &[255, 128, 64, 255];
        let texture = |ctx: &mut Context<HeadlessBackend>, name: &str| {
            ctx.create_texture_from_rgba(name, ViewDimension::D2, 1, 1, &[pixel])
                .expect("texture")
        };

        let positions: [f32; 9] = [0.0, 0.5, 0.0, -0.5, -0.5, 0.0, 0.5, -0.5, 0.0];
        let normals: Vec<f32> = [0.0, 0.0, 1.0].repeat(3);
        let tangents: Vec<f32> = [1.0, 0.0, 0.0].repeat(3);
        let binormals: Vec<f32> = [0.0, 1.0, 0.0].repeat(3);
        let vertices = |ctx: &mut Context<HeadlessBackend>, name: &str, size: u32, data: &[f32]| {
            ctx.create_vertex_buffer(name, size, data).expect(name)
        };

        Self {
            position: vertices(ctx, keys::POSITION, 3, &positions),
            normal: vertices(ctx, keys::NORMAL, 3, &normals),
            tex_coord: vertices(ctx, keys::TEX_COORD, 2, &[0.5, 0.0, 0.0, 1.0, 1.0, 1.0]),
            tangent: vertices(ctx, keys::TANGENT, 3, &tangents),
            binormal: vertices(ctx, keys::BINORMAL, 3, &binormals),
            indices: ctx
                .create_index_buffer(keys::INDICES, &[0, 1, 2])
                .expect("indices"),
            diffuse: texture(ctx, keys::DIFFUSE),
            normal_map: texture(ctx, keys::NORMAL_MAP),
            reflection_map: texture(ctx, keys::REFLECTION_MAP),
            skybox: ctx
                .create_texture_from_rgba(keys::SKYBOX, ViewDimension::Cube, 1, 1, &[pixel; 6])
                .expect("skybox"),
        }
    }

    /// Position, normal, texcoord, indices and a diffuse texture.
    pub fn diffuse_only(&self) -> ResourceMap<'_> {
        ResourceMap::new()
            .with_buffer(keys::POSITION, &self.position)
            .with_buffer(keys::NORMAL, &self.normal)
            .with_buffer(keys::TEX_COORD, &self.tex_coord)
            .with_buffer(keys::INDICES, &self.indices)
            .with_texture(keys::DIFFUSE, &self.diffuse)
    }

    /// Diffuse set plus tangent frame and normal map.
    pub fn normal_mapped(&self) -> ResourceMap<'_> {
        self.diffuse_only()
            .with_buffer(keys::TANGENT, &self.tangent)
            .with_buffer(keys::BINORMAL, &self.binormal)
            .with_texture(keys::NORMAL_MAP, &self.normal_map)
    }

    /// Everything, including reflection map and skybox.
    pub fn full(&self) -> ResourceMap<'_> {
        self.normal_mapped()
            .with_texture(keys::REFLECTION_MAP, &self.reflection_map)
            .with_texture(keys::SKYBOX, &self.skybox)
    }
}
