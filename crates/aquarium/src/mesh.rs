//! Procedural geometry for the synthetic tank.
//!
//! Every mesh carries the full five vertex streams; kinds that read fewer
//! simply leave the extra buffers out of their resource map.

use aquarium_engine::render::scene::keys;
use aquarium_engine::render::{Buffer, Context, RenderBackend, ResourceMap, Result};
use glam::{Vec2, Vec3};

#[derive(Debug, Default, Clone)]
pub struct MeshData {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub tex_coords: Vec<f32>,
    pub tangents: Vec<f32>,
    pub binormals: Vec<f32>,
    pub indices: Vec<u16>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    fn push_vertex(
        &mut self,
        position: Vec3,
        normal: Vec3,
        uv: Vec2,
        tangent: Vec3,
        binormal: Vec3,
    ) -> u16 {
        let index = self.vertex_count() as u16;
        self.positions.extend_from_slice(&position.to_array());
        self.normals.extend_from_slice(&normal.to_array());
        self.tex_coords.extend_from_slice(&uv.to_array());
        self.tangents.extend_from_slice(&tangent.to_array());
        self.binormals.extend_from_slice(&binormal.to_array());
        index
    }

    /// Axis-aligned box centred on `center`, faces wound counter-clockwise
    /// seen from outside.
    pub fn cuboid(center: Vec3, half: Vec3) -> Self {
        const FACES: [(Vec3, Vec3); 6] = [
            (Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_X, Vec3::Z),
            (Vec3::Y, Vec3::X),
            (Vec3::NEG_Y, Vec3::X),
            (Vec3::Z, Vec3::X),
            (Vec3::NEG_Z, Vec3::NEG_X),
        ];
        const CORNERS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

        let mut mesh = MeshData::default();
        for (normal, tangent) in FACES {
            let binormal = normal.cross(tangent);
            let base = mesh.vertex_count() as u16;
            for (su, sv) in CORNERS {
                let position = center + normal * half + tangent * half * su + binormal * half * sv;
                let uv = Vec2::new((su + 1.0) * 0.5, (sv + 1.0) * 0.5);
                mesh.push_vertex(position, normal, uv, tangent, binormal);
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }

    /// UV sphere around the origin.
    pub fn sphere(radius: f32, rings: u16, segments: u16) -> Self {
        let mut mesh = MeshData::default();
        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let theta = v * std::f32::consts::PI;
            for segment in 0..=segments {
                let u = segment as f32 / segments as f32;
                let phi = u * std::f32::consts::TAU;

                let normal = Vec3::new(
                    theta.sin() * phi.cos(),
                    theta.cos(),
                    theta.sin() * phi.sin(),
                );
                let tangent = Vec3::new(-phi.sin(), 0.0, phi.cos());
                let binormal = normal.cross(tangent);
                mesh.push_vertex(normal * radius, normal, Vec2::new(u, v), tangent, binormal);
            }
        }

        let stride = segments + 1;
        for ring in 0..rings {
            for segment in 0..segments {
                let a = ring * stride + segment;
                let b = a + stride;
                mesh.indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
        mesh
    }

    /// Upright blade in the xy plane, rooted at the origin. Vertices further
    /// up sway further.
    pub fn blade(height: f32, width: f32, segments: u16) -> Self {
        let mut mesh = MeshData::default();
        for step in 0..=segments {
            let t = step as f32 / segments as f32;
            let half = width * 0.5 * (1.0 - t * 0.8);
            for (side, u) in [(-half, 0.0), (half, 1.0)] {
                mesh.push_vertex(
                    Vec3::new(side, t * height, 0.0),
                    Vec3::Z,
                    Vec2::new(u, 1.0 - t),
                    Vec3::X,
                    Vec3::Y,
                );
            }
        }
        for step in 0..segments {
            let a = step * 2;
            mesh.indices
                .extend_from_slice(&[a, a + 1, a + 3, a, a + 3, a + 2]);
        }
        mesh
    }

    /// Fish body: a box along z spanning `[-length / 2, length / 2]`, the
    /// range the swim wave is normalized against.
    pub fn fish(length: f32) -> Self {
        MeshData::cuboid(Vec3::ZERO, Vec3::new(length * 0.1, length * 0.15, length * 0.5))
    }
}

/// Vertex and index buffers uploaded from a [`MeshData`].
#[derive(Debug)]
pub struct GpuMesh {
    position: Buffer,
    normal: Buffer,
    tex_coord: Buffer,
    tangent: Buffer,
    binormal: Buffer,
    indices: Buffer,
}

impl GpuMesh {
    pub fn upload<B: RenderBackend>(
        ctx: &mut Context<B>,
        label: &str,
        data: &MeshData,
    ) -> Result<Self> {
        Ok(Self {
            position: ctx.create_vertex_buffer(&format!("{label} position"), 3, &data.positions)?,
            normal: ctx.create_vertex_buffer(&format!("{label} normal"), 3, &data.normals)?,
            tex_coord: ctx.create_vertex_buffer(&format!("{label} texCoord"), 2, &data.tex_coords)?,
            tangent: ctx.create_vertex_buffer(&format!("{label} tangent"), 3, &data.tangents)?,
            binormal: ctx.create_vertex_buffer(&format!("{label} binormal"), 3, &data.binormals)?,
            indices: ctx.create_index_buffer(&format!("{label} indices"), &data.indices)?,
        })
    }

    /// Position, normal, texture coordinates and indices.
    pub fn basic(&self) -> ResourceMap<'_> {
        ResourceMap::new()
            .with_buffer(keys::POSITION, &self.position)
            .with_buffer(keys::NORMAL, &self.normal)
            .with_buffer(keys::TEX_COORD, &self.tex_coord)
            .with_buffer(keys::INDICES, &self.indices)
    }

    /// All five streams plus indices.
    pub fn full(&self) -> ResourceMap<'_> {
        self.basic()
            .with_buffer(keys::TANGENT, &self.tangent)
            .with_buffer(keys::BINORMAL, &self.binormal)
    }

    pub fn destroy<B: RenderBackend>(self, ctx: &mut Context<B>) {
        for buffer in [
            self.position,
            self.normal,
            self.tex_coord,
            self.tangent,
            self.binormal,
            self.indices,
        ] {
            ctx.destroy_buffer(buffer);
        }
    }
}
