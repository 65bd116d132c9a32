use bytemuck::{Pod, Zeroable};

use crate::render::backend::RenderBackend;
use crate::render::binding::{BindingEntry, BindingSpec};
use crate::render::context::Context;
use crate::render::draw::DrawCall;
use crate::render::error::{RenderError, Result};
use crate::render::program::Program;
use crate::render::resources::Buffer;
use crate::render::scene::{ResourceMap, ViewUniforms, keys};

use super::common::{self, F, Mesh, ModelBindings, V};
use super::{InstanceUniforms, ModelName};

const KIND: &str = "inner";

/// Refraction parameters for the inside of the globe.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InnerUniforms {
    pub eta: f32,
    pub tank_color_fudge: f32,
    pub refraction_fudge: f32,
    pub _pad: f32,
}

impl Default for InnerUniforms {
    fn default() -> Self {
        Self {
            eta: 1.0,
            tank_color_fudge: 0.796,
            refraction_fudge: 3.0,
            _pad: 0.0,
        }
    }
}

#[derive(Debug)]
struct Initialized {
    bindings: ModelBindings,
    inner: Buffer,
    view: Buffer,
}

/// The refracting inner surface of the globe.
///
/// Pipeline layout `[general, world, model]`, model layout:
/// `{0 inner, 1 reflection sampler, 2 skybox sampler, 3 diffuse, 4 normal map,
/// 5 reflection map, 6 skybox cube, 7 view (V)}`.
///
/// The view is model-owned; the latest update is uploaded on `draw`.
#[derive(Debug)]
pub struct InnerModel {
    name: ModelName,
    enable_blend: bool,
    uniforms: InnerUniforms,
    uniforms_dirty: bool,
    view: Option<ViewUniforms>,
    state: Option<Initialized>,
}

impl InnerModel {
    pub fn new(name: ModelName, enable_blend: bool) -> Self {
        Self {
            name,
            enable_blend,
            uniforms: InnerUniforms::default(),
            uniforms_dirty: false,
            view: None,
            state: None,
        }
    }

    pub fn name(&self) -> ModelName {
        self.name
    }

    pub fn bindings(&self) -> Option<&ModelBindings> {
        self.state.as_ref().map(|s| &s.bindings)
    }

    pub fn inner_uniforms(&self) -> InnerUniforms {
        self.uniforms
    }

    /// Replaces the refraction parameters; uploaded with the next draw.
    pub fn set_inner_uniforms(&mut self, uniforms: InnerUniforms) {
        self.uniforms = uniforms;
        self.uniforms_dirty = true;
    }

    pub fn init<B: RenderBackend>(
        &mut self,
        ctx: &mut Context<B>,
        program: &Program,
        resources: &ResourceMap<'_>,
    ) -> Result<()> {
        let diffuse = common::texture(resources, KIND, keys::DIFFUSE)?;
        let normal_map = common::texture(resources, KIND, keys::NORMAL_MAP)?;
        let reflection_map = common::texture(resources, KIND, keys::REFLECTION_MAP)?;
        let skybox = common::texture(resources, KIND, keys::SKYBOX)?;
        let mesh = Mesh::resolve(
            resources,
            KIND,
            &[
                keys::POSITION,
                keys::NORMAL,
                keys::TEX_COORD,
                keys::TANGENT,
                keys::BINORMAL,
            ],
        )?;

        let (general_layout, general_group, world_layout, world_group) = {
            let globals = ctx.globals()?;
            (
                globals.general_layout,
                globals.general_group,
                globals.world_layout,
                globals.world_group,
            )
        };

        let label = format!("{KIND} {}", self.name);

        let model_layout = ctx.make_bind_group_layout(
            &label,
            [
                BindingSpec::uniform(0, F),
                BindingSpec::sampler(1, F),
                BindingSpec::sampler(2, F),
                BindingSpec::texture(3, F),
                BindingSpec::texture(4, F),
                BindingSpec::texture(5, F),
                BindingSpec::cube_texture(6, F),
                BindingSpec::uniform(7, V),
            ],
        )?;

        let inner = ctx.create_uniform_buffer(&label, &self.uniforms)?;
        let view = ctx.create_uniform_buffer(
            &format!("{label} view"),
            &self.view.unwrap_or_default(),
        )?;

        let model_group = ctx.make_bind_group(
            &label,
            model_layout,
            &[
                BindingEntry::new(0, inner.binding()),
                BindingEntry::new(1, reflection_map.sampler_binding()),
                BindingEntry::new(2, skybox.sampler_binding()),
                BindingEntry::new(3, diffuse.view_binding()),
                BindingEntry::new(4, normal_map.view_binding()),
                BindingEntry::new(5, reflection_map.view_binding()),
                BindingEntry::new(6, skybox.view_binding()),
                BindingEntry::new(7, view.binding()),
            ],
        )?;

        let bindings = common::finish(
            ctx,
            &label,
            program,
            &mesh,
            &[
                (general_layout, general_group),
                (world_layout, world_group),
                (model_layout, model_group),
            ],
            2,
            self.enable_blend,
        )?;

        self.uniforms_dirty = false;
        self.state = Some(Initialized {
            bindings,
            inner,
            view,
        });
        Ok(())
    }

    pub fn update_per_instance_uniforms(&mut self, uniforms: &InstanceUniforms) -> Result<()> {
        match uniforms {
            InstanceUniforms::View(view) => {
                self.view = Some(*view);
                Ok(())
            }
            other => Err(RenderError::UnexpectedInstanceData {
                model: KIND,
                supplied: other.kind(),
            }),
        }
    }

    pub fn pending_draw_call(&self) -> Option<DrawCall> {
        self.bindings().map(|b| b.draw_call(1))
    }

    pub fn draw<B: RenderBackend>(&mut self, ctx: &mut Context<B>) -> Result<()> {
        let state = self
            .state
            .as_ref()
            .ok_or(RenderError::ModelNotInitialized(KIND))?;

        if let Some(view) = self.view.take() {
            ctx.set_buffer_data(&state.view, 0, bytemuck::bytes_of(&view))?;
        }
        if self.uniforms_dirty {
            ctx.set_buffer_data(&state.inner, 0, bytemuck::bytes_of(&self.uniforms))?;
            self.uniforms_dirty = false;
        }
        ctx.submit_draw(&state.bindings.draw_call(1))
    }

    /// Forgets a view staged since the last draw.
    pub fn clear_instances(&mut self) {
        self.view = None;
    }

    pub fn destroy<B: RenderBackend>(self, ctx: &mut Context<B>) {
        if let Some(state) = self.state {
            state.bindings.release(ctx);
            ctx.destroy_buffer(state.inner);
            ctx.destroy_buffer(state.view);
        }
    }
}
