use crate::render::backend::RenderBackend;
use crate::render::binding::{BindingEntry, BindingSpec};
use crate::render::context::Context;
use crate::render::draw::DrawCall;
use crate::render::error::{RenderError, Result};
use crate::render::program::Program;
use crate::render::resources::Buffer;
use crate::render::scene::{ResourceMap, ViewUniforms, keys};

use super::common::{self, F, LightFactorUniforms, Mesh, ModelBindings, V};
use super::{InstanceUniforms, ModelName};

const KIND: &str = "outside";

#[derive(Debug)]
struct Initialized {
    bindings: ModelBindings,
    light_factor: Buffer,
    view: Buffer,
}

/// Environment surrounding the tank.
///
/// Pipeline layout `[general, world, model]`, model layout
/// `{0 light factor, 1 sampler, 2 diffuse, 3 view (V)}`.
#[derive(Debug)]
pub struct OutsideModel {
    name: ModelName,
    enable_blend: bool,
    light_factor: LightFactorUniforms,
    view: Option<ViewUniforms>,
    state: Option<Initialized>,
}

impl OutsideModel {
    pub fn new(name: ModelName, enable_blend: bool) -> Self {
        Self {
            name,
            enable_blend,
            light_factor: LightFactorUniforms::default(),
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

    pub fn init<B: RenderBackend>(
        &mut self,
        ctx: &mut Context<B>,
        program: &Program,
        resources: &ResourceMap<'_>,
    ) -> Result<()> {
        let diffuse = common::texture(resources, KIND, keys::DIFFUSE)?;
        let mesh = Mesh::resolve(
            resources,
            KIND,
            &[keys::POSITION, keys::NORMAL, keys::TEX_COORD],
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
                BindingSpec::texture(2, F),
                BindingSpec::uniform(3, V),
            ],
        )?;

        let light_factor = ctx.create_uniform_buffer(&label, &self.light_factor)?;
        let view = ctx.create_uniform_buffer(
            &format!("{label} view"),
            &self.view.unwrap_or_default(),
        )?;

        let model_group = ctx.make_bind_group(
            &label,
            model_layout,
            &[
                BindingEntry::new(0, light_factor.binding()),
                BindingEntry::new(1, diffuse.sampler_binding()),
                BindingEntry::new(2, diffuse.view_binding()),
                BindingEntry::new(3, view.binding()),
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

        self.state = Some(Initialized {
            bindings,
            light_factor,
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
        ctx.submit_draw(&state.bindings.draw_call(1))
    }

    /// Forgets a view staged since the last draw.
    pub fn clear_instances(&mut self) {
        self.view = None;
    }

    pub fn destroy<B: RenderBackend>(self, ctx: &mut Context<B>) {
        if let Some(state) = self.state {
            state.bindings.release(ctx);
            ctx.destroy_buffer(state.light_factor);
            ctx.destroy_buffer(state.view);
        }
    }
}
