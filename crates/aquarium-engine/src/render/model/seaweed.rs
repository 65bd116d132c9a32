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

const KIND: &str = "seaweed";

/// Instances a seaweed model can batch into one draw.
pub const MAX_SEAWEED_INSTANCES: usize = 20;

/// Size of one per-instance time slot: WGSL uniform arrays use a 16-byte stride.
const TIME_STRIDE: usize = 4;

#[derive(Debug)]
struct Initialized {
    bindings: ModelBindings,
    light_factor: Buffer,
    views: Buffer,
    times: Buffer,
}

/// Batched, animated seaweed.
///
/// Pipeline layout `[general, world, model, per-instance]`:
/// - model `{0 light factor, 1 sampler, 2 diffuse}`, fragment-visible
/// - per-instance `{0 view array, 1 time array}`, vertex-visible
///
/// Each `update_per_instance_uniforms` fills the next array slot; `draw`
/// uploads the filled prefix, issues one draw with that many instances and
/// resets the counter.
#[derive(Debug)]
pub struct SeaweedModel {
    name: ModelName,
    enable_blend: bool,
    light_factor: LightFactorUniforms,
    views: Vec<ViewUniforms>,
    /// `[time, 0, 0, 0]` per instance.
    times: Vec<[f32; TIME_STRIDE]>,
    state: Option<Initialized>,
}

impl SeaweedModel {
    pub fn new(name: ModelName, enable_blend: bool) -> Self {
        Self {
            name,
            enable_blend,
            light_factor: LightFactorUniforms::default(),
            views: Vec::with_capacity(MAX_SEAWEED_INSTANCES),
            times: Vec::with_capacity(MAX_SEAWEED_INSTANCES),
            state: None,
        }
    }

    pub fn name(&self) -> ModelName {
        self.name
    }

    pub fn bindings(&self) -> Option<&ModelBindings> {
        self.state.as_ref().map(|s| &s.bindings)
    }

    /// Instances staged since the last draw.
    pub fn instance_count(&self) -> usize {
        self.views.len()
    }

    /// Time value staged for instance `index`.
    pub fn instance_time(&self, index: usize) -> Option<f32> {
        self.times.get(index).map(|t| t[0])
    }

    /// The per-instance time array buffer, for inspection.
    pub fn time_buffer(&self) -> Option<&Buffer> {
        self.state.as_ref().map(|s| &s.times)
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
            ],
        )?;
        let per_layout = ctx.make_bind_group_layout(
            &format!("{label} per-instance"),
            [BindingSpec::uniform(0, V), BindingSpec::uniform(1, V)],
        )?;

        let light_factor = ctx.create_uniform_buffer(&label, &self.light_factor)?;
        let views = ctx.create_buffer(
            &format!("{label} views"),
            (MAX_SEAWEED_INSTANCES * size_of::<ViewUniforms>()) as u64,
            wgpu::BufferUsages::UNIFORM,
        )?;
        let times = ctx.create_buffer(
            &format!("{label} times"),
            (MAX_SEAWEED_INSTANCES * size_of::<[f32; TIME_STRIDE]>()) as u64,
            wgpu::BufferUsages::UNIFORM,
        )?;

        let model_group = ctx.make_bind_group(
            &label,
            model_layout,
            &[
                BindingEntry::new(0, light_factor.binding()),
                BindingEntry::new(1, diffuse.sampler_binding()),
                BindingEntry::new(2, diffuse.view_binding()),
            ],
        )?;
        let per_group = ctx.make_bind_group(
            &format!("{label} per-instance"),
            per_layout,
            &[
                BindingEntry::new(0, views.binding()),
                BindingEntry::new(1, times.binding()),
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
                (per_layout, per_group),
            ],
            2,
            self.enable_blend,
        )?;

        self.state = Some(Initialized {
            bindings,
            light_factor,
            views,
            times,
        });
        Ok(())
    }

    /// Appends one instance. Its time is `clock + index` so neighbouring
    /// plants sway out of phase.
    pub fn update_per_instance_uniforms(
        &mut self,
        uniforms: &InstanceUniforms,
        clock: f32,
    ) -> Result<()> {
        let InstanceUniforms::View(view) = uniforms else {
            return Err(RenderError::UnexpectedInstanceData {
                model: KIND,
                supplied: uniforms.kind(),
            });
        };

        let index = self.views.len();
        if index >= MAX_SEAWEED_INSTANCES {
            return Err(RenderError::InstanceCapacityExceeded {
                capacity: MAX_SEAWEED_INSTANCES,
            });
        }

        self.views.push(*view);
        self.times.push([clock + index as f32, 0.0, 0.0, 0.0]);
        Ok(())
    }

    pub fn pending_draw_call(&self) -> Option<DrawCall> {
        if self.views.is_empty() {
            return None;
        }
        self.bindings()
            .map(|b| b.draw_call(self.views.len() as u32))
    }

    /// Uploads and draws the staged batch. The batch is consumed even when
    /// the draw fails.
    pub fn draw<B: RenderBackend>(&mut self, ctx: &mut Context<B>) -> Result<()> {
        let result = self.submit_batch(ctx);
        self.clear_instances();
        result
    }

    fn submit_batch<B: RenderBackend>(&self, ctx: &mut Context<B>) -> Result<()> {
        let state = self
            .state
            .as_ref()
            .ok_or(RenderError::ModelNotInitialized(KIND))?;
        if self.views.is_empty() {
            return Ok(());
        }

        ctx.set_buffer_data(&state.views, 0, bytemuck::cast_slice(&self.views))?;
        ctx.set_buffer_data(&state.times, 0, bytemuck::cast_slice(&self.times))?;
        ctx.submit_draw(&state.bindings.draw_call(self.views.len() as u32))
    }

    /// Drops the staged batch without drawing it.
    pub fn clear_instances(&mut self) {
        self.views.clear();
        self.times.clear();
    }

    pub fn destroy<B: RenderBackend>(self, ctx: &mut Context<B>) {
        if let Some(state) = self.state {
            state.bindings.release(ctx);
            ctx.destroy_buffer(state.light_factor);
            ctx.destroy_buffer(state.views);
            ctx.destroy_buffer(state.times);
        }
    }
}
