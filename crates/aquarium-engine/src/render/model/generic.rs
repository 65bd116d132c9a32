use crate::render::backend::RenderBackend;
use crate::render::binding::BindingEntry;
use crate::render::context::Context;
use crate::render::draw::DrawCall;
use crate::render::error::{RenderError, Result};
use crate::render::program::Program;
use crate::render::resources::Buffer;
use crate::render::scene::{ResourceMap, keys};

use super::common::{self, LightFactorUniforms, Mesh, ModelBindings};
use super::layout::GenericLayout;
use super::{InstanceUniforms, ModelName};

const KIND: &str = "generic";

#[derive(Debug)]
struct Initialized {
    bindings: ModelBindings,
    layout: GenericLayout,
    light_factor: Buffer,
}

/// Static scenery: rocks, ruins, the ship, the globe base.
///
/// Only the model layout is bound (pipeline layout `[model]`); its shape comes
/// from [`GenericLayout::select`].
#[derive(Debug)]
pub struct GenericModel {
    name: ModelName,
    enable_blend: bool,
    light_factor: LightFactorUniforms,
    state: Option<Initialized>,
}

impl GenericModel {
    pub fn new(name: ModelName, enable_blend: bool) -> Self {
        Self {
            name,
            enable_blend,
            light_factor: LightFactorUniforms::default(),
            state: None,
        }
    }

    pub fn name(&self) -> ModelName {
        self.name
    }

    pub fn bindings(&self) -> Option<&ModelBindings> {
        self.state.as_ref().map(|s| &s.bindings)
    }

    /// Layout chosen by `init`.
    pub fn layout(&self) -> Option<GenericLayout> {
        self.state.as_ref().map(|s| s.layout)
    }

    pub fn init<B: RenderBackend>(
        &mut self,
        ctx: &mut Context<B>,
        program: &Program,
        resources: &ResourceMap<'_>,
    ) -> Result<()> {
        let diffuse = common::texture(resources, KIND, keys::DIFFUSE)?;
        let normal_map = resources.texture(keys::NORMAL_MAP);
        let reflection_map = resources.texture(keys::REFLECTION_MAP);
        let skybox = resources.texture(keys::SKYBOX);

        let mesh = Mesh::resolve_optional_tangents(resources, KIND)?;

        let layout = GenericLayout::select(
            self.name,
            skybox.is_some(),
            reflection_map.is_some(),
            normal_map.is_some(),
        );

        let label = format!("{KIND} {}", self.name);
        let light_factor = ctx.create_uniform_buffer(&label, &self.light_factor)?;

        let entries = match layout {
            GenericLayout::Reflection => {
                let normal_map = normal_map.ok_or(RenderError::MissingResource {
                    model: KIND,
                    name: keys::NORMAL_MAP,
                })?;
                let (Some(reflection_map), Some(skybox)) = (reflection_map, skybox) else {
                    return Err(RenderError::MissingResource {
                        model: KIND,
                        name: keys::SKYBOX,
                    });
                };
                vec![
                    BindingEntry::new(0, light_factor.binding()),
                    BindingEntry::new(1, reflection_map.sampler_binding()),
                    BindingEntry::new(2, skybox.sampler_binding()),
                    BindingEntry::new(3, diffuse.view_binding()),
                    BindingEntry::new(4, normal_map.view_binding()),
                    BindingEntry::new(5, reflection_map.view_binding()),
                    BindingEntry::new(6, skybox.view_binding()),
                ]
            }
            GenericLayout::NormalMapped => {
                if !mesh.has_tangents() {
                    return Err(RenderError::MissingResource {
                        model: KIND,
                        name: keys::TANGENT,
                    });
                }
                let normal_map = normal_map.ok_or(RenderError::MissingResource {
                    model: KIND,
                    name: keys::NORMAL_MAP,
                })?;
                let globals = ctx.globals()?;
                vec![
                    BindingEntry::new(0, globals.light_world_position.binding()),
                    BindingEntry::new(1, globals.view.binding()),
                    BindingEntry::new(2, globals.light.binding()),
                    BindingEntry::new(3, light_factor.binding()),
                    BindingEntry::new(4, diffuse.sampler_binding()),
                    BindingEntry::new(5, diffuse.view_binding()),
                    BindingEntry::new(6, normal_map.view_binding()),
                    BindingEntry::new(7, globals.fog.binding()),
                ]
            }
            GenericLayout::DiffuseOnly => vec![
                BindingEntry::new(0, light_factor.binding()),
                BindingEntry::new(1, diffuse.sampler_binding()),
                BindingEntry::new(2, diffuse.view_binding()),
            ],
        };

        let model_layout = ctx.make_bind_group_layout(&label, layout.specs().iter().copied())?;
        let model_group = ctx.make_bind_group(&label, model_layout, &entries)?;

        let bindings = common::finish(
            ctx,
            &label,
            program,
            &mesh,
            &[(model_layout, model_group)],
            0,
            self.enable_blend,
        )?;

        self.state = Some(Initialized {
            bindings,
            layout,
            light_factor,
        });
        Ok(())
    }

    /// Generic models read the shared camera; view updates are accepted and
    /// ignored.
    pub fn update_per_instance_uniforms(&mut self, uniforms: &InstanceUniforms) -> Result<()> {
        match uniforms {
            InstanceUniforms::View(_) => Ok(()),
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
        let call = self
            .pending_draw_call()
            .ok_or(RenderError::ModelNotInitialized(KIND))?;
        ctx.submit_draw(&call)
    }

    pub fn destroy<B: RenderBackend>(self, ctx: &mut Context<B>) {
        if let Some(state) = self.state {
            state.bindings.release(ctx);
            ctx.destroy_buffer(state.light_factor);
        }
    }
}
