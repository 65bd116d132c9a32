//! Per-kind model renderers.
//!
//! The scene topology is fixed, so the set of renderer kinds is closed: one
//! enum variant per kind, dispatched with a single `match`. Every kind follows
//! the same protocol:
//!
//! - `init` once: resolve named resources, build the input state, layouts,
//!   pipeline and bind groups, upload model-owned uniforms
//! - `update_per_instance_uniforms` any number of times per frame
//! - `draw` once per frame while the context's pass is open
//!
//! Models hold only handles into the context plus their own uniform
//! buffers, group layouts, bind groups and pipeline; [`Model::destroy`]
//! hands all of them back. The shared global groups stay with the context.

mod common;
mod fish;
mod generic;
mod inner;
mod layout;
mod outside;
mod seaweed;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub use self::common::{LightFactorUniforms, ModelBindings};
pub use self::fish::{FishInstance, FishModel, FishVertexUniforms, MAX_FISH_INSTANCES};
pub use self::generic::GenericModel;
pub use self::inner::{InnerModel, InnerUniforms};
pub use self::layout::GenericLayout;
pub use self::outside::OutsideModel;
pub use self::seaweed::{MAX_SEAWEED_INSTANCES, SeaweedModel};

use super::backend::RenderBackend;
use super::context::Context;
use super::draw::DrawCall;
use super::error::Result;
use super::program::Program;
use super::scene::{ResourceMap, ViewUniforms};

/// Renderer kind, named by the scene's group tag.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ModelGroup {
    Generic,
    Fish,
    Seaweed,
    Inner,
    Outside,
}

#[derive(Debug, Clone, Error)]
#[error("unknown model group `{0}`")]
pub struct UnknownModelGroup(pub String);

impl ModelGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelGroup::Generic => "generic",
            ModelGroup::Fish => "fish",
            ModelGroup::Seaweed => "seaweed",
            ModelGroup::Inner => "inner",
            ModelGroup::Outside => "outside",
        }
    }
}

impl fmt::Display for ModelGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelGroup {
    type Err = UnknownModelGroup;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generic" => Ok(ModelGroup::Generic),
            // Instanced fish share the batched fish renderer.
            "fish" | "fishinstanceddraw" => Ok(ModelGroup::Fish),
            "seaweed" => Ok(ModelGroup::Seaweed),
            "inner" => Ok(ModelGroup::Inner),
            "outside" => Ok(ModelGroup::Outside),
            _ => Err(UnknownModelGroup(s.to_owned())),
        }
    }
}

macro_rules! model_names {
    ($($variant:ident => $name:literal,)*) => {
        /// The fixed catalogue of scene models.
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
        pub enum ModelName {
            $($variant,)*
        }

        impl ModelName {
            pub const ALL: &'static [ModelName] = &[$(ModelName::$variant,)*];

            /// Asset name as used in scene files.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(ModelName::$variant => $name,)*
                }
            }
        }

        impl FromStr for ModelName {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($name => Ok(ModelName::$variant),)*
                    _ => Err(format!("unknown model `{s}`")),
                }
            }
        }
    };
}

model_names! {
    SmallFishA => "SmallFishA",
    MediumFishA => "MediumFishA",
    MediumFishB => "MediumFishB",
    BigFishA => "BigFishA",
    BigFishB => "BigFishB",
    Arch => "Arch",
    Coral => "Coral",
    CoralStoneA => "CoralStoneA",
    CoralStoneB => "CoralStoneB",
    EnvironmentBox => "EnvironmentBox",
    FloorBaseBaked => "FloorBase_Baked",
    FloorCenter => "FloorCenter",
    GlobeBase => "GlobeBase",
    GlobeInner => "GlobeInner",
    GlobeOuter => "GlobeOuter",
    RockA => "RockA",
    RockB => "RockB",
    RockC => "RockC",
    RuinColumn => "RuinColumn",
    Stone => "Stone",
    SunknShipBoxes => "SunknShipBoxes",
    SunknShipDeck => "SunknShipDeck",
    SunknShipHull => "SunknShipHull",
    SunknSub => "SunknSub",
    SupportBeams => "SupportBeams",
    TreasureChest => "TreasureChest",
    SeaweedA => "SeaweedA",
    SeaweedB => "SeaweedB",
}

impl ModelName {
    /// The group a scene normally places this model in.
    pub fn default_group(self) -> ModelGroup {
        match self {
            ModelName::SmallFishA
            | ModelName::MediumFishA
            | ModelName::MediumFishB
            | ModelName::BigFishA
            | ModelName::BigFishB => ModelGroup::Fish,
            ModelName::SeaweedA | ModelName::SeaweedB => ModelGroup::Seaweed,
            ModelName::GlobeInner => ModelGroup::Inner,
            ModelName::EnvironmentBox => ModelGroup::Outside,
            _ => ModelGroup::Generic,
        }
    }

    /// The globe base ships normal and reflection maps but renders with the
    /// diffuse-only layout.
    pub fn is_globe_base(self) -> bool {
        self == ModelName::GlobeBase
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-instance data handed to [`Model::update_per_instance_uniforms`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InstanceUniforms {
    /// Object transforms; used by every kind except fish.
    View(ViewUniforms),
    Fish(FishInstance),
}

impl InstanceUniforms {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            InstanceUniforms::View(_) => "view",
            InstanceUniforms::Fish(_) => "fish",
        }
    }
}

/// One renderer of any kind.
#[derive(Debug)]
pub enum Model {
    Generic(GenericModel),
    Fish(FishModel),
    Seaweed(SeaweedModel),
    Inner(InnerModel),
    Outside(OutsideModel),
}

impl Model {
    pub(crate) fn new(group: ModelGroup, name: ModelName, enable_blend: bool) -> Self {
        match group {
            ModelGroup::Generic => Model::Generic(GenericModel::new(name, enable_blend)),
            ModelGroup::Fish => Model::Fish(FishModel::new(name, enable_blend)),
            ModelGroup::Seaweed => Model::Seaweed(SeaweedModel::new(name, enable_blend)),
            ModelGroup::Inner => Model::Inner(InnerModel::new(name, enable_blend)),
            ModelGroup::Outside => Model::Outside(OutsideModel::new(name, enable_blend)),
        }
    }

    pub fn group(&self) -> ModelGroup {
        match self {
            Model::Generic(_) => ModelGroup::Generic,
            Model::Fish(_) => ModelGroup::Fish,
            Model::Seaweed(_) => ModelGroup::Seaweed,
            Model::Inner(_) => ModelGroup::Inner,
            Model::Outside(_) => ModelGroup::Outside,
        }
    }

    pub fn name(&self) -> ModelName {
        match self {
            Model::Generic(m) => m.name(),
            Model::Fish(m) => m.name(),
            Model::Seaweed(m) => m.name(),
            Model::Inner(m) => m.name(),
            Model::Outside(m) => m.name(),
        }
    }

    /// Handles created by `init`; `None` before it.
    pub fn bindings(&self) -> Option<&ModelBindings> {
        match self {
            Model::Generic(m) => m.bindings(),
            Model::Fish(m) => m.bindings(),
            Model::Seaweed(m) => m.bindings(),
            Model::Inner(m) => m.bindings(),
            Model::Outside(m) => m.bindings(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.bindings().is_some()
    }

    /// One-time setup. Missing resources and layout mismatches are errors.
    pub fn init<B: RenderBackend>(
        &mut self,
        ctx: &mut Context<B>,
        program: &Program,
        resources: &ResourceMap<'_>,
    ) -> Result<()> {
        match self {
            Model::Generic(m) => m.init(ctx, program, resources),
            Model::Fish(m) => m.init(ctx, program, resources),
            Model::Seaweed(m) => m.init(ctx, program, resources),
            Model::Inner(m) => m.init(ctx, program, resources),
            Model::Outside(m) => m.init(ctx, program, resources),
        }
    }

    /// Stages one instance's uniforms for the next `draw`.
    ///
    /// `clock` is the scene clock in seconds. Batched kinds return
    /// [`RenderError::InstanceCapacityExceeded`](super::RenderError) once
    /// their fixed capacity is used up.
    pub fn update_per_instance_uniforms(
        &mut self,
        uniforms: &InstanceUniforms,
        clock: f32,
    ) -> Result<()> {
        match self {
            Model::Generic(m) => m.update_per_instance_uniforms(uniforms),
            Model::Fish(m) => m.update_per_instance_uniforms(uniforms),
            Model::Seaweed(m) => m.update_per_instance_uniforms(uniforms, clock),
            Model::Inner(m) => m.update_per_instance_uniforms(uniforms),
            Model::Outside(m) => m.update_per_instance_uniforms(uniforms),
        }
    }

    /// Uploads staged per-instance data and appends this model's draw to the
    /// context's open pass.
    pub fn draw<B: RenderBackend>(&mut self, ctx: &mut Context<B>) -> Result<()> {
        match self {
            Model::Generic(m) => m.draw(ctx),
            Model::Fish(m) => m.draw(ctx),
            Model::Seaweed(m) => m.draw(ctx),
            Model::Inner(m) => m.draw(ctx),
            Model::Outside(m) => m.draw(ctx),
        }
    }

    /// Discards instance data staged since the last `draw`, for frames that
    /// are skipped before any model draws.
    pub fn clear_instances(&mut self) {
        match self {
            Model::Generic(_) => {}
            Model::Fish(m) => m.clear_instances(),
            Model::Seaweed(m) => m.clear_instances(),
            Model::Inner(m) => m.clear_instances(),
            Model::Outside(m) => m.clear_instances(),
        }
    }

    /// The draw the next `draw` would append, given the currently staged
    /// instances. `None` before `init` or when a batch is empty.
    pub fn pending_draw_call(&self) -> Option<DrawCall> {
        match self {
            Model::Generic(m) => m.pending_draw_call(),
            Model::Fish(m) => m.pending_draw_call(),
            Model::Seaweed(m) => m.pending_draw_call(),
            Model::Inner(m) => m.pending_draw_call(),
            Model::Outside(m) => m.pending_draw_call(),
        }
    }

    /// Releases every model-owned object: uniform buffers, model and
    /// per-instance groups with their layouts, the pipeline layout and the
    /// pipeline.
    pub fn destroy<B: RenderBackend>(self, ctx: &mut Context<B>) {
        match self {
            Model::Generic(m) => m.destroy(ctx),
            Model::Fish(m) => m.destroy(ctx),
            Model::Seaweed(m) => m.destroy(ctx),
            Model::Inner(m) => m.destroy(ctx),
            Model::Outside(m) => m.destroy(ctx),
        }
    }
}
