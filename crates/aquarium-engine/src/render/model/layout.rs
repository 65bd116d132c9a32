//! Layout selection for generic models.
//!
//! Shader binding slots depend on which optional textures a model ships, so
//! the model layout is chosen once at `init` from a fixed table:
//!
//! | textures present                            | layout         | bindings |
//! |---------------------------------------------|----------------|----------|
//! | skybox + reflection map, not the globe base | `Reflection`   | 7        |
//! | normal map, not the globe base              | `NormalMapped` | 8        |
//! | anything else                               | `DiffuseOnly`  | 3        |

use crate::render::binding::BindingSpec;

use super::ModelName;
use super::common::{F, V};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GenericLayout {
    /// `{0 light factor, 1 reflection sampler, 2 skybox sampler,
    /// 3 diffuse, 4 normal map, 5 reflection map, 6 skybox cube}`
    Reflection,
    /// `{0 light world position (V), 1 view (V), 2 light, 3 light factor,
    /// 4 sampler, 5 diffuse, 6 normal map, 7 fog}`
    NormalMapped,
    /// `{0 light factor, 1 sampler, 2 diffuse}`
    DiffuseOnly,
}

const REFLECTION: [BindingSpec; 7] = [
    BindingSpec::uniform(0, F),
    BindingSpec::sampler(1, F),
    BindingSpec::sampler(2, F),
    BindingSpec::texture(3, F),
    BindingSpec::texture(4, F),
    BindingSpec::texture(5, F),
    BindingSpec::cube_texture(6, F),
];

const NORMAL_MAPPED: [BindingSpec; 8] = [
    BindingSpec::uniform(0, V),
    BindingSpec::uniform(1, V),
    BindingSpec::uniform(2, F),
    BindingSpec::uniform(3, F),
    BindingSpec::sampler(4, F),
    BindingSpec::texture(5, F),
    BindingSpec::texture(6, F),
    BindingSpec::uniform(7, F),
];

const DIFFUSE_ONLY: [BindingSpec; 3] = [
    BindingSpec::uniform(0, F),
    BindingSpec::sampler(1, F),
    BindingSpec::texture(2, F),
];

impl GenericLayout {
    pub fn select(
        name: ModelName,
        has_skybox: bool,
        has_reflection_map: bool,
        has_normal_map: bool,
    ) -> Self {
        if name.is_globe_base() {
            return GenericLayout::DiffuseOnly;
        }
        if has_skybox && has_reflection_map {
            GenericLayout::Reflection
        } else if has_normal_map {
            GenericLayout::NormalMapped
        } else {
            GenericLayout::DiffuseOnly
        }
    }

    pub fn specs(self) -> &'static [BindingSpec] {
        match self {
            GenericLayout::Reflection => &REFLECTION,
            GenericLayout::NormalMapped => &NORMAL_MAPPED,
            GenericLayout::DiffuseOnly => &DIFFUSE_ONLY,
        }
    }

    pub fn binding_count(self) -> usize {
        self.specs().len()
    }
}
