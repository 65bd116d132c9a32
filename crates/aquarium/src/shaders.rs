//! Built-in WGSL sources, keyed by the ids the scene asks for.

use aquarium_engine::render::MemoryShaderLibrary;

pub const SOURCES: &[(&str, &str)] = &[
    ("generic_normal_vs", include_str!("../shaders/generic_normal_vs.wgsl")),
    ("generic_normal_fs", include_str!("../shaders/generic_normal_fs.wgsl")),
    ("fish_vs", include_str!("../shaders/fish_vs.wgsl")),
    ("fish_fs", include_str!("../shaders/fish_fs.wgsl")),
    ("seaweed_vs", include_str!("../shaders/seaweed_vs.wgsl")),
    ("seaweed_fs", include_str!("../shaders/seaweed_fs.wgsl")),
    ("inner_vs", include_str!("../shaders/inner_vs.wgsl")),
    ("inner_fs", include_str!("../shaders/inner_fs.wgsl")),
    ("outside_vs", include_str!("../shaders/outside_vs.wgsl")),
    ("outside_fs", include_str!("../shaders/outside_fs.wgsl")),
];

pub fn builtin() -> MemoryShaderLibrary {
    let mut library = MemoryShaderLibrary::new();
    for (id, source) in SOURCES {
        library.insert(*id, *source);
    }
    library
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquarium_engine::render::{ShaderLibrary, check_wgsl};

    #[test]
    fn every_builtin_shader_validates() {
        for (id, source) in SOURCES {
            assert!(check_wgsl(id, source), "{id} does not validate");
        }
    }

    #[test]
    fn library_serves_every_id() {
        let library = builtin();
        for (id, _) in SOURCES {
            assert!(library.source(id).is_some());
        }
        assert!(library.source("generic_diffuse_vs").is_none());
    }
}
