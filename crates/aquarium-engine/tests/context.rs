mod common;

use aquarium_engine::render::scene::{FogUniforms, LightWorldPositionUniform};
use std::path::{Path, PathBuf};

use aquarium_engine::render::{
    BindingEntry, BindingSpec, ClearValues, Context, ContextState, HeadlessBackend, RenderError,
    SceneState, TextureSource, ViewDimension,
};

use common::context;

#[test]
fn buffer_writes_read_back_in_place() {
    let mut ctx = context();
    let buffer = ctx
        .create_buffer("scratch", 64, wgpu::BufferUsages::UNIFORM)
        .unwrap();

    let payload: [f32; 4] = [1.0, 2.0, 3.0, 4.0];
    ctx.set_buffer_data(&buffer, 16, bytemuck::cast_slice(&payload))
        .unwrap();

    let bytes = ctx.read_buffer_data(&buffer, 16, 16).unwrap();
    assert_eq!(bytes.as_slice(), bytemuck::cast_slice::<f32, u8>(&payload));

    let untouched = ctx.read_buffer_data(&buffer, 0, 16).unwrap();
    assert!(untouched.iter().all(|b| *b == 0));
}

#[test]
fn later_writes_win() {
    let mut ctx = context();
    let buffer = ctx
        .create_buffer_from_data("ubo", &[0; 8], wgpu::BufferUsages::UNIFORM)
        .unwrap();

    ctx.set_buffer_data(&buffer, 0, &[1; 8]).unwrap();
    ctx.set_buffer_data(&buffer, 4, &[2; 4]).unwrap();

    assert_eq!(
        ctx.read_buffer_data(&buffer, 0, 8).unwrap(),
        vec![1, 1, 1, 1, 2, 2, 2, 2]
    );
}

#[test]
fn unaligned_writes_are_rejected_without_touching_the_buffer() {
    let mut ctx = context();
    let buffer = ctx
        .create_buffer_from_data("ubo", &[9; 8], wgpu::BufferUsages::UNIFORM)
        .unwrap();

    let short = ctx.set_buffer_data(&buffer, 0, &[1, 2]);
    assert!(matches!(short, Err(RenderError::UnalignedWrite { offset: 0, len: 2 })));

    let shifted = ctx.set_buffer_data(&buffer, 2, &[1; 4]);
    assert!(matches!(shifted, Err(RenderError::UnalignedWrite { offset: 2, len: 4 })));

    let past_end = ctx.set_buffer_data(&buffer, 4, &[1; 8]);
    assert!(matches!(past_end, Err(RenderError::BufferRange { end: 12, size: 8, .. })));

    assert_eq!(ctx.read_buffer_data(&buffer, 0, 8).unwrap(), vec![9; 8]);
}

#[test]
fn huge_ranges_are_errors_not_overflows() {
    let mut ctx = context();
    let buffer = ctx
        .create_buffer("scratch", 16, wgpu::BufferUsages::UNIFORM)
        .unwrap();

    let read = ctx.read_buffer_data(&buffer, u64::MAX, 1);
    assert!(matches!(read, Err(RenderError::RangeOverflow { .. })));

    let read = ctx.read_buffer_data(&buffer, 8, u64::MAX);
    assert!(matches!(read, Err(RenderError::RangeOverflow { len: u64::MAX, .. })));

    let write = ctx.set_buffer_data(&buffer, u64::MAX - 3, &[0; 4]);
    assert!(matches!(write, Err(RenderError::RangeOverflow { .. })));
}

#[test]
fn general_resources_are_required_and_refreshable() {
    let mut ctx = Context::new(HeadlessBackend::default());
    assert!(matches!(ctx.globals(), Err(RenderError::GlobalsMissing)));

    let mut scene = SceneState::default();
    ctx.init_general_resources(&scene).unwrap();
    let live = ctx.backend().live_buffers();

    scene.fog = FogUniforms {
        fog_power: 14.5,
        fog_mult: 1.66,
        fog_offset: 0.53,
        _pad: 0.0,
        fog_color: [0.54, 0.86, 1.0, 1.0],
    };
    ctx.init_general_resources(&scene).unwrap();
    assert_eq!(ctx.backend().live_buffers(), live);

    let globals = ctx.globals().unwrap();
    let fog = ctx.backend().buffer_contents(globals.fog.id()).unwrap();
    assert_eq!(fog, bytemuck::bytes_of(&scene.fog));
}

#[test]
fn world_uniforms_follow_the_camera() {
    let mut ctx = context();
    let mut scene = SceneState::default();
    scene.light_world_position = LightWorldPositionUniform {
        light_world_pos: [0.0, 100.0, 0.0],
        ..Default::default()
    };
    scene.view.world[3] = [1.0, 2.0, 3.0, 1.0];

    ctx.update_world_uniforms(&scene);

    let globals = ctx.globals().unwrap();
    let backend = ctx.backend();
    assert_eq!(
        backend.buffer_contents(globals.light_world_position.id()).unwrap(),
        bytemuck::bytes_of(&scene.light_world_position)
    );
    assert_eq!(
        backend.buffer_contents(globals.view.id()).unwrap(),
        bytemuck::bytes_of(&scene.view)
    );
}

#[test]
fn general_and_world_groups_match_their_layouts() {
    let ctx = context();
    let globals = ctx.globals().unwrap();

    assert_eq!(ctx.layout_desc(globals.general_layout).unwrap().len(), 2);
    assert_eq!(ctx.layout_desc(globals.world_layout).unwrap().len(), 1);
    assert_eq!(
        ctx.bind_group_layout_of(globals.general_group),
        Some(globals.general_layout)
    );
    assert_eq!(
        ctx.bind_group_layout_of(globals.world_group),
        Some(globals.world_layout)
    );
}

#[test]
fn bind_groups_must_cover_their_layout() {
    let mut ctx = context();
    let ubo = ctx
        .create_uniform_buffer("ubo", &[0.0f32; 4])
        .unwrap();
    let texture = ctx
        .create_texture_from_rgba("white", ViewDimension::D2, 1, 1, &[&[255u8; 4][..]])
        .unwrap();
    let layout = ctx
        .make_bind_group_layout(
            "pair",
            [
                BindingSpec::uniform(0, wgpu::ShaderStages::FRAGMENT),
                BindingSpec::texture(1, wgpu::ShaderStages::FRAGMENT),
            ],
        )
        .unwrap();

    let short = ctx.make_bind_group("short", layout, &[BindingEntry::new(0, ubo.binding())]);
    assert!(matches!(short, Err(RenderError::BindingCountMismatch { .. })));

    let swapped = ctx.make_bind_group(
        "swapped",
        layout,
        &[
            BindingEntry::new(0, texture.view_binding()),
            BindingEntry::new(1, ubo.binding()),
        ],
    );
    assert!(matches!(swapped, Err(RenderError::BindingKindMismatch { .. })));

    ctx.make_bind_group(
        "ok",
        layout,
        &[
            BindingEntry::new(0, ubo.binding()),
            BindingEntry::new(1, texture.view_binding()),
        ],
    )
    .unwrap();
}

#[test]
fn cubemaps_need_six_faces() {
    let mut ctx = context();
    let face: &[u8] = &[0, 0, 0, 255];

    let err = ctx
        .create_texture_from_rgba("sky", ViewDimension::Cube, 1, 1, &[face; 5])
        .unwrap_err();
    assert!(matches!(err, RenderError::InvalidTexture { .. }));

    let sky = ctx
        .create_texture_from_rgba("sky", ViewDimension::Cube, 1, 1, &[face; 6])
        .unwrap();
    assert_eq!(sky.dimension(), ViewDimension::Cube);
}

#[test]
fn missing_shader_source_is_an_error() {
    let mut ctx = context();
    let err = ctx
        .create_program(&common::shaders(), "vs", "nowhere")
        .unwrap_err();
    assert!(matches!(err, RenderError::ShaderSourceNotFound(id) if id == "nowhere"));
}

#[test]
fn clear_values_reach_the_frame() {
    let mut ctx = context();
    let clear = ClearValues {
        color: wgpu::Color::BLACK,
        depth: 0.5,
        stencil: 1,
    };
    ctx.set_clear_values(clear);

    ctx.pre_frame().unwrap();
    ctx.flush().unwrap();

    assert_eq!(ctx.backend().last_frame().unwrap().clear, clear);
}

#[test]
fn terminate_closes_an_open_frame() {
    let mut ctx = context();
    ctx.pre_frame().unwrap();
    ctx.terminate();

    assert_eq!(ctx.state(), ContextState::Terminated);
    assert_eq!(ctx.backend().presented(), 1);
    assert!(matches!(ctx.flush(), Err(RenderError::InvalidState { .. })));
}

fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]))
        .save(&path)
        .unwrap();
    path
}

#[test]
fn file_textures_take_the_image_size() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "sand.png", 2, 3);
    let mut ctx = context();

    let sand = ctx
        .create_texture("sand", &TextureSource::File(path))
        .unwrap();
    assert_eq!(sand.size(), (2, 3));
    assert_eq!(sand.dimension(), ViewDimension::D2);
    assert_eq!(
        ctx.backend().texture_extent(sand.id()),
        Some((ViewDimension::D2, 2, 3))
    );
}

#[test]
fn cube_textures_assemble_six_faces() {
    let dir = tempfile::tempdir().unwrap();
    let faces: [PathBuf; 6] =
        std::array::from_fn(|i| write_png(dir.path(), &format!("sky_{i}.png"), 4, 4));
    let mut ctx = context();

    let sky = ctx
        .create_texture("sky", &TextureSource::Cube(faces.clone()))
        .unwrap();
    assert_eq!(sky.dimension(), ViewDimension::Cube);
    assert_eq!(
        ctx.backend().texture_extent(sky.id()),
        Some((ViewDimension::Cube, 4, 4))
    );

    let mut uneven = faces;
    uneven[5] = write_png(dir.path(), "sky_small.png", 2, 2);
    let err = ctx
        .create_texture("sky", &TextureSource::Cube(uneven))
        .unwrap_err();
    assert!(matches!(err, RenderError::InvalidTexture { .. }));
}

#[test]
fn missing_image_files_are_decode_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nowhere.png");
    let mut ctx = context();
    let textures = ctx.backend().live_textures();

    let err = ctx
        .create_texture("nowhere", &TextureSource::File(missing.clone()))
        .unwrap_err();
    assert!(matches!(err, RenderError::Image { path, .. } if path == missing));
    assert_eq!(ctx.backend().live_textures(), textures);
}

#[test]
fn destroying_a_texture_frees_its_sampler() {
    let mut ctx = context();
    let samplers = ctx.backend().live_samplers();
    let pixel: &[u8] = &[255; 4];

    for _ in 0..10 {
        let texture = ctx
            .create_texture_from_rgba("white", ViewDimension::D2, 1, 1, &[pixel])
            .unwrap();
        ctx.destroy_texture(texture);
    }

    assert_eq!(ctx.backend().live_textures(), 0);
    assert_eq!(ctx.backend().live_samplers(), samplers);
}
