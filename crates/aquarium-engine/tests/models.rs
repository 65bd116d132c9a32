mod common;

use aquarium_engine::render::model::{FishInstance, GenericLayout, MAX_SEAWEED_INSTANCES};
use aquarium_engine::render::{
    Context, ContextState, HeadlessBackend, InstanceUniforms, Model, ModelGroup, ModelName,
    RenderError, ResourceMap, ViewUniforms,
};

use common::{Assets, context, program};

fn init_model(
    ctx: &mut Context<HeadlessBackend>,
    group: &str,
    name: ModelName,
    resources: &ResourceMap<'_>,
) -> Model {
    let program = program(ctx);
    let mut model = ctx.create_model(group, name, false).expect("known group");
    model.init(ctx, &program, resources).expect("init");
    model
}

fn view() -> InstanceUniforms {
    InstanceUniforms::View(ViewUniforms::default())
}

#[test]
fn every_kind_binds_exactly_its_declared_slots() {
    let mut ctx = context();
    let assets = Assets::load(&mut ctx);
    let resources = assets.full();

    let cases = [
        ("generic", ModelName::Arch, 1),
        ("fish", ModelName::SmallFishA, 4),
        ("seaweed", ModelName::SeaweedA, 4),
        ("inner", ModelName::GlobeInner, 3),
        ("outside", ModelName::EnvironmentBox, 3),
    ];

    for (group, name, group_count) in cases {
        let model = init_model(&mut ctx, group, name, &resources);
        let bindings = model.bindings().expect("initialized");
        assert_eq!(bindings.bind_groups.len(), group_count, "{group}");

        for (_, bind_group) in &bindings.bind_groups {
            let layout = ctx.bind_group_layout_of(*bind_group).expect("live group");
            let declared = ctx.layout_desc(layout).expect("live layout").len();
            let bound = ctx
                .backend()
                .bind_group_entries(*bind_group)
                .expect("recorded group")
                .len();
            assert_eq!(declared, bound, "{group}: group {bind_group:?}");
        }
    }
}

#[test]
fn draw_calls_follow_pipeline_layout_order() {
    let mut ctx = context();
    let assets = Assets::load(&mut ctx);
    let resources = assets.full();

    for group in ["generic", "fish", "seaweed", "inner", "outside"] {
        let name = match group {
            "fish" => ModelName::BigFishA,
            "seaweed" => ModelName::SeaweedB,
            "inner" => ModelName::GlobeInner,
            "outside" => ModelName::EnvironmentBox,
            _ => ModelName::RockA,
        };
        let mut model = init_model(&mut ctx, group, name, &resources);
        let instance = if model.group() == ModelGroup::Fish {
            InstanceUniforms::Fish(FishInstance::default())
        } else {
            view()
        };
        model.update_per_instance_uniforms(&instance, 0.0).unwrap();

        let call = model.pending_draw_call().expect("pending draw");
        ctx.check_draw_call(&call).unwrap();

        let bindings = model.bindings().unwrap();
        let layouts = ctx
            .pipeline_layout_groups(bindings.pipeline_layout)
            .expect("pipeline layout")
            .to_vec();
        assert_eq!(layouts.len(), call.bind_groups.len());
        for (position, (index, bind_group)) in call.bind_groups.iter().enumerate() {
            assert_eq!(*index as usize, position);
            assert_eq!(ctx.bind_group_layout_of(*bind_group), Some(layouts[position]));
        }
        assert!(layouts.contains(&bindings.model_layout));
    }
}

#[test]
fn generic_layout_follows_available_textures() {
    let mut ctx = context();
    let assets = Assets::load(&mut ctx);

    let cases = [
        (ModelName::Arch, assets.full(), GenericLayout::Reflection, 7),
        (ModelName::Arch, assets.normal_mapped(), GenericLayout::NormalMapped, 8),
        (ModelName::Arch, assets.diffuse_only(), GenericLayout::DiffuseOnly, 3),
        (ModelName::GlobeBase, assets.full(), GenericLayout::DiffuseOnly, 3),
    ];

    for (name, resources, expected, slots) in cases {
        let model = init_model(&mut ctx, "generic", name, &resources);
        let Model::Generic(generic) = &model else {
            panic!("expected a generic model");
        };
        assert_eq!(generic.layout(), Some(expected), "{name}");

        let bindings = generic.bindings().unwrap();
        assert_eq!(ctx.layout_desc(bindings.model_layout).unwrap().len(), slots);
        assert_eq!(
            ctx.pipeline_layout_groups(bindings.pipeline_layout).unwrap(),
            &[bindings.model_layout]
        );
    }
}

#[test]
fn generic_vertex_inputs_include_tangents_only_when_present() {
    let mut ctx = context();
    let assets = Assets::load(&mut ctx);

    let plain = init_model(&mut ctx, "generic", ModelName::Coral, &assets.diffuse_only());
    let mapped = init_model(&mut ctx, "generic", ModelName::Coral, &assets.normal_mapped());

    assert_eq!(plain.bindings().unwrap().vertex_buffers.len(), 3);
    assert_eq!(mapped.bindings().unwrap().vertex_buffers.len(), 5);
}

#[test]
fn repeated_draws_record_identical_calls() {
    let mut ctx = context();
    let assets = Assets::load(&mut ctx);
    let mut model = init_model(&mut ctx, "generic", ModelName::Stone, &assets.diffuse_only());

    ctx.pre_frame().unwrap();
    for _ in 0..4 {
        model.draw(&mut ctx).unwrap();
    }
    ctx.flush().unwrap();

    let frame = ctx.backend().last_frame().unwrap();
    assert_eq!(frame.draws.len(), 4);
    assert!(frame.draws.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn seaweed_batches_instances_and_resets_after_draw() {
    let mut ctx = context();
    let assets = Assets::load(&mut ctx);
    let mut model = init_model(&mut ctx, "seaweed", ModelName::SeaweedA, &assets.diffuse_only());

    let clock = 2.5;
    let count = 5;
    for _ in 0..count {
        model.update_per_instance_uniforms(&view(), clock).unwrap();
    }

    let Model::Seaweed(seaweed) = &model else {
        panic!("expected seaweed");
    };
    assert_eq!(seaweed.instance_count(), count);
    assert_eq!(seaweed.instance_time(count - 1), Some(clock + (count - 1) as f32));

    ctx.pre_frame().unwrap();
    model.draw(&mut ctx).unwrap();
    ctx.flush().unwrap();

    let frame = ctx.backend().last_frame().unwrap();
    assert_eq!(frame.draws.len(), 1);
    assert_eq!(frame.draws[0].instance_count, count as u32);

    let Model::Seaweed(seaweed) = &model else {
        unreachable!();
    };
    assert_eq!(seaweed.instance_count(), 0);

    let times = seaweed.time_buffer().unwrap();
    let offset = ((count - 1) * 16) as u64;
    let bytes = ctx.read_buffer_data(times, offset, 4).unwrap();
    let last: f32 = bytemuck::pod_read_unaligned(&bytes);
    assert_eq!(last, clock + (count - 1) as f32);

    // An empty batch records nothing.
    ctx.pre_frame().unwrap();
    model.draw(&mut ctx).unwrap();
    ctx.flush().unwrap();
    assert!(ctx.backend().last_frame().unwrap().draws.is_empty());
}

#[test]
fn seaweed_rejects_instances_past_capacity() {
    let mut ctx = context();
    let assets = Assets::load(&mut ctx);
    let mut model = init_model(&mut ctx, "seaweed", ModelName::SeaweedB, &assets.diffuse_only());

    for _ in 0..MAX_SEAWEED_INSTANCES {
        model.update_per_instance_uniforms(&view(), 0.0).unwrap();
    }
    assert!(matches!(
        model.update_per_instance_uniforms(&view(), 0.0),
        Err(RenderError::InstanceCapacityExceeded { capacity: MAX_SEAWEED_INSTANCES })
    ));
}

#[test]
fn fish_draw_covers_every_staged_instance() {
    let mut ctx = context();
    let assets = Assets::load(&mut ctx);
    let mut model = init_model(
        &mut ctx,
        "fishInstancedDraw",
        ModelName::MediumFishB,
        &assets.full(),
    );

    for i in 0..3 {
        let fish = FishInstance {
            world_position: [i as f32, 0.0, 0.0],
            scale: 1.0,
            next_position: [i as f32 + 1.0, 0.0, 0.0],
            time: i as f32 * 0.25,
        };
        model
            .update_per_instance_uniforms(&InstanceUniforms::Fish(fish), 0.0)
            .unwrap();
    }

    ctx.pre_frame().unwrap();
    model.draw(&mut ctx).unwrap();
    ctx.flush().unwrap();

    let frame = ctx.backend().last_frame().unwrap();
    assert_eq!(frame.draws.len(), 1);
    assert_eq!(frame.draws[0].instance_count, 3);
    assert!(model.pending_draw_call().is_none());
}

#[test]
fn single_triangle_end_to_end() {
    let mut ctx = context();
    let assets = Assets::load(&mut ctx);
    let mut model = init_model(&mut ctx, "generic", ModelName::FloorCenter, &assets.diffuse_only());

    ctx.pre_frame().unwrap();
    model.update_per_instance_uniforms(&view(), 0.0).unwrap();
    model.draw(&mut ctx).unwrap();
    ctx.flush().unwrap();

    let backend = ctx.backend();
    assert_eq!(backend.presented(), 1);
    let frame = backend.last_frame().unwrap();
    assert_eq!(frame.clear, Default::default());
    assert_eq!(frame.draws.len(), 1);
    assert_eq!(frame.draws[0].index_count, 3);
    assert_eq!(frame.draws[0].instance_count, 1);
    assert_eq!(frame.draws[0].index_format, wgpu::IndexFormat::Uint16);
}

#[test]
fn unknown_group_tag_yields_no_model() {
    let ctx = context();
    assert!(ctx.create_model("kelp", ModelName::SeaweedA, false).is_none());
}

#[test]
fn missing_resources_fail_init() {
    let mut ctx = context();
    let assets = Assets::load(&mut ctx);
    let program = program(&mut ctx);

    let mut fish = ctx.create_model("fish", ModelName::SmallFishA, false).unwrap();
    let err = fish.init(&mut ctx, &program, &assets.diffuse_only()).unwrap_err();
    assert!(matches!(err, RenderError::MissingResource { model: "fish", .. }));
    assert!(!fish.is_initialized());

    let mut outside = ctx.create_model("outside", ModelName::EnvironmentBox, false).unwrap();
    let err = outside.init(&mut ctx, &program, &ResourceMap::new()).unwrap_err();
    assert!(matches!(err, RenderError::MissingResource { name: "diffuse", .. }));
}

#[test]
fn invalid_shader_fails_pipeline_creation() {
    let mut ctx = context();
    let assets = Assets::load(&mut ctx);
    let broken = ctx.create_program(&common::shaders(), "broken", "fs").unwrap();
    assert!(!broken.is_valid());

    let mut model = ctx.create_model("generic", ModelName::RockB, false).unwrap();
    let err = model.init(&mut ctx, &broken, &assets.diffuse_only()).unwrap_err();
    assert!(matches!(err, RenderError::InvalidShaderModule(_)));
}

#[test]
fn drawing_requires_init_and_an_open_frame() {
    let mut ctx = context();
    let assets = Assets::load(&mut ctx);

    let mut raw = ctx.create_model("outside", ModelName::EnvironmentBox, false).unwrap();
    ctx.pre_frame().unwrap();
    assert!(matches!(raw.draw(&mut ctx), Err(RenderError::ModelNotInitialized(_))));
    ctx.flush().unwrap();

    let resources = assets.diffuse_only();
    let mut model = init_model(&mut ctx, "outside", ModelName::EnvironmentBox, &resources);
    assert!(matches!(model.draw(&mut ctx), Err(RenderError::InvalidState { .. })));
}

#[test]
fn destroy_releases_model_buffers() {
    let mut ctx = context();
    let assets = Assets::load(&mut ctx);
    let before = ctx.backend().live_buffers();

    let model = init_model(&mut ctx, "seaweed", ModelName::SeaweedA, &assets.diffuse_only());
    assert_eq!(ctx.backend().live_buffers(), before + 3);

    model.destroy(&mut ctx);
    assert_eq!(ctx.backend().live_buffers(), before);
}

#[test]
fn repeated_init_and_destroy_leaves_only_the_globals() {
    let mut ctx = context();
    let assets = Assets::load(&mut ctx);
    let program = program(&mut ctx);

    for _ in 0..5 {
        let mut model = ctx.create_model("generic", ModelName::Arch, false).unwrap();
        model.init(&mut ctx, &program, &assets.full()).unwrap();
        model.destroy(&mut ctx);
    }

    let backend = ctx.backend();
    assert_eq!(backend.live_bind_groups(), 2);
    assert_eq!(backend.live_bind_group_layouts(), 2);
    assert_eq!(backend.live_pipelines(), 0);
    assert_eq!(backend.live_pipeline_layouts(), 0);
}

#[test]
fn destroy_keeps_the_shared_groups_alive() {
    let mut ctx = context();
    let assets = Assets::load(&mut ctx);
    let resources = assets.full();

    let cases = [
        ("fish", ModelName::BigFishB),
        ("seaweed", ModelName::SeaweedA),
        ("inner", ModelName::GlobeInner),
        ("outside", ModelName::EnvironmentBox),
    ];
    for (group, name) in cases {
        let model = init_model(&mut ctx, group, name, &resources);
        let bindings = model.bindings().unwrap().clone();
        model.destroy(&mut ctx);

        assert_eq!(ctx.pipeline_layout_of(bindings.pipeline), None, "{group}");
        assert_eq!(ctx.pipeline_layout_groups(bindings.pipeline_layout), None);
        for (layout, bind_group) in &bindings.owned_groups {
            assert_eq!(ctx.layout_desc(*layout), None, "{group}");
            assert_eq!(ctx.bind_group_layout_of(*bind_group), None, "{group}");
        }
    }

    let globals = ctx.globals().unwrap();
    assert_eq!(
        ctx.bind_group_layout_of(globals.general_group),
        Some(globals.general_layout)
    );
    assert_eq!(
        ctx.bind_group_layout_of(globals.world_group),
        Some(globals.world_layout)
    );
    assert_eq!(ctx.backend().live_bind_groups(), 2);
    assert_eq!(ctx.backend().live_pipelines(), 0);
}

#[test]
fn skipped_frame_discards_staged_instances() {
    let mut ctx = context();
    let assets = Assets::load(&mut ctx);
    let mut model = init_model(&mut ctx, "seaweed", ModelName::SeaweedA, &assets.diffuse_only());

    for _ in 0..12 {
        model.update_per_instance_uniforms(&view(), 1.0).unwrap();
    }
    ctx.backend_mut().skip_next_frames(1);
    assert!(matches!(ctx.pre_frame(), Err(RenderError::FrameUnavailable)));
    assert_eq!(ctx.state(), ContextState::Ready);
    model.clear_instances();

    for _ in 0..12 {
        model.update_per_instance_uniforms(&view(), 2.0).unwrap();
    }
    let Model::Seaweed(seaweed) = &model else {
        panic!("expected seaweed");
    };
    assert_eq!(seaweed.instance_count(), 12);
    assert_eq!(seaweed.instance_time(0), Some(2.0));

    ctx.pre_frame().unwrap();
    model.draw(&mut ctx).unwrap();
    ctx.flush().unwrap();
    assert_eq!(ctx.backend().last_frame().unwrap().draws[0].instance_count, 12);

    let mut fish = init_model(&mut ctx, "fish", ModelName::SmallFishA, &assets.full());
    fish.update_per_instance_uniforms(&InstanceUniforms::Fish(FishInstance::default()), 0.0)
        .unwrap();
    fish.clear_instances();
    assert!(fish.pending_draw_call().is_none());
}

#[test]
fn blend_is_a_pipeline_property() {
    let mut ctx = context();
    let assets = Assets::load(&mut ctx);
    let program = program(&mut ctx);
    let resources = assets.diffuse_only();

    let mut opaque = ctx.create_model("generic", ModelName::GlobeOuter, false).unwrap();
    let mut blended = ctx.create_model("generic", ModelName::GlobeOuter, true).unwrap();
    opaque.init(&mut ctx, &program, &resources).unwrap();
    blended.init(&mut ctx, &program, &resources).unwrap();

    let state = |model: &Model| {
        ctx.backend()
            .pipeline_state(model.bindings().unwrap().pipeline)
            .cloned()
            .unwrap()
    };
    assert_ne!(state(&opaque), state(&blended));
}
