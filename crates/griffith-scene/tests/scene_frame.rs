use griffith_config::{Config, StartWeather};
use griffith_render::{
    MeshKind, RecordingRenderer, RenderCommand, RenderTarget, SceneRenderer, ShaderVariant,
    ShadowStage,
};
use griffith_scene::{GriffithScene, SceneControl};

fn create_scene(config: &Config) -> (RecordingRenderer, GriffithScene) {
    let mut renderer = RecordingRenderer::new(1080, 600);
    let scene = GriffithScene::from_config(&mut renderer, config).unwrap();
    renderer.clear_commands();
    (renderer, scene)
}

fn rainy() -> Config {
    let mut config = Config::default();
    config.weather.start = StartWeather::Rain;
    config
}

#[test]
fn frame_draws_depth_pass_before_canvas() {
    let (mut renderer, mut scene) = create_scene(&Config::default());
    let report = scene.frame(&mut renderer, 0.016).unwrap();

    let depth = RenderTarget::Depth(scene.shadows().depth_texture());
    let commands = renderer.commands();
    assert_eq!(commands.first(), Some(&RenderCommand::Bind(depth)));
    let unbind_depth = commands
        .iter()
        .position(|c| *c == RenderCommand::Unbind(depth))
        .unwrap();
    let bind_canvas = commands
        .iter()
        .position(|c| *c == RenderCommand::Bind(RenderTarget::Canvas))
        .unwrap();
    assert!(unbind_depth < bind_canvas);
    assert_eq!(
        commands.last(),
        Some(&RenderCommand::Unbind(RenderTarget::Canvas))
    );
    assert_eq!(renderer.bound_target(), None);
    assert_eq!(scene.shadows().stage(), ShadowStage::Idle);

    assert_eq!(renderer.draws_on(depth).count(), report.stats.shadow_casters);
    assert_eq!(
        renderer.draws_on(RenderTarget::Canvas).count(),
        report.stats.camera_draws
    );
    assert_eq!(scene.frames_rendered(), 1);
}

#[test]
fn depth_pass_matches_canvas_casters() {
    let (mut renderer, mut scene) = create_scene(&rainy());
    for _ in 0..3 {
        renderer.clear_commands();
        scene.frame(&mut renderer, 0.05).unwrap();
    }

    let depth = RenderTarget::Depth(scene.shadows().depth_texture());
    let depth_transforms: Vec<_> = renderer.draws_on(depth).map(|d| d.transform).collect();
    let caster_transforms: Vec<_> = renderer
        .draws_on(RenderTarget::Canvas)
        .filter(|d| d.material.casts_shadows)
        .map(|d| d.transform)
        .collect();
    assert_eq!(depth_transforms, caster_transforms);
    assert!(
        renderer
            .draws_on(depth)
            .all(|d| d.variant == ShaderVariant::DepthOnly)
    );
}

#[test]
fn rain_is_drawn_after_the_scene_without_shadows() {
    let (mut renderer, mut scene) = create_scene(&rainy());
    let clear = scene.frame(&mut renderer, 0.0).unwrap();
    assert_eq!(clear.particles_drawn, 0);

    renderer.clear_commands();
    let report = scene.frame(&mut renderer, 0.05).unwrap();
    assert_eq!(report.particles_drawn, scene.weather().len());
    assert!(report.particles_drawn > 0);
    assert_eq!(report.stats.shadow_casters, clear.stats.shadow_casters);
    assert_eq!(
        report.stats.camera_draws,
        clear.stats.camera_draws + report.particles_drawn
    );

    let canvas: Vec<_> = renderer.draws_on(RenderTarget::Canvas).collect();
    let particles = &canvas[canvas.len() - report.particles_drawn..];
    assert!(
        particles
            .iter()
            .all(|d| d.mesh == MeshKind::Sphere && !d.material.casts_shadows)
    );
}

#[test]
fn night_frames_skip_shadow_lookups() {
    let mut config = Config::default();
    config.sky.half_period_seconds = 1;
    let (mut renderer, mut scene) = create_scene(&config);

    let mut toggles = 0;
    let mut was_day = true;
    for _ in 0..6 {
        renderer.clear_commands();
        let report = scene.frame(&mut renderer, 0.25).unwrap();
        if report.is_daytime != was_day {
            toggles += 1;
            was_day = report.is_daytime;
        }
    }
    assert_eq!(toggles, 1);
    assert!(!was_day);

    let variants: Vec<_> = renderer
        .draws_on(RenderTarget::Canvas)
        .map(|d| d.variant)
        .collect();
    assert!(!variants.contains(&ShaderVariant::Shadowed));
    assert!(variants.contains(&ShaderVariant::Phong));

    let lights = renderer
        .draws_on(RenderTarget::Canvas)
        .map(|d| d.light_count)
        .max();
    assert_eq!(lights, Some(15));
}

#[test]
fn controls_take_effect_between_frames() {
    let (mut renderer, mut scene) = create_scene(&Config::default());
    let before = scene.frame(&mut renderer, 0.016).unwrap();

    scene.apply(SceneControl::MoreBuildings);
    let after = scene.frame(&mut renderer, 0.016).unwrap();
    assert_eq!(after.stats.shadow_casters, before.stats.shadow_casters + 1);

    scene.apply(SceneControl::ToggleCamera);
    scene.apply(SceneControl::ResetCamera);
    scene.frame(&mut renderer, 0.016).unwrap();
    assert!(scene.camera().is_transitioning());
}
