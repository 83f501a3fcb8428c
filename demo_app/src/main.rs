//! Cube drop demo
//!
//! Builds the default cube scene: a dynamic cube with a wireframe collider
//! visual falls onto a static floor slab. Runs headless for a fixed number
//! of frames and logs the cube's height.
//!
//! Usage: `cube_drop [config.toml|config.ron] [frames]`

use scene_engine::foundation::logging;
use scene_engine::foundation::math::utils::rotation_x_deg;
use scene_engine::physics::{MOVING, NON_MOVING};
use scene_engine::prelude::*;

const DEFAULT_FRAMES: u64 = 180;

/// Logs the node's height every `interval` seconds
struct HeightLogger {
    base: BehaviourBase,
    interval: f32,
    elapsed: f32,
}

impl HeightLogger {
    fn new(ctx: &AttachContext<'_>) -> Self {
        Self {
            base: BehaviourBase::new(ctx.node()),
            interval: 0.5,
            elapsed: 0.0,
        }
    }
}

impl Component for HeightLogger {
    fn node(&self) -> NodeId {
        self.base.node
    }

    fn kinds(&self) -> ComponentKind {
        ComponentKind::LIFECYCLE_BEHAVIOUR
    }
}

impl Behaviour for HeightLogger {
    fn enabled(&self) -> bool {
        self.base.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.base.enabled = enabled;
    }
}

impl LifecycleBehaviour for HeightLogger {
    fn hooks(&self) -> Hooks {
        Hooks::START | Hooks::UPDATE | Hooks::TRIGGER_ENTER
    }

    fn start(&mut self, ctx: &mut BehaviourContext<'_>) {
        if let Some(object) = ctx.object() {
            log::info!("Cube starts at y = {:.3}", object.borrow().transform.position.y);
        }
    }

    fn update(&mut self, ctx: &mut BehaviourContext<'_>, delta: f32) {
        self.elapsed += delta;
        if self.elapsed < self.interval {
            return;
        }
        self.elapsed = 0.0;
        if let Some(object) = ctx.object() {
            log::info!("Cube at y = {:.3}", object.borrow().world_transform().position.y);
        }
    }

    fn on_trigger_enter(&mut self, _ctx: &mut BehaviourContext<'_>, other: NodeId) {
        log::info!("Cube touched node {:?}", other);
    }
}

/// Falling cube above a floor slab
struct CubeScene;

impl Application for CubeScene {
    fn setup(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        let world = engine.world_mut();
        let moving = world.layers().get_layer(MOVING).unwrap_or(LAYER_MOVING);
        let non_moving = world.layers().get_layer(NON_MOVING).unwrap_or(LAYER_NON_MOVING);

        let cube = world.create_node(
            SceneObject::new("cube")
                .with_transform(Transform::from_position(Vec3::new(0.0, 2.0, 0.0)))
                .with_visual(Visual::Mesh("cube".to_string())),
            moving,
        );
        world.add_component(cube, Collider::unit_box)?;
        let visualizer = world.try_add_component(cube, BoxColliderVisualizer::new)?;
        let logger = world.add_component(cube, HeightLogger::new)?;
        let cube_body = world.add_component(cube, Rigidbody::dynamic)?;

        let floor = world.create_node(
            SceneObject::new("floor").with_transform(Transform::from_position_rotation(
                Vec3::zeros(),
                rotation_x_deg(-90.0),
            )),
            non_moving,
        );
        world.add_component(floor, |ctx| {
            Collider::cuboid(ctx, Vec3::zeros(), Vec3::new(10.0, 10.0, 0.1))
        })?;
        let floor_body = world.add_component(floor, Rigidbody::fixed)?;

        engine.add_body(&cube_body);
        engine.add_body(&floor_body);
        engine.register_behaviour(&visualizer);
        engine.register_behaviour(&logger);

        log::info!("Cube scene ready with {} nodes", engine.world().node_count());
        Ok(())
    }

    fn teardown(&mut self, engine: &mut Engine) {
        log::info!(
            "Ran {} frames, {} simulation steps",
            engine.frame_count(),
            engine.step_loop().steps_taken()
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => EngineConfig::load_from_file(&path)?,
        None => EngineConfig::default(),
    };
    let frames = match args.next() {
        Some(value) => value.parse()?,
        None => DEFAULT_FRAMES,
    };

    logging::init_with_level(config.logging.level_filter());
    log::info!("Starting cube drop demo for {} frames", frames);

    let mut engine = Engine::with_rapier(config)?;
    engine.init()?;
    engine.run(&mut CubeScene, Some(frames))?;
    Ok(())
}
