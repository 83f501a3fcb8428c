//! Frame driver behaviour dispatch, node destruction and the fixed-step loop

mod common;

use std::time::{Duration, Instant};

use approx::assert_relative_eq;
use common::{basic_engine, count, new_log, Recorder};
use scene_engine::physics::{FixedStepLoop, RapierPhysics};
use scene_engine::prelude::*;
use scene_engine::scene::{HeadlessRenderer, Visual};

const ALL_HOOKS: Hooks = Hooks::all();

#[test]
fn disabled_behaviour_receives_no_updates() {
    let mut engine = basic_engine();
    let log = new_log();
    let node = engine.world_mut().create_node(SceneObject::new("n"), LAYER_MOVING);
    let recorder = engine
        .world_mut()
        .add_component(node, |ctx| Recorder::new(ctx, ALL_HOOKS, log.clone()))
        .expect("node exists");
    recorder.borrow_mut().set_enabled(false);
    engine.register_behaviour(&recorder);

    for _ in 0..3 {
        engine.step_simulation().expect("step");
        engine.frame_with_delta(0.016).expect("frame");
    }
    assert_eq!(count(&log, "update"), 0);
    assert_eq!(count(&log, "fixed_update"), 0);
    assert_eq!(count(&log, "late_update"), 0);
    assert_eq!(count(&log, "on_enable"), 0);
    assert_eq!(count(&log, "awake"), 1);

    recorder.borrow_mut().set_enabled(true);
    engine.frame_with_delta(0.016).expect("frame");
    let calls = log.borrow().clone();
    let enable_at = calls.iter().position(|c| *c == "on_enable").expect("enabled");
    let update_at = calls.iter().position(|c| *c == "update").expect("updated");
    assert!(enable_at < update_at);
    assert_eq!(count(&log, "on_enable"), 1);
}

#[test]
fn enable_edges_fire_once_and_start_once() {
    let mut engine = basic_engine();
    let log = new_log();
    let node = engine.world_mut().create_node(SceneObject::new("n"), LAYER_MOVING);
    let recorder = engine
        .world_mut()
        .add_component(node, |ctx| Recorder::new(ctx, ALL_HOOKS, log.clone()))
        .expect("node exists");
    engine.register_behaviour(&recorder);
    assert_eq!(count(&log, "on_enable"), 1);

    engine.frame_with_delta(0.016).expect("frame");
    recorder.borrow_mut().set_enabled(false);
    engine.frame_with_delta(0.016).expect("frame");
    engine.frame_with_delta(0.016).expect("frame");
    assert_eq!(count(&log, "on_disable"), 1);

    recorder.borrow_mut().set_enabled(true);
    engine.frame_with_delta(0.016).expect("frame");
    engine.frame_with_delta(0.016).expect("frame");
    assert_eq!(count(&log, "on_enable"), 2);
    assert_eq!(count(&log, "start"), 1);
    assert_eq!(count(&log, "update"), 3);
}

#[test]
fn disabling_the_node_disables_its_behaviours() {
    let mut engine = basic_engine();
    let log = new_log();
    let node = engine.world_mut().create_node(SceneObject::new("n"), LAYER_MOVING);
    let recorder = engine
        .world_mut()
        .add_component(node, |ctx| Recorder::new(ctx, ALL_HOOKS, log.clone()))
        .expect("node exists");
    engine.register_behaviour(&recorder);

    engine.world_mut().node_mut(node).expect("exists").enabled = false;
    engine.frame_with_delta(0.016).expect("frame");
    assert_eq!(count(&log, "on_disable"), 1);
    assert_eq!(count(&log, "update"), 0);
}

#[test]
fn undeclared_hooks_never_fire() {
    let mut engine = basic_engine();
    let log = new_log();
    let node = engine.world_mut().create_node(SceneObject::new("n"), LAYER_MOVING);
    let recorder = engine
        .world_mut()
        .add_component(node, |ctx| Recorder::new(ctx, Hooks::LATE_UPDATE, log.clone()))
        .expect("node exists");
    engine.register_behaviour(&recorder);

    engine.step_simulation().expect("step");
    engine.frame_with_delta(0.016).expect("frame");
    assert_eq!(*log.borrow(), vec!["late_update"]);
}

#[test]
fn unregister_fires_on_disable_and_rejects_stale_id() {
    let mut engine = basic_engine();
    let log = new_log();
    let node = engine.world_mut().create_node(SceneObject::new("n"), LAYER_MOVING);
    let recorder = engine
        .world_mut()
        .add_component(node, |ctx| Recorder::new(ctx, ALL_HOOKS, log.clone()))
        .expect("node exists");
    let id = engine.register_behaviour(&recorder);

    assert!(engine.unregister_behaviour(id));
    assert!(!engine.unregister_behaviour(id));
    assert_eq!(count(&log, "on_disable"), 1);
    engine.frame_with_delta(0.016).expect("frame");
    assert_eq!(count(&log, "update"), 0);
}

#[test]
fn destroying_a_node_releases_visuals_and_scene_entry() {
    let mut engine = basic_engine();
    let node = engine.world_mut().create_node(SceneObject::new("cube"), LAYER_MOVING);
    engine
        .world_mut()
        .add_component(node, Collider::unit_box)
        .expect("node exists");
    let visualizer = engine
        .world_mut()
        .try_add_component(node, BoxColliderVisualizer::new)
        .expect("box collider present");
    engine.register_behaviour(&visualizer);
    let object = engine.world().node(node).expect("exists").object().clone();
    assert_eq!(object.borrow().children().len(), 1);
    assert!(matches!(visualizer.borrow().group().borrow().visual, Visual::Lines(_)));

    assert!(engine.destroy_node(node));
    assert!(object.borrow().children().is_empty());
    assert!(!engine.world().scene().contains(node));
    assert!(engine.behaviours().is_empty());
}

#[test]
fn falling_cube_end_to_end() {
    let mut engine = basic_engine();
    let node = engine.world_mut().create_node(
        SceneObject::new("cube").with_transform(Transform::from_position(Vec3::new(0.0, 2.0, 0.0))),
        LAYER_MOVING,
    );
    engine
        .world_mut()
        .add_component(node, |ctx| Collider::cuboid(ctx, Vec3::new(0.0, 0.0, 2.0), Vec3::new(1.0, 1.0, 1.0)))
        .expect("node exists");
    let body = engine
        .world_mut()
        .add_component(node, Rigidbody::dynamic)
        .expect("node exists");
    engine.add_body(&body).expect("accepted");

    engine.step_simulation().expect("step");
    engine.frame_with_delta(0.0).expect("frame");
    assert!(body.borrow().position().y < 2.0);
}

#[test]
fn sync_runs_before_update() {
    use scene_engine::physics::BasicPhysics;

    let mut engine = basic_engine();
    let node = engine.world_mut().create_node(SceneObject::new("cube"), LAYER_MOVING);
    engine
        .world_mut()
        .add_component(node, Collider::unit_box)
        .expect("node exists");
    let body = engine
        .world_mut()
        .add_component(node, Rigidbody::dynamic)
        .expect("node exists");
    let handle = engine.add_body(&body).expect("accepted");

    let target = Vec3::new(0.0, 7.0, 0.0);
    engine
        .physics_as_mut::<BasicPhysics>()
        .expect("basic backend")
        .set_body_pose(handle, target, Quat::identity());

    // Nothing moves the node until the next frame syncs it.
    assert_eq!(body.borrow().position(), Vec3::zeros());
    engine.frame_with_delta(0.016).expect("frame");
    assert_eq!(body.borrow().position(), target);
}

#[test]
fn fixed_step_loop_schedule() {
    let start = Instant::now();
    let period = Duration::from_millis(125);
    let mut step_loop = FixedStepLoop::new(0.125, 3);
    assert_eq!(step_loop.due_steps(start + period), 0);

    assert!(step_loop.start(start));
    assert_eq!(step_loop.due_steps(start), 1);
    assert_eq!(step_loop.due_steps(start + period), 1);
    assert_eq!(step_loop.due_steps(start + period * 10), 3);

    let token = step_loop.token();
    token.stop();
    assert_eq!(step_loop.due_steps(start + period * 20), 0);
    assert!(!step_loop.is_running());
    assert!(!step_loop.start(start + period * 21));
}

#[test]
fn rapier_contact_reaches_behaviours() {
    let mut engine = Engine::new(
        EngineConfig::default(),
        Box::new(RapierPhysics::new()),
        Box::new(HeadlessRenderer::new()),
    )
    .expect("default config is valid");
    engine.init().expect("rapier initializes");

    let floor = engine.world_mut().create_node(SceneObject::new("floor"), LAYER_NON_MOVING);
    engine
        .world_mut()
        .add_component(floor, |ctx| Collider::plane(ctx, 0.0))
        .expect("node exists");
    let floor_body = engine
        .world_mut()
        .add_component(floor, Rigidbody::fixed)
        .expect("node exists");

    let ball = engine.world_mut().create_node(
        SceneObject::new("ball").with_transform(Transform::from_position(Vec3::new(0.0, 1.0, 0.0))),
        LAYER_MOVING,
    );
    engine
        .world_mut()
        .add_component(ball, |ctx| Collider::sphere(ctx, Vec3::zeros(), 0.5))
        .expect("node exists");
    let ball_body = engine
        .world_mut()
        .add_component(ball, Rigidbody::dynamic)
        .expect("node exists");
    let log = new_log();
    let recorder = engine
        .world_mut()
        .add_component(ball, |ctx| Recorder::new(ctx, Hooks::TRIGGER_ENTER, log.clone()))
        .expect("node exists");

    engine.add_body(&floor_body).expect("accepted");
    engine.add_body(&ball_body).expect("accepted");
    engine.register_behaviour(&recorder);

    for _ in 0..60 {
        engine.step_simulation().expect("step");
    }
    engine.frame_with_delta(0.0).expect("frame");

    assert!(recorder.borrow().contacts.contains(&("enter", floor)));
    assert!(ball_body.borrow().position().y > 0.0);
}

fn kinematic_box(engine: &mut Engine, name: &str, size: Vec3) -> ComponentRef<Rigidbody> {
    let node = engine.world_mut().create_node(SceneObject::new(name), LAYER_MOVING);
    engine
        .world_mut()
        .add_component(node, |ctx| Collider::cuboid(ctx, Vec3::zeros(), size))
        .expect("node exists");
    let body = engine
        .world_mut()
        .add_component(node, |ctx| Rigidbody::with_motion_type(ctx, MotionType::Kinematic))
        .expect("node exists");
    engine.add_body(&body).expect("accepted");
    body
}

fn nudge_x(body: &ComponentRef<Rigidbody>, dx: f32) {
    body.borrow().object().borrow_mut().transform.position.x += dx;
}

#[test]
fn kinematic_node_keeps_assigned_pose_across_frames() {
    use scene_engine::physics::BasicPhysics;

    let mut engine = basic_engine();
    let body = kinematic_box(&mut engine, "platform", Vec3::new(1.0, 1.0, 1.0));
    let handle = body.borrow().body_handle().expect("simulated");

    // Frames without a step in between must not pull the node back.
    for frame in 1..=4 {
        nudge_x(&body, 1.0);
        if frame % 2 == 0 {
            engine.step_simulation().expect("step");
        }
        engine.frame_with_delta(0.016).expect("frame");
        assert_relative_eq!(body.borrow().position().x, frame as f32);
    }

    let (position, _) = engine
        .physics_as::<BasicPhysics>()
        .expect("basic backend")
        .body_pose(handle)
        .expect("tracked");
    assert_relative_eq!(position.x, 4.0);
}

#[test]
fn rapier_kinematic_platform_carries_resting_box() {
    let mut engine = Engine::new(
        EngineConfig::default(),
        Box::new(RapierPhysics::new()),
        Box::new(HeadlessRenderer::new()),
    )
    .expect("default config is valid");
    engine.init().expect("rapier initializes");

    let platform = kinematic_box(&mut engine, "platform", Vec3::new(4.0, 0.2, 4.0));
    let crate_node = engine.world_mut().create_node(
        SceneObject::new("crate").with_transform(Transform::from_position(Vec3::new(0.0, 0.36, 0.0))),
        LAYER_MOVING,
    );
    engine
        .world_mut()
        .add_component(crate_node, |ctx| Collider::cuboid(ctx, Vec3::zeros(), Vec3::new(0.5, 0.5, 0.5)))
        .expect("node exists");
    let crate_body = engine
        .world_mut()
        .add_component(crate_node, Rigidbody::dynamic)
        .expect("node exists");
    engine.add_body(&crate_body).expect("accepted");

    for _ in 0..30 {
        engine.step_simulation().expect("step");
    }
    engine.frame_with_delta(0.0).expect("frame");
    let settled_x = crate_body.borrow().position().x;

    for step in 1..=60 {
        nudge_x(&platform, 0.01);
        engine.step_simulation().expect("step");
        engine.frame_with_delta(0.016).expect("frame");
        assert_relative_eq!(platform.borrow().position().x, 0.01 * step as f32, epsilon = 1e-4);
    }

    let carried = crate_body.borrow().position();
    assert!(carried.x - settled_x > 0.2, "crate moved only to x = {}", carried.x);
    assert!(carried.y > 0.2, "crate fell through the platform: y = {}", carried.y);
}
