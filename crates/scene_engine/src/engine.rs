//! Frame driver
//!
//! The engine owns the world, the behaviour registry, the physics backend
//! and the render collaborator, and multiplexes two clocks on one thread:
//!
//! ```text
//! advance(now)
//!   ├─ due fixed steps (FixedStepLoop)
//!   │    reconcile → fixed_update → backend.step → trigger enter/exit
//!   └─ one frame, if running
//!        backend.sync → reconcile → update → late_update → render
//! ```
//!
//! Simulation stepping and frame dispatch never overlap, so node transforms
//! need no locking.

use std::any::Any;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::application::Application;
use crate::config::ConfigError;
use crate::core::EngineConfig;
use crate::ecs::{BehaviourRegistry, Component, ComponentError, ComponentRef, LifecycleBehaviour, World};
use crate::foundation::collections::{BehaviourId, BodyHandle, NodeId};
use crate::foundation::time::Timer;
use crate::physics::{AddBodyError, LayerRegistry, PhysicsBackend, PhysicsError, RapierPhysics, Rigidbody};
use crate::physics::{FixedStepLoop, LoopState};
use crate::scene::{HeadlessRenderer, RenderError, Renderer};

/// Main engine struct
///
/// Construction is cheap; [`Engine::init`] builds the simulation context and
/// must succeed before [`Engine::start`].
pub struct Engine {
    world: World,
    behaviours: BehaviourRegistry,
    physics: Box<dyn PhysicsBackend>,
    renderer: Box<dyn Renderer>,
    timer: Timer,
    step_loop: FixedStepLoop,
    config: EngineConfig,
    initialized: bool,
    running: bool,
    frames: u64,
}

impl Engine {
    /// Create an engine around a physics backend and a renderer. The world
    /// starts with the default "moving"/"non_moving" layers.
    pub fn new(
        config: EngineConfig,
        physics: Box<dyn PhysicsBackend>,
        renderer: Box<dyn Renderer>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let step_loop = FixedStepLoop::new(config.physics.fixed_delta, config.physics.max_catch_up_steps);
        Ok(Self {
            world: World::with_layers(LayerRegistry::with_default_layers()),
            behaviours: BehaviourRegistry::new(),
            physics,
            renderer,
            timer: Timer::new(),
            step_loop,
            config,
            initialized: false,
            running: false,
            frames: 0,
        })
    }

    /// Engine with the rapier backend and a headless renderer
    pub fn with_rapier(config: EngineConfig) -> Result<Self, EngineError> {
        Self::new(config, Box::new(RapierPhysics::new()), Box::new(HeadlessRenderer::new()))
    }

    /// Build the simulation context from the world's layers. A failure
    /// here is fatal: the engine refuses to start.
    pub fn init(&mut self) -> Result<(), EngineError> {
        log::info!("Initializing engine with {} physics...", self.physics.name());
        self.physics
            .init(self.world.layers(), &self.config.physics)
            .map_err(|e| EngineError::InitializationFailed(format!("Physics backend: {}", e)))?;
        self.initialized = true;
        log::info!("Engine initialized");
        Ok(())
    }

    /// Whether `init` has completed
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Begin dispatching frames and start the simulation loop if it is not
    /// running yet
    pub fn start(&mut self) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }
        // A stopped step loop cannot be restarted.
        if !self.step_loop.start(Instant::now()) && self.step_loop.state() != LoopState::Running {
            return Err(EngineError::ShutDown);
        }
        self.timer.reset();
        self.running = true;
        log::info!("Engine started");
        Ok(())
    }

    /// Stop dispatching frames. The simulation loop keeps its schedule.
    pub fn pause(&mut self) {
        if self.running {
            log::info!("Engine paused after {} frames", self.frames);
        }
        self.running = false;
    }

    /// Whether frames are being dispatched
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stop frames and the simulation loop for good
    pub fn shutdown(&mut self) {
        self.pause();
        self.step_loop.stop();
        log::info!("Engine shutdown complete");
    }

    /// Register a behaviour for lifecycle dispatch
    pub fn register_behaviour<T: LifecycleBehaviour>(&mut self, behaviour: &ComponentRef<T>) -> BehaviourId {
        self.behaviours.register(&mut self.world, behaviour)
    }

    /// Remove a behaviour from dispatch. Returns `false` for a stale id.
    pub fn unregister_behaviour(&mut self, id: BehaviourId) -> bool {
        self.behaviours.unregister(&mut self.world, id)
    }

    /// Simulate a rigidbody. A rejection is logged and the node stays
    /// render-only.
    pub fn add_body(&mut self, rigidbody: &ComponentRef<Rigidbody>) -> Option<BodyHandle> {
        match self.try_add_body(rigidbody) {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("Rigidbody on node {:?} not simulated: {}", rigidbody.borrow().node(), e);
                None
            }
        }
    }

    /// Simulate a rigidbody, returning the rejection reason on failure
    pub fn try_add_body(&mut self, rigidbody: &ComponentRef<Rigidbody>) -> Result<BodyHandle, AddBodyError> {
        self.physics.add(&self.world, rigidbody)
    }

    /// Stop simulating a rigidbody. Returns `false` if it was not simulated.
    pub fn remove_body(&mut self, rigidbody: &ComponentRef<Rigidbody>) -> bool {
        let handle = rigidbody.borrow().body_handle();
        handle.is_some_and(|handle| self.physics.remove(handle))
    }

    /// Destroy a node: its behaviours leave dispatch, its body leaves the
    /// simulation, its components release their visuals and it leaves the
    /// scene
    pub fn destroy_node(&mut self, node: NodeId) -> bool {
        if !self.world.contains_node(node) {
            return false;
        }
        self.behaviours.unregister_node(&mut self.world, node);
        if let Some(rigidbody) = self.world.get_component::<Rigidbody>(node) {
            self.remove_body(&rigidbody);
        }
        self.world.destroy_node(node)
    }

    /// Run exactly one fixed simulation step
    pub fn step_simulation(&mut self) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }
        let fixed_delta = self.config.physics.fixed_delta;
        self.behaviours.reconcile(&mut self.world);
        self.behaviours.fixed_update(&mut self.world, fixed_delta);
        self.physics.step(fixed_delta);
        for event in self.physics.drain_contact_events() {
            self.behaviours.dispatch_contact(&mut self.world, &event);
        }
        Ok(())
    }

    /// Dispatch one frame with an explicit delta in seconds. Negative or
    /// non-finite deltas are treated as zero.
    pub fn frame_with_delta(&mut self, delta: f32) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };

        self.physics.sync(&self.world);
        self.behaviours.reconcile(&mut self.world);
        self.behaviours.update(&mut self.world, delta);
        self.behaviours.late_update(&mut self.world, delta);
        self.renderer.render(self.world.scene())?;
        self.frames += 1;
        Ok(())
    }

    /// Dispatch one frame timed against the frame clock
    pub fn frame(&mut self, now: Instant) -> Result<(), EngineError> {
        let delta = self.timer.tick_at(now);
        self.frame_with_delta(delta)
    }

    /// Run every fixed step due at `now`, returning how many ran
    pub fn pump_simulation(&mut self, now: Instant) -> Result<u32, EngineError> {
        let due = self.step_loop.due_steps(now);
        for _ in 0..due {
            self.step_simulation()?;
        }
        Ok(due)
    }

    /// Run due fixed steps, then one frame if the engine is running
    pub fn advance(&mut self, now: Instant) -> Result<(), EngineError> {
        self.pump_simulation(now)?;
        if self.running {
            self.frame(now)?;
        }
        Ok(())
    }

    /// Blocking main loop. Sets up `app`, starts the engine and advances it
    /// at the configured frame rate until the engine is paused or
    /// `max_frames` frames have run.
    pub fn run<A: Application>(&mut self, app: &mut A, max_frames: Option<u64>) -> Result<(), EngineError> {
        if !self.initialized {
            self.init()?;
        }
        app.setup(self)
            .map_err(|e| EngineError::Application(format!("App setup: {}", e)))?;
        self.start()?;

        let frame_period = Duration::from_secs_f64(1.0 / f64::from(self.config.frame.target_fps));
        log::info!("Starting main loop...");
        let result = self.main_loop(app, frame_period, max_frames);

        app.teardown(self);
        self.shutdown();
        result
    }

    fn main_loop<A: Application>(
        &mut self,
        app: &mut A,
        frame_period: Duration,
        max_frames: Option<u64>,
    ) -> Result<(), EngineError> {
        let first_frame = self.frames;
        while self.running {
            if max_frames.is_some_and(|max| self.frames - first_frame >= max) {
                break;
            }
            let frame_start = Instant::now();
            self.advance(frame_start)?;
            let delta = self.timer.delta_time();
            app.on_frame(self, delta)
                .map_err(|e| EngineError::Application(format!("App frame: {}", e)))?;

            let elapsed = frame_start.elapsed();
            if elapsed < frame_period {
                thread::sleep(frame_period - elapsed);
            }
        }
        Ok(())
    }

    /// The world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The world, mutably
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The physics backend
    pub fn physics(&self) -> &dyn PhysicsBackend {
        self.physics.as_ref()
    }

    /// The physics backend as its concrete type
    pub fn physics_as<T: Any>(&self) -> Option<&T> {
        self.physics.as_any().downcast_ref::<T>()
    }

    /// The physics backend as its concrete type, mutably
    pub fn physics_as_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.physics.as_any_mut().downcast_mut::<T>()
    }

    /// Registered behaviours
    pub fn behaviours(&self) -> &BehaviourRegistry {
        &self.behaviours
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The fixed-step schedule
    pub fn step_loop(&self) -> &FixedStepLoop {
        &self.step_loop
    }

    /// Frames dispatched so far
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Delta of the last timed frame
    pub fn delta_time(&self) -> f32 {
        self.timer.delta_time()
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// `start` or a dispatch was attempted before `init`
    #[error("Engine is not initialized")]
    NotInitialized,

    /// `start` was attempted after `shutdown`
    #[error("Engine has been shut down")]
    ShutDown,

    /// Initialization error
    #[error("Engine initialization failed: {0}")]
    InitializationFailed(String),

    /// Physics backend error
    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    /// Component construction error
    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    /// Rendering error
    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Application error
    #[error("Application error: {0}")]
    Application(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{BasicPhysics, Collider, LAYER_MOVING};
    use crate::scene::SceneObject;

    fn basic_engine() -> Engine {
        Engine::new(
            EngineConfig::default(),
            Box::new(BasicPhysics::new()),
            Box::new(HeadlessRenderer::new()),
        )
        .expect("default config is valid")
    }

    #[test]
    fn test_start_requires_init() {
        let mut engine = basic_engine();
        assert!(matches!(engine.start(), Err(EngineError::NotInitialized)));
        assert!(matches!(engine.frame_with_delta(0.016), Err(EngineError::NotInitialized)));
        assert!(!engine.is_running());

        engine.init().expect("init");
        engine.start().expect("start");
        assert!(engine.is_running());
    }

    #[test]
    fn test_init_twice_fails() {
        let mut engine = basic_engine();
        engine.init().expect("init");
        assert!(matches!(engine.init(), Err(EngineError::InitializationFailed(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.physics.fixed_delta = 0.0;
        let result = Engine::new(config, Box::new(BasicPhysics::new()), Box::new(HeadlessRenderer::new()));
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_pause_stops_frames_not_simulation() {
        let mut engine = basic_engine();
        engine.init().expect("init");
        engine.start().expect("start");
        engine.pause();

        let later = Instant::now() + Duration::from_millis(100);
        engine.advance(later).expect("advance");
        assert_eq!(engine.frame_count(), 0);
        assert!(engine.step_loop().steps_taken() > 0);
    }

    #[test]
    fn test_shutdown_stops_simulation_loop() {
        let mut engine = basic_engine();
        engine.init().expect("init");
        engine.start().expect("start");
        engine.shutdown();

        let later = Instant::now() + Duration::from_secs(1);
        assert_eq!(engine.pump_simulation(later).expect("pump"), 0);
        assert!(!engine.is_running());

        assert!(matches!(engine.start(), Err(EngineError::ShutDown)));
        assert!(!engine.is_running());
        assert_eq!(engine.pump_simulation(later).expect("pump"), 0);
    }

    #[test]
    fn test_start_after_pause_resumes() {
        let mut engine = basic_engine();
        engine.init().expect("init");
        engine.start().expect("start");
        engine.pause();
        assert!(!engine.is_running());
        engine.start().expect("restart after pause");
        assert!(engine.is_running());
    }

    #[test]
    fn test_rejected_body_degrades_to_render_only() {
        let mut engine = basic_engine();
        engine.init().expect("init");
        let node = engine.world_mut().create_node(SceneObject::new("ghost"), LAYER_MOVING);
        let body = engine
            .world_mut()
            .add_component(node, Rigidbody::dynamic)
            .expect("node exists");

        assert!(engine.add_body(&body).is_none());
        assert_eq!(engine.physics().body_count(), 0);
        engine.frame_with_delta(0.016).expect("frame");
        assert!(engine.world().scene().contains(node));
    }

    #[test]
    fn test_destroy_node_removes_body() {
        let mut engine = basic_engine();
        engine.init().expect("init");
        let node = engine.world_mut().create_node(SceneObject::new("cube"), LAYER_MOVING);
        engine
            .world_mut()
            .add_component(node, Collider::unit_box)
            .expect("node exists");
        let body = engine
            .world_mut()
            .add_component(node, Rigidbody::dynamic)
            .expect("node exists");
        engine.add_body(&body).expect("accepted");

        assert!(engine.destroy_node(node));
        assert_eq!(engine.physics().body_count(), 0);
        assert!(!body.borrow().is_simulated());
        assert!(!engine.destroy_node(node));
    }

    #[test]
    fn test_physics_downcast() {
        let engine = basic_engine();
        assert!(engine.physics_as::<BasicPhysics>().is_some());
        assert!(engine.physics_as::<RapierPhysics>().is_none());
    }
}
