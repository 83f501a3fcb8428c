//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use scene_engine::physics::BasicPhysics;
use scene_engine::prelude::*;
use scene_engine::scene::HeadlessRenderer;

/// Callback names in the order they fired
pub type CallLog = Rc<RefCell<Vec<&'static str>>>;

/// Behaviour that records every callback it receives
pub struct Recorder {
    base: BehaviourBase,
    hooks: Hooks,
    log: CallLog,
    pub contacts: Vec<(&'static str, NodeId)>,
}

impl Recorder {
    pub fn new(ctx: &AttachContext<'_>, hooks: Hooks, log: CallLog) -> Self {
        Self {
            base: BehaviourBase::new(ctx.node()),
            hooks,
            log,
            contacts: Vec::new(),
        }
    }

    fn record(&self, name: &'static str) {
        self.log.borrow_mut().push(name);
    }
}

impl Component for Recorder {
    fn node(&self) -> NodeId {
        self.base.node
    }

    fn kinds(&self) -> ComponentKind {
        ComponentKind::LIFECYCLE_BEHAVIOUR
    }
}

impl Behaviour for Recorder {
    fn enabled(&self) -> bool {
        self.base.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.base.enabled = enabled;
    }
}

impl LifecycleBehaviour for Recorder {
    fn hooks(&self) -> Hooks {
        self.hooks
    }

    fn awake(&mut self, _ctx: &mut BehaviourContext<'_>) {
        self.record("awake");
    }

    fn on_enable(&mut self, _ctx: &mut BehaviourContext<'_>) {
        self.record("on_enable");
    }

    fn start(&mut self, _ctx: &mut BehaviourContext<'_>) {
        self.record("start");
    }

    fn fixed_update(&mut self, _ctx: &mut BehaviourContext<'_>, _fixed_delta: f32) {
        self.record("fixed_update");
    }

    fn update(&mut self, _ctx: &mut BehaviourContext<'_>, _delta: f32) {
        self.record("update");
    }

    fn late_update(&mut self, _ctx: &mut BehaviourContext<'_>, _delta: f32) {
        self.record("late_update");
    }

    fn on_trigger_enter(&mut self, _ctx: &mut BehaviourContext<'_>, other: NodeId) {
        self.contacts.push(("enter", other));
    }

    fn on_trigger_exit(&mut self, _ctx: &mut BehaviourContext<'_>, other: NodeId) {
        self.contacts.push(("exit", other));
    }

    fn on_disable(&mut self, _ctx: &mut BehaviourContext<'_>) {
        self.record("on_disable");
    }
}

pub fn new_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn count(log: &CallLog, name: &str) -> usize {
    log.borrow().iter().filter(|entry| **entry == name).count()
}

/// Initialized engine on the deterministic backend
pub fn basic_engine() -> Engine {
    let mut engine = Engine::new(
        EngineConfig::default(),
        Box::new(BasicPhysics::new()),
        Box::new(HeadlessRenderer::new()),
    )
    .expect("default config is valid");
    engine.init().expect("basic backend initializes");
    engine
}
