//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and transform composition
//! - Generation-checked handles for nodes, behaviours and simulated bodies
//! - Frame timing
//! - Logging setup

pub mod math;
pub mod collections;
pub mod time;
pub mod logging;
