//! Infinite Core - Core types and utilities for the Infinite engine
//!
//! This crate provides the foundational types used throughout the engine:
//! - Mathematical primitives (re-exported from glam)
//! - Stable entity identifiers and colors
//! - Game clock producing timestamps for timed systems

pub mod time;
pub mod types;

pub use glam::Vec3;
pub use time::{FrameStep, GameTime, TimeConfig};
pub use types::{Color, EntityId};
