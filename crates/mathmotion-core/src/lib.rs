//! # mathmotion-core
//!
//! Core types and primitives for the mathmotion scene animation engine.
//! This crate contains foundational types shared across the workspace:
//! colors, 3D points, logical time, easing, object kinds, configuration and errors.

pub mod color;
pub mod config;
pub mod error;
pub mod hash;
pub mod math;
pub mod time;
pub mod types;

pub use config::*;

pub use color::{Color, ColorSpace};
pub use error::{MatchSide, SceneError, SceneResult};
pub use hash::{hash_value, ContentHash};
pub use math::{Bounds, Complex, Matrix3, Point3};
pub use time::{Duration, Timestamp};
pub use types::{Capabilities, Easing, ObjectId, ObjectKind};
