//! AMO Animation System
//!
//! This module provides skeletal animation playback for AMO models, including:
//! - Per-joint position and rotation keyframe tracks
//! - Keyframe interpolation (linear for positions, slerp for rotations)
//! - A playback state machine with looping, seeking and speed control
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use amo_model::animation::{Animation, AnimationController, AnimationSet};
//! use amo_model::skeleton::{Joint, Skeleton};
//! use glam::Vec3;
//!
//! let mut walk = Animation::new("walk");
//! walk.add_position_keyframe(1, 0.0, Vec3::ZERO);
//! walk.add_position_keyframe(1, 1.0, Vec3::Y);
//! let animations: AnimationSet = std::iter::once(walk).collect();
//!
//! let (mut skeleton, _) = Skeleton::new(vec![Joint::new("root", -1), Joint::new("hand", 0)]);
//! let mut controller = AnimationController::new(Arc::new(animations));
//!
//! controller.play("walk");
//! controller.update(0.5, &mut skeleton);
//!
//! let hand = skeleton.joint(1).unwrap().world_position();
//! assert!((hand - Vec3::new(0.0, 0.5, 0.0)).length() < 1e-6);
//! ```

mod clip;
mod controller;
mod interpolation;
mod state;
mod types;

pub use clip::{Animation, AnimationSet, apply_animation};
pub use controller::AnimationController;
pub use interpolation::{find_keyframe_index, sample, sample_keyframes};
pub use state::PlaybackState;
pub use types::{Keyframe, Lerp, PositionKeyframe, RotationKeyframe, Track};
