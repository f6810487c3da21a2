//! Animation playback state machine
//!
//! The controller tracks which animation is current, its playback time and
//! speed. Each tick it writes the sampled pose into a skeleton and runs the
//! world pass so skinning reads see a consistent pose.

use std::sync::Arc;

use super::clip::{Animation, AnimationSet, apply_animation};
use super::state::PlaybackState;
use crate::skeleton::Skeleton;

/// Plays animations from one model's animation set
#[derive(Debug, Clone)]
pub struct AnimationController {
    /// Animations of the model this controller is bound to
    animations: Arc<AnimationSet>,
    /// Index of the current animation in the set
    current: Option<usize>,
    /// Playback time in seconds
    time: f32,
    state: PlaybackState,
    /// Time multiplier applied on update
    speed: f32,
    /// Overrides the animation's own looping flag when set
    looping: Option<bool>,
}

impl AnimationController {
    /// Create a stopped controller with no current animation
    pub fn new(animations: Arc<AnimationSet>) -> Self {
        Self {
            animations,
            current: None,
            time: 0.0,
            state: PlaybackState::Stopped,
            speed: 1.0,
            looping: None,
        }
    }

    /// Start the named animation from time 0.
    ///
    /// Returns false and leaves the state untouched if no such animation
    /// exists.
    pub fn play(&mut self, name: &str) -> bool {
        let Some(index) = self.animations.index_of(name) else {
            log::warn!("Animation '{}' not found", name);
            return false;
        };

        log::debug!("Playing animation '{}'", name);
        self.current = Some(index);
        self.time = 0.0;
        self.state = PlaybackState::Playing;
        true
    }

    /// Pause playback if an animation is playing
    pub fn pause(&mut self) {
        if self.current.is_some() {
            self.state = self.state.paused();
        }
    }

    /// Resume playback if an animation is paused
    pub fn resume(&mut self) {
        if self.current.is_some() {
            self.state = self.state.resumed();
        }
    }

    /// Stop playback and rewind to the start
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.time = 0.0;
    }

    /// Jump to `time` and pose the skeleton there, whatever the state.
    ///
    /// The time is clamped to the animation's range. Returns false when there
    /// is no current animation or the time is not finite.
    pub fn seek(&mut self, time: f32, skeleton: &mut Skeleton) -> bool {
        let Some(animation) = self.current.and_then(|i| self.animations.by_index(i)) else {
            return false;
        };
        if !time.is_finite() {
            log::warn!("Ignoring seek to non-finite time {}", time);
            return false;
        }

        self.time = time.clamp(0.0, animation.duration());
        apply_animation(animation, self.time, skeleton);
        skeleton.update_world_transforms();
        true
    }

    /// Advance playback by `delta_time` seconds and pose the skeleton.
    ///
    /// Does nothing unless playing. Looping animations wrap; others clamp to
    /// their duration and stop there. A step that would make the playback
    /// time non-finite is dropped.
    pub fn update(&mut self, delta_time: f32, skeleton: &mut Skeleton) {
        if !self.state.is_playing() {
            return;
        }
        let Some(animation) = self.current.and_then(|i| self.animations.by_index(i)) else {
            return;
        };

        let time = self.time + delta_time * self.speed;
        if !time.is_finite() {
            log::warn!(
                "Ignoring update with non-finite time step (delta {}, speed {})",
                delta_time,
                self.speed
            );
            return;
        }

        let duration = animation.duration();
        self.time = time;

        if self.looping.unwrap_or(animation.looping) {
            if duration > 0.0 {
                self.time = self.time.rem_euclid(duration);
            }
        } else if self.time >= duration || self.time < 0.0 {
            self.time = self.time.clamp(0.0, duration);
            self.state = PlaybackState::Stopped;
            log::debug!("Animation '{}' finished", animation.name);
        }

        apply_animation(animation, self.time, skeleton);
        skeleton.update_world_transforms();
    }

    /// Set the playback speed multiplier (1.0 = normal, negative plays backwards)
    ///
    /// Non-finite speeds are ignored and the previous speed is kept.
    pub fn set_speed(&mut self, speed: f32) {
        if !speed.is_finite() {
            log::warn!("Ignoring non-finite playback speed {}", speed);
            return;
        }
        self.speed = speed;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Force looping on or off, or `None` to use each animation's own flag
    pub fn set_looping(&mut self, looping: Option<bool>) {
        self.looping = looping;
    }

    /// Whether the current animation wraps at its end
    pub fn is_looping(&self) -> bool {
        let own = self.current_animation().is_some_and(|a| a.looping);
        self.looping.unwrap_or(own)
    }

    /// Current playback time (seconds)
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn current_animation(&self) -> Option<&Animation> {
        self.current.and_then(|i| self.animations.by_index(i))
    }

    /// Name of the current animation
    pub fn current(&self) -> Option<&str> {
        self.current_animation().map(|a| a.name.as_str())
    }

    pub fn animations(&self) -> &AnimationSet {
        &self.animations
    }
}
