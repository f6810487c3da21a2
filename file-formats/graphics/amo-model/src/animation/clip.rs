//! Named keyframe animations and their application to a skeleton

use std::collections::{BTreeMap, HashMap};

use glam::{Quat, Vec3};

use super::interpolation::sample;
use super::types::{Keyframe, Track};
use crate::skeleton::Skeleton;

/// A named set of per-joint position and rotation tracks
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Animation {
    pub name: String,
    /// Whether playback wraps at the end
    pub looping: bool,
    position_tracks: BTreeMap<usize, Track<Vec3>>,
    rotation_tracks: BTreeMap<usize, Track<Quat>>,
    duration: f32,
}

impl Animation {
    /// Create an empty looping animation
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            looping: true,
            position_tracks: BTreeMap::new(),
            rotation_tracks: BTreeMap::new(),
            duration: 0.0,
        }
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Latest keyframe time across all tracks
    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn add_position_keyframe(&mut self, joint: usize, time: f32, value: Vec3) {
        self.position_tracks
            .entry(joint)
            .or_default()
            .insert(Keyframe::new(time, value));
        self.duration = self.duration.max(time);
    }

    pub fn add_rotation_keyframe(&mut self, joint: usize, time: f32, value: Quat) {
        self.rotation_tracks
            .entry(joint)
            .or_default()
            .insert(Keyframe::new(time, value));
        self.duration = self.duration.max(time);
    }

    pub fn position_tracks(&self) -> &BTreeMap<usize, Track<Vec3>> {
        &self.position_tracks
    }

    pub fn rotation_tracks(&self) -> &BTreeMap<usize, Track<Quat>> {
        &self.rotation_tracks
    }

    pub fn position_track(&self, joint: usize) -> Option<&Track<Vec3>> {
        self.position_tracks.get(&joint)
    }

    pub fn rotation_track(&self, joint: usize) -> Option<&Track<Quat>> {
        self.rotation_tracks.get(&joint)
    }

    pub fn keyframe_count(&self) -> usize {
        self.position_tracks.values().map(Track::len).sum::<usize>()
            + self.rotation_tracks.values().map(Track::len).sum::<usize>()
    }

    /// Joint indices used by any track, ascending and deduplicated
    pub fn animated_joints(&self) -> Vec<usize> {
        let mut joints: Vec<usize> = self
            .position_tracks
            .keys()
            .chain(self.rotation_tracks.keys())
            .copied()
            .collect();
        joints.sort_unstable();
        joints.dedup();
        joints
    }

    /// Joint indices used by tracks but absent from a skeleton of this size
    pub fn missing_joints(&self, joint_count: usize) -> Vec<usize> {
        self.animated_joints()
            .into_iter()
            .filter(|&j| j >= joint_count)
            .collect()
    }
}

/// Write an animation's pose at `time` into the skeleton's local transforms
///
/// Joints without a track keep their current local values. Tracks for joints
/// outside the skeleton are skipped; the number skipped is returned. The
/// caller runs the world pass afterwards.
pub fn apply_animation(animation: &Animation, time: f32, skeleton: &mut Skeleton) -> usize {
    let mut skipped = 0;

    for (&joint, track) in &animation.position_tracks {
        let value = sample(track, time, Vec3::ZERO);
        if skeleton.set_local_position(joint, value).is_err() {
            skipped += 1;
        }
    }

    for (&joint, track) in &animation.rotation_tracks {
        let value = sample(track, time, Quat::IDENTITY);
        if skeleton.set_local_rotation(joint, value).is_err() {
            skipped += 1;
        }
    }

    skipped
}

/// Animations of a model, addressable by name and by declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationSet {
    animations: Vec<Animation>,
    by_name: HashMap<String, usize>,
}

impl AnimationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an animation, replacing any existing one with the same name
    pub fn insert(&mut self, animation: Animation) {
        match self.by_name.get(&animation.name) {
            Some(&index) => self.animations[index] = animation,
            None => {
                self.by_name
                    .insert(animation.name.clone(), self.animations.len());
                self.animations.push(animation);
            }
        }
    }

    /// Get the animation with the given name, creating an empty one if needed
    pub fn get_or_create(&mut self, name: &str) -> &mut Animation {
        let index = match self.by_name.get(name) {
            Some(&index) => index,
            None => {
                self.insert(Animation::new(name));
                self.animations.len() - 1
            }
        };
        &mut self.animations[index]
    }

    pub fn get(&self, name: &str) -> Option<&Animation> {
        self.index_of(name).map(|i| &self.animations[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Animation> {
        self.index_of(name).map(|i| &mut self.animations[i])
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn by_index(&self, index: usize) -> Option<&Animation> {
        self.animations.get(index)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Animation> {
        self.animations.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.animations.iter().map(|a| a.name.as_str())
    }
}

impl<'a> IntoIterator for &'a AnimationSet {
    type Item = &'a Animation;
    type IntoIter = std::slice::Iter<'a, Animation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Animation> for AnimationSet {
    fn from_iter<I: IntoIterator<Item = Animation>>(iter: I) -> Self {
        let mut set = Self::new();
        for animation in iter {
            set.insert(animation);
        }
        set
    }
}
