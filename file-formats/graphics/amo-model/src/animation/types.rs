//! Common types for the AMO animation system

use glam::{Quat, Vec3};

/// Trait for values that can be blended between two keyframes
pub trait Lerp: Copy {
    /// Interpolate between self and other by `t` in `[0, 1]`
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Lerp for Vec3 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        *self + (*other - *self) * t
    }
}

impl Lerp for Quat {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        // Rotations always take the shortest spherical path
        self.slerp(*other, t)
    }
}

/// A single timed sample
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Keyframe<T> {
    /// Time in seconds
    pub time: f32,
    pub value: T,
}

impl<T> Keyframe<T> {
    pub const fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}

/// Position keyframe of a joint
pub type PositionKeyframe = Keyframe<Vec3>;

/// Rotation keyframe of a joint (quaternion xyzw)
pub type RotationKeyframe = Keyframe<Quat>;

/// Time-ordered keyframes for one property of one joint
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize))]
pub struct Track<T> {
    keyframes: Vec<Keyframe<T>>,
}

impl<T> Track<T> {
    pub const fn new() -> Self {
        Self {
            keyframes: Vec::new(),
        }
    }

    /// Insert a keyframe, keeping the track sorted by time.
    ///
    /// A keyframe at an existing time lands after the ones already there.
    pub fn insert(&mut self, keyframe: Keyframe<T>) {
        let index = self.keyframes.partition_point(|k| k.time <= keyframe.time);
        self.keyframes.insert(index, keyframe);
    }

    pub fn keyframes(&self) -> &[Keyframe<T>] {
        &self.keyframes
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Time of the last keyframe
    pub fn end_time(&self) -> Option<f32> {
        self.keyframes.last().map(|k| k.time)
    }
}

impl<T> Default for Track<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<Keyframe<T>> for Track<T> {
    fn from_iter<I: IntoIterator<Item = Keyframe<T>>>(iter: I) -> Self {
        let mut track = Self::new();
        for keyframe in iter {
            track.insert(keyframe);
        }
        track
    }
}

#[cfg(feature = "serde-support")]
impl<'de, T: serde::Deserialize<'de>> serde::Deserialize<'de> for Track<T> {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        struct TrackData<K> {
            keyframes: Vec<Keyframe<K>>,
        }

        let data = TrackData::<T>::deserialize(deserializer)?;
        Ok(data.keyframes.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_lerp() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(10.0, 20.0, 30.0);

        let mid = Lerp::lerp(&a, &b, 0.5);
        assert!((mid.x - 5.0).abs() < 0.001);
        assert!((mid.y - 10.0).abs() < 0.001);
        assert!((mid.z - 15.0).abs() < 0.001);
    }

    #[test]
    fn test_quat_lerp_is_slerp() {
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let mid = Lerp::lerp(&a, &b, 0.5);
        let expected = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        assert!(mid.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_track_insert_sorts() {
        let mut track = Track::new();
        track.insert(Keyframe::new(2.0, 2.0_f32));
        track.insert(Keyframe::new(0.0, 0.0));
        track.insert(Keyframe::new(1.0, 1.0));

        let times: Vec<f32> = track.keyframes().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
        assert_eq!(track.end_time(), Some(2.0));
    }

    #[test]
    fn test_track_equal_times_keep_insertion_order() {
        let track: Track<f32> = [Keyframe::new(1.0, 10.0), Keyframe::new(1.0, 20.0)]
            .into_iter()
            .collect();
        assert_eq!(track.keyframes()[0].value, 10.0);
        assert_eq!(track.keyframes()[1].value, 20.0);
    }

    #[cfg(feature = "serde-support")]
    #[test]
    fn test_deserialize_sorts_keyframes() {
        let json = r#"{"keyframes":[{"time":2.0,"value":[2,0,0]},{"time":0.5,"value":[1,0,0]}]}"#;
        let track: Track<Vec3> = serde_json::from_str(json).unwrap();
        let times: Vec<f32> = track.keyframes().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.5, 2.0]);
    }
}
