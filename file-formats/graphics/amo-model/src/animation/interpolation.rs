//! Keyframe interpolation for joint tracks

use super::types::{Keyframe, Lerp, Track};

/// Find the index of the keyframe at or before the given time
///
/// Returns None if there are no keyframes. Times before the first keyframe
/// map to index 0 and times past the last map to the last index; otherwise
/// the result is the earlier keyframe of the bracketing pair.
pub fn find_keyframe_index<T>(keyframes: &[Keyframe<T>], time: f32) -> Option<usize> {
    if keyframes.is_empty() {
        return None;
    }

    // Largest index whose time is <= the requested time
    let after = keyframes.partition_point(|k| k.time <= time);
    Some(after.saturating_sub(1))
}

/// Sample a keyframe slice at the given time
///
/// Values are exact at keyframe times and clamped outside the keyed range.
pub fn sample_keyframes<T: Lerp>(keyframes: &[Keyframe<T>], time: f32, default: T) -> T {
    let (Some(first), Some(last)) = (keyframes.first(), keyframes.last()) else {
        return default;
    };

    if keyframes.len() == 1 || time <= first.time {
        return first.value;
    }
    if time >= last.time {
        return last.value;
    }

    let Some(index) = find_keyframe_index(keyframes, time) else {
        return default;
    };

    let prev = &keyframes[index];
    if time == prev.time {
        return prev.value;
    }
    let Some(next) = keyframes.get(index + 1) else {
        return prev.value;
    };

    let span = next.time - prev.time;
    if span <= 0.0 {
        return next.value;
    }

    let t = (time - prev.time) / span;
    prev.value.lerp(&next.value, t)
}

/// Sample a track at the given time, returning `default` for an empty track
pub fn sample<T: Lerp>(track: &Track<T>, time: f32, default: T) -> T {
    sample_keyframes(track.keyframes(), time, default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    fn position_track(keys: &[(f32, Vec3)]) -> Track<Vec3> {
        keys.iter().map(|&(t, v)| Keyframe::new(t, v)).collect()
    }

    #[test]
    fn test_find_keyframe_index_empty() {
        let keyframes: Vec<Keyframe<Vec3>> = vec![];
        assert_eq!(find_keyframe_index(&keyframes, 0.0), None);
    }

    #[test]
    fn test_find_keyframe_index_multiple() {
        let track = position_track(&[
            (0.0, Vec3::ZERO),
            (1.0, Vec3::ZERO),
            (2.0, Vec3::ZERO),
            (3.0, Vec3::ZERO),
        ]);
        let keys = track.keyframes();

        // Before first
        assert_eq!(find_keyframe_index(keys, -1.0), Some(0));

        // Between keyframes
        assert_eq!(find_keyframe_index(keys, 0.5), Some(0));
        assert_eq!(find_keyframe_index(keys, 1.5), Some(1));
        assert_eq!(find_keyframe_index(keys, 2.5), Some(2));

        // At keyframes
        assert_eq!(find_keyframe_index(keys, 1.0), Some(1));
        assert_eq!(find_keyframe_index(keys, 2.0), Some(2));

        // After last
        assert_eq!(find_keyframe_index(keys, 4.0), Some(3));
    }

    #[test]
    fn test_empty_track_uses_default() {
        let track: Track<Vec3> = Track::new();
        assert_eq!(sample(&track, 1.0, Vec3::ONE), Vec3::ONE);

        let track: Track<Quat> = Track::new();
        assert_eq!(sample(&track, 1.0, Quat::IDENTITY), Quat::IDENTITY);
    }

    #[test]
    fn test_single_keyframe_is_constant() {
        let value = Vec3::new(1.0, 2.0, 3.0);
        let track = position_track(&[(0.5, value)]);
        for time in [-1.0, 0.0, 0.5, 10.0] {
            assert_eq!(sample(&track, time, Vec3::ZERO), value);
        }
    }

    #[test]
    fn test_boundaries_are_exact() {
        let a = Vec3::new(0.1, 0.2, 0.3);
        let b = Vec3::new(7.7, -3.3, 1.9);
        let c = Vec3::new(-2.0, 4.0, 0.0);
        let track = position_track(&[(0.25, a), (1.75, b), (3.0, c)]);

        assert_eq!(sample(&track, 0.25, Vec3::ZERO), a);
        assert_eq!(sample(&track, 1.75, Vec3::ZERO), b);
        assert_eq!(sample(&track, 3.0, Vec3::ZERO), c);

        // Clamped outside the keyed range
        assert_eq!(sample(&track, -5.0, Vec3::ZERO), a);
        assert_eq!(sample(&track, 99.0, Vec3::ZERO), c);
    }

    #[test]
    fn test_linear_position() {
        let track = position_track(&[(0.0, Vec3::ZERO), (2.0, Vec3::new(10.0, 0.0, -4.0))]);
        let v = sample(&track, 0.5, Vec3::ZERO);
        assert!((v - Vec3::new(2.5, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_slerp_halfway_about_y() {
        let track: Track<Quat> = [
            Keyframe::new(0.0, Quat::IDENTITY),
            Keyframe::new(1.0, Quat::from_rotation_y(FRAC_PI_2)),
        ]
        .into_iter()
        .collect();

        let mid = sample(&track, 0.5, Quat::IDENTITY);
        assert!((mid.length() - 1.0).abs() < 1e-5);

        let (axis, angle) = mid.to_axis_angle();
        assert!((angle - FRAC_PI_4).abs() < 1e-4);
        assert!((axis - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn test_rotation_boundaries_are_exact() {
        let start = Quat::from_rotation_x(0.3);
        let end = Quat::from_rotation_z(1.2);
        let track: Track<Quat> = [Keyframe::new(0.0, start), Keyframe::new(1.0, end)]
            .into_iter()
            .collect();
        assert_eq!(sample(&track, 0.0, Quat::IDENTITY), start);
        assert_eq!(sample(&track, 1.0, Quat::IDENTITY), end);
    }

    #[test]
    fn test_duplicate_times_do_not_divide_by_zero() {
        let track = position_track(&[
            (0.0, Vec3::ZERO),
            (1.0, Vec3::X),
            (1.0, Vec3::Y),
            (2.0, Vec3::Z),
        ]);
        let v = sample(&track, 1.0, Vec3::ZERO);
        assert!(v.is_finite());
        let v = sample(&track, 1.5, Vec3::ZERO);
        assert!((v - Vec3::new(0.0, 0.5, 0.5)).length() < 1e-5);
    }
}
