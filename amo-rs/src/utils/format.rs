//! Formatting utilities

use glam::{Quat, Vec3};
use humansize::{DECIMAL, format_size};

/// Format file size in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Format a vector with fixed precision
pub fn format_vec3(v: Vec3) -> String {
    format!("({:.4}, {:.4}, {:.4})", v.x, v.y, v.z)
}

/// Format a quaternion as xyzw with fixed precision
pub fn format_quat(q: Quat) -> String {
    format!("({:.4}, {:.4}, {:.4}, {:.4})", q.x, q.y, q.z, q.w)
}

/// Format a duration in seconds
pub fn format_seconds(seconds: f32) -> String {
    format!("{seconds:.3}s")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1024), "1.02 kB");
        assert_eq!(format_bytes(1048576), "1.05 MB");
    }

    #[test]
    fn test_format_vectors() {
        assert_eq!(format_vec3(Vec3::new(0.0, 0.5, -1.0)), "(0.0000, 0.5000, -1.0000)");
        assert_eq!(format_quat(Quat::IDENTITY), "(0.0000, 0.0000, 0.0000, 1.0000)");
        assert_eq!(format_seconds(1.5), "1.500s");
    }
}
