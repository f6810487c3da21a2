//! Vertex skinning for AMO models
//!
//! This module applies linear blend skinning: a skinned vertex's animated
//! position is the sum of its bind position transformed by each influencing
//! joint's world matrix, scaled by that joint's weight.
//!
//! Weights are used exactly as authored. A vertex whose weights sum to 0.4
//! shrinks towards the joint origins; [`weight_sum_deviation`] lets loaders
//! flag such data.
//!
//! # Example
//!
//! ```rust
//! use amo_model::geometry::{SkinData, Vertex};
//! use amo_model::skeleton::{Joint, Skeleton};
//! use amo_model::skinning::{Skinner, SkinningOptions};
//! use glam::{Vec2, Vec3};
//!
//! let (mut skeleton, _) = Skeleton::new(vec![Joint::new("root", -1)]);
//! skeleton.set_local_position(0, Vec3::X)?;
//! skeleton.update_world_transforms();
//!
//! let vertex = Vertex::new(Vec3::ZERO, Vec3::Y, Vec2::ZERO).with_skin(SkinData::single(0));
//! let skinner = Skinner::new(SkinningOptions::default());
//!
//! let mut positions = Vec::new();
//! skinner.skin_positions_into([&vertex], &skeleton, &mut positions);
//! assert_eq!(positions, vec![Vec3::X]);
//! # Ok::<(), amo_model::AmoError>(())
//! ```

use glam::Vec3;

use crate::error::{Diagnostic, DiagnosticKind};
use crate::geometry::{SkinData, Vertex};
use crate::skeleton::Skeleton;

/// Options for controlling the skinning behavior
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct SkinningOptions {
    /// Whether normals are blended too; when false bind normals are passed through
    pub skin_normals: bool,
}

impl Default for SkinningOptions {
    fn default() -> Self {
        Self { skin_normals: true }
    }
}

/// Blend a bind-pose position through up to 4 joint influences
///
/// Influences with a non-positive weight or an index outside the skeleton
/// are ignored. If none remain the bind position is returned unchanged.
/// World matrices are read as of the skeleton's last world pass.
pub fn animated_position(position: Vec3, skin: &SkinData, skeleton: &Skeleton) -> Vec3 {
    let mut result = Vec3::ZERO;
    let mut influenced = false;

    for (joint, weight) in skin.influences() {
        if let Some(transformed) = skeleton.transform_point(joint, position) {
            result += transformed * weight;
            influenced = true;
        }
    }

    if influenced { result } else { position }
}

/// Blend a bind-pose normal through the joints' rotation and scale
///
/// The blended normal is renormalized; a zero result falls back to the
/// bind normal.
pub fn animated_normal(normal: Vec3, skin: &SkinData, skeleton: &Skeleton) -> Vec3 {
    let mut result = Vec3::ZERO;
    let mut influenced = false;

    for (joint, weight) in skin.influences() {
        if let Some(transformed) = skeleton.transform_vector(joint, normal) {
            result += transformed * weight;
            influenced = true;
        }
    }

    if !influenced {
        return normal;
    }
    result.try_normalize().unwrap_or(normal)
}

/// Animated position of any vertex; unskinned vertices stay in bind pose
pub fn skin_vertex(vertex: &Vertex, skeleton: &Skeleton) -> Vec3 {
    match &vertex.skin {
        Some(skin) => animated_position(vertex.position, skin, skeleton),
        None => vertex.position,
    }
}

/// How far a weight set's sum is from 1, when beyond `tolerance`
pub fn weight_sum_deviation(weights: &[f32], tolerance: f32) -> Option<f32> {
    let sum: f32 = weights.iter().sum();
    let deviation = (sum - 1.0).abs();
    (deviation > tolerance).then_some(deviation)
}

/// Report skinned vertices whose weights do not sum to 1 within `tolerance`
///
/// Diagnostics carry no line number; the message names the vertex by its
/// position in `vertices`.
pub fn lint_weights<'a, I>(vertices: I, tolerance: f32) -> Vec<Diagnostic>
where
    I: IntoIterator<Item = &'a Vertex>,
{
    vertices
        .into_iter()
        .enumerate()
        .filter_map(|(index, vertex)| {
            let skin = vertex.skin.as_ref()?;
            let deviation = weight_sum_deviation(&skin.weights, tolerance)?;
            Some(Diagnostic::new(
                None,
                DiagnosticKind::WeightLint,
                format!(
                    "vertex {} weights sum to {} ({} away from 1)",
                    index,
                    skin.weight_sum(),
                    deviation
                ),
            ))
        })
        .collect()
}

/// Batch skinning into caller-owned buffers
#[derive(Debug, Clone, Default)]
pub struct Skinner {
    options: SkinningOptions,
}

impl Skinner {
    pub fn new(options: SkinningOptions) -> Self {
        Self { options }
    }

    /// Skin vertex positions into `out`, replacing its contents.
    ///
    /// `out` keeps its allocation between frames.
    pub fn skin_positions_into<'a, I>(&self, vertices: I, skeleton: &Skeleton, out: &mut Vec<Vec3>)
    where
        I: IntoIterator<Item = &'a Vertex>,
    {
        warn_if_stale(skeleton);
        out.clear();
        out.extend(vertices.into_iter().map(|v| skin_vertex(v, skeleton)));
    }

    /// Skin vertex normals into `out`, replacing its contents
    pub fn skin_normals_into<'a, I>(&self, vertices: I, skeleton: &Skeleton, out: &mut Vec<Vec3>)
    where
        I: IntoIterator<Item = &'a Vertex>,
    {
        warn_if_stale(skeleton);
        out.clear();
        let skin_normals = self.options.skin_normals;
        out.extend(vertices.into_iter().map(|v| match &v.skin {
            Some(skin) if skin_normals => animated_normal(v.normal, skin, skeleton),
            _ => v.normal,
        }));
    }

    pub fn options(&self) -> &SkinningOptions {
        &self.options
    }

    /// Update skinning options
    pub fn set_options(&mut self, options: SkinningOptions) {
        self.options = options;
    }
}

fn warn_if_stale(skeleton: &Skeleton) {
    if skeleton.is_dirty() {
        log::warn!(
            "Skinning against a skeleton with pending local changes; call update_world_transforms first"
        );
    }
}
