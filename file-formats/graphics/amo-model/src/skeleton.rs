//! Joint hierarchy and transform computation
//!
//! Joints are stored in a flat array and refer to their parent by index.
//! Every parent precedes its children, so one pass in index order resolves
//! the whole hierarchy.

use glam::{Mat4, Quat, Vec3};

use crate::error::{AmoError, Diagnostic, DiagnosticKind, Result};

/// Parent index of a root joint
pub const ROOT_PARENT: i32 = -1;

/// A node in the skeleton hierarchy
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Joint {
    pub name: String,
    /// Parent joint index, [`ROOT_PARENT`] for a root
    pub parent: i32,
    local_position: Vec3,
    local_rotation: Quat,
    bind_position: Vec3,
    bind_rotation: Quat,
    local_transform: Mat4,
    world_transform: Mat4,
}

impl Joint {
    /// Create a joint in bind pose with identity local transform
    pub fn new(name: impl Into<String>, parent: i32) -> Self {
        Self::with_bind_pose(name, parent, Vec3::ZERO, Quat::IDENTITY)
    }

    pub fn with_bind_pose(
        name: impl Into<String>,
        parent: i32,
        position: Vec3,
        rotation: Quat,
    ) -> Self {
        let local = Mat4::from_rotation_translation(rotation, position);
        Self {
            name: name.into(),
            parent,
            local_position: position,
            local_rotation: rotation,
            bind_position: position,
            bind_rotation: rotation,
            local_transform: local,
            world_transform: local,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent < 0
    }

    /// Parent index, if any
    pub fn parent_index(&self) -> Option<usize> {
        usize::try_from(self.parent).ok()
    }

    pub fn local_position(&self) -> Vec3 {
        self.local_position
    }

    pub fn local_rotation(&self) -> Quat {
        self.local_rotation
    }

    pub fn bind_position(&self) -> Vec3 {
        self.bind_position
    }

    pub fn bind_rotation(&self) -> Quat {
        self.bind_rotation
    }

    /// Local matrix as of the last world pass
    pub fn local_transform(&self) -> Mat4 {
        self.local_transform
    }

    /// World matrix as of the last world pass
    pub fn world_transform(&self) -> Mat4 {
        self.world_transform
    }

    /// World-space origin of the joint
    pub fn world_position(&self) -> Vec3 {
        self.world_transform.w_axis.truncate()
    }
}

/// A flat, index-addressed joint hierarchy
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize))]
pub struct Skeleton {
    joints: Vec<Joint>,
    dirty: bool,
}

/// Deserialized skeletons go through [`Skeleton::new`], so bad parents are
/// re-parented and world transforms recomputed.
#[cfg(feature = "serde-support")]
impl<'de> serde::Deserialize<'de> for Skeleton {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        struct SkeletonData {
            joints: Vec<Joint>,
        }

        let data = SkeletonData::deserialize(deserializer)?;
        Ok(Self::new(data.joints).0)
    }
}

impl Skeleton {
    /// Build a skeleton, computing world transforms for the bind pose.
    ///
    /// Joints whose parent does not precede them are re-parented to root and
    /// reported.
    pub fn new(mut joints: Vec<Joint>) -> (Self, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();

        for (index, joint) in joints.iter_mut().enumerate() {
            if joint.parent < ROOT_PARENT || (joint.parent >= 0 && joint.parent as usize >= index) {
                let diagnostic = Diagnostic::new(
                    None,
                    DiagnosticKind::ReferenceWarning,
                    format!(
                        "joint {} '{}' has parent {} which does not precede it; treating as root",
                        index, joint.name, joint.parent
                    ),
                );
                log::warn!("{diagnostic}");
                diagnostics.push(diagnostic);
                joint.parent = ROOT_PARENT;
            }
        }

        let mut skeleton = Self {
            joints,
            dirty: true,
        };
        skeleton.update_world_transforms();
        (skeleton, diagnostics)
    }

    /// Skeleton with no joints
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    /// Index of the first joint with the given name
    pub fn find_joint(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|j| j.name == name)
    }

    /// Whether a local transform changed since the last world pass
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_local_position(&mut self, index: usize, position: Vec3) -> Result<()> {
        let joint = self
            .joints
            .get_mut(index)
            .ok_or(AmoError::InvalidJoint { index })?;
        joint.local_position = position;
        self.dirty = true;
        Ok(())
    }

    pub fn set_local_rotation(&mut self, index: usize, rotation: Quat) -> Result<()> {
        let joint = self
            .joints
            .get_mut(index)
            .ok_or(AmoError::InvalidJoint { index })?;
        joint.local_rotation = rotation;
        self.dirty = true;
        Ok(())
    }

    /// Restore every joint's local transform to its bind pose
    pub fn reset_to_bind_pose(&mut self) {
        for joint in &mut self.joints {
            joint.local_position = joint.bind_position;
            joint.local_rotation = joint.bind_rotation;
        }
        self.dirty = true;
        self.update_world_transforms();
    }

    /// Recompute local and world transforms for every joint
    pub fn update_world_transforms(&mut self) {
        for i in 0..self.joints.len() {
            let local = Mat4::from_rotation_translation(
                self.joints[i].local_rotation,
                self.joints[i].local_position,
            );

            // Parents precede children, so the parent's world matrix is
            // already current in this pass
            let world = match self.joints[i].parent_index() {
                Some(parent) => self.joints[parent].world_transform * local,
                None => local,
            };

            let joint = &mut self.joints[i];
            joint.local_transform = local;
            joint.world_transform = world;
        }
        self.dirty = false;
    }

    /// Apply a joint's world transform to a point
    pub fn transform_point(&self, index: usize, point: Vec3) -> Option<Vec3> {
        self.joints
            .get(index)
            .map(|j| j.world_transform.transform_point3(point))
    }

    /// Apply a joint's world rotation and scale to a direction
    pub fn transform_vector(&self, index: usize, vector: Vec3) -> Option<Vec3> {
        self.joints
            .get(index)
            .map(|j| j.world_transform.transform_vector3(vector))
    }

    /// Indices of the direct children of a joint
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.joints
            .iter()
            .enumerate()
            .filter(move |(_, j)| j.parent_index() == Some(index))
            .map(|(i, _)| i)
    }

    /// Indices of the root joints
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.joints
            .iter()
            .enumerate()
            .filter(|(_, j)| j.is_root())
            .map(|(i, _)| i)
    }

    /// Number of ancestors of a joint
    pub fn depth(&self, index: usize) -> Option<usize> {
        let mut joint = self.joints.get(index)?;
        let mut depth = 0;
        while let Some(parent) = joint.parent_index() {
            joint = &self.joints[parent];
            depth += 1;
        }
        Some(depth)
    }

    /// World matrices as flat column-major floats for upload
    pub fn world_matrices(&self) -> Vec<f32> {
        let mut data = Vec::with_capacity(self.joints.len() * 16);
        for joint in &self.joints {
            data.extend_from_slice(&joint.world_transform.to_cols_array());
        }
        data
    }
}
