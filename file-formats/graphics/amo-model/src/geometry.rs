//! Geometry primitives: vertices, faces and named face groups

use glam::{Quat, Vec2, Vec3};

/// Marker for an unused joint slot in [`SkinData::joints`]
pub const NO_JOINT: i32 = -1;

/// Maximum number of joints influencing a single vertex
pub const MAX_INFLUENCES: usize = 4;

/// Joint influences of a skinned vertex
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct SkinData {
    /// 0-based joint indices, [`NO_JOINT`] for an unused slot
    pub joints: [i32; MAX_INFLUENCES],
    /// Weights as authored; never renormalized
    pub weights: [f32; MAX_INFLUENCES],
}

impl SkinData {
    /// Joints used when a face references no joint entry
    pub const NO_JOINTS: [i32; MAX_INFLUENCES] = [NO_JOINT; MAX_INFLUENCES];

    /// Weights used when a face references no weight entry
    pub const DEFAULT_WEIGHTS: [f32; MAX_INFLUENCES] = [1.0, 0.0, 0.0, 0.0];

    pub const fn new(joints: [i32; MAX_INFLUENCES], weights: [f32; MAX_INFLUENCES]) -> Self {
        Self { joints, weights }
    }

    /// Full weight on a single joint
    pub const fn single(joint: i32) -> Self {
        Self {
            joints: [joint, NO_JOINT, NO_JOINT, NO_JOINT],
            weights: Self::DEFAULT_WEIGHTS,
        }
    }

    /// Iterate over `(joint, weight)` pairs that can influence the vertex
    pub fn influences(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.joints
            .iter()
            .zip(self.weights.iter())
            .filter(|&(&joint, &weight)| joint >= 0 && weight > 0.0)
            .map(|(&joint, &weight)| (joint as usize, weight))
    }

    pub fn weight_sum(&self) -> f32 {
        self.weights.iter().sum()
    }
}

impl Default for SkinData {
    fn default() -> Self {
        Self::new(Self::NO_JOINTS, Self::DEFAULT_WEIGHTS)
    }
}

/// A mesh vertex with an optional skin payload
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub skin: Option<SkinData>,
}

impl Vertex {
    /// Create an unskinned vertex
    pub const fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
            skin: None,
        }
    }

    /// Attach joint influences
    pub const fn with_skin(mut self, skin: SkinData) -> Self {
        self.skin = Some(skin);
        self
    }

    pub fn is_skinned(&self) -> bool {
        self.skin.is_some()
    }
}

/// Shape of a face as declared in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceKind {
    Triangle,
    Quad,
    /// Polygon with 5 or more vertices
    Polygon(usize),
}

/// An ordered polygon of 3 or more vertices
///
/// Winding is kept exactly as declared.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize))]
pub struct Face {
    vertices: Vec<Vertex>,
}

impl Face {
    /// Build a face, returning `None` for fewer than 3 vertices
    pub fn new(vertices: Vec<Vertex>) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        Some(Self { vertices })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always false; a face holds at least 3 vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn kind(&self) -> FaceKind {
        match self.vertices.len() {
            3 => FaceKind::Triangle,
            4 => FaceKind::Quad,
            n => FaceKind::Polygon(n),
        }
    }

    /// Number of triangles a renderer draws for this face
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() - 2
    }

    /// Fan triangle indices anchored at vertex 0
    pub fn fan_indices(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        (1..self.vertices.len() - 1).map(|i| [0, i, i + 1])
    }

    /// Split N-gons (N >= 5) into N-2 fan triangles; triangles and quads
    /// are returned unchanged
    pub fn decompose(&self) -> Vec<Face> {
        match self.kind() {
            FaceKind::Triangle | FaceKind::Quad => vec![self.clone()],
            FaceKind::Polygon(_) => self
                .fan_indices()
                .map(|[a, b, c]| Face {
                    vertices: vec![self.vertices[a], self.vertices[b], self.vertices[c]],
                })
                .collect(),
        }
    }
}

#[cfg(feature = "serde-support")]
impl<'de> serde::Deserialize<'de> for Face {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        struct FaceData {
            vertices: Vec<Vertex>,
        }

        let data = FaceData::deserialize(deserializer)?;
        let count = data.vertices.len();
        Self::new(data.vertices).ok_or_else(|| {
            serde::de::Error::custom(format!("face has {count} vertices, at least 3 required"))
        })
    }
}

/// Local transform of a mesh object
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl ObjectTransform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn to_matrix(&self) -> glam::Mat4 {
        glam::Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A named group of faces
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct MeshObject {
    pub name: String,
    /// Declared with `ao` rather than `o`
    pub animated: bool,
    /// Transform for per-object animation, present on animated objects
    pub transform: Option<ObjectTransform>,
    pub faces: Vec<Face>,
}

impl MeshObject {
    /// Name of the group that collects faces declared before any `o` line
    pub const DEFAULT_NAME: &'static str = "default";

    pub fn new(name: impl Into<String>, animated: bool) -> Self {
        Self {
            name: name.into(),
            animated,
            transform: animated.then_some(ObjectTransform::IDENTITY),
            faces: Vec::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.faces.iter().map(Face::len).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.iter().map(Face::triangle_count).sum()
    }

    /// Face vertices in declaration order
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.faces.iter().flat_map(|f| f.vertices().iter())
    }
}
