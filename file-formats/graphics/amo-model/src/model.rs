//! Loaded AMO models and their animated instances
//!
//! An [`AmoModel`] is immutable once loaded and is shared between instances
//! through an `Arc`. Each [`AnimatedModel`] owns its own pose and playback
//! controller, so many instances of one model can animate independently.

use std::io::BufRead;
use std::str::FromStr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use glam::Vec3;

use crate::animation::{AnimationController, AnimationSet, PlaybackState};
use crate::error::{AmoError, Diagnostic, Result};
use crate::geometry::{MeshObject, Vertex};
use crate::parser::{self, LoadOptions, LoadResult};
use crate::resolver::ResourceResolver;
use crate::skeleton::Skeleton;
use crate::skinning::{Skinner, SkinningOptions};

/// Summary counts for a loaded model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelStats {
    /// Entries in the `v` pool
    pub positions: usize,
    /// Vertices referenced by faces
    pub face_vertices: usize,
    pub faces: usize,
    pub triangles: usize,
    pub objects: usize,
    pub animated_objects: usize,
    pub skinned_vertices: usize,
    pub joints: usize,
    pub animations: usize,
    pub keyframes: usize,
    pub diagnostics: usize,
}

/// A parsed AMO model: geometry, bind-pose skeleton and animations
#[derive(Debug, Clone)]
pub struct AmoModel {
    objects: Vec<MeshObject>,
    skeleton: Skeleton,
    animations: Arc<AnimationSet>,
    diagnostics: Vec<Diagnostic>,
    position_count: usize,
}

impl AmoModel {
    /// Load a model from an AMO stream
    pub fn load<R: BufRead>(reader: R, options: &LoadOptions) -> Result<Self> {
        let result = parser::parse(reader, options)?;
        Ok(Self::from_load_result(result, options))
    }

    /// Load a model from AMO text
    pub fn parse_str(content: &str, options: &LoadOptions) -> Result<Self> {
        let result = parser::parse_str(content, options)?;
        Ok(Self::from_load_result(result, options))
    }

    /// Load the named resource through a resolver
    pub fn from_resolver<R: ResourceResolver + ?Sized>(
        resolver: &R,
        name: &str,
        options: &LoadOptions,
    ) -> Result<Self> {
        log::debug!("Loading model '{}'", name);
        let reader = resolver.open(name)?;
        Self::load(reader, options)
    }

    /// Parse the named resource on a worker thread
    ///
    /// The finished model is handed back through [`BackgroundLoad::join`].
    pub fn load_in_background<R>(resolver: R, name: impl Into<String>, options: LoadOptions) -> BackgroundLoad
    where
        R: ResourceResolver + Send + 'static,
    {
        let name = name.into();
        let thread_name = format!("amo-load-{name}");
        let task_name = name.clone();
        let task = move || Self::from_resolver(&resolver, &task_name, &options);

        let handle = match thread::Builder::new().name(thread_name).spawn(task) {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("Failed to spawn loader thread for '{}': {}", name, e);
                None
            }
        };
        BackgroundLoad { name, handle }
    }

    /// Build a model from a parse result, resolving the skeleton hierarchy
    pub fn from_load_result(result: LoadResult, options: &LoadOptions) -> Self {
        let LoadResult {
            vertices,
            joints,
            objects,
            animations,
            mut diagnostics,
            ..
        } = result;

        let (skeleton, hierarchy) = Skeleton::new(joints);
        if options.validate_hierarchy {
            diagnostics.extend(hierarchy);
        }

        Self {
            objects,
            skeleton,
            animations: Arc::new(animations),
            diagnostics,
            position_count: vertices.len(),
        }
    }

    /// Face groups in declaration order
    pub fn objects(&self) -> &[MeshObject] {
        &self.objects
    }

    pub fn object(&self, name: &str) -> Option<&MeshObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Skeleton in bind pose
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn animations(&self) -> &AnimationSet {
        &self.animations
    }

    /// Shared handle to the animations, as used by controllers
    pub fn animation_set(&self) -> Arc<AnimationSet> {
        Arc::clone(&self.animations)
    }

    /// Non-fatal issues found while loading
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Whether any line or face was dropped while loading
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.kind.is_error())
    }

    /// All face vertices, object by object in declaration order
    pub fn skinned_vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.objects.iter().flat_map(MeshObject::vertices)
    }

    pub fn stats(&self) -> ModelStats {
        ModelStats {
            positions: self.position_count,
            face_vertices: self.objects.iter().map(MeshObject::vertex_count).sum(),
            faces: self.objects.iter().map(|o| o.faces.len()).sum(),
            triangles: self.objects.iter().map(MeshObject::triangle_count).sum(),
            objects: self.objects.len(),
            animated_objects: self.objects.iter().filter(|o| o.animated).count(),
            skinned_vertices: self.skinned_vertices().filter(|v| v.is_skinned()).count(),
            joints: self.skeleton.len(),
            animations: self.animations.len(),
            keyframes: self.animations.iter().map(|a| a.keyframe_count()).sum(),
            diagnostics: self.diagnostics.len(),
        }
    }
}

impl FromStr for AmoModel {
    type Err = AmoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s, &LoadOptions::default())
    }
}

/// A model being parsed on a worker thread
#[derive(Debug)]
pub struct BackgroundLoad {
    name: String,
    handle: Option<JoinHandle<Result<AmoModel>>>,
}

impl BackgroundLoad {
    /// Name of the resource being loaded
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if the worker is done without blocking
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the worker and take ownership of the model
    pub fn join(self) -> Result<AmoModel> {
        let Some(handle) = self.handle else {
            return Err(AmoError::LoaderFailed(format!(
                "no loader thread was started for '{}'",
                self.name
            )));
        };

        handle.join().map_err(|panic| {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            AmoError::LoaderFailed(format!("loading '{}' panicked: {}", self.name, message))
        })?
    }
}

/// One animated instance of a shared model
#[derive(Debug, Clone)]
pub struct AnimatedModel {
    model: Arc<AmoModel>,
    pose: Skeleton,
    controller: AnimationController,
    skinner: Skinner,
}

impl AnimatedModel {
    /// Create an instance in bind pose with a stopped controller
    pub fn new(model: Arc<AmoModel>) -> Self {
        let pose = model.skeleton.clone();
        let controller = AnimationController::new(model.animation_set());
        Self {
            model,
            pose,
            controller,
            skinner: Skinner::default(),
        }
    }

    pub fn with_skinning_options(mut self, options: SkinningOptions) -> Self {
        self.skinner.set_options(options);
        self
    }

    pub fn model(&self) -> &Arc<AmoModel> {
        &self.model
    }

    /// Current pose of this instance
    pub fn skeleton(&self) -> &Skeleton {
        &self.pose
    }

    pub fn controller(&self) -> &AnimationController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut AnimationController {
        &mut self.controller
    }

    pub fn state(&self) -> PlaybackState {
        self.controller.state()
    }

    /// Start the named animation; false if it does not exist
    pub fn play(&mut self, name: &str) -> bool {
        self.controller.play(name)
    }

    pub fn pause(&mut self) {
        self.controller.pause();
    }

    pub fn resume(&mut self) {
        self.controller.resume();
    }

    pub fn stop(&mut self) {
        self.controller.stop();
    }

    /// Jump to `time` in the current animation and pose the skeleton
    pub fn seek(&mut self, time: f32) -> bool {
        self.controller.seek(time, &mut self.pose)
    }

    /// Advance playback and leave the pose ready for skinning
    pub fn update(&mut self, delta_time: f32) {
        self.controller.update(delta_time, &mut self.pose);
        if self.pose.is_dirty() {
            self.pose.update_world_transforms();
        }
    }

    /// Return to the bind pose without touching the controller
    pub fn reset_pose(&mut self) {
        self.pose.reset_to_bind_pose();
    }

    /// Skin every face vertex of the model into `out`
    pub fn skin_positions_into(&self, out: &mut Vec<Vec3>) {
        self.skinner
            .skin_positions_into(self.model.skinned_vertices(), &self.pose, out);
    }

    /// Skin every face vertex normal of the model into `out`
    pub fn skin_normals_into(&self, out: &mut Vec<Vec3>) {
        self.skinner
            .skin_normals_into(self.model.skinned_vertices(), &self.pose, out);
    }

    /// Skin one object's face vertices into `out`; false if there is no such object
    pub fn skin_object_positions_into(&self, name: &str, out: &mut Vec<Vec3>) -> bool {
        let Some(object) = self.model.object(name) else {
            out.clear();
            return false;
        };
        self.skinner
            .skin_positions_into(object.vertices(), &self.pose, out);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;
    use crate::resolver::MemoryResolver;

    const ARM: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
vj 2
vw 1
j root -1
j hand 0
ao arm
f 1///1/1 2///1/1 3
a raise
ap 0 2 0 0 0
ap 1 2 0 1 0
";

    fn assert_send_sync<T: Send + Sync>() {}
    fn assert_send<T: Send>() {}

    #[test]
    fn test_thread_safety() {
        assert_send_sync::<AmoModel>();
        assert_send::<AnimatedModel>();
        assert_send::<BackgroundLoad>();
    }

    #[test]
    fn test_model_accessors() {
        let model: AmoModel = ARM.parse().unwrap();
        assert!(model.diagnostics().is_empty());
        assert_eq!(model.skeleton().len(), 2);
        assert!(model.object("arm").unwrap().animated);
        assert!(model.animations().contains("raise"));

        let stats = model.stats();
        assert_eq!(stats.positions, 3);
        assert_eq!(stats.face_vertices, 3);
        assert_eq!(stats.faces, 1);
        assert_eq!(stats.triangles, 1);
        assert_eq!(stats.animated_objects, 1);
        assert_eq!(stats.skinned_vertices, 2);
        assert_eq!(stats.keyframes, 2);
    }

    #[test]
    fn test_hierarchy_diagnostics_follow_option() {
        let content = "j a 1\nj b 0\n";
        let model = AmoModel::parse_str(content, &LoadOptions::default()).unwrap();
        assert_eq!(model.diagnostics().len(), 1);
        assert_eq!(model.diagnostics()[0].kind, DiagnosticKind::ReferenceWarning);
        assert!(model.skeleton().joint(0).unwrap().is_root());

        let options = LoadOptions {
            validate_hierarchy: false,
            ..LoadOptions::default()
        };
        let model = AmoModel::parse_str(content, &options).unwrap();
        assert!(model.diagnostics().is_empty());
        // The joint is still re-parented
        assert!(model.skeleton().joint(0).unwrap().is_root());
    }

    #[test]
    fn test_from_resolver_and_background_load() {
        let resolver = MemoryResolver::new().with("arm.amo", ARM);
        let model = AmoModel::from_resolver(&resolver, "arm.amo", &LoadOptions::default()).unwrap();
        assert_eq!(model.stats().joints, 2);

        assert!(matches!(
            AmoModel::from_resolver(&resolver, "leg.amo", &LoadOptions::default()),
            Err(AmoError::ResourceNotFound { .. })
        ));

        let load = AmoModel::load_in_background(resolver, "arm.amo", LoadOptions::default());
        assert_eq!(load.name(), "arm.amo");
        let model = load.join().unwrap();
        assert_eq!(model.animations().len(), 1);
    }

    #[test]
    fn test_background_load_reports_errors() {
        let resolver = MemoryResolver::new().with("bad.amo", "what is this\n");
        let load = AmoModel::load_in_background(resolver, "bad.amo", LoadOptions::strict());
        assert!(matches!(load.join(), Err(AmoError::Format { line: 1, .. })));
    }

    #[test]
    fn test_instances_animate_independently() {
        let model = Arc::new(ARM.parse::<AmoModel>().unwrap());
        let mut first = AnimatedModel::new(Arc::clone(&model));
        let second = AnimatedModel::new(Arc::clone(&model));

        assert!(first.play("raise"));
        first.update(0.5);

        let mut positions = Vec::new();
        first.skin_positions_into(&mut positions);
        assert!((positions[0] - Vec3::new(0.0, 0.5, 0.0)).length() < 1e-6);
        assert!((positions[1] - Vec3::new(1.0, 0.5, 0.0)).length() < 1e-6);
        // Unskinned vertex stays put
        assert_eq!(positions[2], Vec3::new(0.0, 1.0, 0.0));

        second.skin_positions_into(&mut positions);
        assert_eq!(positions[0], Vec3::ZERO);
        assert_eq!(second.state(), PlaybackState::Stopped);
        // Bind pose is untouched
        assert_eq!(model.skeleton().joint(1).unwrap().world_position(), Vec3::ZERO);
    }

    #[test]
    fn test_seek_and_object_skinning() {
        let model = Arc::new(ARM.parse::<AmoModel>().unwrap());
        let mut instance = AnimatedModel::new(model);
        instance.play("raise");
        instance.pause();
        assert!(instance.seek(1.0));

        let mut positions = Vec::new();
        assert!(instance.skin_object_positions_into("arm", &mut positions));
        assert!((positions[0] - Vec3::Y).length() < 1e-6);
        assert!(!instance.skin_object_positions_into("leg", &mut positions));
        assert!(positions.is_empty());

        instance.reset_pose();
        instance.skin_positions_into(&mut positions);
        assert_eq!(positions[0], Vec3::ZERO);
    }
}
