//! Line-oriented parser for the AMO text format
//!
//! Each non-blank line holds one record whose first token is its tag:
//!
//! ```text
//! v  x y z                       vertex
//! vn x y z                       normal
//! vt u v                         uv
//! vj j1 [j2 j3 j4]               1-based joint indices (0 = none)
//! vw w1 [w2 w3 w4]               weights (missing = 0.0)
//! j  name parentIndex            joint, parentIndex 0-based, -1 = root
//! o  name | ao name              begin object / animated object group
//! a  name [loop|once]            begin animation
//! ap time joint x y z            position keyframe (joint 1-based)
//! ar time joint x y z w          rotation keyframe, quaternion xyzw
//! f  v[/vt[/vn[/vj[/vw]]]] ...   face with 3 or more vertex groups
//! ```
//!
//! `#` starts a comment that runs to the end of the line.

use std::collections::HashMap;
use std::io::{BufRead, Cursor};
use std::str::FromStr;

use glam::{Quat, Vec2, Vec3};

use crate::animation::{Animation, AnimationSet};
use crate::error::{Diagnostic, DiagnosticKind, Result};
use crate::geometry::{
    Face, MAX_INFLUENCES, MeshObject, NO_JOINT, ObjectTransform, SkinData, Vertex,
};
use crate::skeleton::Joint;
use crate::skinning::weight_sum_deviation;

/// Options controlling how strictly a file is loaded
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct LoadOptions {
    /// Abort on the first malformed line or face instead of skipping it
    pub strict: bool,
    /// Report joints whose parent index is not an earlier joint
    pub validate_hierarchy: bool,
    /// Report `vw` entries whose weights do not sum to 1
    pub lint_weights: bool,
    /// Allowed distance of a weight sum from 1 before it is reported
    pub weight_sum_tolerance: f32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            strict: false,
            validate_hierarchy: true,
            lint_weights: true,
            weight_sum_tolerance: 0.01,
        }
    }
}

impl LoadOptions {
    /// Options that abort on the first malformed line
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }
}

/// Everything read from one AMO stream
#[derive(Debug, Clone, Default)]
pub struct LoadResult {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    /// `vj` entries, already converted to 0-based indices
    pub skin_joints: Vec<[i32; MAX_INFLUENCES]>,
    /// `vw` entries
    pub skin_weights: Vec<[f32; MAX_INFLUENCES]>,
    pub joints: Vec<Joint>,
    /// Face groups in declaration order
    pub objects: Vec<MeshObject>,
    pub animations: AnimationSet,
    /// Non-fatal issues found while loading
    pub diagnostics: Vec<Diagnostic>,
}

impl LoadResult {
    pub fn object(&self, name: &str) -> Option<&MeshObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Whether any line or face was dropped
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.kind.is_error())
    }
}

/// Parse an AMO stream
///
/// Lines that are not valid UTF-8 are format errors for that line; only
/// failures of the reader itself abort a lenient load.
pub fn parse<R: BufRead>(mut reader: R, options: &LoadOptions) -> Result<LoadResult> {
    let mut parser = Parser::new(options);
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;

        match std::str::from_utf8(&buf) {
            Ok(line) => parser.line(line_no, line)?,
            Err(e) => parser.reject(format_error(
                line_no,
                format!("line is not valid UTF-8 (invalid byte at offset {})", e.valid_up_to()),
            ))?,
        }
    }

    Ok(parser.finish())
}

/// Parse AMO text held in memory
pub fn parse_str(content: &str, options: &LoadOptions) -> Result<LoadResult> {
    parse(Cursor::new(content), options)
}

type LineResult<T> = std::result::Result<T, Diagnostic>;

/// Parse state threaded through one load
struct Parser<'o> {
    options: &'o LoadOptions,
    result: LoadResult,
    /// Index into `result.objects` receiving faces
    current_object: Option<usize>,
    object_index: HashMap<String, usize>,
    /// Name of the animation receiving keyframes
    current_animation: Option<String>,
}

impl<'o> Parser<'o> {
    fn new(options: &'o LoadOptions) -> Self {
        Self {
            options,
            result: LoadResult::default(),
            current_object: None,
            object_index: HashMap::new(),
            current_animation: None,
        }
    }

    /// Handle one raw line, applying the error policy
    fn line(&mut self, line_no: usize, raw: &str) -> Result<()> {
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            return Ok(());
        }

        log::trace!("line {}: {}", line_no, content);

        match self.record(line_no, content) {
            Ok(()) => Ok(()),
            Err(diagnostic) => self.reject(diagnostic),
        }
    }

    /// Abort in strict mode, otherwise record and carry on
    fn reject(&mut self, diagnostic: Diagnostic) -> Result<()> {
        if self.options.strict && diagnostic.kind.is_error() {
            return Err(diagnostic.into_error());
        }
        self.report(diagnostic);
        Ok(())
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        log::warn!("{diagnostic}");
        self.result.diagnostics.push(diagnostic);
    }

    fn record(&mut self, line_no: usize, content: &str) -> LineResult<()> {
        let mut tokens = content.split_whitespace();
        let tag = tokens.next().unwrap_or_default();
        let args: Vec<&str> = tokens.collect();

        match tag {
            "v" => {
                let [x, y, z] = floats::<3>(line_no, tag, &args)?;
                self.result.vertices.push(Vec3::new(x, y, z));
            }
            "vn" => {
                let [x, y, z] = floats::<3>(line_no, tag, &args)?;
                self.result.normals.push(Vec3::new(x, y, z));
            }
            "vt" => {
                let [u, v] = floats::<2>(line_no, tag, &args)?;
                self.result.uvs.push(Vec2::new(u, v));
            }
            "vj" => self.skin_joints(line_no, &args)?,
            "vw" => self.skin_weights(line_no, &args)?,
            "j" => self.joint(line_no, &args)?,
            "o" | "ao" => {
                let name = rest(line_no, tag, &args)?;
                self.begin_object(&name, tag == "ao");
            }
            "a" => self.begin_animation(line_no, &args)?,
            "ap" => self.position_keyframe(line_no, &args)?,
            "ar" => self.rotation_keyframe(line_no, &args)?,
            "f" => self.face(line_no, &args)?,
            other => {
                return Err(format_error(line_no, format!("unknown record tag '{other}'")));
            }
        }
        Ok(())
    }

    fn skin_joints(&mut self, line_no: usize, args: &[&str]) -> LineResult<()> {
        let values = up_to_four(line_no, "vj", args)?;
        let mut joints = SkinData::NO_JOINTS;
        for (slot, token) in joints.iter_mut().zip(values) {
            let index: i32 = number(line_no, "vj", token)?;
            *slot = match index {
                0 => NO_JOINT,
                i if i > 0 => i - 1,
                i => {
                    return Err(format_error(line_no, format!("negative joint index {i} in vj")));
                }
            };
        }
        self.result.skin_joints.push(joints);
        Ok(())
    }

    fn skin_weights(&mut self, line_no: usize, args: &[&str]) -> LineResult<()> {
        let values = up_to_four(line_no, "vw", args)?;
        let mut weights = [0.0; MAX_INFLUENCES];
        for (slot, token) in weights.iter_mut().zip(values) {
            *slot = float(line_no, "vw", token)?;
        }

        if self.options.lint_weights
            && let Some(deviation) = weight_sum_deviation(&weights, self.options.weight_sum_tolerance)
        {
            self.report(Diagnostic::new(
                Some(line_no),
                DiagnosticKind::WeightLint,
                format!(
                    "weights {:?} sum to {} ({} away from 1)",
                    weights,
                    weights.iter().sum::<f32>(),
                    deviation
                ),
            ));
        }

        self.result.skin_weights.push(weights);
        Ok(())
    }

    fn joint(&mut self, line_no: usize, args: &[&str]) -> LineResult<()> {
        let [name, parent] = exact::<2>(line_no, "j", args)?;
        let parent: i32 = number(line_no, "j", parent)?;
        self.result.joints.push(Joint::new(name, parent));
        Ok(())
    }

    fn begin_object(&mut self, name: &str, animated: bool) {
        let index = match self.object_index.get(name) {
            Some(&index) => {
                let object = &mut self.result.objects[index];
                if animated && !object.animated {
                    object.animated = true;
                    object.transform.get_or_insert(ObjectTransform::IDENTITY);
                }
                index
            }
            None => {
                self.result.objects.push(MeshObject::new(name, animated));
                let index = self.result.objects.len() - 1;
                self.object_index.insert(name.to_string(), index);
                index
            }
        };
        self.current_object = Some(index);
    }

    fn begin_animation(&mut self, line_no: usize, args: &[&str]) -> LineResult<()> {
        let (name, looping) = match args {
            [name] => (*name, true),
            [name, "loop"] => (*name, true),
            [name, "once"] => (*name, false),
            [_, mode] => {
                return Err(format_error(
                    line_no,
                    format!("animation mode must be 'loop' or 'once', got '{mode}'"),
                ));
            }
            _ => return Err(arity_error(line_no, "a", "1 or 2", args.len())),
        };

        self.result.animations.get_or_create(name).looping = looping;
        self.current_animation = Some(name.to_string());
        Ok(())
    }

    fn keyframe_target(&mut self, line_no: usize, tag: &str, time: &str, joint: &str) -> LineResult<(f32, usize)> {
        let time = float(line_no, tag, time)?;
        let joint: i64 = number(line_no, tag, joint)?;
        if joint < 1 {
            return Err(format_error(
                line_no,
                format!("{tag} joint index {joint} is not 1-based"),
            ));
        }
        if self.current_animation.is_none() {
            return Err(format_error(line_no, format!("{tag} keyframe outside of an animation")));
        }
        let joint = usize::try_from(joint - 1)
            .map_err(|_| format_error(line_no, format!("{tag} joint index {joint} out of range")))?;
        Ok((time, joint))
    }

    fn position_keyframe(&mut self, line_no: usize, args: &[&str]) -> LineResult<()> {
        let [time, joint, x, y, z] = exact::<5>(line_no, "ap", args)?;
        let (time, joint) = self.keyframe_target(line_no, "ap", time, joint)?;
        let value = Vec3::new(
            float(line_no, "ap", x)?,
            float(line_no, "ap", y)?,
            float(line_no, "ap", z)?,
        );
        self.current_animation_mut()
            .add_position_keyframe(joint, time, value);
        Ok(())
    }

    fn rotation_keyframe(&mut self, line_no: usize, args: &[&str]) -> LineResult<()> {
        let [time, joint, x, y, z, w] = exact::<6>(line_no, "ar", args)?;
        let (time, joint) = self.keyframe_target(line_no, "ar", time, joint)?;
        let value = Quat::from_xyzw(
            float(line_no, "ar", x)?,
            float(line_no, "ar", y)?,
            float(line_no, "ar", z)?,
            float(line_no, "ar", w)?,
        );
        self.current_animation_mut()
            .add_rotation_keyframe(joint, time, value);
        Ok(())
    }

    fn current_animation_mut(&mut self) -> &mut Animation {
        let name = self.current_animation.as_deref().unwrap_or_default();
        self.result.animations.get_or_create(name)
    }

    fn face(&mut self, line_no: usize, args: &[&str]) -> LineResult<()> {
        if args.len() < 3 {
            return Err(Diagnostic::new(
                Some(line_no),
                DiagnosticKind::DegenerateFace,
                format!("face has {} vertices, at least 3 are required", args.len()),
            ));
        }

        let mut warnings = Vec::new();
        let mut vertices = Vec::with_capacity(args.len());
        for group in args {
            vertices.push(self.face_vertex(line_no, group, &mut warnings)?);
        }
        for warning in warnings {
            self.report(warning);
        }

        // Length was checked above
        let Some(face) = Face::new(vertices) else {
            return Ok(());
        };

        let index = match self.current_object {
            Some(index) => index,
            None => {
                self.begin_object(MeshObject::DEFAULT_NAME, false);
                self.result.objects.len() - 1
            }
        };
        self.result.objects[index].faces.push(face);
        Ok(())
    }

    /// Resolve one `v/vt/vn/vj/vw` group against the pools read so far
    fn face_vertex(
        &self,
        line_no: usize,
        group: &str,
        warnings: &mut Vec<Diagnostic>,
    ) -> LineResult<Vertex> {
        let parts: Vec<&str> = group.split('/').collect();
        if parts.len() > 5 {
            return Err(format_error(
                line_no,
                format!("face vertex '{group}' has more than 5 indices"),
            ));
        }

        let index = |slot: usize| -> LineResult<Option<i64>> {
            match parts.get(slot) {
                None | Some(&"") => Ok(None),
                Some(token) => number(line_no, "f", token).map(Some),
            }
        };

        let Some(vertex_index) = index(0)? else {
            return Err(format_error(line_no, format!("face vertex '{group}' has no vertex index")));
        };
        let Some(&position) = pool_entry(&self.result.vertices, vertex_index) else {
            return Err(format_error(
                line_no,
                format!(
                    "vertex index {} out of range (1..={})",
                    vertex_index,
                    self.result.vertices.len()
                ),
            ));
        };

        let uv_index = index(1)?;
        let normal_index = index(2)?;
        let joints_index = index(3)?;
        let weights_index = index(4)?;

        let mut lookup = Lookup { line_no, warnings };
        let uv = lookup.entry("uv", &self.result.uvs, uv_index, Vec2::ZERO);
        let normal = lookup.entry("normal", &self.result.normals, normal_index, Vec3::ZERO);

        let mut vertex = Vertex::new(position, normal, uv);
        if joints_index.is_some() || weights_index.is_some() {
            let joints = lookup.entry(
                "joint",
                &self.result.skin_joints,
                joints_index,
                SkinData::NO_JOINTS,
            );
            let weights = lookup.entry(
                "weight",
                &self.result.skin_weights,
                weights_index,
                SkinData::DEFAULT_WEIGHTS,
            );
            vertex = vertex.with_skin(SkinData::new(joints, weights));
        }
        Ok(vertex)
    }

    /// Run end-of-file checks and hand over the result
    fn finish(mut self) -> LoadResult {
        let joint_count = self.result.joints.len();
        let mut warnings = Vec::new();

        for animation in &self.result.animations {
            for joint in animation.missing_joints(joint_count) {
                warnings.push(Diagnostic::new(
                    None,
                    DiagnosticKind::ReferenceWarning,
                    format!(
                        "animation '{}' animates joint {} but only {} joints are defined",
                        animation.name,
                        joint + 1,
                        joint_count
                    ),
                ));
            }
        }
        for warning in warnings {
            self.report(warning);
        }

        log::debug!(
            "Parsed {} vertices, {} objects, {} joints, {} animations ({} diagnostics)",
            self.result.vertices.len(),
            self.result.objects.len(),
            joint_count,
            self.result.animations.len(),
            self.result.diagnostics.len()
        );
        self.result
    }
}

/// 1-based lookup into a pool
fn pool_entry<T>(pool: &[T], index: i64) -> Option<&T> {
    let index = usize::try_from(index).ok()?.checked_sub(1)?;
    pool.get(index)
}

/// Optional face references, defaulting when unset or out of range
struct Lookup<'w> {
    line_no: usize,
    warnings: &'w mut Vec<Diagnostic>,
}

impl Lookup<'_> {
    fn entry<T: Copy>(&mut self, what: &str, pool: &[T], index: Option<i64>, default: T) -> T {
        let Some(index) = index else {
            return default;
        };
        if let Some(&value) = pool_entry(pool, index) {
            return value;
        }
        self.warnings.push(Diagnostic::new(
            Some(self.line_no),
            DiagnosticKind::ReferenceWarning,
            format!("{what} index {index} out of range (1..={}), using default", pool.len()),
        ));
        default
    }
}

fn format_error(line_no: usize, message: String) -> Diagnostic {
    Diagnostic::new(Some(line_no), DiagnosticKind::FormatError, message)
}

fn arity_error(line_no: usize, tag: &str, expected: &str, got: usize) -> Diagnostic {
    format_error(
        line_no,
        format!("'{tag}' expects {expected} values, got {got}"),
    )
}

fn number<T: FromStr>(line_no: usize, tag: &str, token: &str) -> LineResult<T> {
    token
        .parse()
        .map_err(|_| format_error(line_no, format!("invalid number '{token}' in '{tag}'")))
}

fn float(line_no: usize, tag: &str, token: &str) -> LineResult<f32> {
    let value: f32 = number(line_no, tag, token)?;
    if !value.is_finite() {
        return Err(format_error(line_no, format!("non-finite number '{token}' in '{tag}'")));
    }
    Ok(value)
}

/// Exactly N tokens
fn exact<'a, const N: usize>(line_no: usize, tag: &str, args: &[&'a str]) -> LineResult<[&'a str; N]> {
    args.try_into()
        .map_err(|_| arity_error(line_no, tag, &N.to_string(), args.len()))
}

/// Exactly N floats
fn floats<const N: usize>(line_no: usize, tag: &str, args: &[&str]) -> LineResult<[f32; N]> {
    let tokens: [&str; N] = exact(line_no, tag, args)?;
    let mut values = [0.0; N];
    for (value, token) in values.iter_mut().zip(tokens) {
        *value = float(line_no, tag, token)?;
    }
    Ok(values)
}

/// Between 1 and 4 tokens
fn up_to_four<'a, 'b>(line_no: usize, tag: &str, args: &'b [&'a str]) -> LineResult<&'b [&'a str]> {
    if args.is_empty() || args.len() > MAX_INFLUENCES {
        return Err(arity_error(line_no, tag, "1 to 4", args.len()));
    }
    Ok(args)
}

/// Remaining tokens joined by single spaces; at least one required
fn rest(line_no: usize, tag: &str, args: &[&str]) -> LineResult<String> {
    if args.is_empty() {
        return Err(arity_error(line_no, tag, "a name", 0));
    }
    Ok(args.join(" "))
}
