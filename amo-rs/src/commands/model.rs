//! AMO model command implementations

use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use amo_model::{
    AmoModel, AnimatedModel, Diagnostic, FsResolver, LoadOptions, ModelStats, Skeleton,
};

use crate::utils::{
    NodeType, TreeNode, TreeOptions, add_table_row, create_table, format_bytes, format_quat,
    format_seconds, format_vec3, render_tree,
};

/// Summary printed by `info --json`
#[derive(Serialize)]
struct ModelSummary<'a> {
    file: String,
    size: u64,
    stats: ModelStats,
    objects: Vec<ObjectSummary<'a>>,
    animations: Vec<AnimationSummary<'a>>,
    diagnostics: &'a [Diagnostic],
}

#[derive(Serialize)]
struct ObjectSummary<'a> {
    name: &'a str,
    animated: bool,
    faces: usize,
    triangles: usize,
}

#[derive(Serialize)]
struct AnimationSummary<'a> {
    name: &'a str,
    duration: f32,
    looping: bool,
    keyframes: usize,
    joints: usize,
}

fn load_model(path: &Path, options: &LoadOptions) -> Result<AmoModel> {
    let (base, name) = split_path(path)?;
    AmoModel::from_resolver(&FsResolver::new(base), &name, options)
        .with_context(|| format!("Failed to load AMO model from {}", path.display()))
}

/// Split a path into a resolver base directory and a resource name
fn split_path(path: &Path) -> Result<(&Path, String)> {
    let name = path
        .file_name()
        .with_context(|| format!("Not a file path: {}", path.display()))?
        .to_string_lossy()
        .into_owned();
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    Ok((base, name))
}

fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

pub fn handle_info(path: &Path, detailed: bool, json: bool) -> Result<()> {
    let model = load_model(path, &LoadOptions::default())?;
    let stats = model.stats();

    if json {
        let summary = ModelSummary {
            file: path.display().to_string(),
            size: file_size(path),
            stats,
            objects: model
                .objects()
                .iter()
                .map(|o| ObjectSummary {
                    name: &o.name,
                    animated: o.animated,
                    faces: o.faces.len(),
                    triangles: o.triangle_count(),
                })
                .collect(),
            animations: model
                .animations()
                .iter()
                .map(|a| AnimationSummary {
                    name: &a.name,
                    duration: a.duration(),
                    looping: a.looping,
                    keyframes: a.keyframe_count(),
                    joints: a.animated_joints().len(),
                })
                .collect(),
            diagnostics: model.diagnostics(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Loading AMO model: {}", path.display());
    println!("\n=== AMO Model Information ===");
    println!("File size: {}", format_bytes(file_size(path)));
    println!("Positions: {}", stats.positions);
    println!(
        "Faces: {} ({} triangles, {} face vertices)",
        stats.faces, stats.triangles, stats.face_vertices
    );
    println!(
        "Objects: {} ({} animated)",
        stats.objects, stats.animated_objects
    );
    println!("Skinned vertices: {}", stats.skinned_vertices);
    println!("Joints: {}", stats.joints);
    println!(
        "Animations: {} ({} keyframes)",
        stats.animations, stats.keyframes
    );
    println!("Diagnostics: {}", stats.diagnostics);

    if detailed {
        if !model.objects().is_empty() {
            println!("\n=== Objects ===");
            let mut table = create_table(&["Name", "Animated", "Faces", "Triangles", "Vertices"]);
            for object in model.objects() {
                add_table_row(
                    &mut table,
                    vec![
                        object.name.clone(),
                        object.animated.to_string(),
                        object.faces.len().to_string(),
                        object.triangle_count().to_string(),
                        object.vertex_count().to_string(),
                    ],
                );
            }
            table.printstd();
        }

        if !model.animations().is_empty() {
            println!("\n=== Animations ===");
            let mut table = create_table(&["Name", "Duration", "Looping", "Keyframes", "Joints"]);
            for animation in model.animations() {
                add_table_row(
                    &mut table,
                    vec![
                        animation.name.clone(),
                        format_seconds(animation.duration()),
                        animation.looping.to_string(),
                        animation.keyframe_count().to_string(),
                        animation.animated_joints().len().to_string(),
                    ],
                );
            }
            table.printstd();
        }
    }

    Ok(())
}

fn joint_node(skeleton: &Skeleton, index: usize) -> TreeNode {
    let mut node = TreeNode::new(
        skeleton
            .joint(index)
            .map_or_else(|| format!("#{index}"), |j| j.name.clone()),
        NodeType::Joint,
    )
    .with_metadata("index", index);

    for child in skeleton.children(index) {
        node = node.add_child(joint_node(skeleton, child));
    }
    node
}

pub fn handle_tree(path: &Path, max_depth: usize, no_color: bool) -> Result<()> {
    let model = load_model(path, &LoadOptions::default())?;
    let stats = model.stats();

    let file_name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let mut root = TreeNode::new(file_name, NodeType::Root)
        .with_metadata("faces", stats.faces)
        .with_metadata("diagnostics", stats.diagnostics);

    let skeleton = model.skeleton();
    let mut joints = TreeNode::new("Skeleton", NodeType::Section).with_metadata("joints", stats.joints);
    for index in skeleton.roots() {
        joints = joints.add_child(joint_node(skeleton, index));
    }
    root = root.add_child(joints);

    let mut objects = TreeNode::new("Objects", NodeType::Section).with_metadata("count", stats.objects);
    for object in model.objects() {
        let mut node = TreeNode::new(object.name.clone(), NodeType::Object)
            .with_metadata("faces", object.faces.len())
            .with_metadata("triangles", object.triangle_count());
        if object.animated {
            node = node.with_metadata("animated", true);
        }
        objects = objects.add_child(node);
    }
    root = root.add_child(objects);

    let mut animations =
        TreeNode::new("Animations", NodeType::Section).with_metadata("count", stats.animations);
    for animation in model.animations() {
        let mut node = TreeNode::new(animation.name.clone(), NodeType::Animation)
            .with_metadata("duration", format_seconds(animation.duration()))
            .with_metadata("looping", animation.looping);

        for joint in animation.animated_joints() {
            let name = skeleton
                .joint(joint)
                .map_or_else(|| format!("missing #{joint}"), |j| j.name.clone());
            let positions = animation.position_track(joint).map_or(0, |t| t.len());
            let rotations = animation.rotation_track(joint).map_or(0, |t| t.len());
            node = node.add_child(
                TreeNode::new(name, NodeType::Track)
                    .with_metadata("position", positions)
                    .with_metadata("rotation", rotations),
            );
        }
        animations = animations.add_child(node);
    }
    root = root.add_child(animations);

    let options = TreeOptions {
        max_depth: Some(max_depth),
        no_color,
        ..TreeOptions::default()
    };
    print!("{}", render_tree(&root, &options));
    Ok(())
}

pub fn handle_validate(path: &Path, strict: bool, show_warnings: bool) -> Result<()> {
    println!("Validating AMO model: {}", path.display());

    let options = if strict {
        LoadOptions::strict()
    } else {
        LoadOptions::default()
    };
    let model = load_model(path, &options)?;

    let (errors, warnings): (Vec<&Diagnostic>, Vec<&Diagnostic>) =
        model.diagnostics().iter().partition(|d| d.kind.is_error());

    for diagnostic in &errors {
        println!("  ✗ {diagnostic}");
    }
    if show_warnings {
        for diagnostic in &warnings {
            println!("  ⚠ {diagnostic}");
        }
    }

    println!(
        "\n{} error(s), {} warning(s)",
        errors.len(),
        warnings.len()
    );

    if !errors.is_empty() {
        bail!(
            "{} has {} malformed line(s) or face(s)",
            path.display(),
            errors.len()
        );
    }

    println!("✓ Model is valid");
    Ok(())
}

pub fn handle_sample(path: &Path, animation: &str, time: f32, object: Option<&str>) -> Result<()> {
    let model = Arc::new(load_model(path, &LoadOptions::default())?);

    if let Some(name) = object
        && model.object(name).is_none()
    {
        bail!("Object '{}' not found in {}", name, path.display());
    }

    let mut instance = AnimatedModel::new(Arc::clone(&model));
    if !instance.play(animation) {
        let available: Vec<&str> = model.animations().names().collect();
        bail!(
            "Animation '{}' not found (available: {})",
            animation,
            if available.is_empty() {
                "none".to_string()
            } else {
                available.join(", ")
            }
        );
    }
    instance.pause();
    if !instance.seek(time) {
        bail!("Cannot seek to time {}", time);
    }

    println!(
        "Sampling '{}' at {}",
        animation,
        format_seconds(instance.controller().time())
    );

    println!("\n=== Joints ===");
    let skeleton = instance.skeleton();
    let mut table = create_table(&["#", "Name", "Parent", "Local Position", "Local Rotation", "World Position"]);
    for (index, joint) in skeleton.joints().iter().enumerate() {
        let parent = joint
            .parent_index()
            .and_then(|p| skeleton.joint(p))
            .map_or_else(|| "-".to_string(), |p| p.name.clone());
        add_table_row(
            &mut table,
            vec![
                index.to_string(),
                joint.name.clone(),
                parent,
                format_vec3(joint.local_position()),
                format_quat(joint.local_rotation()),
                format_vec3(joint.world_position()),
            ],
        );
    }
    table.printstd();

    let mut positions = Vec::new();
    match object {
        Some(name) => {
            instance.skin_object_positions_into(name, &mut positions);
            println!("\n=== Vertices ({name}) ===");
        }
        None => {
            instance.skin_positions_into(&mut positions);
            println!("\n=== Vertices ===");
        }
    }

    let mut table = create_table(&["#", "Position"]);
    for (index, position) in positions.iter().enumerate() {
        add_table_row(&mut table, vec![index.to_string(), format_vec3(*position)]);
    }
    table.printstd();

    Ok(())
}
