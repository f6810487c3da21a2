//! A parser and runtime for AMO skinned mesh files
//!
//! AMO is a line-oriented text format in the spirit of Wavefront OBJ that adds
//! per-vertex joint influences, a joint hierarchy and keyframe animations.
//! This crate loads such files into an immutable [`AmoModel`] and animates any
//! number of [`AnimatedModel`] instances of it with linear blend skinning.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use amo_model::{AmoModel, AnimatedModel};
//!
//! let source = "\
//! v 0 0 0
//! v 1 0 0
//! v 0 1 0
//! vj 2
//! vw 1
//! j root -1
//! j hand 0
//! f 1///1/1 2///1/1 3///1/1
//! a wave
//! ap 0 2 0 0 0
//! ap 1 2 0 1 0
//! ";
//!
//! let model = Arc::new(source.parse::<AmoModel>()?);
//! let mut instance = AnimatedModel::new(model);
//! instance.play("wave");
//! instance.update(0.5);
//!
//! let mut positions = Vec::new();
//! instance.skin_positions_into(&mut positions);
//! assert!((positions[0].y - 0.5).abs() < 1e-6);
//! # Ok::<(), amo_model::AmoError>(())
//! ```

pub mod animation;
pub mod error;
pub mod geometry;
pub mod model;
pub mod parallel;
pub mod parser;
pub mod resolver;
pub mod skeleton;
pub mod skinning;

// Re-export common types
pub use animation::{Animation, AnimationController, AnimationSet, PlaybackState};
pub use error::{AmoError, Diagnostic, DiagnosticKind, Result};
pub use geometry::{Face, MeshObject, SkinData, Vertex};
pub use model::{AmoModel, AnimatedModel, BackgroundLoad, ModelStats};
pub use parser::{LoadOptions, LoadResult};
pub use resolver::{FsResolver, MemoryResolver, ResourceResolver};
pub use skeleton::{Joint, Skeleton};
pub use skinning::{Skinner, SkinningOptions};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
