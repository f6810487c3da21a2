use std::fmt;
use std::io;
use thiserror::Error;

/// Error types for AMO model loading and playback
#[derive(Error, Debug)]
pub enum AmoError {
    /// I/O Error during reading
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The resource resolver could not open the named resource
    #[error("Resource not found: {name}")]
    ResourceNotFound { name: String },

    /// Malformed record or bad vertex reference
    #[error("Format error at line {line}: {message}")]
    Format { line: usize, message: String },

    /// A joint index outside the skeleton was used where one is required
    #[error("Invalid joint index: {index}")]
    InvalidJoint { index: usize },

    /// The background loader thread panicked before publishing a model
    #[error("Loader thread failed: {0}")]
    LoaderFailed(String),
}

/// Result type using AmoError
pub type Result<T> = std::result::Result<T, AmoError>;

/// Category of a non-fatal issue found while loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticKind {
    /// A malformed line that was skipped
    FormatError,
    /// A joint, keyframe or animation reference to something absent
    ReferenceWarning,
    /// A face with fewer than 3 vertices
    DegenerateFace,
    /// Skin weights that do not sum to 1
    WeightLint,
}

impl DiagnosticKind {
    /// Whether this kind means data was dropped rather than defaulted
    pub fn is_error(self) -> bool {
        matches!(self, Self::FormatError | Self::DegenerateFace)
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FormatError => "format error",
            Self::ReferenceWarning => "reference warning",
            Self::DegenerateFace => "degenerate face",
            Self::WeightLint => "weight lint",
        };
        f.write_str(name)
    }
}

/// A non-fatal issue accumulated alongside a best-effort model
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    /// 1-based source line, when the issue belongs to one
    pub line: Option<usize>,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: Option<usize>, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            line,
            kind,
            message: message.into(),
        }
    }

    /// Convert into the fatal error used by strict loading
    pub fn into_error(self) -> AmoError {
        AmoError::Format {
            line: self.line.unwrap_or(0),
            message: self.message,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}: {}", self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}
