//! Error types for the arbor facade.

use std::fmt;
use std::io;

use arbor_kernel::KernelError;
use arbor_mesh::AssemblyError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline stage a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Kernel start-up.
    Init,
    /// Parameter parsing and validation.
    Config,
    /// Skeleton and foliage generation.
    Generate,
    /// Boolean union of the primitives.
    Assemble,
    /// STL serialization.
    Export,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Config => "config",
            Stage::Generate => "generate",
            Stage::Assemble => "assemble",
            Stage::Export => "export",
        };
        f.write_str(s)
    }
}

/// Stable machine-readable error tag for the request/response boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorTag {
    /// The kernel failed to initialize; the session is unusable.
    KernelInit,
    /// Parameters could not be read or are out of range.
    InvalidConfig,
    /// Assembly produced nothing.
    NoGeometry,
    /// Export requested before any successful assembly.
    NoMesh,
    /// The request was cancelled before its result was delivered.
    Cancelled,
    /// The assembly worker is gone.
    WorkerGone,
    /// Filesystem failure.
    Io,
}

/// Errors raised while reading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Malformed TOML.
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed.
    #[error("cannot write TOML: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    /// Malformed JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file could not be read.
    #[error("cannot read config: {0}")]
    Io(#[from] io::Error),

    /// Config file extension is not `.toml` or `.json`.
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// A parameter is out of range.
    #[error("invalid parameters: {0}")]
    Invalid(String),
}

/// Errors surfaced by [`crate::Session`] and [`crate::AssemblyWorker`].
#[derive(Error, Debug)]
pub enum ArborError {
    /// The kernel failed to initialize. Repeated for every request until
    /// the session is reinitialized.
    #[error("{0}")]
    KernelInit(#[from] KernelError),

    /// Bad parameters.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Assembly failed.
    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    /// Export before any successful assembly.
    #[error("no mesh generated")]
    NoMesh,

    /// Result discarded by cancellation.
    #[error("request cancelled")]
    Cancelled {
        /// Stage of the cancelled request.
        stage: Stage,
    },

    /// The worker thread stopped before answering.
    #[error("assembly worker stopped")]
    WorkerGone {
        /// Stage of the unanswered request.
        stage: Stage,
    },

    /// Writing output failed.
    #[error("export failed: {0}")]
    Io(#[from] io::Error),
}

impl ArborError {
    /// Stage the failure belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            ArborError::KernelInit(_) => Stage::Init,
            ArborError::Config(_) => Stage::Config,
            ArborError::Assembly(_) => Stage::Assemble,
            ArborError::NoMesh | ArborError::Io(_) => Stage::Export,
            ArborError::Cancelled { stage } | ArborError::WorkerGone { stage } => *stage,
        }
    }

    /// Protocol tag.
    pub fn tag(&self) -> ErrorTag {
        match self {
            ArborError::KernelInit(_) => ErrorTag::KernelInit,
            ArborError::Config(_) => ErrorTag::InvalidConfig,
            ArborError::Assembly(AssemblyError::NoGeometry) => ErrorTag::NoGeometry,
            ArborError::NoMesh => ErrorTag::NoMesh,
            ArborError::Cancelled { .. } => ErrorTag::Cancelled,
            ArborError::WorkerGone { .. } => ErrorTag::WorkerGone,
            ArborError::Io(_) => ErrorTag::Io,
        }
    }
}

/// Result type for arbor operations.
pub type Result<T> = std::result::Result<T, ArborError>;
