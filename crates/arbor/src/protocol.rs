//! Request/response messages exchanged with a [`crate::Session`].
//!
//! Serialized as tagged JSON objects:
//!
//! ```json
//! {"type": "generate", "height": 12.0, "species": "pine"}
//! {"type": "export", "scale": 0.005}
//! ```

use serde::{Deserialize, Serialize};

use crate::config::TreeParams;
use crate::error::{ArborError, ErrorTag, Stage};

/// A request to a session or worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Build a tree and keep its mesh as the current result.
    Generate(TreeParams),
    /// Encode the current mesh as binary STL.
    Export {
        /// Position scale. Falls back to the last parameters' `export_scale`.
        #[serde(default)]
        scale: Option<f64>,
    },
}

impl Request {
    /// Stage this request starts in.
    pub fn stage(&self) -> Stage {
        match self {
            Request::Generate(_) => Stage::Generate,
            Request::Export { .. } => Stage::Export,
        }
    }
}

/// A reply to one [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Mesh produced by a generate request.
    Mesh {
        /// Flat `[x, y, z, ...]` positions.
        vertices: Vec<f32>,
        /// Triangle vertex indices.
        indices: Vec<u32>,
    },
    /// STL bytes produced by an export request.
    Exported {
        /// Binary STL.
        bytes: Vec<u8>,
    },
    /// Failure.
    Error {
        /// Machine-readable tag.
        tag: ErrorTag,
        /// Stage that failed.
        stage: Stage,
        /// Human-readable message.
        message: String,
    },
}

impl Response {
    /// Error response for `err`.
    pub fn from_error(err: &ArborError) -> Self {
        Response::Error {
            tag: err.tag(),
            stage: err.stage(),
            message: err.to_string(),
        }
    }

    /// Whether this is an error reply.
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }

    /// Error tag, if this is an error reply.
    pub fn error_tag(&self) -> Option<ErrorTag> {
        match self {
            Response::Error { tag, .. } => Some(*tag),
            _ => None,
        }
    }
}
