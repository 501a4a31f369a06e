//! Error types for the scene host.

use thiserror::Error;

/// Main error type for scene preparation and rendering operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A mesh instance is missing a required shading property
    #[error("Instance '{instance}' is missing material property '{property}'")]
    MissingMaterial { instance: String, property: String },

    /// A mesh instance references a vertex outside its vertex list
    #[error("Instance '{instance}' has index {index} out of bounds (vertex count: {count})")]
    IndexOutOfBounds {
        instance: String,
        index: u32,
        count: usize,
    },

    /// Packed element stride disagrees with the kernel's expected stride
    #[error("{kind} buffer stride mismatch: kernel expects {expected} bytes, builder packs {actual}")]
    BufferLayoutMismatch {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Output surface allocation failed (invalid size or out of memory)
    #[error("Failed to allocate {what} surface at {width}x{height}")]
    ResourceAllocation {
        what: &'static str,
        width: u32,
        height: u32,
    },

    /// Geometry source had no triangles when a rebuild was requested
    #[error("Geometry source is empty: no triangles available for buffer rebuild")]
    EmptySourceData,

    /// A frame was requested before activation
    #[error("Controller is not activated")]
    NotActivated,

    /// Kernel dispatch failed for this frame
    #[error("Kernel dispatch failed: {0}")]
    Kernel(String),

    /// Environment map could not be loaded or decoded
    #[error("Environment map load failed: {0}")]
    EnvMap(String),
}

impl Error {
    /// Create a missing-material error.
    pub fn missing_material(instance: impl Into<String>, property: impl Into<String>) -> Self {
        Self::MissingMaterial {
            instance: instance.into(),
            property: property.into(),
        }
    }

    /// Create a kernel dispatch error from any message.
    pub fn kernel(msg: impl Into<String>) -> Self {
        Self::Kernel(msg.into())
    }
}

/// Result type alias for scene host operations.
pub type Result<T> = std::result::Result<T, Error>;
