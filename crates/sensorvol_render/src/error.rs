//! Render error types
//!
//! Precondition violations (negative half-angles or radius) are contract
//! errors from the caller. Device errors come from buffer creation or shader
//! compilation and are not retried.

use std::fmt;

/// Which half-angle failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// Error type for volume updates and device operations
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A half-angle was negative
    NegativeHalfAngle { axis: Axis, value: f64 },
    /// The radius was negative
    NegativeRadius(f64),
    /// No adapter or device could be obtained
    DeviceUnavailable(String),
    /// The device could not create a buffer
    BufferCreation(String),
    /// A shader program failed to compile or validate
    ShaderCompilation(String),
    /// Submitting draw commands failed
    Submission(String),
}

impl RenderError {
    /// True for caller contract violations, as opposed to device failures
    pub fn is_precondition(&self) -> bool {
        matches!(self, RenderError::NegativeHalfAngle { .. } | RenderError::NegativeRadius(_))
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NegativeHalfAngle { axis, value } => {
                write!(
                    f,
                    "{} half-angle must be greater than or equal to zero, got {}",
                    axis, value
                )
            }
            RenderError::NegativeRadius(value) => {
                write!(f, "radius must be greater than or equal to zero, got {}", value)
            }
            RenderError::DeviceUnavailable(msg) => write!(f, "Render device unavailable: {}", msg),
            RenderError::BufferCreation(msg) => write!(f, "Buffer creation failed: {}", msg),
            RenderError::ShaderCompilation(msg) => write!(f, "Shader compilation failed: {}", msg),
            RenderError::Submission(msg) => write!(f, "Submission failed: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {}
