// Licensed under the MIT and Apache-2.0 licenses.

use thiserror::Error;

use crate::dtype::DType;

/// Errors surfaced by the public entry points. Validation errors are raised
/// before any work is submitted; worker errors are captured by the first
/// failing bucket and re-raised after the join, in which case a
/// caller-supplied destination may be partially written.
#[derive(Debug, Error)]
pub enum CubeError {
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("operation `{op}` is not supported for dtype {dtype}")]
    UnsupportedOp { op: &'static str, dtype: DType },

    #[error("value {value} does not round-trip through dtype {dtype}")]
    CastOverflow { value: String, dtype: DType },

    #[error("index {index} out of bounds (length {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("bad configuration: {0}")]
    BadConfig(String),
}

pub type Result<T> = std::result::Result<T, CubeError>;

/// Signal returned by a container's bulk staged I/O when it cannot honor
/// it (e.g. a non-contiguous view). Kernels recover from this by
/// restarting the range on their elementwise scalar path; it never
/// crosses the public surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkIoUnsupported;
