use std::fmt;

use thiserror::Error;

/// Value kind a parameter index is declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Float,
    Int,
    Bool,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            ParamKind::Float => "float",
            ParamKind::Int => "int",
            ParamKind::Bool => "bool",
        })
    }
}

/// Errors returned across the host boundary.
///
/// The core never retries and never logs these; the host decides.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IntrfError {
    /// Allocation of instance-owned buffers failed. The instance is unusable.
    #[error("failed to allocate {bytes} bytes of instance memory")]
    Memory { bytes: usize },

    /// Index out of range, kind mismatch, or unknown enum ordinal. Nothing was mutated.
    #[error("parameter {index} is not a valid {kind} parameter")]
    InvalidParameter { index: usize, kind: ParamKind },

    /// Operation on a released instance.
    #[error("instance has been released")]
    InvalidState,
}

pub type Result<T, E = IntrfError> = std::result::Result<T, E>;
