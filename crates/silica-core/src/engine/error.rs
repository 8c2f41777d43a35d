use thiserror::Error;

use crate::core::geometry::GeometryError;
use crate::core::params::ParamError;
use crate::core::tree::TreeError;
use crate::core::volume::VolumeError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("run tree has no 'DST' node; the run context must create it before subsystems initialize")]
    MissingDstNode,

    #[error("subsystem '{name}' was already initialized for this run")]
    AlreadyInitialized { name: String },

    #[error("subsystem '{name}' received an event before run initialization")]
    NotInitialized { name: String },

    #[error("run was already initialized; a context drives at most one run")]
    RunAlreadyStarted,

    #[error("run was not initialized; call init_run before processing events")]
    RunNotStarted,

    #[error("parameter error: {source}")]
    Param {
        #[from]
        source: ParamError,
    },

    #[error("volume selection error: {source}")]
    Volume {
        #[from]
        source: VolumeError,
    },

    #[error("node tree error: {source}")]
    Tree {
        #[from]
        source: TreeError,
    },

    #[error("geometry error: {source}")]
    Geometry {
        #[from]
        source: GeometryError,
    },

    #[error("stepping action for '{name}' failed: {message}")]
    Stepping { name: String, message: String },
}
