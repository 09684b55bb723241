//! Error types for mode changes.

use crate::id::ModeId;
use thiserror::Error;

/// Why the engine refused a mode-change request.
///
/// A refused request never leaves the engine half-switched: the previously
/// active mode stays active.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModeChangeError {
    /// The identifier is not in the mode registry.
    #[error("Mode '{mode}' is not registered")]
    UnknownMode {
        /// The identifier that was requested
        mode: ModeId,
    },

    /// The parameter bag did not match what the mode expects.
    #[error("Invalid parameters for mode '{mode}': {message}")]
    InvalidParams {
        /// Mode that rejected its parameters
        mode: ModeId,
        /// Description of the problem
        message: String,
    },

    /// The mode refused to start in the current engine state
    /// (typically a missing selection).
    #[error("{message}")]
    Rejected {
        /// Mode that refused to start
        mode: ModeId,
        /// User-facing explanation
        message: String,
    },
}

impl ModeChangeError {
    /// The mode the failed request was aimed at.
    pub fn mode(&self) -> ModeId {
        match self {
            Self::UnknownMode { mode }
            | Self::InvalidParams { mode, .. }
            | Self::Rejected { mode, .. } => *mode,
        }
    }
}
