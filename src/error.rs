//! Error taxonomy for the reconciliation and inference pipeline.
//!
//! Failures split into two tiers:
//!
//! - **Run-level** (`InsufficientFrames`, `Io`, `Table`): no meaningful
//!   output can be produced; callers abort the batch.
//! - **Item-level** (`MalformedFrame`, `InfeasibleTransition`,
//!   `MissingVector`): the failing frame/transition/row is skipped and
//!   recorded in a diagnostics list while the rest of the batch proceeds.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TopologyError {
    /// A frame's node table cannot yield metrics (empty frame, duplicate
    /// node ids, or an adjacency referencing an unknown node).
    #[error("malformed frame {frame_index}: {message}")]
    MalformedFrame { frame_index: u32, message: String },

    /// Fewer than two frames: no transition can be formed.
    #[error("insufficient frames: got {got}, need at least 2")]
    InsufficientFrames { got: usize },

    /// No nonnegative integer event combination reaches the target deltas
    /// for one transition.
    #[error(
        "transition {from_frame}->{to_frame} is infeasible: \
         no nonnegative integer event counts reach \
         (delta_tips={delta_tips}, delta_junctions={delta_junctions})"
    )]
    InfeasibleTransition {
        from_frame: u32,
        to_frame: u32,
        delta_tips: i64,
        delta_junctions: i64,
    },

    /// A comparison row was requested without both vectors present.
    #[error("transition {from_frame}->{to_frame}: missing {side} event vector")]
    MissingVector {
        from_frame: u32,
        to_frame: u32,
        side: &'static str,
    },

    #[error("I/O error while {context} '{path}': {source}")]
    Io {
        context: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A table file exists but a row or header cannot be interpreted.
    #[error("table '{path}' line {line}: {message}")]
    Table {
        path: String,
        line: usize,
        message: String,
    },
}

impl TopologyError {
    pub(crate) fn malformed_frame(frame_index: u32, message: impl Into<String>) -> Self {
        Self::MalformedFrame {
            frame_index,
            message: message.into(),
        }
    }

    pub fn io(context: &'static str, path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            context,
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn table(path: &std::path::Path, line: usize, message: impl Into<String>) -> Self {
        Self::Table {
            path: path.display().to_string(),
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TopologyError>;
