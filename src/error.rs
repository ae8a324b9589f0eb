//! Error types for the blade design pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading, modifying, writing or simulating a blade design.
#[derive(Debug, Error)]
pub enum BladeError {
    /// A source file does not match its fixed layout.
    #[error("malformed input in {} (line {line}): {message}", .path.display())]
    MalformedInput {
        path: PathBuf,
        /// 1-based line number, 0 when the problem is not tied to one line.
        line: usize,
        message: String,
    },

    /// Modifier or run parameters are inconsistent with the geometry.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A working copy changed shape between read and write.
    #[error("format mismatch in {}: {message}", .path.display())]
    FormatMismatch { path: PathBuf, message: String },

    /// Filesystem failure.
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external solver failed.
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

impl BladeError {
    pub(crate) fn malformed(
        path: impl Into<PathBuf>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        BladeError::MalformedInput {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        BladeError::FormatMismatch {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BladeError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures of the external solver process.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("failed to launch solver `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("solver for design `{design}` exited with {status}")]
    Failed { design: String, status: String },

    #[error("solver for design `{design}` did not finish within {secs} s")]
    Timeout { design: String, secs: u64 },

    #[error("solver for design `{design}` produced no {}", .path.display())]
    MissingOutput { design: String, path: PathBuf },
}

pub type Result<T> = std::result::Result<T, BladeError>;
