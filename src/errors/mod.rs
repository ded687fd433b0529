// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod validation;

pub use validation::ValidationError;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification of every [`Error`].
///
/// Callers that only care whether they passed a bad value, hit a lifecycle
/// violation, or saw a kernel body fail can match on this instead of the
/// detailed variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    IllegalArgument,
    InvalidState,
    RuntimeFailure,
}

/// Errors raised by the element/type/allocation model and the execution graph.
///
/// Argument and state errors are always raised before any mutation happens, so
/// the object the call was made on is unchanged when one of them comes back.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied shape, range, usage, or name violates a precondition.
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    /// The object's lifecycle forbids the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Graph structure rejected at `create()`.
    #[error("invalid graph: {0}")]
    InvalidGraph(#[from] ValidationError),

    /// Graph description could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A kernel body failed inside the executor; passed through untouched.
    #[error("kernel '{kernel}' failed: {source}")]
    RuntimeFailure {
        kernel: String,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::IllegalArgument(_) | Error::Config(_) => ErrorKind::IllegalArgument,
            Error::InvalidState(_) | Error::InvalidGraph(_) => ErrorKind::InvalidState,
            Error::RuntimeFailure { .. } => ErrorKind::RuntimeFailure,
        }
    }

    pub(crate) fn illegal(msg: impl Into<String>) -> Self {
        Error::IllegalArgument(msg.into())
    }

    pub(crate) fn state(msg: impl Into<String>) -> Self {
        Error::InvalidState(msg.into())
    }
}
