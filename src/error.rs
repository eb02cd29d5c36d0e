//! Consolidated error taxonomy.
//!
//! Only [`EngineError`] escalates past a single scenario file. Handler
//! failures are recorded into the [`RunContext`] trace and drive phase
//! sequencing instead of crossing component boundaries as exceptions, and
//! scenario-file problems are reported per file without aborting siblings.
//!
//! [`RunContext`]: crate::context::RunContext

use std::{io, path::PathBuf};

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

use crate::action::ActionKind;

/// Fatal failure of a scenario file's pipeline.
///
/// These are the only errors propagating out of [`runner::run()`]; everything
/// that happens inside the browser is captured into the trace instead.
///
/// [`runner::run()`]: crate::runner::run
#[derive(Debug, Display, Error)]
pub enum EngineError {
    /// A step referenced an action type absent from the handler registry.
    ///
    /// No handler could run, so nothing is recorded into the trace.
    #[display("unknown action type: {_0}")]
    UnknownActionType(#[error(not(source))] ActionKind),

    /// The browser session refused an operation the pipeline needs before
    /// any phase can run.
    #[display("browser session failed: {_0}")]
    Session(SessionError),
}

/// Failure signaled by an action handler.
///
/// Recorded into the trace as [`ErrorRecord`], never thrown across the
/// dispatch boundary.
///
/// [`ErrorRecord`]: crate::context::ErrorRecord
#[derive(Clone, Debug, Deserialize, Display, Eq, Error, PartialEq, Serialize)]
#[display("{message}")]
pub struct HandlerError {
    /// What the handler reported.
    pub message: String,
}

impl HandlerError {
    /// Creates a new [`HandlerError`] out of the given `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

/// Failure at the opaque browser-session boundary.
#[derive(Debug, Display, Error)]
#[display("{message}")]
pub struct SessionError {
    /// What the session reported.
    pub message: String,
}

impl SessionError {
    /// Creates a new [`SessionError`] out of the given `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Per-file problem with a scenario definition.
///
/// Callers report these and move on to the next file; they never abort the
/// whole run.
#[derive(Debug, Display, Error)]
pub enum ScenarioError {
    /// The scenario lacks the required `name` field.
    #[display("scenario {} must set a name", path.display())]
    MissingName {
        /// File the scenario was read from.
        #[error(not(source))]
        path: PathBuf,
    },

    /// The scenario file could not be read.
    #[display("failed to read scenario {}: {source}", path.display())]
    Io {
        /// File the scenario was read from.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The scenario file is not valid YAML for the scenario model.
    #[display("failed to parse scenario {}: {source}", path.display())]
    Parse {
        /// File the scenario was read from.
        path: PathBuf,
        /// Underlying deserialization error.
        source: serde_yaml::Error,
    },

    /// Scenario file enumeration failed.
    #[display("failed to enumerate scenario files: {source}")]
    Discover {
        /// Underlying walker error.
        source: globwalk::GlobError,
    },
}
