//! Opaque browser-session capability and CSS coverage types.

use async_trait::async_trait;
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Capability the engine needs from a live browser session.
///
/// Concrete engines (CDP clients, WebDriver bridges, in-memory fakes in
/// tests) implement this. All per-action browser commands flow through
/// action handlers, which receive the concrete session type `S`, so this
/// trait only covers what the pipeline itself drives: user-agent setup,
/// whole-run CSS coverage and teardown.
#[async_trait(?Send)]
pub trait Session {
    /// Overrides the session's user agent before any navigation happens.
    async fn set_user_agent(&self, user_agent: &str) -> Result<(), SessionError>;

    /// Starts collecting CSS coverage for the whole run.
    async fn start_css_coverage(&self) -> Result<(), SessionError>;

    /// Stops coverage collection, draining the per-stylesheet buffers.
    ///
    /// Buffers are drained exactly once, at session teardown.
    async fn stop_css_coverage(&self) -> Result<Vec<CoverageEntry>, SessionError>;

    /// Closes the session, releasing the underlying browser.
    async fn close(&self) -> Result<(), SessionError>;
}

/// Half-open byte range `[start, end)` of a stylesheet.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CoverageRange {
    /// First used byte.
    pub start: usize,

    /// One past the last used byte.
    pub end: usize,
}

/// Usage of one stylesheet, captured over a whole run.
///
/// `ranges` are non-overlapping and ascending, as reported by the browser.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CoverageEntry {
    /// URL the stylesheet was served from.
    pub url: String,

    /// Full original source of the stylesheet.
    pub text: String,

    /// Byte ranges exercised during the run.
    pub ranges: Vec<CoverageRange>,
}

/// Target browser identifier.
///
/// Threaded through run options into handlers (screenshot naming) and
/// matched against a scenario's `onlyBrowser` allow-list.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    /// Chromium-family browsers.
    #[default]
    #[display("chrome")]
    Chrome,

    /// Firefox.
    #[display("firefox")]
    Firefox,
}
