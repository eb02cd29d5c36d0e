//! Scenario model, YAML loading and file discovery.
//!
//! A scenario is a declarative script of browser actions plus optional
//! setup/teardown phases, immutable for the whole run. Loading classifies
//! each file before any session work happens: skipped files perform zero
//! handler invocations.

use std::{fs, path::Path, path::PathBuf};

use derive_more::Display;
use serde::Deserialize;

use crate::{action::Step, error::ScenarioError, session::Browser, template};

fn default_iteration() -> usize {
    1
}

/// Setup phase run once before any iteration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PreCondition {
    /// URL to navigate to before the phase's steps, if any.
    #[serde(default)]
    pub url: Option<String>,

    /// Ordered setup steps.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Teardown phase run once after the last iteration, even on failure.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PostCondition {
    /// URL to navigate to before the phase's steps, if any.
    #[serde(default)]
    pub url: Option<String>,

    /// Ordered teardown steps.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A declarative browser-interaction script.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Scenario name; required, and matched against the target filter.
    #[serde(default)]
    pub name: String,

    /// Skips the file entirely before any session work.
    #[serde(default)]
    pub skip: bool,

    /// Allow-list of target browsers; a mismatch skips the file.
    #[serde(default)]
    pub only_browser: Option<Vec<Browser>>,

    /// Number of iteration passes to run.
    #[serde(default = "default_iteration")]
    pub iteration: usize,

    /// URL every iteration pass navigates to.
    pub url: String,

    /// User agent override applied before the first navigation.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Optional setup phase.
    #[serde(default)]
    pub precondition: Option<PreCondition>,

    /// Main iteration body.
    #[serde(default)]
    pub steps: Vec<Step>,

    /// Optional teardown phase.
    #[serde(default)]
    pub postcondition: Option<PostCondition>,
}

/// Why a scenario file was skipped without running.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum SkipReason {
    /// The file sets `skip: true`.
    #[display("marked skip")]
    Marked,

    /// The file's `onlyBrowser` list excludes the target browser.
    #[display("targets other browsers")]
    BrowserMismatch,

    /// A target-name filter is active and the scenario is not in it.
    #[display("not in the requested target set")]
    NotTargeted,
}

/// Outcome of loading one scenario file.
#[derive(Clone, Debug, PartialEq)]
pub enum Loaded {
    /// The scenario should run.
    Run(Scenario),

    /// The file is skipped; no session work happens.
    Skipped(SkipReason),
}

/// Reads, templates and classifies one scenario file.
///
/// `targets` is the optional scenario-name filter; empty runs everything.
/// A missing `name` is a per-file error the caller reports, never a crash.
pub fn load(path: &Path, browser: Browser, targets: &[String]) -> Result<Loaded, ScenarioError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ScenarioError::Io { path: path.to_owned(), source })?;
    let expanded = template::expand(&raw);
    let scenario: Scenario = serde_yaml::from_str(&expanded)
        .map_err(|source| ScenarioError::Parse { path: path.to_owned(), source })?;

    if scenario.skip {
        tracing::info!("{} skip...", path.display());
        return Ok(Loaded::Skipped(SkipReason::Marked));
    }
    if let Some(only) = &scenario.only_browser {
        if !only.contains(&browser) {
            tracing::info!(
                "this scenario only runs on {only:?}, {} skip...",
                path.display(),
            );
            return Ok(Loaded::Skipped(SkipReason::BrowserMismatch));
        }
    }
    if scenario.name.is_empty() {
        return Err(ScenarioError::MissingName { path: path.to_owned() });
    }
    if !targets.is_empty() && !targets.contains(&scenario.name) {
        tracing::debug!("skip scenario {}", path.display());
        return Ok(Loaded::Skipped(SkipReason::NotTargeted));
    }

    Ok(Loaded::Run(scenario))
}

/// Enumerates scenario files under `dir`, lexically sorted.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>, ScenarioError> {
    let walker = globwalk::GlobWalkerBuilder::from_patterns(dir, &["*.{yaml,yml}"])
        .build()
        .map_err(|source| ScenarioError::Discover { source })?;

    let mut files: Vec<PathBuf> = walker
        .filter_map(Result::ok)
        .map(|entry| entry.path().to_owned())
        .collect();
    files.sort();
    Ok(files)
}
