//! Scenario execution: dispatch, phase sequencing and the whole-file
//! pipeline.
//!
//! # Order guarantees
//!
//! Within a file, the precondition strictly precedes all iteration passes,
//! which strictly precede the postcondition, and actions of one dispatch
//! never run concurrently. Across files no ordering is guaranteed; files
//! assigned to different workers complete in any order.

mod dispatch;
mod phase;

use crate::{
    context::RunContext,
    css,
    error::EngineError,
    handler::{Registry, RunOptions},
    scenario::Scenario,
    session::Session,
};

#[doc(inline)]
pub use self::{
    dispatch::dispatch,
    phase::{capture_failure, run_phases},
};

/// Runs the whole pipeline of one scenario file against `session`.
///
/// Applies the scenario's user agent, collects CSS coverage across the
/// run, sequences the phases, and tears the session down on every exit
/// path: coverage is drained exactly once, pruned stylesheets are written,
/// and the session is closed whether the pipeline succeeded, recorded a
/// failure into the trace, or aborted fatally.
pub async fn run<S: Session>(
    session: &S,
    registry: &Registry<S>,
    scenario: &Scenario,
    options: &RunOptions,
) -> Result<RunContext, EngineError> {
    let outcome = pipeline(session, registry, scenario, options).await;

    match session.stop_css_coverage().await {
        Ok(entries) => css::write_pruned(&css::extract(&entries), &options.css_dir),
        Err(e) => tracing::warn!("failed to drain CSS coverage: {e}"),
    }
    if let Err(e) = session.close().await {
        tracing::warn!("failed to close browser session: {e}");
    }

    outcome
}

async fn pipeline<S: Session>(
    session: &S,
    registry: &Registry<S>,
    scenario: &Scenario,
    options: &RunOptions,
) -> Result<RunContext, EngineError> {
    if let Some(user_agent) = &scenario.user_agent {
        session.set_user_agent(user_agent).await.map_err(EngineError::Session)?;
    }
    session.start_css_coverage().await.map_err(EngineError::Session)?;

    run_phases(session, registry, scenario, options).await
}
