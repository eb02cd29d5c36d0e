//! Phase sequencing and failure capture.
//!
//! A run moves through `Precondition -> Iteration(1..) -> Postcondition`,
//! with an implicit aborted state reachable from any phase once the trace
//! records an error. The postcondition still runs after a failure, since
//! teardown steps must clean up whatever the failure left behind.

use crate::{
    action::{Action, ActionKind},
    context::{Branch, RunContext},
    error::EngineError,
    handler::{HandlerContext, Registry, RunOptions},
    scenario::Scenario,
};

use super::dispatch::dispatch;

/// Runs all phases of `scenario`, returning the accumulated trace.
///
/// The declared `iteration` count is honored: up to `max(iteration, 1)`
/// passes run, stopping early once the trace records an error. Failure
/// capture fires after the precondition and after each iteration pass.
pub async fn run_phases<S>(
    session: &S,
    registry: &Registry<S>,
    scenario: &Scenario,
    options: &RunOptions,
) -> Result<RunContext, EngineError> {
    let mut context = RunContext::new(scenario.name.clone(), options.clone());

    if let Some(precondition) = &scenario.precondition {
        tracing::info!("precondition start.");
        if let Some(url) = &precondition.url {
            context = navigate(session, registry, url, context, options).await?;
        }
        if !context.has_error() {
            context = dispatch(
                0,
                session,
                registry,
                &precondition.steps,
                context,
                Branch::Precondition,
                options,
            )
            .await?;
        }
        capture_failure(session, registry, &context, options).await;
        tracing::info!("precondition done.");
    }

    tracing::info!("main scenario start.");
    if !context.has_error() {
        let passes = scenario.iteration.max(1);
        for pass in 0..passes {
            context = context.ensure_iteration(pass);
            context = navigate(session, registry, &scenario.url, context, options).await?;
            if !context.has_error() {
                context = dispatch(
                    pass + 1,
                    session,
                    registry,
                    &scenario.steps,
                    context,
                    Branch::Iteration(pass),
                    options,
                )
                .await?;
            }
            capture_failure(session, registry, &context, options).await;
            if context.has_error() {
                break;
            }
        }
    }
    tracing::info!("main scenario end.");

    if let Some(postcondition) = &scenario.postcondition {
        if let Some(url) = &postcondition.url {
            context = navigate(session, registry, url, context, options).await?;
        }
        context = dispatch(
            0,
            session,
            registry,
            &postcondition.steps,
            context,
            Branch::Postcondition,
            options,
        )
        .await?;
    }

    Ok(context)
}

/// Navigates through the `goto` handler without recording the navigation
/// into the trace. A navigation failure is captured as the run's error.
async fn navigate<S>(
    session: &S,
    registry: &Registry<S>,
    url: &str,
    context: RunContext,
    options: &RunOptions,
) -> Result<RunContext, EngineError> {
    let action = Action::Goto { meta: None, url: url.to_owned() };
    let handler = registry
        .find(ActionKind::Goto)
        .ok_or(EngineError::UnknownActionType(ActionKind::Goto))?;

    let result = handler(session, &action, HandlerContext { context: &context, options }).await;
    match result {
        Ok(_) => Ok(context),
        Err(cause) => Ok(context.with_error(cause)),
    }
}

/// Captures diagnostic state when the trace records an error.
///
/// Invokes the `screenshot` handler with a synthetic full-page action named
/// `error`, then the `dump` handler. No-op without an error. Never raises:
/// a failing capture is logged and swallowed, so diagnostics cannot mask
/// the original failure.
pub async fn capture_failure<S>(
    session: &S,
    registry: &Registry<S>,
    context: &RunContext,
    options: &RunOptions,
) {
    if !context.has_error() {
        return;
    }

    let screenshot =
        Action::Screenshot { meta: None, name: "error".into(), full_page: true };
    match registry.find(ActionKind::Screenshot) {
        Some(handler) => {
            if let Err(e) =
                handler(session, &screenshot, HandlerContext { context, options }).await
            {
                tracing::warn!("failed to capture failure screenshot: {e}");
            }
        }
        None => tracing::debug!("no screenshot handler registered, skipping capture"),
    }

    let dump = Action::Dump { meta: None };
    match registry.find(ActionKind::Dump) {
        Some(handler) => {
            if let Err(e) = handler(session, &dump, HandlerContext { context, options }).await {
                tracing::warn!("failed to capture page dump: {e}");
            }
        }
        None => tracing::debug!("no dump handler registered, skipping capture"),
    }
}
