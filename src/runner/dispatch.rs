//! Sequential action dispatch.

use crate::{
    action::Step,
    context::{Branch, RunContext},
    error::EngineError,
    handler::{HandlerContext, Registry, RunOptions},
};

/// Executes `steps` strictly in order against `session`, folding each
/// handler result into the `branch` target of the trace.
///
/// Actions never run concurrently, so handler side effects are observed by
/// the page in script order. A handler failure is recorded as the context's
/// error and short-circuits the remaining steps; an action type missing
/// from `registry` is fatal and propagates instead.
pub async fn dispatch<S>(
    iteration: usize,
    session: &S,
    registry: &Registry<S>,
    steps: &[Step],
    context: RunContext,
    branch: Branch,
    options: &RunOptions,
) -> Result<RunContext, EngineError> {
    let mut context = context.with_current_iteration(iteration);

    for step in steps {
        let action = &step.action;
        let handler = registry
            .find(action.kind())
            .ok_or(EngineError::UnknownActionType(action.kind()))?;

        let result =
            handler(session, action, HandlerContext { context: &context, options }).await;
        match result {
            Ok(outcome) => context = context.fold(branch, outcome),
            Err(cause) => return Ok(context.with_error(cause)),
        }
    }

    Ok(context)
}
