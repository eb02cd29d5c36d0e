//! Action-handler capability and the [`Registry`] storing handlers.
//!
//! A handler is the host-supplied function executing one action kind
//! against a live browser session. The engine only requires that every
//! action type referenced by a scenario resolves to one.

use std::{collections::HashMap, fmt, path::PathBuf};

use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::{
    action::{Action, ActionKind, ActionMeta},
    context::RunContext,
    error::HandlerError,
    session::Browser,
};

/// Ambient per-run configuration, threaded by value into every handler
/// call instead of living in global state.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RunOptions {
    /// Target browser identifier.
    pub browser: Browser,

    /// Directory screenshots are written into.
    pub image_dir: PathBuf,

    /// Directory pruned stylesheets are written into.
    pub css_dir: PathBuf,
}

/// Everything a handler may inspect besides the action itself.
#[derive(Debug)]
pub struct HandlerContext<'a> {
    /// Trace accumulated so far, with [`RunContext::current_iteration`] set
    /// for the ongoing dispatch.
    pub context: &'a RunContext,

    /// Ambient run configuration.
    pub options: &'a RunOptions,
}

/// Successful result of one handler invocation, folded into the trace.
///
/// If the action carried a [`meta`], the handler must echo it verbatim.
///
/// [`meta`]: ActionMeta
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct StepOutcome {
    /// Metadata echoed from the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ActionMeta>,

    /// Handler-specific payload (typed value, screenshot path, dumped
    /// markup).
    #[serde(flatten)]
    pub payload: Map<String, Json>,
}

impl StepOutcome {
    /// Creates an empty [`StepOutcome`] echoing the given `meta`.
    #[must_use]
    pub fn new(meta: Option<ActionMeta>) -> Self {
        Self { meta, payload: Map::new() }
    }

    /// Creates a [`StepOutcome`] echoing the metadata of `action`.
    #[must_use]
    pub fn of(action: &Action) -> Self {
        Self::new(action.meta().cloned())
    }

    /// Attaches a payload field.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        let _ = self.payload.insert(key.into(), value.into());
        self
    }
}

/// Result of one handler invocation.
pub type HandlerResult = Result<StepOutcome, HandlerError>;

/// Boxed asynchronous handler of one action kind.
///
/// Handlers signal failure through the returned future, never by
/// panicking; a failure is recorded into the trace and short-circuits the
/// current phase.
pub type ActionHandler<S> = Box<
    dyn for<'a> Fn(&'a S, &'a Action, HandlerContext<'a>) -> LocalBoxFuture<'a, HandlerResult>,
>;

/// Collection of [`ActionHandler`]s keyed by [`ActionKind`].
///
/// Every action type referenced by a scenario must resolve to exactly one
/// handler here, otherwise dispatch fails fatally with
/// [`EngineError::UnknownActionType`].
///
/// [`EngineError::UnknownActionType`]: crate::error::EngineError::UnknownActionType
pub struct Registry<S> {
    handlers: HashMap<ActionKind, ActionHandler<S>>,
}

// Implemented manually to print handler pointers instead of requiring
// `Debug` from the boxed functions.
impl<S> fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field(
                "handlers",
                &self
                    .handlers
                    .iter()
                    .map(|(kind, handler)| (kind, format!("{:p}", handler)))
                    .collect::<HashMap<_, _>>(),
            )
            .finish()
    }
}

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self { handlers: HashMap::new() }
    }
}

impl<S> Registry<S> {
    /// Creates an empty [`Registry`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler for the given action `kind`, replacing a previous one.
    #[must_use]
    pub fn with<F>(mut self, kind: ActionKind, handler: F) -> Self
    where
        F: for<'a> Fn(&'a S, &'a Action, HandlerContext<'a>) -> LocalBoxFuture<'a, HandlerResult>
            + 'static,
    {
        self.insert(kind, handler);
        self
    }

    /// Adds a handler for the given action `kind`, replacing a previous one.
    pub fn insert<F>(&mut self, kind: ActionKind, handler: F)
    where
        F: for<'a> Fn(&'a S, &'a Action, HandlerContext<'a>) -> LocalBoxFuture<'a, HandlerResult>
            + 'static,
    {
        let _ = self.handlers.insert(kind, Box::new(handler));
    }

    /// Returns the handler of the given action `kind`, if present.
    #[must_use]
    pub fn find(&self, kind: ActionKind) -> Option<&ActionHandler<S>> {
        self.handlers.get(&kind)
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt as _;

    use super::*;

    #[test]
    fn later_insert_replaces_earlier_handler() {
        let registry: Registry<()> = Registry::new()
            .with(ActionKind::Dump, |_, action, _| {
                async move { Ok(StepOutcome::of(action).with("generation", 1)) }.boxed_local()
            })
            .with(ActionKind::Dump, |_, action, _| {
                async move { Ok(StepOutcome::of(action).with("generation", 2)) }.boxed_local()
            });

        let action = Action::Dump { meta: None };
        let context = RunContext::new("replace", test_options());
        let handler = registry.find(ActionKind::Dump).unwrap();
        let outcome = futures::executor::block_on(handler(
            &(),
            &action,
            HandlerContext { context: &context, options: &test_options() },
        ))
        .unwrap();
        assert_eq!(outcome.payload["generation"], 2);
    }

    #[test]
    fn find_misses_unregistered_kinds() {
        let registry: Registry<()> = Registry::new();
        assert!(registry.find(ActionKind::Click).is_none());
    }

    fn test_options() -> RunOptions {
        RunOptions {
            browser: Browser::Chrome,
            image_dir: "images".into(),
            css_dir: "css".into(),
        }
    }
}
