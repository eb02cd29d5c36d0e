//! Append-only execution trace of one scenario file.
//!
//! A [`RunContext`] is created once per scenario file and discarded after
//! the file's CSS extraction completes; it is never shared across files or
//! workers. Once written, an entry in any `steps` sequence is never
//! modified or removed. All updates go through pure methods returning a
//! new context, so a context handed to a handler can never be mutated
//! behind its back.

use serde::Serialize;

use crate::{
    error::HandlerError,
    handler::{RunOptions, StepOutcome},
};

/// Which branch of the trace a dispatch folds results into.
///
/// The target is always decided by the invoking phase controller, never by
/// a handler result itself.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Branch {
    /// `precondition.steps`.
    Precondition,

    /// `iterations[i].steps` of the given pass.
    Iteration(usize),

    /// `postcondition.steps`.
    Postcondition,
}

/// Identity and configuration of a run, set once at start.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunInfo {
    /// Scenario name.
    pub name: String,

    /// Run configuration the trace was produced under.
    pub options: RunOptions,
}

/// Ordered handler results of one phase or iteration pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PhaseTrace {
    /// Handler results in execution order.
    pub steps: Vec<StepOutcome>,
}

/// Recorded abnormal termination of a phase.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ErrorRecord {
    /// What the failing handler reported.
    pub cause: HandlerError,
}

/// The execution trace: an append-only log of everything a scenario run
/// produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunContext {
    /// Run identity and configuration.
    pub info: RunInfo,

    /// Index of the iteration currently executing; set per dispatch.
    pub current_iteration: usize,

    /// Precondition phase results.
    pub precondition: PhaseTrace,

    /// One entry per iteration pass, growing monotonically as passes
    /// execute.
    pub iterations: Vec<PhaseTrace>,

    /// Postcondition phase results.
    pub postcondition: PhaseTrace,

    /// Present iff a phase terminated abnormally.
    pub error: Option<ErrorRecord>,
}

impl RunContext {
    /// Creates the empty trace of a fresh run.
    #[must_use]
    pub fn new(name: impl Into<String>, options: RunOptions) -> Self {
        Self {
            info: RunInfo { name: name.into(), options },
            current_iteration: 0,
            precondition: PhaseTrace::default(),
            iterations: Vec::new(),
            postcondition: PhaseTrace::default(),
            error: None,
        }
    }

    /// Appends `outcome` to the `branch` target, leaving every other branch
    /// untouched.
    ///
    /// Pure: `self` is never mutated, and two folds from the same base
    /// produce independent contexts.
    #[must_use]
    pub fn fold(&self, branch: Branch, outcome: StepOutcome) -> Self {
        let mut next = self.clone();
        match branch {
            Branch::Precondition => next.precondition.steps.push(outcome),
            Branch::Iteration(pass) => {
                while next.iterations.len() <= pass {
                    next.iterations.push(PhaseTrace::default());
                }
                next.iterations[pass].steps.push(outcome);
            }
            Branch::Postcondition => next.postcondition.steps.push(outcome),
        }
        next
    }

    /// Returns a context whose `iterations` reach at least `pass + 1`
    /// entries, so the pass's (possibly empty) trace is observable.
    #[must_use]
    pub fn ensure_iteration(&self, pass: usize) -> Self {
        let mut next = self.clone();
        while next.iterations.len() <= pass {
            next.iterations.push(PhaseTrace::default());
        }
        next
    }

    /// Returns a context with `current_iteration` set for an upcoming
    /// dispatch.
    #[must_use]
    pub fn with_current_iteration(&self, iteration: usize) -> Self {
        let mut next = self.clone();
        next.current_iteration = iteration;
        next
    }

    /// Returns a context with `cause` recorded as the run's error.
    ///
    /// The first recorded failure wins; a later one (a postcondition step
    /// failing during cleanup, say) never masks it.
    #[must_use]
    pub fn with_error(&self, cause: HandlerError) -> Self {
        let mut next = self.clone();
        let _ = next.error.get_or_insert(ErrorRecord { cause });
        next
    }

    /// Whether a phase has terminated abnormally.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use crate::session::Browser;

    use super::*;

    fn base() -> RunContext {
        RunContext::new(
            "trace",
            RunOptions {
                browser: Browser::Chrome,
                image_dir: "images".into(),
                css_dir: "css".into(),
            },
        )
    }

    #[test]
    fn fold_never_mutates_the_input() {
        let base = base();
        let folded = base.fold(Branch::Precondition, StepOutcome::default());

        assert!(base.precondition.steps.is_empty());
        assert_eq!(folded.precondition.steps.len(), 1);
    }

    #[test]
    fn two_folds_from_one_base_are_independent() {
        let base = base();
        let left = base.fold(Branch::Precondition, StepOutcome::default().with("side", "left"));
        let right = base.fold(Branch::Precondition, StepOutcome::default().with("side", "right"));

        assert_eq!(left.precondition.steps.len(), 1);
        assert_eq!(right.precondition.steps.len(), 1);
        assert_eq!(left.precondition.steps[0].payload["side"], "left");
        assert_eq!(right.precondition.steps[0].payload["side"], "right");
    }

    #[test]
    fn iteration_fold_grows_passes_monotonically() {
        let ctx = base()
            .fold(Branch::Iteration(0), StepOutcome::default())
            .fold(Branch::Iteration(1), StepOutcome::default())
            .fold(Branch::Iteration(1), StepOutcome::default());

        assert_eq!(ctx.iterations.len(), 2);
        assert_eq!(ctx.iterations[0].steps.len(), 1);
        assert_eq!(ctx.iterations[1].steps.len(), 2);
    }

    #[test]
    fn fold_leaves_unrelated_branches_untouched() {
        let ctx = base()
            .fold(Branch::Precondition, StepOutcome::default())
            .fold(Branch::Postcondition, StepOutcome::default());

        assert_eq!(ctx.precondition.steps.len(), 1);
        assert_eq!(ctx.postcondition.steps.len(), 1);
        assert!(ctx.iterations.is_empty());
    }

    #[test]
    fn first_recorded_error_wins() {
        let ctx = base()
            .with_error(HandlerError::new("original failure"))
            .with_error(HandlerError::new("cleanup failure"));

        assert_eq!(ctx.error.unwrap().cause.message, "original failure");
    }

    #[test]
    fn ensure_iteration_exposes_an_empty_pass() {
        let ctx = base().ensure_iteration(0);
        assert_eq!(ctx.iterations.len(), 1);
        assert!(ctx.iterations[0].steps.is_empty());
    }
}
