//! Scenario execution engine for declarative browser-interaction scripts.
//!
//! A [`Scenario`] is a YAML script of tagged [`Action`]s plus optional
//! setup and teardown phases. The engine replays it against an opaque
//! browser [`Session`] through host-supplied action handlers, accumulating
//! an append-only [`RunContext`] trace across three ordered phases:
//! precondition, one or more iterations, postcondition. On failure it
//! captures diagnostic state (screenshot and DOM dump) before finalizing
//! the trace, and after every run it distills the session's CSS coverage
//! into pruned stylesheets.
//!
//! Scenario files fan out across a pool of worker processes via the
//! [`worker`] distribution protocol; within one file everything is strictly
//! sequential, so page side effects happen in script order.
//!
//! The concrete browser engine and the per-action commands stay outside
//! this crate: hosts implement [`Session`] and register an
//! [`ActionHandler`] per action kind.

#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod action;
pub mod cli;
pub mod context;
pub mod css;
pub mod error;
pub mod handler;
pub mod runner;
pub mod scenario;
pub mod session;
pub mod template;
pub mod worker;

pub use self::{
    action::{Action, ActionKind, ActionMeta, Step},
    context::{Branch, ErrorRecord, RunContext},
    error::{EngineError, HandlerError, ScenarioError, SessionError},
    handler::{ActionHandler, HandlerContext, HandlerResult, Registry, RunOptions, StepOutcome},
    runner::run,
    scenario::{Loaded, Scenario, SkipReason},
    session::{Browser, CoverageEntry, CoverageRange, Session},
};
