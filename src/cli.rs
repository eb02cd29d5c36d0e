//! Composable CLI options.
//!
//! Hosts flatten [`Opts`] into their own `clap` command, so the runner's
//! knobs combine with host-specific options without boilerplate.

use std::path::PathBuf;

use clap::Args;

use crate::{handler::RunOptions, session::Browser};

/// CLI options of a scenario-runner master process.
#[derive(Args, Clone, Debug)]
pub struct Opts {
    /// Root directory of scenario files.
    #[arg(long, short = 'p', value_name = "dir")]
    pub path: PathBuf,

    /// Directory screenshots are written into.
    #[arg(long = "image-dir", short = 'i', value_name = "dir")]
    pub image_dir: PathBuf,

    /// Directory pruned stylesheets are written into.
    #[arg(long = "css-dir", short = 'c', value_name = "dir")]
    pub css_dir: PathBuf,

    /// Number of worker processes. Zero runs every file sequentially
    /// in-process.
    #[arg(long, value_name = "int", default_value_t = 0)]
    pub parallel: usize,

    /// Scenario names to run; empty runs everything.
    #[arg(long, value_name = "names", value_delimiter = ',')]
    pub target: Vec<String>,

    /// Target browser identifier.
    #[arg(long, value_enum, default_value_t = Browser::Chrome)]
    pub browser: Browser,

    /// Disables headless mode.
    #[arg(long = "disable-headless")]
    pub disable_headless: bool,
}

impl Opts {
    /// Ambient run configuration derived from these options.
    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            browser: self.browser,
            image_dir: self.image_dir.clone(),
            css_dir: self.css_dir.clone(),
        }
    }
}
