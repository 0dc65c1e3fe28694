//! `bumbo init [--project-dir <dir>]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use bumbo_core::{
    project::{self, init_at},
    BumboConfig,
};

/// Prepare a project for bumbo.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory inside the project (defaults to the current directory).
    #[arg(long, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let start = match self.project_dir {
            Some(dir) => dir,
            None => std::env::current_dir().context("cannot read current directory")?,
        };
        let root = project::resolve_root(&start)?;
        let layout = BumboConfig::load(&root)?.layout(&root);

        let report = init_at(&layout)
            .with_context(|| format!("failed to init '{}'", root.display()))?;

        println!("✓ Initialized bumbo in '{}'", root.display());
        if report.appended.is_empty() {
            println!("  .forceignore already excludes staged files");
        } else {
            println!("  Added to .forceignore: {}", report.appended.join(" "));
        }
        if report.config_written {
            println!(
                "  Wrote default config: {}",
                layout.config_path().display()
            );
        }
        Ok(())
    }
}
