//! `bumbo retrieve` / `bumbo deploy`: run one reconciliation session.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use bumbo_core::{project, BumboConfig, ComponentRequest};
use bumbo_sync::{ComponentState, Flow, KDiff3, Session, SessionReport, SfdxCli};

/// Arguments shared by `bumbo retrieve` and `bumbo deploy`.
#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Components as `Type:name1,name2`. Repeat for more types.
    #[arg(
        short = 'f',
        long = "metadata",
        value_name = "TYPE:NAMES",
        required = true
    )]
    pub metadata: Vec<ComponentRequest>,

    /// Directory inside the project (defaults to the current directory).
    #[arg(long, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Org alias or username; overrides `target_org` from config.
    #[arg(long, short = 'u', value_name = "ORG")]
    pub target_org: Option<String>,

    /// Emit the session report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SessionArgs {
    pub fn run(self, flow: Flow) -> Result<()> {
        let start = match self.project_dir {
            Some(dir) => dir,
            None => std::env::current_dir().context("cannot read current directory")?,
        };
        let root = project::resolve_root(&start)?;
        let config = BumboConfig::load(&root)
            .with_context(|| format!("failed to load config for '{}'", root.display()))?;

        let merge_tool = KDiff3::locate(config.merge_tool.as_deref())?;

        let target_org = self.target_org.or_else(|| config.target_org.clone());
        let org = SfdxCli::new(config.sfdx_bin.clone(), root.clone()).with_target_org(target_org);
        let session = Session::new(
            config.layout(&root),
            config.catalog(),
            Arc::new(org),
            Arc::new(merge_tool),
        )
        .with_api_version(config.api_version.clone());

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;
        let requests = self.metadata;
        let report = runtime.block_on(async {
            match flow {
                Flow::Retrieve => session.retrieve(&requests).await,
                Flow::Deploy => session.deploy(&requests).await,
            }
        })?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_summary(&report);
        }
        Ok(())
    }
}

fn print_summary(report: &SessionReport) {
    let count = |state: ComponentState| {
        report
            .components
            .iter()
            .filter(|r| r.state == state)
            .count()
    };
    let merged = count(ComponentState::MergedAccepted);
    let unchanged = count(ComponentState::Unchanged);
    let rejected = report.rejected().count();

    let verb = match report.flow {
        Flow::Retrieve => "retrieve",
        Flow::Deploy => "deploy",
    };
    let headline = format!(
        "{verb} finished ({merged} merged, {unchanged} unchanged, {rejected} rejected)"
    );
    if rejected == 0 {
        println!("{} {headline}", "✓".green());
    } else {
        println!("{} {headline}", "!".yellow());
    }

    for r in &report.components {
        let identity = &r.component.identity;
        match r.state {
            ComponentState::MergedAccepted => println!("  {}  {identity}", "✎".green()),
            ComponentState::Unchanged => println!("  ·  {identity}"),
            _ => println!("  {}  {identity} (merge not accepted)", "✗".red()),
        }
    }

    match &report.deployed {
        Some(batch) => println!("deployed {}", batch.to_arg()),
        None if report.flow == Flow::Deploy => println!("nothing to deploy"),
        None => {}
    }
}
