//! `ghkit init <login> [--kind ...] [--project N]... [--repo NAME]...`

use anyhow::{Context, Result};
use clap::Args;

use ghkit_core::{OwnerKind, ProjectNumber};

use super::Session;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// User or organization login that owns the workspace.
    pub login: String,

    /// Account kind: user | org. Looked up remotely when omitted.
    #[arg(long)]
    pub kind: Option<OwnerKind>,

    /// Project number to include (repeatable).
    #[arg(long = "project", short = 'p', value_name = "N")]
    pub projects: Vec<u32>,

    /// Repository name to include, without the owner prefix (repeatable).
    #[arg(long = "repo", short = 'r', value_name = "NAME")]
    pub repositories: Vec<String>,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::load()?;
        let mut orchestrator = session.orchestrator(&self.login)?;

        let projects: Vec<ProjectNumber> =
            self.projects.iter().copied().map(ProjectNumber).collect();
        let snapshot = orchestrator
            .initialize(self.kind, &projects, &self.repositories)
            .with_context(|| format!("failed to initialize '{}'", self.login))?;

        println!(
            "✓ Initialized {} with {} project(s) and {} repositories",
            snapshot.workspace.owner(),
            snapshot.projects.len(),
            snapshot.repositories.len()
        );
        println!("  Saved to: {}", orchestrator.store().snapshot_path().display());
        Ok(())
    }
}
