//! `ghkit refresh <login> [--scope all|projects|repositories]`

use anyhow::{Context, Result};
use clap::Args;

use ghkit_sync::RefreshScope;

use super::{print_reports, Session};

#[derive(Args, Debug)]
pub struct RefreshArgs {
    pub login: String,

    /// Part of the snapshot to re-fetch; the rest is kept as cached.
    #[arg(long, default_value_t = RefreshScope::All)]
    pub scope: RefreshScope,
}

impl RefreshArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::load()?;
        let mut orchestrator = session.orchestrator(&self.login)?;
        let outcome = orchestrator
            .refresh_scope(self.scope)
            .with_context(|| format!("refresh failed for '{}'", self.login))?;

        print_reports(&outcome.reports);
        let status = if outcome.changed { "updated" } else { "unchanged" };
        println!(
            "✓ '{}' {status}, synced at {}",
            self.login,
            outcome.last_synced_at.to_rfc3339()
        );
        Ok(())
    }
}
