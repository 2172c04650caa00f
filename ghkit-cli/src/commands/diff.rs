//! `ghkit diff <login>`: drift against live state, nothing written.

use anyhow::{Context, Result};
use clap::Args;
use similar::TextDiff;

use ghkit_sync::RefreshScope;

use super::{print_reports, Session};

#[derive(Args, Debug)]
pub struct DiffArgs {
    pub login: String,

    #[arg(long, default_value_t = RefreshScope::All)]
    pub scope: RefreshScope,

    /// Also print a unified diff of the snapshot a refresh would write.
    #[arg(long)]
    pub unified: bool,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::load()?;
        let orchestrator = session.orchestrator(&self.login)?;

        if !self.unified {
            let reports = orchestrator
                .detect_drift(self.scope)
                .with_context(|| format!("drift detection failed for '{}'", self.login))?;
            print_reports(&reports);
            return Ok(());
        }

        let plan = orchestrator
            .plan_refresh(self.scope)
            .with_context(|| format!("drift detection failed for '{}'", self.login))?;
        print_reports(&plan.reports);

        // Compare without the sync stamp so an unchanged remote diffs clean.
        let mut cached = plan.cached.clone();
        let mut next = plan.next.clone();
        cached.cache.last_synced_at = None;
        next.cache.last_synced_at = None;
        let before = cached.to_yaml()?;
        let after = next.to_yaml()?;
        if before == after {
            println!("Snapshot content is unchanged.");
            return Ok(());
        }

        let unified = TextDiff::from_lines(&before, &after)
            .unified_diff()
            .header("a/snapshot.yaml", "b/snapshot.yaml")
            .context_radius(3)
            .to_string();
        print!("{unified}");
        if !unified.ends_with('\n') {
            println!();
        }
        Ok(())
    }
}
