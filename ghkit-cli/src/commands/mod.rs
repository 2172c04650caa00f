//! Subcommand implementations and the plumbing they share.

pub mod diff;
pub mod init;
pub mod items;
pub mod refresh;
pub mod status;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;

use ghkit_core::{Config, FileSnapshotStore, TransportKind};
use ghkit_gateway::{GhCliTransport, GraphqlGateway, HttpTransport, Transport};
use ghkit_sync::{ChangeReport, CollectOptions, Orchestrator};

pub type Gateway = GraphqlGateway<Box<dyn Transport>>;

/// Home directory plus the configuration rooted there.
pub struct Session {
    pub home: PathBuf,
    pub config: Config,
}

impl Session {
    pub fn load() -> Result<Self> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
        let config = Config::load_at(&home).context("failed to load ~/.ghkit/config.yaml")?;
        tracing::debug!("config: {config:?}");
        Ok(Self { home, config })
    }

    pub fn options(&self) -> CollectOptions {
        CollectOptions::from(&self.config)
    }

    pub fn gateway(&self) -> Result<Gateway> {
        let transport: Box<dyn Transport> = match self.config.transport {
            TransportKind::Gh => Box::new(GhCliTransport::new()),
            TransportKind::Http => Box::new(
                HttpTransport::from_env(
                    self.config.api_url.clone(),
                    Duration::from_secs(self.config.timeout_secs),
                )
                .context("http transport needs GH_TOKEN or GITHUB_TOKEN")?,
            ),
        };
        Ok(GraphqlGateway::new(transport))
    }

    pub fn store(&self, login: &str) -> FileSnapshotStore {
        FileSnapshotStore::open_at(&self.home, login)
    }

    pub fn orchestrator(&self, login: &str) -> Result<Orchestrator<Gateway, FileSnapshotStore>> {
        Orchestrator::open(login, self.gateway()?, self.store(login), self.options())
            .with_context(|| format!("failed to open workspace '{login}'"))
    }
}

/// `+ added` / `- removed` lines per drifted category.
pub fn print_reports(reports: &[ChangeReport]) {
    let drifted: Vec<_> = reports.iter().filter(|r| !r.is_empty()).collect();
    if drifted.is_empty() {
        println!("No changes.");
        return;
    }
    for report in drifted {
        println!("{}", report.category.to_string().bold());
        for key in &report.added {
            println!("  {}", format!("+ {key}").green());
        }
        for key in &report.removed {
            println!("  {}", format!("- {key}").red());
        }
    }
}
