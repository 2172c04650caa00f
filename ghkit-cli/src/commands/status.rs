//! `ghkit status <login>`: snapshot age and contents.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use ghkit_core::{store, Snapshot};
use ghkit_sync::{check_staleness, staleness::format_age, validate, StaleReason, Staleness};

use super::Session;

#[derive(Args, Debug)]
pub struct StatusArgs {
    pub login: String,

    /// Age in days at which the snapshot counts as stale.
    #[arg(long, value_name = "DAYS")]
    pub max_age_days: Option<u32>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        validate::login(&self.login)?;
        let session = Session::load()?;
        let max_age_days = self.max_age_days.unwrap_or(session.config.stale_after_days);

        let snapshot = store::load_snapshot_at(&session.home, &self.login)
            .with_context(|| format!("failed to read snapshot for '{}'", self.login))?;
        let staleness = check_staleness(snapshot.as_ref(), max_age_days);

        if self.json {
            return print_json(&self.login, snapshot.as_ref(), &staleness, max_age_days);
        }
        print_table(&self.login, snapshot.as_ref(), &staleness);
        Ok(())
    }
}

#[derive(Serialize)]
struct StatusJson<'a> {
    workspace: &'a str,
    kind: Option<String>,
    status: &'static str,
    detail: String,
    stale: bool,
    max_age_days: u32,
    last_synced_at: Option<DateTime<Utc>>,
    projects: usize,
    repositories: usize,
    toolkit_version: Option<&'a str>,
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "workspace")]
    workspace: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "detail")]
    detail: String,
    #[tabled(rename = "projects")]
    projects: usize,
    #[tabled(rename = "repositories")]
    repositories: usize,
}

fn print_json(
    login: &str,
    snapshot: Option<&Snapshot>,
    staleness: &Staleness,
    max_age_days: u32,
) -> Result<()> {
    let payload = StatusJson {
        workspace: login,
        kind: snapshot.map(|s| s.workspace.kind.to_string()),
        status: status_key(staleness),
        detail: staleness_detail(staleness),
        stale: staleness.is_stale(),
        max_age_days,
        last_synced_at: snapshot.and_then(|s| s.cache.last_synced_at),
        projects: snapshot.map_or(0, |s| s.projects.len()),
        repositories: snapshot.map_or(0, |s| s.repositories.len()),
        toolkit_version: snapshot.map(|s| s.cache.toolkit_version.as_str()),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(login: &str, snapshot: Option<&Snapshot>, staleness: &Staleness) {
    let workspace = match snapshot {
        Some(s) => s.workspace.owner().to_string(),
        None => login.to_string(),
    };
    let row = StatusRow {
        workspace,
        status: format!("{} {}", indicator(staleness), status_label(staleness)),
        detail: staleness_detail(staleness),
        projects: snapshot.map_or(0, |s| s.projects.len()),
        repositories: snapshot.map_or(0, |s| s.repositories.len()),
    };
    let mut table = Table::new(vec![row]);
    table.with(Style::rounded());
    println!("{table}");

    match staleness {
        Staleness::Stale {
            reason: StaleReason::NoSnapshot,
        } => println!("Run 'ghkit init {login}' to create a snapshot."),
        Staleness::Stale { .. } => println!("Run 'ghkit refresh {login}' to update it."),
        Staleness::Fresh { .. } => {}
    }
}

fn status_key(staleness: &Staleness) -> &'static str {
    match staleness {
        Staleness::Fresh { .. } => "fresh",
        Staleness::Stale { .. } => "stale",
    }
}

fn status_label(staleness: &Staleness) -> &'static str {
    match staleness {
        Staleness::Fresh { .. } => "FRESH",
        Staleness::Stale { .. } => "STALE",
    }
}

fn indicator(staleness: &Staleness) -> String {
    match staleness {
        Staleness::Fresh { .. } => "■".green().bold().to_string(),
        Staleness::Stale { .. } => "■".yellow().bold().to_string(),
    }
}

fn staleness_detail(staleness: &Staleness) -> String {
    match staleness {
        Staleness::Fresh { age } => format!("synced {} ago", format_age(*age)),
        Staleness::Stale { reason } => reason.to_string(),
    }
}
