//! `ghkit items <login> <number>`: every item on one project board.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use ghkit_core::{store, Owner, OwnerKind, ProjectNumber};
use ghkit_gateway::{ItemKind, ProjectItem, QueryGateway};
use ghkit_sync::{collect_project_items, validate};

use super::Session;

#[derive(Args, Debug)]
pub struct ItemsArgs {
    pub login: String,

    pub number: u32,

    /// Account kind: user | org. Taken from the snapshot, or looked up, when omitted.
    #[arg(long)]
    pub kind: Option<OwnerKind>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ItemsJson<'a> {
    project: &'a str,
    title: &'a str,
    total_count: u64,
    items: &'a [ProjectItem],
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "type")]
    kind: &'static str,
    #[tabled(rename = "#")]
    number: String,
    #[tabled(rename = "title")]
    title: String,
}

impl ItemsArgs {
    pub fn run(self) -> Result<()> {
        validate::login(&self.login)?;
        let session = Session::load()?;
        let gateway = session.gateway()?;
        let kind = self.owner_kind(&session, &gateway)?;
        let owner = Owner::new(self.login.clone(), kind);

        let collected =
            collect_project_items(&gateway, &owner, ProjectNumber(self.number), session.options())
                .with_context(|| format!("failed to collect project {} of {owner}", self.number))?;

        if self.json {
            let payload = ItemsJson {
                project: &collected.summary.id,
                title: &collected.summary.title,
                total_count: collected.summary.total_count,
                items: &collected.items,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize items JSON")?
            );
            return Ok(());
        }

        println!(
            "{} ({} items)",
            collected.summary.title, collected.summary.total_count
        );
        if collected.items.is_empty() {
            return Ok(());
        }
        let rows: Vec<ItemRow> = collected
            .items
            .iter()
            .map(|item| ItemRow {
                kind: kind_label(item.kind),
                number: item.number.map(|n| n.to_string()).unwrap_or_default(),
                title: item.title.clone(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }

    fn owner_kind(&self, session: &Session, gateway: &impl QueryGateway) -> Result<OwnerKind> {
        if let Some(kind) = self.kind {
            return Ok(kind);
        }
        if let Some(snapshot) = store::load_snapshot_at(&session.home, &self.login)? {
            return Ok(snapshot.workspace.kind);
        }
        let (kind, _) = gateway
            .resolve_owner(&self.login)
            .with_context(|| format!("could not resolve '{}'", self.login))?;
        Ok(kind)
    }
}

fn kind_label(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Issue => "issue",
        ItemKind::PullRequest => "pull request",
        ItemKind::DraftIssue => "draft",
        ItemKind::Redacted => "redacted",
    }
}
