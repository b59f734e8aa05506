//! Health check commands

use crate::app::{HealthAction, HealthArgs};
use crate::output::{Cell, Document, Output, Table};
use anyhow::Result;
use serde_json::json;
use vectory_core::{StatusTone, VectoryClient};

fn verdict(check: &str, ok: bool) -> Cell {
    if ok {
        Cell::toned(format!("Vector database is {}", check), StatusTone::Good)
    } else {
        Cell::toned(format!("Vector database is not {}", check), StatusTone::Bad)
    }
}

fn yes_no(ok: bool) -> Cell {
    if ok {
        Cell::toned("Yes", StatusTone::Good)
    } else {
        Cell::toned("No", StatusTone::Bad)
    }
}

pub async fn run(args: HealthArgs, client: &VectoryClient, out: &Output) -> Result<()> {
    match args.action {
        Some(HealthAction::Live) => {
            out.note(&format!("Checking if vector database is live at {}...", client.base_url()));
            let live = client.health.check_live().await;
            out.emit(&json!({ "live": live }), &Document::new().line(verdict("live", live)))
        }
        Some(HealthAction::Ready) => {
            out.note(&format!("Checking if vector database is ready at {}...", client.base_url()));
            let ready = client.health.check_ready().await;
            out.emit(&json!({ "ready": ready }), &Document::new().line(verdict("ready", ready)))
        }
        Some(HealthAction::Status) => {
            out.note(&format!("Checking vector database health at {}...", client.base_url()));
            let health = client.health.check_health().await;
            let mut table = Table::new(["Check", "Status"]).titled("Vector Database Health Status");
            table.row(vec!["Live".into(), yes_no(health.live)]);
            table.row(vec!["Ready".into(), yes_no(health.ready)]);
            out.emit(&health, &Document::new().table(table))
        }
        None => {
            out.note(&format!("Checking vector database at {}...", client.base_url()));
            let health = client.health.check_health().await;
            let doc = Document::new()
                .line(verdict("live", health.live))
                .line(verdict("ready", health.ready));
            out.emit(&health, &doc)
        }
    }
}
