//! Watch command: stream entity changes until interrupted.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tracing::debug;

use hassdeck_core::{Category, ConnectionState, EntityId, StoreState};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::Session;

// ── Change detection ────────────────────────────────────────────────

#[derive(Debug, PartialEq, Serialize)]
struct Change {
    at: DateTime<Utc>,
    entity_id: String,
    name: String,
    /// `None` when the entity appeared.
    from: Option<String>,
    /// `None` when the entity disappeared.
    to: Option<String>,
}

fn watched(id: &EntityId, categories: &[Category]) -> bool {
    categories.is_empty() || id.category().is_some_and(|c| categories.contains(&c))
}

/// Entities whose status or attributes differ between two snapshots.
fn diff(prev: &StoreState, next: &StoreState, categories: &[Category]) -> Vec<Change> {
    let now = Utc::now();
    let before: HashMap<&EntityId, _> = prev
        .entities()
        .iter()
        .map(|e| (&e.entity_id, e))
        .collect();

    let mut changes = Vec::new();
    for entity in next.entities().iter() {
        if !watched(&entity.entity_id, categories) {
            continue;
        }
        let from = match before.get(&entity.entity_id) {
            Some(old) if old.status == entity.status && old.attributes == entity.attributes => {
                continue;
            }
            Some(old) => Some(old.status.clone()),
            None => None,
        };
        changes.push(Change {
            at: now,
            entity_id: entity.entity_id.to_string(),
            name: next.display_name(entity).to_owned(),
            from,
            to: Some(entity.status.clone()),
        });
    }

    for old in prev.entities().iter() {
        if watched(&old.entity_id, categories) && next.entity(&old.entity_id).is_none() {
            changes.push(Change {
                at: now,
                entity_id: old.entity_id.to_string(),
                name: prev.display_name(old).to_owned(),
                from: Some(old.status.clone()),
                to: None,
            });
        }
    }
    changes
}

fn print_change(change: &Change, format: &OutputFormat, color: bool) {
    let line = match format {
        OutputFormat::Json | OutputFormat::JsonCompact => {
            serde_json::to_string(change).unwrap_or_default()
        }
        OutputFormat::Plain => change.entity_id.clone(),
        OutputFormat::Table | OutputFormat::Yaml => {
            let at = change.at.with_timezone(&Local).format("%H:%M:%S");
            match (&change.from, &change.to) {
                (Some(from), Some(to)) if from == to => {
                    format!("{at}  {}  attributes changed", change.name)
                }
                (Some(from), Some(to)) => format!(
                    "{at}  {}  {} → {}",
                    change.name,
                    output::paint_status(from, color),
                    output::paint_status(to, color)
                ),
                (None, Some(to)) => format!(
                    "{at}  {}  appeared ({})",
                    change.name,
                    output::paint_status(to, color)
                ),
                (_, None) => format!("{at}  {}  removed", change.name),
            }
        }
    };
    output::print_output(&line, false);
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(session: &Session, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let controller = &session.controller;
    let color = output::should_color(&global.color);
    let mut stream = controller.subscribe();
    let mut connection = controller.connection_state();

    // With --interval the watch loop polls; otherwise the controller does.
    let mut ticker = args.interval.map(|secs| {
        let period = Duration::from_secs(secs.max(1));
        tokio::time::interval_at(tokio::time::Instant::now() + period, period)
    });

    if !global.quiet {
        eprintln!(
            "Watching {} entities on {} (Ctrl-C to stop)",
            stream.current().entities().len(),
            controller.config().url
        );
    }

    let mut previous = stream.current().clone();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break;
            }
            next = stream.changed() => {
                let Some(next) = next else { break };
                for change in diff(&previous, &next, &args.category) {
                    print_change(&change, &global.output, color);
                }
                previous = next;
            }
            changed = connection.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = connection.borrow_and_update().clone();
                if !global.quiet && !matches!(state, ConnectionState::Connecting) {
                    eprintln!("connection: {}", output::paint_connection(&state, color));
                }
            }
            () = async {
                match ticker.as_mut() {
                    Some(t) => { t.tick().await; }
                    None => std::future::pending::<()>().await,
                }
            } => {
                // Failures land in the store and the connection state.
                let _ = controller.full_refresh().await;
            }
        }
    }
    Ok(())
}
