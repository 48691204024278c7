//! Status command handler.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;
use strum::IntoEnumIterator;

use hassdeck_core::Category;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::{Session, util};

#[derive(Serialize)]
struct StatusReport {
    profile: String,
    url: String,
    connection: String,
    entities: usize,
    by_category: BTreeMap<String, usize>,
    areas: usize,
    devices: usize,
    hidden_entities: usize,
    hidden_rooms: usize,
    custom_names: usize,
    pending: usize,
    data_age_secs: Option<i64>,
    remote_preferences: bool,
    last_error: Option<String>,
}

fn detail(report: &StatusReport, color: bool, connection: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Profile:      {}", report.profile);
    let _ = writeln!(out, "Hub:          {}", report.url);
    let _ = writeln!(out, "Connection:   {connection}");
    let _ = writeln!(
        out,
        "Data age:     {}",
        report
            .data_age_secs
            .map_or_else(|| "-".into(), |s| util::format_age(chrono::Duration::seconds(s)))
    );
    let _ = writeln!(
        out,
        "Preferences:  {}",
        if report.remote_preferences {
            "local + remote"
        } else {
            "local"
        }
    );
    let _ = writeln!(
        out,
        "Registry:     {} areas, {} devices",
        report.areas, report.devices
    );
    let _ = writeln!(
        out,
        "Hidden:       {} entities, {} rooms",
        report.hidden_entities, report.hidden_rooms
    );
    let _ = writeln!(out, "Custom names: {}", report.custom_names);
    let _ = writeln!(out, "Pending:      {}", report.pending);
    if let Some(ref err) = report.last_error {
        let _ = writeln!(out, "Last error:   {}", output::paint_status("error", color));
        let _ = writeln!(out, "              {err}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Entities:     {}", report.entities);
    for (category, count) in &report.by_category {
        let _ = writeln!(out, "  {category:<20} {count}");
    }
    out.trim_end().to_owned()
}

pub fn handle(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let controller = &session.controller;
    let state = controller.store().snapshot();
    let connection = controller.current_connection_state();
    let color = output::should_color(&global.color);

    let by_category = Category::iter()
        .map(|c| (c.to_string(), state.collection(c).len()))
        .filter(|(_, n)| *n > 0)
        .collect();

    let report = StatusReport {
        profile: session.profile_name.clone(),
        url: controller.config().url.to_string(),
        connection: output::paint_connection(&connection, false),
        entities: state.entities().len(),
        by_category,
        areas: state.registry().areas().count(),
        devices: state.registry().device_count(),
        hidden_entities: state.hidden_entities().len(),
        hidden_rooms: state.hidden_rooms().len(),
        custom_names: state.custom_names().len(),
        pending: state.pending_count(),
        data_age_secs: state.data_age().map(|age| age.num_seconds()),
        remote_preferences: session.prefs.remote_available(),
        last_error: state.error().map(str::to_owned),
    };

    let painted = output::paint_connection(&connection, color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| detail(r, color, &painted),
        |r| r.connection.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
