//! Preference handlers: visibility, custom names, dashboard settings.

use std::fmt::Write;

use hassdeck_core::{Settings, SettingsPatch};

use crate::cli::{GlobalOpts, RenameArgs, SettingsArgs, SettingsCommand, VisibilityArgs};
use crate::error::CliError;
use crate::output;

use super::{Session, util};

fn done(changed: bool, what: &str, global: &GlobalOpts) {
    if global.quiet {
        return;
    }
    if changed {
        eprintln!("✓ {what}");
    } else {
        eprintln!("  {what} (unchanged)");
    }
}

// ── Visibility ──────────────────────────────────────────────────────

pub fn hide(session: &Session, args: &VisibilityArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let state = session.controller.store().snapshot();
    if args.room {
        let area = util::resolve_area(&state, &args.target)?;
        let changed = session.prefs.hide_room(area.id.clone());
        done(changed, &format!("Room '{}' hidden", area.name), global);
    } else {
        let entity = util::resolve_entity(&state, &args.target)?;
        let changed = session.prefs.hide_entity(entity.entity_id.clone());
        done(changed, &format!("{} hidden", entity.entity_id), global);
    }
    Ok(())
}

pub fn show(session: &Session, args: &VisibilityArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let state = session.controller.store().snapshot();
    if args.room {
        let area = util::resolve_area(&state, &args.target)?;
        let changed = session.prefs.show_room(area.id.clone());
        done(changed, &format!("Room '{}' visible", area.name), global);
    } else {
        // Hidden ids stay showable after the entity disappears from the hub.
        let id = hassdeck_core::EntityId::from(args.target.trim());
        if !state.hidden_entities().contains(&id) {
            util::resolve_entity(&state, &args.target)?;
        }
        let changed = session.prefs.show_entity(id.clone());
        done(changed, &format!("{id} visible"), global);
    }
    Ok(())
}

// ── Custom names ────────────────────────────────────────────────────

pub fn rename(session: &Session, args: RenameArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let state = session.controller.store().snapshot();
    let entity = util::resolve_entity(&state, &args.entity_id)?;
    let id = entity.entity_id.clone();

    match args.name {
        Some(name) if !name.trim().is_empty() => {
            let name = name.trim().to_owned();
            let changed = session.prefs.set_custom_name(id.clone(), name.clone());
            done(changed, &format!("{id} is now '{name}'"), global);
        }
        _ => {
            let changed = session.prefs.remove_custom_name(id.clone());
            done(changed, &format!("{id} uses its hub name"), global);
        }
    }
    Ok(())
}

// ── Settings ────────────────────────────────────────────────────────

fn format_settings(settings: &Settings) -> String {
    let mut out = String::new();
    let interval = if settings.refresh_interval == 0 {
        "profile default".to_owned()
    } else {
        format!("{}s", settings.refresh_interval)
    };
    let _ = writeln!(out, "Refresh interval:  {interval}");
    let _ = writeln!(
        out,
        "Weather source:    {}",
        if settings.weather_source.is_empty() {
            "(first weather entity)"
        } else {
            &settings.weather_source
        }
    );
    let _ = writeln!(out, "Noise filters:     {}", settings.filter_patterns.len());
    for pattern in &settings.filter_patterns {
        let _ = writeln!(out, "  {pattern}");
    }
    let _ = writeln!(out, "Pinned entities:   {}", settings.pinned_entities.len());
    let _ = write!(out, "Pinned automations: {}", settings.pinned_automations.len());
    out
}

pub fn settings(session: &Session, args: SettingsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SettingsCommand::Show => {
            let state = session.controller.store().snapshot();
            let out = output::render_single(&global.output, state.settings(), format_settings, |s| {
                s.refresh_interval.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SettingsCommand::Set {
            refresh_interval,
            weather_source,
            filter_patterns,
            clear_filters,
        } => {
            let patch = SettingsPatch {
                refresh_interval,
                weather_source,
                filter_patterns: if clear_filters {
                    Some(Vec::new())
                } else if filter_patterns.is_empty() {
                    None
                } else {
                    Some(filter_patterns)
                },
                ..SettingsPatch::default()
            };
            if patch.is_empty() {
                return Err(CliError::Validation {
                    field: "settings".into(),
                    reason: "nothing to change; pass at least one option".into(),
                });
            }
            let changed = session.prefs.update_settings(patch);
            done(changed, "Settings updated", global);
            Ok(())
        }
    }
}
