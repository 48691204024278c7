//! Shared helpers for command handlers.

use std::sync::Arc;

use serde_json::{Map, Value};

use hassdeck_core::{Area, Entity, EntityId, StoreState};

use crate::error::CliError;

/// Resolve an entity id against the current snapshot.
pub fn resolve_entity(state: &StoreState, identifier: &str) -> Result<Arc<Entity>, CliError> {
    let id = EntityId::from(identifier.trim());
    state.entity(&id).cloned().ok_or_else(|| CliError::NotFound {
        resource_type: "entity".into(),
        identifier: identifier.into(),
        list_command: "entities".into(),
    })
}

/// Resolve an area by id or case-insensitive name.
pub fn resolve_area<'a>(state: &'a StoreState, identifier: &str) -> Result<&'a Area, CliError> {
    state
        .registry()
        .find_area(identifier.trim())
        .ok_or_else(|| CliError::NotFound {
            resource_type: "area".into(),
            identifier: identifier.into(),
            list_command: "areas --edit".into(),
        })
}

/// Split `domain.service`.
pub fn parse_service(raw: &str) -> Result<(&str, &str), CliError> {
    match raw.split_once('.') {
        Some((domain, service)) if !domain.is_empty() && !service.is_empty() => {
            Ok((domain, service))
        }
        _ => Err(CliError::Validation {
            field: "service".into(),
            reason: format!("expected domain.service, got '{raw}'"),
        }),
    }
}

/// Parse a `--data` argument into a JSON object.
pub fn parse_data(raw: Option<&str>) -> Result<Map<String, Value>, CliError> {
    let Some(raw) = raw else {
        return Ok(Map::new());
    };
    match serde_json::from_str(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(CliError::Validation {
            field: "data".into(),
            reason: format!("expected a JSON object, got {other}"),
        }),
    }
}

/// Human-readable age, e.g. `12s`, `4m`, `2h`.
pub fn format_age(age: chrono::Duration) -> String {
    let secs = age.num_seconds().max(0);
    match secs {
        0..60 => format!("{secs}s"),
        60..3600 => format!("{}m", secs / 60),
        _ => format!("{}h", secs / 3600),
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn service_needs_both_halves() {
        assert_eq!(parse_service("light.turn_on").unwrap(), ("light", "turn_on"));
        assert!(parse_service("light").is_err());
        assert!(parse_service(".turn_on").is_err());
        assert!(parse_service("light.").is_err());
    }

    #[test]
    fn data_must_be_an_object() {
        assert!(parse_data(None).unwrap().is_empty());
        let map = parse_data(Some(r#"{"brightness": 128}"#)).unwrap();
        assert_eq!(map["brightness"], 128);
        assert!(matches!(
            parse_data(Some("[1, 2]")),
            Err(CliError::Validation { .. })
        ));
        assert!(matches!(parse_data(Some("{nope")), Err(CliError::Json(_))));
    }

    #[test]
    fn ages_round_down_to_the_largest_unit() {
        assert_eq!(format_age(chrono::Duration::seconds(12)), "12s");
        assert_eq!(format_age(chrono::Duration::seconds(250)), "4m");
        assert_eq!(format_age(chrono::Duration::seconds(7300)), "2h");
        assert_eq!(format_age(chrono::Duration::seconds(-3)), "0s");
    }
}
