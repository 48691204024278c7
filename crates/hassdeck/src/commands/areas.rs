//! Area grouping and related-entity handlers.

use serde::Serialize;
use tabled::Tabled;

use hassdeck_core::{AreaGroup, EntityId};

use crate::cli::{AreasArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::entities::{EntityRow, EntityView};
use super::{Session, util};

// ── Views ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct AreaView {
    area_id: Option<String>,
    name: String,
    hidden: bool,
    entities: usize,
    filtered: usize,
    categories: Vec<String>,
}

impl From<&AreaGroup> for AreaView {
    fn from(g: &AreaGroup) -> Self {
        Self {
            area_id: g.area_id.clone(),
            name: g.name.clone(),
            hidden: g.hidden,
            entities: g.entity_count(),
            filtered: g.filtered_count,
            categories: g.categories.keys().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Tabled)]
struct AreaRow {
    #[tabled(rename = "Area")]
    name: String,
    #[tabled(rename = "Entities")]
    entities: usize,
    #[tabled(rename = "Filtered")]
    filtered: String,
    #[tabled(rename = "Categories")]
    categories: String,
}

impl From<&AreaView> for AreaRow {
    fn from(v: &AreaView) -> Self {
        Self {
            name: if v.hidden {
                format!("{} (hidden)", v.name)
            } else {
                v.name.clone()
            },
            entities: v.entities,
            filtered: if v.filtered == 0 {
                String::new()
            } else {
                v.filtered.to_string()
            },
            categories: v.categories.join(", "),
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub fn handle(session: &Session, args: &AreasArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let groups = session.controller.area_groups(args.edit);

    let Some(ref needle) = args.area else {
        let views: Vec<AreaView> = groups.iter().map(AreaView::from).collect();
        let out = output::render_list(&global.output, &views, |v| AreaRow::from(v), |v| {
            v.area_id.clone().unwrap_or_else(|| v.name.clone())
        });
        output::print_output(&out, global.quiet);
        return Ok(());
    };

    let state = session.controller.store().snapshot();
    let group = if needle.eq_ignore_ascii_case(hassdeck_core::aggregate::UNASSIGNED) {
        groups.iter().find(|g| g.is_unassigned())
    } else {
        let area = util::resolve_area(&state, needle)?;
        groups
            .iter()
            .find(|g| g.area_id.as_deref() == Some(area.id.as_str()))
    };

    // A resolvable area with nothing visible renders as an empty list.
    let views: Vec<EntityView> = group
        .map(|g| g.entities().map(|e| EntityView::new(&state, e)).collect())
        .unwrap_or_default();

    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &views,
        |v| EntityRow::new(v, color),
        |v| v.entity_id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn related(session: &Session, entity_id: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let state = session.controller.store().snapshot();
    let entity = util::resolve_entity(&state, entity_id)?;
    let id: &EntityId = &entity.entity_id;

    let views: Vec<EntityView> = session
        .controller
        .related(id)
        .iter()
        .map(|e| EntityView::new(&state, e))
        .collect();

    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &views,
        |v| EntityRow::new(v, color),
        |v| v.entity_id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
