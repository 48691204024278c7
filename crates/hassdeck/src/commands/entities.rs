//! Entity listing.

use serde::Serialize;
use tabled::Tabled;

use hassdeck_core::{Entity, StoreState};

use crate::cli::{EntitiesArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::Session;

// ── View ────────────────────────────────────────────────────────────

/// An entity as the dashboard shows it: custom name, area, visibility.
#[derive(Serialize)]
pub struct EntityView {
    pub entity_id: String,
    pub name: String,
    pub state: String,
    pub category: Option<String>,
    pub area: Option<String>,
    pub hidden: bool,
}

impl EntityView {
    pub fn new(state: &StoreState, entity: &Entity) -> Self {
        let registry = state.registry();
        Self {
            entity_id: entity.entity_id.to_string(),
            name: state.display_name(entity).to_owned(),
            state: entity.status.clone(),
            category: entity.category().map(|c| c.to_string()),
            area: registry
                .area_of(&entity.entity_id)
                .map(|id| registry.area_name(id).to_owned()),
            hidden: state.hidden_entities().contains(&entity.entity_id),
        }
    }
}

#[derive(Tabled)]
pub struct EntityRow {
    #[tabled(rename = "Entity")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Area")]
    area: String,
}

impl EntityRow {
    pub fn new(view: &EntityView, color: bool) -> Self {
        let name = if view.hidden {
            format!("{} (hidden)", view.name)
        } else {
            view.name.clone()
        };
        Self {
            id: view.entity_id.clone(),
            name,
            state: output::paint_status(&view.state, color),
            area: view.area.clone().unwrap_or_default(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(session: &Session, args: &EntitiesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let state = session.controller.store().snapshot();
    let color = output::should_color(&global.color);

    let source = match args.category {
        Some(category) => state.collection(category),
        None => state.entities(),
    };
    let mut views: Vec<EntityView> = source
        .iter()
        .filter(|e| args.all || !state.hidden_entities().contains(&e.entity_id))
        .map(|e| EntityView::new(&state, e))
        .collect();
    views.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));

    let out = output::render_list(
        &global.output,
        &views,
        |v| EntityRow::new(v, color),
        |v| v.entity_id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
