//! Entity control handlers: vocabulary actions, raw service calls,
//! continuous values.

use hassdeck_core::{CommitTrigger, ContinuousControl, ControlField, ServiceCall};

use crate::cli::{CallArgs, FieldArg, GlobalOpts, ServiceArgs, SetArgs};
use crate::error::CliError;
use crate::output;

use super::{Session, util};

fn control_field(arg: FieldArg) -> ControlField {
    match arg {
        FieldArg::Temperature => ControlField::Temperature,
        FieldArg::Position => ControlField::CoverPosition,
        FieldArg::Tilt => ControlField::CoverTilt,
        FieldArg::Speed => ControlField::FanSpeed,
        FieldArg::Valve => ControlField::ValvePosition,
    }
}

/// Print the entity's status as the store now shows it.
fn report(session: &Session, entity_id: &hassdeck_core::EntityId, verb: &str, global: &GlobalOpts) {
    if global.quiet {
        return;
    }
    let state = session.controller.store().snapshot();
    let Some(entity) = state.entity(entity_id) else {
        return;
    };
    let color = output::should_color(&global.color);
    eprintln!(
        "✓ {verb} {} → {}",
        state.display_name(entity),
        output::paint_status(&entity.status, color)
    );
}

pub async fn call(session: &Session, args: &CallArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let entity = util::resolve_entity(&session.controller.store().snapshot(), &args.entity_id)?;

    session
        .controller
        .discrete()
        .execute(&entity.entity_id, args.action)
        .await?;

    report(session, &entity.entity_id, &args.action.to_string(), global);
    Ok(())
}

pub async fn service(
    session: &Session,
    args: ServiceArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (domain, service) = util::parse_service(&args.service)?;
    let data = util::parse_data(args.data.as_deref())?;
    let entity = util::resolve_entity(&session.controller.store().snapshot(), &args.target)?;

    let call = ServiceCall {
        domain: domain.to_owned(),
        service: service.to_owned(),
        target: Some(entity.entity_id.clone()),
        data,
    };
    session
        .controller
        .discrete()
        .apply(&entity.entity_id, call, None)
        .await?;

    report(session, &entity.entity_id, &args.service, global);
    Ok(())
}

/// One-shot slider: a single input followed by release.
pub async fn set(session: &Session, args: &SetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let field = control_field(args.field);
    let entity = util::resolve_entity(&session.controller.store().snapshot(), &args.entity_id)?;
    let config = session.controller.config();

    let control = ContinuousControl::new(
        session.controller.mutations().clone(),
        entity.entity_id.clone(),
        field,
        CommitTrigger::Release,
        config.position_tolerance,
    )?;

    control.input(args.value)?;
    let value = control.value().unwrap_or(args.value);
    let committed = control.release().await;
    control.teardown();
    committed?;

    if !global.quiet {
        let state = session.controller.store().snapshot();
        let name = state
            .entity(&entity.entity_id)
            .map_or(entity.entity_id.as_str(), |e| state.display_name(e));
        eprintln!("✓ {name} {field} → {value}");
    }
    Ok(())
}
